pub mod auth;
pub mod favorites;
pub mod follows;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod stores;
