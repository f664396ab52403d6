pub mod favorites;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod store_follows;
pub mod stores;
pub mod users;

pub use favorites::Entity as Favorites;
pub use notifications::Entity as Notifications;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use store_follows::Entity as StoreFollows;
pub use stores::Entity as Stores;
pub use users::Entity as Users;
