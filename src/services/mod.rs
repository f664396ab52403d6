pub mod actor_service;
pub mod admin_service;
pub mod auth_service;
pub mod favorite_service;
pub mod follow_service;
pub mod notification_service;
pub mod order_service;
pub mod product_service;
pub mod review_service;
pub mod store_service;
