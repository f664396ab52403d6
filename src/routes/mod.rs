use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod doc;
pub mod favorites;
pub mod follows;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod params;
pub mod products;
pub mod reviews;
pub mod stores;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/stores", stores::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/favorites", favorites::router())
        .nest("/follows", follows::router())
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
        .merge(reviews::router())
}
