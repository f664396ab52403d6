use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::follows::{FollowedStoreList, ToggleFollowResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::follow_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_followed_stores))
        .route("/{store_id}", post(toggle_follow))
}

#[utoipa::path(
    post,
    path = "/api/follows/{store_id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID")
    ),
    responses(
        (status = 200, description = "Follow toggled", body = ApiResponse<ToggleFollowResponse>),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Follows"
)]
pub async fn toggle_follow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ToggleFollowResponse>>> {
    let resp = follow_service::toggle_follow(&state.pool, &user, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/follows",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List followed stores", body = ApiResponse<FollowedStoreList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Follows"
)]
pub async fn list_followed_stores(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<FollowedStoreList>>> {
    let resp = follow_service::list_followed_stores(&state.pool, &user, pagination).await?;
    Ok(Json(resp))
}
