use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::reviews::{ProductRating, RespondReviewRequest, ReviewList, SubmitReviewRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products/{id}/reviews",
            get(list_product_reviews).post(submit_review),
        )
        .route("/products/{id}/rating", get(product_rating))
        .route("/reviews/{id}/response", post(respond_to_review))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = SubmitReviewRequest,
    responses(
        (status = 200, description = "Review submitted", body = ApiResponse<Review>),
        (status = 400, description = "Rating out of range"),
        (status = 409, description = "Duplicate or self review"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn submit_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::submit_review(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/products/{id}/reviews", tag = "Reviews")]
pub async fn list_product_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_product_reviews(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/products/{id}/rating", tag = "Reviews")]
pub async fn product_rating(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductRating>>> {
    let rating = review_service::product_rating(&state, id).await?;
    Ok(Json(ApiResponse::success(
        "Rating",
        rating,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/response",
    params(
        ("id" = Uuid, Path, description = "Review ID")
    ),
    request_body = RespondReviewRequest,
    responses(
        (status = 200, description = "Response recorded", body = ApiResponse<Review>),
        (status = 400, description = "Already responded"),
        (status = 403, description = "Not the store owner"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn respond_to_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::respond_to_review(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
