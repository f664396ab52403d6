use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::lifecycle::Lifecycle,
    dto::reviews::ReviewList,
    entity::reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Review,
    response::{ApiResponse, Meta},
    services::review_service::review_from_entity,
    state::AppState,
};

/// Reviews awaiting moderation, oldest first.
pub async fn list_pending_reviews(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ReviewList>> {
    ensure_admin(user)?;
    let items = Reviews::find()
        .filter(ReviewCol::Approved.eq(false))
        .filter(ReviewCol::Lifecycle.eq(Lifecycle::Active.as_str()))
        .order_by_asc(ReviewCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Pending reviews",
        ReviewList { items },
        Some(Meta::empty()),
    ))
}

/// Approve a review so it counts toward the public rating.
pub async fn approve_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Review>> {
    ensure_admin(user)?;
    set_moderation(state, user, id, |active| {
        active.approved = Set(true);
    })
    .await
}

/// Soft-hide a review. It stays in storage but disappears from listings
/// and from the rating.
pub async fn hide_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Review>> {
    ensure_admin(user)?;
    set_moderation(state, user, id, |active| {
        active.lifecycle = Set(Lifecycle::Hidden.as_str().to_owned());
    })
    .await
}

async fn set_moderation<F>(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    apply: F,
) -> AppResult<ApiResponse<Review>>
where
    F: FnOnce(&mut ReviewActive),
{
    let existing = Reviews::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let mut active: ReviewActive = existing.into();
    apply(&mut active);
    let review = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_moderate",
        Some("reviews"),
        Some(serde_json::json!({
            "review_id": review.id,
            "approved": review.approved,
            "lifecycle": review.lifecycle,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Review updated",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}
