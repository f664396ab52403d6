use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{
        lifecycle::Lifecycle,
        notice::{NoticeDraft, NoticeKind},
        review,
    },
    dto::reviews::{ProductRating, ReviewList, RespondReviewRequest, SubmitReviewRequest},
    entity::{
        products::Entity as Products,
        reviews::{
            ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews,
            Model as ReviewModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    services::{actor_service, notification_service, order_service::product_facts},
    state::AppState,
};

/// One review per buyer per product. The pre-insert lookup gives the
/// friendly error; the unique index on (product_id, author_id) is the
/// authoritative backstop when two submissions race.
pub async fn submit_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: SubmitReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let actor = actor_service::resolve(state, user).await?;
    review::check_rating(payload.rating)?;

    let product = Products::find_by_id(product_id).one(&state.orm).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    let facts = product_facts(&state.orm, &product).await?;
    if !facts.lifecycle.is_active() {
        return Err(AppError::NotFound);
    }
    review::check_author(&actor, &facts)?;

    let existing = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .filter(ReviewCol::AuthorId.eq(actor.user_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::DuplicateReview);
    }

    let active = ReviewActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        author_id: Set(actor.user_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        lifecycle: Set(Lifecycle::Active.as_str().to_owned()),
        approved: Set(false),
        artisan_response: Set(None),
        responded_at: Set(None),
        created_at: NotSet,
    };

    let inserted = match active.insert(&state.orm).await {
        Ok(model) => model,
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => return Err(AppError::DuplicateReview),
            _ => return Err(err.into()),
        },
    };

    let notice = NoticeDraft::new(
        facts.owner_id,
        NoticeKind::Review,
        format!("Your product '{}' received a new review", facts.name),
    )
    .with_link(format!("/products/{}", product_id));
    notification_service::emit_all(&state.pool, &[notice]).await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "review_submit",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": inserted.id, "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Review submitted",
        review_from_entity(inserted),
        Some(Meta::empty()),
    ))
}

/// One-way artisan response on a review of their own product. A review
/// holds at most one response; there is no edit flow.
pub async fn respond_to_review(
    state: &AppState,
    user: &AuthUser,
    review_id: Uuid,
    payload: RespondReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let actor = actor_service::resolve(state, user).await?;

    let review = Reviews::find_by_id(review_id).one(&state.orm).await?;
    let review = match review {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    let product = Products::find_by_id(review.product_id).one(&state.orm).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    let facts = product_facts(&state.orm, &product).await?;

    if !actor.owns_store(facts.store_id) {
        return Err(AppError::Forbidden);
    }
    if review.artisan_response.is_some() {
        return Err(AppError::BadRequest(
            "Review already has a response".into(),
        ));
    }

    let author_id = review.author_id;
    let mut active: ReviewActive = review.into();
    active.artisan_response = Set(Some(payload.response));
    active.responded_at = Set(Some(Utc::now().into()));
    let updated = active.update(&state.orm).await?;

    let notice = NoticeDraft::new(
        author_id,
        NoticeKind::Review,
        format!("The artisan replied to your review of '{}'", facts.name),
    )
    .with_link(format!("/products/{}", facts.id));
    notification_service::emit_all(&state.pool, &[notice]).await;

    Ok(ApiResponse::success(
        "Response recorded",
        review_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// Publicly visible reviews for a product: active and approved, newest
/// first.
pub async fn list_product_reviews(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    let items = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .filter(ReviewCol::Lifecycle.eq(Lifecycle::Active.as_str()))
        .filter(ReviewCol::Approved.eq(true))
        .order_by_desc(ReviewCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::empty()),
    ))
}

/// Mean rating over active, approved reviews, one decimal place, 0.0 when
/// none qualify.
pub async fn product_rating(state: &AppState, product_id: Uuid) -> AppResult<ProductRating> {
    let ratings: Vec<(i16,)> = sqlx::query_as(
        "SELECT rating FROM reviews WHERE product_id = $1 AND lifecycle = 'active' AND approved",
    )
    .bind(product_id)
    .fetch_all(&state.pool)
    .await?;

    let values: Vec<i16> = ratings.into_iter().map(|(r,)| r).collect();
    Ok(ProductRating {
        average: review::average(&values),
        count: values.len() as i64,
    })
}

pub(crate) fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        author_id: model.author_id,
        rating: model.rating,
        comment: model.comment,
        lifecycle: model.lifecycle,
        approved: model.approved,
        artisan_response: model.artisan_response,
        responded_at: model.responded_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
