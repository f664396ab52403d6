use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    domain::notice::NoticeKind,
    dto::follows::{FollowedStoreList, ToggleFollowResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Store,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::notification_service,
};

/// Follow the store, or unfollow it if already following. The store owner
/// hears about new followers but not about departures.
pub async fn toggle_follow(
    pool: &DbPool,
    user: &AuthUser,
    store_id: Uuid,
) -> AppResult<ApiResponse<ToggleFollowResponse>> {
    let store: Option<(Uuid, Uuid, String)> = sqlx::query_as(
        "SELECT id, owner_id, name FROM stores WHERE id = $1 AND lifecycle = 'active'",
    )
    .bind(store_id)
    .fetch_optional(pool)
    .await?;
    let (_, owner_id, store_name) = match store {
        Some(row) => row,
        None => return Err(AppError::NotFound),
    };

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM store_follows WHERE user_id = $1 AND store_id = $2")
            .bind(user.user_id)
            .bind(store_id)
            .fetch_optional(pool)
            .await?;

    let following = match existing {
        Some((follow_id,)) => {
            sqlx::query("DELETE FROM store_follows WHERE id = $1")
                .bind(follow_id)
                .execute(pool)
                .await?;
            false
        }
        None => {
            sqlx::query("INSERT INTO store_follows (id, user_id, store_id) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(user.user_id)
                .bind(store_id)
                .execute(pool)
                .await?;
            true
        }
    };

    if following && owner_id != user.user_id {
        if let Err(err) = notification_service::emit(
            pool,
            owner_id,
            NoticeKind::Follow,
            &format!("Your store '{}' has a new follower", store_name),
            Some(&format!("/stores/{}", store_id)),
        )
        .await
        {
            tracing::warn!(error = %err, "notification emit failed");
        }
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        if following { "store_follow" } else { "store_unfollow" },
        Some("store_follows"),
        Some(serde_json::json!({ "store_id": store_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        if following { "Following store" } else { "Unfollowed store" },
        ToggleFollowResponse { following },
        Some(Meta::empty()),
    ))
}

pub async fn list_followed_stores(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FollowedStoreList>> {
    let (page, limit, offset) = pagination.normalize();
    let stores = sqlx::query_as::<_, Store>(
        r#"
        SELECT s.*
        FROM store_follows f
        JOIN stores s ON s.id = f.store_id
        WHERE f.user_id = $1 AND s.lifecycle = 'active'
        ORDER BY f.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM store_follows WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    let data = FollowedStoreList { items: stores };
    Ok(ApiResponse::success("OK", data, Some(meta)))
}
