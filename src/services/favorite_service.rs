use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::favorites::{FavoriteProductList, ToggleFavoriteResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

/// Add the product to the caller's favorites, or remove it if already
/// there. Returns which of the two happened.
pub async fn toggle_favorite(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<ToggleFavoriteResponse>> {
    let product: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND lifecycle = 'active'")
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    if product.is_none() {
        return Err(AppError::NotFound);
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM favorites WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(product_id)
            .fetch_optional(pool)
            .await?;

    let added = match existing {
        Some((favorite_id,)) => {
            sqlx::query("DELETE FROM favorites WHERE id = $1")
                .bind(favorite_id)
                .execute(pool)
                .await?;
            false
        }
        None => {
            sqlx::query("INSERT INTO favorites (id, user_id, product_id) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(user.user_id)
                .bind(product_id)
                .execute(pool)
                .await?;
            true
        }
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        if added { "favorite_add" } else { "favorite_remove" },
        Some("favorites"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        if added {
            "Added to favorites"
        } else {
            "Removed from favorites"
        },
        ToggleFavoriteResponse { added },
        Some(Meta::empty()),
    ))
}

pub async fn list_favorites(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FavoriteProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT p.*
        FROM favorites f
        JOIN products p ON p.id = f.product_id
        WHERE f.user_id = $1 AND p.lifecycle = 'active'
        ORDER BY f.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    let data = FavoriteProductList { items: products };
    Ok(ApiResponse::success("OK", data, Some(meta)))
}
