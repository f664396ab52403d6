use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{lifecycle::Lifecycle, notice::NoticeKind},
    dto::products::{CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        stores::Entity as Stores,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{actor_service, notification_service, review_service},
    state::AppState,
};

/// Public catalog: active products only, with search, price bounds and
/// sorting.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(Column::Lifecycle.eq(Lifecycle::Active.as_str()));

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

/// Product detail with its public rating summary. Hidden products are not
/// served here; their history is only reachable through orders.
pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id).one(&state.orm).await?;
    let product = match product {
        Some(p) if p.lifecycle == Lifecycle::Active.as_str() => p,
        _ => return Err(AppError::NotFound),
    };

    let rating = review_service::product_rating(state, id).await?;

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product_from_entity(product),
            average_rating: rating.average,
            review_count: rating.count,
        },
        None,
    ))
}

/// The artisan's own listings, hidden ones included.
pub async fn my_products(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ProductList>> {
    let actor = actor_service::resolve(state, user).await?;
    let store_id = match actor.store_id {
        Some(id) => id,
        None => return Err(AppError::Forbidden),
    };

    let items = Products::find()
        .filter(Column::StoreId.eq(store_id))
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

/// New listing in the actor's store. Followers of the store get a
/// best-effort announcement.
pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let actor = actor_service::resolve(state, user).await?;
    let store_id = match actor.store_id {
        Some(id) => id,
        None => return Err(AppError::Forbidden),
    };
    if payload.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }

    let store = Stores::find_by_id(store_id).one(&state.orm).await?;
    let store = match store {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        store_id: Set(store_id),
        name: Set(payload.name),
        description: Set(Some(payload.description)),
        price: Set(payload.price),
        stock: Set(payload.stock),
        lifecycle: Set(Lifecycle::Active.as_str().to_owned()),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    notification_service::notify_followers(
        &state.pool,
        store_id,
        actor.user_id,
        NoticeKind::General,
        &format!("{} listed a new product: '{}'", store.name, product.name),
        Some(&format!("/products/{}", product.id)),
    )
    .await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let actor = actor_service::resolve(state, user).await?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    if !actor.owns_store(existing.store_id) {
        return Err(AppError::Forbidden);
    }
    if payload.price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if payload.stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }

    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Remove a listing. Once any order references the product the row must
/// survive for history, so it is hidden instead of deleted.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let actor = actor_service::resolve(state, user).await?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    if !actor.owns_store(existing.store_id) {
        return Err(AppError::Forbidden);
    }

    let referenced = Orders::find()
        .filter(OrderCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;

    let message = if referenced > 0 {
        let mut active: ActiveModel = existing.into();
        active.lifecycle = Set(Lifecycle::Hidden.as_str().to_owned());
        active.update(&state.orm).await?;
        "Product hidden"
    } else {
        Products::delete_by_id(id).exec(&state.orm).await?;
        "Product deleted"
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        message,
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        store_id: model.store_id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        lifecycle: model.lifecycle,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
