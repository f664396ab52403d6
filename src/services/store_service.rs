use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::lifecycle::Lifecycle,
    dto::stores::CreateStoreRequest,
    entity::stores::{ActiveModel as StoreActive, Column as StoreCol, Entity as Stores, Model as StoreModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Store,
    response::{ApiResponse, Meta},
    services::actor_service,
    state::AppState,
};

/// One store per artisan.
pub async fn create_store(
    state: &AppState,
    user: &AuthUser,
    payload: CreateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    let actor = actor_service::resolve(state, user).await?;
    if !actor.is_artisan() {
        return Err(AppError::Forbidden);
    }
    if actor.store_id.is_some() {
        return Err(AppError::BadRequest("You already have a store".into()));
    }

    let store = StoreActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(actor.user_id),
        name: Set(payload.name),
        description: Set(payload.description),
        location: Set(payload.location),
        lifecycle: Set(Lifecycle::Active.as_str().to_owned()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "store_create",
        Some("stores"),
        Some(serde_json::json!({ "store_id": store.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Store created",
        store_from_entity(store),
        Some(Meta::empty()),
    ))
}

pub async fn my_store(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Store>> {
    let store = Stores::find()
        .filter(StoreCol::OwnerId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    let store = match store {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Store",
        store_from_entity(store),
        None,
    ))
}

pub async fn get_store(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Store>> {
    let store = Stores::find_by_id(id).one(&state.orm).await?;
    let store = match store {
        Some(s) if s.lifecycle == Lifecycle::Active.as_str() => s,
        _ => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Store",
        store_from_entity(store),
        None,
    ))
}

pub(crate) fn store_from_entity(model: StoreModel) -> Store {
    Store {
        id: model.id,
        owner_id: model.owner_id,
        name: model.name,
        description: model.description,
        location: model.location,
        lifecycle: model.lifecycle,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
