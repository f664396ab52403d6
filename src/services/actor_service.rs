use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    domain::actor::{ActorContext, Role},
    entity::stores::{Column as StoreCol, Entity as Stores},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    state::AppState,
};

/// Resolve the caller's authorization facts once per request. Core
/// operations take the resulting context instead of re-deriving role and
/// store ownership ad hoc.
pub async fn resolve(state: &AppState, user: &AuthUser) -> AppResult<ActorContext> {
    let role = Role::parse(&user.role).ok_or(AppError::Forbidden)?;

    let store_id = match role {
        Role::Artisan => Stores::find()
            .filter(StoreCol::OwnerId.eq(user.user_id))
            .one(&state.orm)
            .await?
            .map(|store| store.id),
        _ => None,
    };

    Ok(ActorContext {
        user_id: user.user_id,
        role,
        store_id,
    })
}
