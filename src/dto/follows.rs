use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Store;

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleFollowResponse {
    pub following: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowedStoreList {
    pub items: Vec<Store>,
}
