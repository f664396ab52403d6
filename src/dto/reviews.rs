use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Review;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    pub rating: i16,
    pub comment: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondReviewRequest {
    pub response: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductRating {
    pub average: f64,
    pub count: i64,
}
