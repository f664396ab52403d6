use crate::{
    domain::{actor::ActorContext, order::ProductFacts},
    error::AppError,
};

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

pub fn check_rating(rating: i16) -> Result<(), AppError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::BadRequest(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(())
}

/// An artisan cannot review products sold by their own store.
pub fn check_author(actor: &ActorContext, product: &ProductFacts) -> Result<(), AppError> {
    if actor.user_id == product.owner_id || actor.owns_store(product.store_id) {
        return Err(AppError::SelfReview);
    }
    Ok(())
}

/// Mean rating rounded to one decimal place, 0.0 when there is nothing to
/// average. Only ratings the caller already filtered (active and approved
/// reviews) should be passed in.
pub fn average(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let mean = sum as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{actor::Role, lifecycle::Lifecycle};
    use uuid::Uuid;

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        assert!(check_rating(0).is_err());
        assert!(check_rating(6).is_err());
        for rating in MIN_RATING..=MAX_RATING {
            assert!(check_rating(rating).is_ok());
        }
    }

    #[test]
    fn owner_cannot_review_their_own_product() {
        let store_id = Uuid::new_v4();
        let owner = ActorContext {
            user_id: Uuid::new_v4(),
            role: Role::Artisan,
            store_id: Some(store_id),
        };
        let product = ProductFacts {
            id: Uuid::new_v4(),
            name: "Woven basket".into(),
            store_id,
            owner_id: owner.user_id,
            stock: 1,
            lifecycle: Lifecycle::Active,
        };
        let result = check_author(&owner, &product);
        assert!(matches!(result, Err(AppError::SelfReview)));
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        assert_eq!(average(&[4, 5]), 4.5);
        assert_eq!(average(&[5, 5, 5]), 5.0);
        assert_eq!(average(&[1, 2, 2]), 1.7);
    }
}
