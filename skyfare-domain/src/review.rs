use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

pub const MAX_REVIEW_LEN: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub rating: f32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(user_id: Uuid, flight_id: Uuid, rating: f32, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            flight_id,
            rating,
            text,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSpec {
    pub rating: f32,
    pub text: String,
}

impl ReviewSpec {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(DomainError::Validation(format!(
                "rating must be between 0 and 5, got {}",
                self.rating
            )));
        }
        if self.text.len() > MAX_REVIEW_LEN {
            return Err(DomainError::Validation(format!(
                "review text must be at most {} characters",
                MAX_REVIEW_LEN
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_spec_bounds() {
        let ok = ReviewSpec {
            rating: 4.5,
            text: "Smooth flight".into(),
        };
        assert!(ok.validate().is_ok());

        let too_high = ReviewSpec {
            rating: 5.5,
            text: String::new(),
        };
        assert!(too_high.validate().is_err());

        let negative = ReviewSpec {
            rating: -0.5,
            text: String::new(),
        };
        assert!(negative.validate().is_err());

        let too_long = ReviewSpec {
            rating: 3.0,
            text: "x".repeat(MAX_REVIEW_LEN + 1),
        };
        assert!(too_long.validate().is_err());
    }
}
