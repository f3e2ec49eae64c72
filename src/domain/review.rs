//! Seller reviews. One per (reviewer, seller) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::user::PartySummary;
use crate::config::{MAX_RATING, MIN_RATING};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub seller_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Rating and comment as submitted
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    #[schema(example = 4, minimum = 1, maximum = 5)]
    pub rating: i32,
    #[serde(default)]
    #[schema(example = "Item exactly as described, quick handoff.")]
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub reviewer_id: Uuid,
    pub seller_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

impl NewReview {
    pub fn new(reviewer_id: Uuid, seller_id: Uuid, input: ReviewInput) -> AppResult<Self> {
        if reviewer_id == seller_id {
            return Err(AppError::validation("Cannot review yourself"));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
            return Err(AppError::validation(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
        Ok(Self {
            reviewer_id,
            seller_id,
            rating: input.rating,
            comment: input.comment.trim().to_string(),
        })
    }

    pub fn into_review(self, now: DateTime<Utc>) -> Review {
        Review {
            id: Uuid::new_v4(),
            reviewer_id: self.reviewer_id,
            seller_id: self.seller_id,
            rating: self.rating,
            comment: self.comment,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewView {
    pub id: Uuid,
    pub reviewer: PartySummary,
    pub seller_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewView {
    pub fn new(review: Review, reviewer: PartySummary) -> Self {
        Self {
            id: review.id,
            reviewer,
            seller_id: review.seller_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

/// A seller's reviews, newest first, with the derived average
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewList {
    pub seller_id: Uuid,
    /// `None` when the seller has no reviews
    #[schema(example = 4.5)]
    pub average_rating: Option<f64>,
    pub count: usize,
    pub reviews: Vec<ReviewView>,
}

impl ReviewList {
    pub fn new(seller_id: Uuid, reviews: Vec<ReviewView>) -> Self {
        let count = reviews.len();
        let average_rating = (count > 0)
            .then(|| reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / count as f64);
        Self {
            seller_id,
            average_rating,
            count,
            reviews,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(rating: i32) -> ReviewInput {
        ReviewInput {
            rating,
            comment: " fine ".to_string(),
        }
    }

    #[test]
    fn test_self_review_rejected() {
        let me = Uuid::new_v4();
        assert!(matches!(
            NewReview::new(me, me, input(5)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_rating_bounds() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(NewReview::new(a, b, input(0)).is_err());
        assert!(NewReview::new(a, b, input(6)).is_err());
        assert_eq!(NewReview::new(a, b, input(1)).unwrap().comment, "fine");
        assert!(NewReview::new(a, b, input(5)).is_ok());
    }

    #[test]
    fn test_average_rating() {
        let seller = Uuid::new_v4();
        let views = [4, 5]
            .into_iter()
            .map(|rating| {
                let review = NewReview::new(Uuid::new_v4(), seller, input(rating))
                    .unwrap()
                    .into_review(Utc::now());
                ReviewView::new(review, PartySummary::unknown(Uuid::new_v4()))
            })
            .collect();

        let list = ReviewList::new(seller, views);
        assert_eq!(list.count, 2);
        assert_eq!(list.average_rating, Some(4.5));
        assert_eq!(ReviewList::new(seller, Vec::new()).average_rating, None);
    }
}
