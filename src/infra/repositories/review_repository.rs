//! Review repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::conflict_on_unique;
use super::entities::review::{self, ActiveModel, Entity as ReviewEntity};
use crate::domain::{NewReview, Review};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_by_pair(&self, reviewer_id: Uuid, seller_id: Uuid) -> AppResult<Option<Review>>;

    /// Insert a review. Conflict if the pair already has one.
    async fn create(&self, review: NewReview) -> AppResult<Review>;

    /// A seller's reviews, newest first
    async fn list_for_seller(&self, seller_id: Uuid) -> AppResult<Vec<Review>>;
}

pub struct ReviewStore {
    db: DatabaseConnection,
}

impl ReviewStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewRepository for ReviewStore {
    async fn find_by_pair(&self, reviewer_id: Uuid, seller_id: Uuid) -> AppResult<Option<Review>> {
        let result = ReviewEntity::find()
            .filter(review::Column::ReviewerId.eq(reviewer_id))
            .filter(review::Column::SellerId.eq(seller_id))
            .one(&self.db)
            .await?;
        Ok(result.map(Review::from))
    }

    async fn create(&self, new_review: NewReview) -> AppResult<Review> {
        let review = new_review.into_review(chrono::Utc::now());
        let active_model = ActiveModel {
            id: Set(review.id),
            reviewer_id: Set(review.reviewer_id),
            seller_id: Set(review.seller_id),
            rating: Set(review.rating),
            comment: Set(review.comment),
            created_at: Set(review.created_at),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, "You have already reviewed this seller"))?;
        Ok(Review::from(model))
    }

    async fn list_for_seller(&self, seller_id: Uuid) -> AppResult<Vec<Review>> {
        let models = ReviewEntity::find()
            .filter(review::Column::SellerId.eq(seller_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Review::from).collect())
    }
}
