//! Review service - Seller ratings.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::directory::{party, party_summaries};
use crate::domain::{NewReview, PartySummary, ReviewInput, ReviewList, ReviewView};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Rate a seller. Each reviewer may review a given seller once.
    async fn add(&self, reviewer_id: Uuid, seller_id: Uuid, input: ReviewInput)
        -> AppResult<ReviewView>;

    async fn list_for_seller(&self, seller_id: Uuid) -> AppResult<ReviewList>;
}

pub struct ReviewManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ReviewManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> ReviewService for ReviewManager<U> {
    async fn add(
        &self,
        reviewer_id: Uuid,
        seller_id: Uuid,
        input: ReviewInput,
    ) -> AppResult<ReviewView> {
        let new_review = NewReview::new(reviewer_id, seller_id, input)?;

        self.uow
            .users()
            .find_by_id(seller_id)
            .await?
            .ok_or_not_found("Seller")?;
        let reviewer = self
            .uow
            .users()
            .find_by_id(reviewer_id)
            .await?
            .ok_or_not_found("User")?;

        if self
            .uow
            .reviews()
            .find_by_pair(reviewer_id, seller_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("You have already reviewed this seller"));
        }

        // The unique index still catches a racing duplicate
        let review = self.uow.reviews().create(new_review).await?;
        tracing::info!(review_id = %review.id, seller_id = %seller_id, "Review added");
        Ok(ReviewView::new(review, PartySummary::from(&reviewer)))
    }

    async fn list_for_seller(&self, seller_id: Uuid) -> AppResult<ReviewList> {
        self.uow
            .users()
            .find_by_id(seller_id)
            .await?
            .ok_or_not_found("Seller")?;

        let reviews = self.uow.reviews().list_for_seller(seller_id).await?;
        let reviewers = party_summaries(
            self.uow.users().as_ref(),
            reviews.iter().map(|r| r.reviewer_id),
        )
        .await?;

        let views = reviews
            .into_iter()
            .map(|review| {
                let reviewer = party(&reviewers, review.reviewer_id);
                ReviewView::new(review, reviewer)
            })
            .collect();
        Ok(ReviewList::new(seller_id, views))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;
    use crate::infra::InMemoryStore;

    async fn user(store: &InMemoryStore, email: &str) -> Uuid {
        store
            .users()
            .create(NewUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                email: email.to_string(),
                age: 21,
                contact_number: "9000000000".to_string(),
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn input(rating: i32) -> ReviewInput {
        ReviewInput {
            rating,
            comment: "Smooth handoff".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_and_list_with_average() {
        let store = Arc::new(InMemoryStore::new());
        let seller = user(&store, "seller@students.iiit.ac.in").await;
        let first = user(&store, "one@students.iiit.ac.in").await;
        let second = user(&store, "two@students.iiit.ac.in").await;
        let reviews = ReviewManager::new(store.clone());

        reviews.add(first, seller, input(5)).await.unwrap();
        reviews.add(second, seller, input(4)).await.unwrap();

        let list = reviews.list_for_seller(seller).await.unwrap();
        assert_eq!(list.count, 2);
        assert_eq!(list.average_rating, Some(4.5));
        assert_eq!(list.reviews[0].reviewer.id, second);
    }

    #[tokio::test]
    async fn test_second_review_of_same_seller_conflicts() {
        let store = Arc::new(InMemoryStore::new());
        let seller = user(&store, "seller@students.iiit.ac.in").await;
        let reviewer = user(&store, "one@students.iiit.ac.in").await;
        let reviews = ReviewManager::new(store.clone());

        reviews.add(reviewer, seller, input(3)).await.unwrap();
        assert!(matches!(
            reviews.add(reviewer, seller, input(5)).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_rejections() {
        let store = Arc::new(InMemoryStore::new());
        let reviewer = user(&store, "one@students.iiit.ac.in").await;
        let reviews = ReviewManager::new(store.clone());

        assert!(matches!(
            reviews.add(reviewer, reviewer, input(5)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            reviews.add(reviewer, Uuid::new_v4(), input(5)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            reviews.add(reviewer, Uuid::new_v4(), input(6)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            reviews.list_for_seller(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
