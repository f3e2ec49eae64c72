//! Repository layer - Data access abstraction
//!
//! One trait per aggregate, a SeaORM implementation beside it, and mocks
//! generated for tests.

pub(crate) mod cart_repository;
pub(crate) mod entities;
mod item_repository;
pub(crate) mod order_repository;
mod review_repository;
mod user_repository;

use sea_orm::{DbErr, SqlErr};

use crate::errors::AppError;

pub use cart_repository::{CartRepository, CartStore};
pub use item_repository::{ItemRepository, ItemStore};
pub use order_repository::{OrderRepository, OrderStore};
pub use review_repository::{ReviewRepository, ReviewStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use cart_repository::MockCartRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use item_repository::MockItemRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use order_repository::MockOrderRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use review_repository::MockReviewRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;

/// Map a unique-index violation to Conflict, anything else to Database.
pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(message),
        _ => AppError::from(err),
    }
}
