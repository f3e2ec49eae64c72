//! Infrastructure layer - External systems integration
//!
//! - PostgreSQL via SeaORM (entities, migrations, repositories)
//! - In-memory store with the same atomicity guarantees
//! - Redis for rate limiting and distributed locks
//! - Unit of Work for multi-table writes

pub mod cache;
pub mod db;
pub mod locks;
pub mod memory;
pub mod repositories;
pub mod unit_of_work;

pub use cache::{Cache, LockGuard};
pub use db::{Database, Migrator};
pub use locks::{cart_resource, LocalLocks, LockProvider, ResourceGuard};
pub use memory::InMemoryStore;
pub use repositories::{
    CartRepository, ItemRepository, OrderRepository, ReviewRepository, UserRepository,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockCartRepository, MockItemRepository, MockOrderRepository, MockReviewRepository,
    MockUserRepository,
};
