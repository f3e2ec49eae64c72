//! Service Container - Centralized service access.
//!
//! Features:
//! - One place that wires every service to a store and a lock provider
//! - Thread-safe concurrent access via Arc
//! - Small join helper for independent lookups

use std::future::Future;
use std::sync::Arc;

use super::{
    AuthService, Authenticator, CartManager, CartService, Catalog, CatalogService, ChatService,
    GeminiAssistant, OrderManager, OrderService, ReviewManager, ReviewService, UserManager,
    UserService,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{InMemoryStore, LocalLocks, LockProvider, Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn catalog(&self) -> Arc<dyn CatalogService>;

    fn carts(&self) -> Arc<dyn CartService>;

    fn orders(&self) -> Arc<dyn OrderService>;

    fn reviews(&self) -> Arc<dyn ReviewService>;

    fn chat(&self) -> Arc<dyn ChatService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    catalog_service: Arc<dyn CatalogService>,
    cart_service: Arc<dyn CartService>,
    order_service: Arc<dyn OrderService>,
    review_service: Arc<dyn ReviewService>,
    chat_service: Arc<dyn ChatService>,
}

impl Services {
    /// Wire every service to one store
    pub fn with_store<U: UnitOfWork + 'static>(
        uow: Arc<U>,
        config: Config,
        locks: Arc<dyn LockProvider>,
    ) -> Self {
        Self {
            chat_service: Arc::new(GeminiAssistant::new(&config)),
            auth_service: Arc::new(Authenticator::new(uow.clone(), config)),
            user_service: Arc::new(UserManager::new(uow.clone())),
            catalog_service: Arc::new(Catalog::new(uow.clone())),
            cart_service: Arc::new(CartManager::new(uow.clone(), locks)),
            order_service: Arc::new(OrderManager::new(uow.clone())),
            review_service: Arc::new(ReviewManager::new(uow)),
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: Config,
        locks: Arc<dyn LockProvider>,
    ) -> Self {
        Self::with_store(Arc::new(Persistence::new(db)), config, locks)
    }

    /// Single-process container with no external dependencies
    pub fn in_memory(config: Config) -> Self {
        Self::with_store(
            Arc::new(InMemoryStore::new()),
            config,
            Arc::new(LocalLocks::new()),
        )
    }

    /// Replace the chat assistant (used to stub the model)
    pub fn with_chat(mut self, chat: Arc<dyn ChatService>) -> Self {
        self.chat_service = chat;
        self
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn catalog(&self) -> Arc<dyn CatalogService> {
        self.catalog_service.clone()
    }

    fn carts(&self) -> Arc<dyn CartService> {
        self.cart_service.clone()
    }

    fn orders(&self) -> Arc<dyn OrderService> {
        self.order_service.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewService> {
        self.review_service.clone()
    }

    fn chat(&self) -> Arc<dyn ChatService> {
        self.chat_service.clone()
    }
}

/// Concurrent execution of independent lookups.
pub mod parallel {
    use super::*;
    use tokio::try_join;

    /// Execute two independent async operations in parallel.
    ///
    /// If either operation fails, the error is returned immediately.
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }
}
