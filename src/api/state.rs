//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database, LocalLocks, LockProvider};
use crate::services::{
    AuthService, CartService, CatalogService, ChatService, OrderService, ReviewService,
    ServiceContainer, Services, UserService,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub catalog_service: Arc<dyn CatalogService>,
    pub cart_service: Arc<dyn CartService>,
    pub order_service: Arc<dyn OrderService>,
    pub review_service: Arc<dyn ReviewService>,
    pub chat_service: Arc<dyn ChatService>,
    /// Redis cache; rate limiting is off without it
    pub cache: Option<Arc<Cache>>,
    /// Absent when serving from the in-memory store
    pub database: Option<Arc<Database>>,
}

impl AppState {
    /// PostgreSQL-backed state. Cart locks go through Redis when available.
    pub fn from_config(database: Arc<Database>, cache: Option<Arc<Cache>>, config: Config) -> Self {
        let locks: Arc<dyn LockProvider> = match &cache {
            Some(cache) => cache.clone(),
            None => Arc::new(LocalLocks::new()),
        };
        let services = Services::from_connection(database.get_connection(), config, locks);
        Self::from_services(&services, cache, Some(database))
    }

    /// Self-contained state over the in-memory store
    pub fn in_memory(config: Config) -> Self {
        Self::from_services(&Services::in_memory(config), None, None)
    }

    /// Build state from any service container
    pub fn from_services(
        services: &dyn ServiceContainer,
        cache: Option<Arc<Cache>>,
        database: Option<Arc<Database>>,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            user_service: services.users(),
            catalog_service: services.catalog(),
            cart_service: services.carts(),
            order_service: services.orders(),
            review_service: services.reviews(),
            chat_service: services.chat(),
            cache,
            database,
        }
    }
}
