//! Unit of Work pattern implementation.
//!
//! Central access to every repository, plus the two writes that span
//! several tables and must land atomically: committing a checkout and
//! withdrawing an item.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, IsolationLevel,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

use super::repositories::cart_repository::advance_version;
use super::repositories::entities::{cart, cart_line, item, order};
use super::repositories::order_repository::order_model;
use super::repositories::{
    CartRepository, CartStore, ItemRepository, ItemStore, OrderRepository, OrderStore,
    ReviewRepository, ReviewStore, UserRepository, UserStore,
};
use crate::domain::{Cart, NewOrder, Order};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;
    fn items(&self) -> Arc<dyn ItemRepository>;
    fn carts(&self) -> Arc<dyn CartRepository>;
    fn orders(&self) -> Arc<dyn OrderRepository>;
    fn reviews(&self) -> Arc<dyn ReviewRepository>;

    /// Insert the orders and empty the cart in one step.
    ///
    /// Fails with InvalidState, writing nothing, if the stored cart version
    /// no longer matches `cart.version`.
    async fn commit_checkout(&self, cart: &Cart, orders: Vec<NewOrder>) -> AppResult<Vec<Order>>;

    /// Soft-delete a listed item and strip it from every cart.
    /// Returns the ids of the carts that held it.
    async fn withdraw_item(&self, item_id: Uuid) -> AppResult<Vec<Uuid>>;
}

type TxFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// SeaORM implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    item_repo: Arc<ItemStore>,
    cart_repo: Arc<CartStore>,
    order_repo: Arc<OrderStore>,
    review_repo: Arc<ReviewStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            item_repo: Arc::new(ItemStore::new(db.clone())),
            cart_repo: Arc::new(CartStore::new(db.clone())),
            order_repo: Arc::new(OrderStore::new(db.clone())),
            review_repo: Arc::new(ReviewStore::new(db.clone())),
            db,
        }
    }

    /// Run `f` in a transaction: commit on Ok, roll back on Err.
    async fn execute_transaction<F, T>(&self, isolation: IsolationLevel, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a DatabaseTransaction) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
            .await?;

        match f(&txn).await {
            Ok(result) => {
                txn.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn items(&self) -> Arc<dyn ItemRepository> {
        self.item_repo.clone()
    }

    fn carts(&self) -> Arc<dyn CartRepository> {
        self.cart_repo.clone()
    }

    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.order_repo.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewRepository> {
        self.review_repo.clone()
    }

    async fn commit_checkout(&self, cart: &Cart, orders: Vec<NewOrder>) -> AppResult<Vec<Order>> {
        if orders.is_empty() {
            return Err(AppError::invalid_state("Cart is empty"));
        }
        let user_id = cart.user_id;
        let expected_version = cart.version;

        self.execute_transaction(IsolationLevel::Serializable, move |txn| {
            Box::pin(async move {
                // Row lock serializes against any other writer of this cart
                let header = cart::Entity::find_by_id(user_id)
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_else(|| AppError::not_found("Cart"))?;

                if header.version != expected_version {
                    return Err(AppError::invalid_state("Cart changed during checkout"));
                }

                let now = chrono::Utc::now();
                let created: Vec<Order> = orders
                    .iter()
                    .cloned()
                    .map(|o| o.into_order(now))
                    .collect();

                order::Entity::insert_many(orders.into_iter().map(|o| order_model(o, now)))
                    .exec_without_returning(txn)
                    .await?;

                cart_line::Entity::delete_many()
                    .filter(cart_line::Column::UserId.eq(user_id))
                    .exec(txn)
                    .await?;

                if !advance_version(txn, user_id, expected_version, now).await? {
                    return Err(AppError::invalid_state("Cart changed during checkout"));
                }

                Ok(created)
            })
        })
        .await
    }

    async fn withdraw_item(&self, item_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.execute_transaction(IsolationLevel::ReadCommitted, move |txn| {
            Box::pin(async move {
                let now = chrono::Utc::now();
                let updated = item::Entity::update_many()
                    .set(item::ActiveModel {
                        deleted_at: Set(Some(now)),
                        updated_at: Set(now),
                        ..Default::default()
                    })
                    .filter(item::Column::Id.eq(item_id))
                    .filter(item::Column::DeletedAt.is_null())
                    .exec(txn)
                    .await?;

                if updated.rows_affected == 0 {
                    return Err(AppError::not_found("Item"));
                }

                let holders: Vec<Uuid> = cart_line::Entity::find()
                    .select_only()
                    .column(cart_line::Column::UserId)
                    .filter(cart_line::Column::ItemId.eq(item_id))
                    .into_tuple()
                    .all(txn)
                    .await?;

                if holders.is_empty() {
                    return Ok(holders);
                }

                cart_line::Entity::delete_many()
                    .filter(cart_line::Column::ItemId.eq(item_id))
                    .exec(txn)
                    .await?;

                // Bump versions so in-flight cart writes based on the old lines fail
                cart::Entity::update_many()
                    .col_expr(
                        cart::Column::Version,
                        sea_orm::sea_query::Expr::col(cart::Column::Version).add(1),
                    )
                    .col_expr(cart::Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
                    .filter(cart::Column::UserId.is_in(holders.clone()))
                    .exec(txn)
                    .await?;

                Ok(holders)
            })
        })
        .await
    }
}
