//! Cart repository.
//!
//! A cart is a `carts` header row plus ordered `cart_lines`. Every save is
//! a compare-and-set on the header's `version`.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::entities::{cart, cart_line};
use crate::domain::{Cart, CartLine};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Cart>>;

    /// Load the user's cart, creating an empty one on first access.
    async fn get_or_create(&self, user_id: Uuid) -> AppResult<Cart>;

    /// Persist `cart` if its version is still current.
    ///
    /// Returns the stored cart with the bumped version, or InvalidState if
    /// someone else wrote first.
    async fn save(&self, cart: Cart) -> AppResult<Cart>;
}

pub struct CartStore {
    db: DatabaseConnection,
}

impl CartStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Read a cart with its lines in display order.
pub(crate) async fn load_cart<C: ConnectionTrait>(
    conn: &C,
    header: cart::Model,
) -> AppResult<Cart> {
    let lines = cart_line::Entity::find()
        .filter(cart_line::Column::UserId.eq(header.user_id))
        .order_by_asc(cart_line::Column::Position)
        .all(conn)
        .await?;

    Ok(Cart {
        user_id: header.user_id,
        lines: lines.into_iter().map(CartLine::from).collect(),
        version: header.version,
        created_at: header.created_at,
        updated_at: header.updated_at,
    })
}

/// Bump the version if it still equals `expected`. False when it moved.
pub(crate) async fn advance_version<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    expected: i64,
    now: chrono::DateTime<chrono::Utc>,
) -> AppResult<bool> {
    let result = cart::Entity::update_many()
        .col_expr(cart::Column::Version, Expr::col(cart::Column::Version).add(1))
        .col_expr(cart::Column::UpdatedAt, Expr::value(now))
        .filter(cart::Column::UserId.eq(user_id))
        .filter(cart::Column::Version.eq(expected))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

fn line_models(user_id: Uuid, lines: &[CartLine]) -> Vec<cart_line::ActiveModel> {
    lines
        .iter()
        .enumerate()
        .map(|(position, line)| cart_line::ActiveModel {
            user_id: Set(user_id),
            item_id: Set(line.item_id),
            quantity: Set(line.quantity),
            position: Set(position as i32),
            added_at: Set(line.added_at),
        })
        .collect()
}

#[async_trait]
impl CartRepository for CartStore {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Cart>> {
        match cart::Entity::find_by_id(user_id).one(&self.db).await? {
            Some(header) => Ok(Some(load_cart(&self.db, header).await?)),
            None => Ok(None),
        }
    }

    async fn get_or_create(&self, user_id: Uuid) -> AppResult<Cart> {
        let now = chrono::Utc::now();
        cart::Entity::insert(cart::ActiveModel {
            user_id: Set(user_id),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(OnConflict::column(cart::Column::UserId).do_nothing().to_owned())
        .exec_without_returning(&self.db)
        .await?;

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::internal("cart row missing after upsert"))
    }

    async fn save(&self, mut cart: Cart) -> AppResult<Cart> {
        let txn = self.db.begin().await?;

        if !advance_version(&txn, cart.user_id, cart.version, cart.updated_at).await? {
            txn.rollback().await?;
            tracing::debug!(user_id = %cart.user_id, "Stale cart write rejected");
            return Err(AppError::invalid_state("Cart was modified concurrently"));
        }

        cart_line::Entity::delete_many()
            .filter(cart_line::Column::UserId.eq(cart.user_id))
            .exec(&txn)
            .await?;

        if !cart.lines.is_empty() {
            cart_line::Entity::insert_many(line_models(cart.user_id, &cart.lines))
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        cart.version += 1;
        Ok(cart)
    }
}
