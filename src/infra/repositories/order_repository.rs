//! Order repository.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use super::entities::order::{self, Entity as OrderEntity};
use crate::domain::{NewOrder, Order, OrderParty, OrderStatus};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;

    /// Orders where `user_id` is the given party, in `status`, newest first
    async fn list_for(
        &self,
        party: OrderParty,
        user_id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Vec<Order>>;

    /// Move a pending order to completed.
    ///
    /// Returns false when the order was not pending (someone completed it
    /// first, or it does not exist).
    async fn complete_pending(&self, id: Uuid) -> AppResult<bool>;
}

pub struct OrderStore {
    db: DatabaseConnection,
}

impl OrderStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn order_model(order: NewOrder, now: chrono::DateTime<chrono::Utc>) -> order::ActiveModel {
    order::ActiveModel {
        id: Set(order.id),
        buyer_id: Set(order.buyer_id),
        seller_id: Set(order.seller_id),
        item_id: Set(order.item_id),
        quantity: Set(order.quantity),
        total_price: Set(order.total_price),
        code_hash: Set(order.code_hash),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

#[async_trait]
impl OrderRepository for OrderStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        OrderEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Order::try_from)
            .transpose()
    }

    async fn list_for(
        &self,
        party: OrderParty,
        user_id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Vec<Order>> {
        let party_column = match party {
            OrderParty::Buyer => order::Column::BuyerId,
            OrderParty::Seller => order::Column::SellerId,
        };

        OrderEntity::find()
            .filter(party_column.eq(user_id))
            .filter(order::Column::Status.eq(status.as_str()))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    async fn complete_pending(&self, id: Uuid) -> AppResult<bool> {
        let result = OrderEntity::update_many()
            .col_expr(
                order::Column::Status,
                Expr::value(OrderStatus::Completed.as_str()),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::Status.eq(OrderStatus::Pending.as_str()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
