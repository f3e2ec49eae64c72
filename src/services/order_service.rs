//! Order service - Order listings and the handoff code check.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::container::parallel;
use super::directory::{party, party_summaries};
use crate::domain::{OneTimeCode, Order, OrderItemView, OrderQuery, OrderView, SecretHash};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait OrderService: Send + Sync {
    /// Orders where the user is buyer or seller, newest first
    async fn list(&self, user_id: Uuid, query: OrderQuery) -> AppResult<Vec<OrderView>>;

    /// Complete a pending order by checking the buyer's handoff code.
    /// Only the order's seller may do this, and only once.
    async fn verify(&self, seller_id: Uuid, order_id: Uuid, code: &str) -> AppResult<OrderView>;
}

pub struct OrderManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> OrderManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn views(&self, orders: Vec<Order>) -> AppResult<Vec<OrderView>> {
        let item_ids: Vec<Uuid> = orders.iter().map(|o| o.item_id).collect();
        let item_lookup = async {
            let items = if item_ids.is_empty() {
                Vec::new()
            } else {
                self.uow.items().find_many_with_deleted(&item_ids).await?
            };
            AppResult::Ok(
                items
                    .iter()
                    .map(|item| (item.id, OrderItemView::from(item)))
                    .collect::<HashMap<Uuid, OrderItemView>>(),
            )
        };
        let users = self.uow.users();
        let party_lookup = party_summaries(
            users.as_ref(),
            orders.iter().flat_map(|o| [o.buyer_id, o.seller_id]),
        );
        let (items, parties) = parallel::join2(item_lookup, party_lookup).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let item = items
                    .get(&order.item_id)
                    .cloned()
                    .unwrap_or_else(|| OrderItemView::unavailable(order.item_id));
                let buyer = party(&parties, order.buyer_id);
                let seller = party(&parties, order.seller_id);
                OrderView::new(order, item, buyer, seller)
            })
            .collect())
    }
}

#[async_trait]
impl<U: UnitOfWork> OrderService for OrderManager<U> {
    async fn list(&self, user_id: Uuid, query: OrderQuery) -> AppResult<Vec<OrderView>> {
        let orders = self
            .uow
            .orders()
            .list_for(query.party(), user_id, query.status())
            .await?;
        self.views(orders).await
    }

    async fn verify(&self, seller_id: Uuid, order_id: Uuid, code: &str) -> AppResult<OrderView> {
        let order = self
            .uow
            .orders()
            .find_by_id(order_id)
            .await?
            .ok_or_not_found("Order")?;

        if order.seller_id != seller_id {
            return Err(AppError::forbidden("Only the seller can verify this order"));
        }
        if !order.is_pending() {
            return Err(AppError::invalid_state("Order is already completed"));
        }

        let code = code.trim();
        if !OneTimeCode::is_well_formed(code)
            || !SecretHash::from_hash(order.code_hash.clone()).verify(code)
        {
            tracing::info!(order_id = %order_id, "Handoff code rejected");
            return Err(AppError::validation("Invalid code"));
        }

        // A concurrent verification may have won since the read above
        if !self.uow.orders().complete_pending(order_id).await? {
            return Err(AppError::invalid_state("Order is already completed"));
        }
        tracing::info!(order_id = %order_id, seller_id = %seller_id, "Order completed");

        let completed = self
            .uow
            .orders()
            .find_by_id(order_id)
            .await?
            .ok_or_not_found("Order")?;
        let mut views = self.views(vec![completed]).await?;
        views.pop().ok_or_else(|| AppError::internal("order view missing"))
    }
}
