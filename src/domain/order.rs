//! Orders produced by checkout and completed by the seller's code check.
//!
//! Lifecycle: `pending --[seller submits the buyer's code]--> completed`.
//! There is no other transition.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::item::{Item, ItemRef};
use super::user::PartySummary;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(AppError::internal(format!("Unknown order status: {}", other))),
        }
    }
}

/// Single-line purchase record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    /// Unit price × quantity at checkout time
    pub total_price: Decimal,
    /// Argon2id digest of the handoff code
    pub code_hash: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// Order about to be written by checkout
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub total_price: Decimal,
    pub code_hash: String,
}

impl NewOrder {
    /// Snapshot one cart line. The seller and price are copied from the item.
    pub fn for_line(buyer_id: Uuid, item: &Item, quantity: i32, code_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            buyer_id,
            seller_id: item.seller_id,
            item_id: item.id,
            quantity,
            total_price: item.price * Decimal::from(quantity),
            code_hash,
        }
    }

    pub fn into_order(self, now: DateTime<Utc>) -> Order {
        Order {
            id: self.id,
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            item_id: self.item_id,
            quantity: self.quantity,
            total_price: self.total_price,
            code_hash: self.code_hash,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Which side of an order a listing is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderParty {
    Buyer,
    Seller,
}

/// The four order listings a user can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderQuery {
    PendingPurchases,
    Purchases,
    Sales,
    PendingDeliveries,
}

impl OrderQuery {
    pub fn party(&self) -> OrderParty {
        match self {
            OrderQuery::PendingPurchases | OrderQuery::Purchases => OrderParty::Buyer,
            OrderQuery::Sales | OrderQuery::PendingDeliveries => OrderParty::Seller,
        }
    }

    pub fn status(&self) -> OrderStatus {
        match self {
            OrderQuery::PendingPurchases | OrderQuery::PendingDeliveries => OrderStatus::Pending,
            OrderQuery::Purchases | OrderQuery::Sales => OrderStatus::Completed,
        }
    }
}

/// Code submitted by the seller at handoff
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyCodeRequest {
    #[schema(example = "482913")]
    pub otp: String,
}

/// Item fragment shown on an order; survives item deletion
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemView {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[schema(value_type = String, example = "120.00")]
    pub price: Decimal,
}

impl OrderItemView {
    pub fn unavailable(id: Uuid) -> Self {
        Self {
            id,
            name: "Unavailable item".to_string(),
            category: String::new(),
            price: Decimal::ZERO,
        }
    }
}

impl From<&Item> for OrderItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            category: item.category.clone(),
            price: item.price,
        }
    }
}

/// Order resolved for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub item: OrderItemView,
    pub buyer: PartySummary,
    pub seller: PartySummary,
    pub quantity: i32,
    #[schema(value_type = String, example = "240.00")]
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn new(
        order: Order,
        item: OrderItemView,
        buyer: PartySummary,
        seller: PartySummary,
    ) -> Self {
        Self {
            id: order.id,
            item,
            buyer,
            seller,
            quantity: order.quantity,
            total_price: order.total_price,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// One entry of the checkout response. The only place a plaintext code
/// ever leaves the server.
#[derive(Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub item: ItemRef,
    #[schema(example = "482913")]
    pub plain_code: String,
}

impl fmt::Debug for CheckoutReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutReceipt")
            .field("item", &self.item)
            .field("plain_code", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: Decimal) -> Item {
        let now = Utc::now();
        Item {
            id: Uuid::new_v4(),
            name: "Desk".to_string(),
            price,
            description: String::new(),
            category: "Furniture".to_string(),
            seller_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_new_order_snapshots_price_and_seller() {
        let desk = item(Decimal::new(100, 0));
        let buyer = Uuid::new_v4();
        let order = NewOrder::for_line(buyer, &desk, 2, "digest".to_string()).into_order(Utc::now());

        assert_eq!(order.total_price, Decimal::new(200, 0));
        assert_eq!(order.seller_id, desk.seller_id);
        assert_eq!(order.buyer_id, buyer);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [OrderStatus::Pending, OrderStatus::Completed] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_query_mapping() {
        assert_eq!(OrderQuery::PendingPurchases.party(), OrderParty::Buyer);
        assert_eq!(OrderQuery::PendingPurchases.status(), OrderStatus::Pending);
        assert_eq!(OrderQuery::Purchases.status(), OrderStatus::Completed);
        assert_eq!(OrderQuery::Sales.party(), OrderParty::Seller);
        assert_eq!(OrderQuery::Sales.status(), OrderStatus::Completed);
        assert_eq!(OrderQuery::PendingDeliveries.party(), OrderParty::Seller);
        assert_eq!(OrderQuery::PendingDeliveries.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_receipt_wire_shape() {
        let receipt = CheckoutReceipt {
            item: ItemRef {
                id: Uuid::nil(),
                name: "Desk".to_string(),
            },
            plain_code: "123456".to_string(),
        };
        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["plainCode"], "123456");
        assert_eq!(json["item"]["name"], "Desk");
        assert!(!format!("{:?}", receipt).contains("123456"));
    }
}
