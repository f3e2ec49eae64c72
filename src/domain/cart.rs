//! Shopping cart aggregate.
//!
//! A cart holds at most one line per item. `version` increases on every
//! persisted change so stores can reject writes based on a stale read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::item::Item;
use super::user::PartySummary;
use crate::errors::{AppError, AppResult};

/// One (item, quantity) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item_id: Uuid,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub user_id: Uuid,
    pub lines: Vec<CartLine>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn empty(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            lines: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, item_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    /// Add one unit: bump an existing line or append a new one.
    pub fn add_item(&mut self, item_id: Uuid) {
        let now = Utc::now();
        match self.lines.iter_mut().find(|l| l.item_id == item_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                item_id,
                quantity: 1,
                added_at: now,
            }),
        }
        self.updated_at = now;
    }

    /// Drop the line for `item_id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, item_id: Uuid) -> bool {
        self.retain_items(|id| id != item_id)
    }

    /// Keep only lines whose item passes `keep`. Returns whether any line went.
    pub fn retain_items(&mut self, mut keep: impl FnMut(Uuid) -> bool) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| keep(l.item_id));
        let removed = self.lines.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Overwrite a line's quantity.
    pub fn set_quantity(&mut self, item_id: Uuid, quantity: i32) -> AppResult<()> {
        if quantity < 1 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.item_id == item_id)
            .ok_or_else(|| AppError::not_found("Item in cart"))?;
        line.quantity = quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.updated_at = Utc::now();
    }
}

/// Cart line resolved for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLineView {
    pub item_id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "120.00")]
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub seller: PartySummary,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(value_type = String, example = "240.00")]
    pub line_total: Decimal,
}

impl CartLineView {
    pub fn new(item: &Item, seller: PartySummary, quantity: i32) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            price: item.price,
            description: item.description.clone(),
            category: item.category.clone(),
            seller,
            quantity,
            line_total: item.price * Decimal::from(quantity),
        }
    }
}

/// Cart resolved for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub user_id: Uuid,
    pub lines: Vec<CartLineView>,
    #[schema(value_type = String, example = "240.00")]
    pub total: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl CartView {
    pub fn new(cart: &Cart, lines: Vec<CartLineView>) -> Self {
        let total = lines.iter().map(|l| l.line_total).sum();
        Self {
            user_id: cart.user_id,
            lines,
            total,
            updated_at: cart.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_same_item_twice_increments_one_line() {
        let mut cart = Cart::empty(Uuid::new_v4());
        let item = Uuid::new_v4();
        cart.add_item(item);
        cart.add_item(item);

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.line(item).unwrap().quantity, 2);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut cart = Cart::empty(Uuid::new_v4());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        cart.add_item(a);
        cart.add_item(b);
        cart.add_item(a);

        let ids: Vec<Uuid> = cart.lines.iter().map(|l| l.item_id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_remove_absent_line_is_noop() {
        let mut cart = Cart::empty(Uuid::new_v4());
        cart.add_item(Uuid::new_v4());
        assert!(!cart.remove_item(Uuid::new_v4()));
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn test_retain_items_keeps_order() {
        let mut cart = Cart::empty(Uuid::new_v4());
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        cart.add_item(a);
        cart.add_item(b);
        cart.add_item(c);

        assert!(cart.retain_items(|id| id != b));
        let ids: Vec<Uuid> = cart.lines.iter().map(|l| l.item_id).collect();
        assert_eq!(ids, vec![a, c]);
        assert!(!cart.retain_items(|_| true));
    }

    #[test]
    fn test_set_quantity_rules() {
        let mut cart = Cart::empty(Uuid::new_v4());
        let item = Uuid::new_v4();
        cart.add_item(item);

        assert!(matches!(cart.set_quantity(item, 0), Err(AppError::Validation(_))));
        assert!(matches!(
            cart.set_quantity(Uuid::new_v4(), 3),
            Err(AppError::NotFound(_))
        ));
        cart.set_quantity(item, 5).unwrap();
        assert_eq!(cart.line(item).unwrap().quantity, 5);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::empty(Uuid::new_v4());
        cart.add_item(Uuid::new_v4());
        cart.clear();
        assert!(cart.is_empty());
    }
}
