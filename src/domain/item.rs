//! Catalog items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::{PartySummary, PublicProfile};
use crate::errors::{AppError, AppResult};

/// Item listed by a seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp (None = listed, Some = withdrawn)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.seller_id == user_id
    }
}

/// Listing data for a new item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub seller_id: Uuid,
}

impl NewItem {
    /// Trim text fields and enforce listing rules.
    pub fn validated(self) -> AppResult<Self> {
        let name = self.name.trim().to_string();
        let category = self.category.trim().to_string();

        if name.is_empty() {
            return Err(AppError::validation("Item name is required"));
        }
        if category.is_empty() {
            return Err(AppError::validation("Category is required"));
        }
        if self.price < Decimal::ZERO {
            return Err(AppError::validation("Price cannot be negative"));
        }

        Ok(Self {
            name,
            category,
            description: self.description.trim().to_string(),
            ..self
        })
    }
}

/// Search filter: free text over name/description plus a category allow-list
#[derive(Debug, Clone, Default)]
pub struct ItemSearch {
    pub text: Option<String>,
    pub categories: Vec<String>,
    /// Items listed by this user are excluded
    pub exclude_seller: Option<Uuid>,
}

impl ItemSearch {
    /// Normalized search text, `None` when blank.
    pub fn needle(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether an item passes the filter (used by stores without SQL).
    pub fn matches(&self, item: &Item) -> bool {
        if item.is_deleted() {
            return false;
        }
        if self.exclude_seller == Some(item.seller_id) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.iter().any(|c| c == &item.category) {
            return false;
        }
        match self.needle() {
            Some(needle) => {
                item.name.to_lowercase().contains(&needle)
                    || item.description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// Item as listed in search results and the seller dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    #[schema(example = "Calculus textbook")]
    pub name: String,
    #[schema(value_type = String, example = "350.00")]
    pub price: Decimal,
    pub description: String,
    #[schema(example = "Books")]
    pub category: String,
    pub seller: PartySummary,
    pub created_at: DateTime<Utc>,
}

impl ItemResponse {
    pub fn new(item: Item, seller: PartySummary) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            description: item.description,
            category: item.category,
            seller,
            created_at: item.created_at,
        }
    }
}

/// Item detail with the seller's contact card
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemDetail {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "350.00")]
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub seller: PublicProfile,
    pub created_at: DateTime<Utc>,
}

impl ItemDetail {
    pub fn new(item: Item, seller: PublicProfile) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            description: item.description,
            category: item.category,
            seller,
            created_at: item.created_at,
        }
    }
}

/// Identity fragment returned with checkout codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ItemRef {
    pub id: Uuid,
    pub name: String,
}
