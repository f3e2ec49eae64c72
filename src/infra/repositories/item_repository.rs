//! Item repository with soft delete.
//!
//! Queries exclude withdrawn items unless the method name says
//! `with_deleted`. Withdrawing an item is a cross-table write and lives on
//! the unit of work.

use async_trait::async_trait;
use sea_orm::sea_query::{extension::postgres::PgExpr, Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::item::{self, ActiveModel, Entity as ItemEntity};
use crate::domain::{Item, ItemSearch, NewItem};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn create(&self, item: NewItem) -> AppResult<Item>;

    /// Find a listed item (excludes withdrawn)
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Item>>;

    /// Items by id, withdrawn ones included (order history, stale cart lines)
    async fn find_many_with_deleted(&self, ids: &[Uuid]) -> AppResult<Vec<Item>>;

    /// A seller's listed items, newest first
    async fn list_by_seller(&self, seller_id: Uuid) -> AppResult<Vec<Item>>;

    /// Listed items matching the filter, newest first
    async fn search(&self, filter: ItemSearch) -> AppResult<Vec<Item>>;
}

pub struct ItemStore {
    db: DatabaseConnection,
}

impl ItemStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Escape LIKE wildcards so user text matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl ItemRepository for ItemStore {
    async fn create(&self, new_item: NewItem) -> AppResult<Item> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_item.name),
            price: Set(new_item.price),
            description: Set(new_item.description),
            category: Set(new_item.category),
            seller_id: Set(new_item.seller_id),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Item::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Item>> {
        let result = ItemEntity::find_by_id(id)
            .filter(item::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(result.map(Item::from))
    }

    async fn find_many_with_deleted(&self, ids: &[Uuid]) -> AppResult<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = ItemEntity::find()
            .filter(item::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Item::from).collect())
    }

    async fn list_by_seller(&self, seller_id: Uuid) -> AppResult<Vec<Item>> {
        let models = ItemEntity::find()
            .filter(item::Column::SellerId.eq(seller_id))
            .filter(item::Column::DeletedAt.is_null())
            .order_by_desc(item::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Item::from).collect())
    }

    async fn search(&self, filter: ItemSearch) -> AppResult<Vec<Item>> {
        let mut query = ItemEntity::find().filter(item::Column::DeletedAt.is_null());

        if let Some(seller_id) = filter.exclude_seller {
            query = query.filter(item::Column::SellerId.ne(seller_id));
        }
        if !filter.categories.is_empty() {
            query = query.filter(item::Column::Category.is_in(filter.categories.clone()));
        }
        if let Some(needle) = filter.needle() {
            let pattern = like_pattern(&needle);
            query = query.filter(
                Condition::any()
                    .add(Expr::col((item::Entity, item::Column::Name)).ilike(pattern.clone()))
                    .add(Expr::col((item::Entity, item::Column::Description)).ilike(pattern)),
            );
        }

        let models = query
            .order_by_desc(item::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Item::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("lamp"), "%lamp%");
    }
}
