//! Catalog service - Listing, browsing and withdrawing items.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::directory::{party, party_summaries};
use crate::domain::{
    Item, ItemDetail, ItemResponse, ItemSearch, NewItem, PartySummary, PublicProfile,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Listing fields as submitted by the seller
#[derive(Debug, Clone)]
pub struct ItemListing {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn create(&self, seller_id: Uuid, listing: ItemListing) -> AppResult<ItemResponse>;

    /// Listed item with the seller's contact card
    async fn get(&self, id: Uuid) -> AppResult<ItemDetail>;

    /// Withdraw an item. Only its seller may do this.
    async fn delete(&self, seller_id: Uuid, id: Uuid) -> AppResult<()>;

    async fn list_by_seller(&self, seller_id: Uuid) -> AppResult<Vec<ItemResponse>>;

    /// Other sellers' items matching free text and categories, newest first
    async fn search(
        &self,
        requester: Uuid,
        text: Option<String>,
        categories: Vec<String>,
    ) -> AppResult<Vec<ItemResponse>>;
}

pub struct Catalog<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Catalog<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn with_sellers(&self, items: Vec<Item>) -> AppResult<Vec<ItemResponse>> {
        let sellers = party_summaries(
            self.uow.users().as_ref(),
            items.iter().map(|i| i.seller_id),
        )
        .await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let seller = party(&sellers, item.seller_id);
                ItemResponse::new(item, seller)
            })
            .collect())
    }
}

#[async_trait]
impl<U: UnitOfWork> CatalogService for Catalog<U> {
    async fn create(&self, seller_id: Uuid, listing: ItemListing) -> AppResult<ItemResponse> {
        let seller = self
            .uow
            .users()
            .find_by_id(seller_id)
            .await?
            .ok_or_not_found("User")?;

        let new_item = NewItem {
            name: listing.name,
            price: listing.price,
            description: listing.description,
            category: listing.category,
            seller_id,
        }
        .validated()?;

        let item = self.uow.items().create(new_item).await?;
        tracing::info!(item_id = %item.id, seller_id = %seller_id, "Item listed");
        Ok(ItemResponse::new(item, PartySummary::from(&seller)))
    }

    async fn get(&self, id: Uuid) -> AppResult<ItemDetail> {
        let item = self.uow.items().find_by_id(id).await?.ok_or_not_found("Item")?;
        let seller = self
            .uow
            .users()
            .find_by_id(item.seller_id)
            .await?
            .ok_or_not_found("Seller")?;
        Ok(ItemDetail::new(item, PublicProfile::from(seller)))
    }

    async fn delete(&self, seller_id: Uuid, id: Uuid) -> AppResult<()> {
        let item = self.uow.items().find_by_id(id).await?.ok_or_not_found("Item")?;
        if !item.is_owned_by(seller_id) {
            return Err(AppError::forbidden("Only the seller can delete this item"));
        }

        let carts = self.uow.withdraw_item(id).await?;
        tracing::info!(item_id = %id, carts_updated = carts.len(), "Item withdrawn");
        Ok(())
    }

    async fn list_by_seller(&self, seller_id: Uuid) -> AppResult<Vec<ItemResponse>> {
        let items = self.uow.items().list_by_seller(seller_id).await?;
        self.with_sellers(items).await
    }

    async fn search(
        &self,
        requester: Uuid,
        text: Option<String>,
        categories: Vec<String>,
    ) -> AppResult<Vec<ItemResponse>> {
        let filter = ItemSearch {
            text,
            categories: categories
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            exclude_seller: Some(requester),
        };
        let items = self.uow.items().search(filter).await?;
        self.with_sellers(items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;
    use crate::infra::InMemoryStore;

    async fn user(store: &InMemoryStore, email: &str) -> Uuid {
        store
            .users()
            .create(NewUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                email: email.to_string(),
                age: 21,
                contact_number: "9000000000".to_string(),
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn listing(name: &str, price: i64, category: &str) -> ItemListing {
        ItemListing {
            name: name.to_string(),
            price: Decimal::new(price, 0),
            description: format!("Used {}", name.to_lowercase()),
            category: category.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_validates_listing() {
        let store = Arc::new(InMemoryStore::new());
        let seller = user(&store, "seller@students.iiit.ac.in").await;
        let catalog = Catalog::new(store);

        let created = catalog
            .create(seller, listing("  Desk ", 100, "Furniture"))
            .await
            .unwrap();
        assert_eq!(created.name, "Desk");
        assert_eq!(created.seller.id, seller);

        assert!(matches!(
            catalog.create(seller, listing("Lamp", -1, "Furniture")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            catalog.create(seller, listing("Lamp", 10, " ")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            catalog.create(Uuid::new_v4(), listing("Lamp", 10, "Furniture")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_filters_and_excludes_requester() {
        let store = Arc::new(InMemoryStore::new());
        let seller = user(&store, "seller@students.iiit.ac.in").await;
        let buyer = user(&store, "buyer@students.iiit.ac.in").await;
        let catalog = Catalog::new(store);

        catalog.create(seller, listing("Desk", 100, "Furniture")).await.unwrap();
        catalog.create(seller, listing("Novel", 20, "Books")).await.unwrap();
        catalog.create(buyer, listing("Desk lamp", 15, "Furniture")).await.unwrap();

        let found = catalog
            .search(buyer, Some("DESK".to_string()), Vec::new())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Desk");

        let books = catalog
            .search(buyer, None, vec!["Books".to_string(), " ".to_string()])
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].category, "Books");

        // Description matches too
        let used = catalog
            .search(seller, Some("used desk".to_string()), Vec::new())
            .await
            .unwrap();
        assert_eq!(used.len(), 1);
        assert_eq!(used[0].seller.id, buyer);
    }

    #[tokio::test]
    async fn test_list_by_seller_is_newest_first() {
        let store = Arc::new(InMemoryStore::new());
        let seller = user(&store, "seller@students.iiit.ac.in").await;
        let catalog = Catalog::new(store);

        catalog.create(seller, listing("Desk", 100, "Furniture")).await.unwrap();
        catalog.create(seller, listing("Chair", 50, "Furniture")).await.unwrap();

        let names: Vec<String> = catalog
            .list_by_seller(seller)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Chair".to_string(), "Desk".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let store = Arc::new(InMemoryStore::new());
        let seller = user(&store, "seller@students.iiit.ac.in").await;
        let other = user(&store, "other@students.iiit.ac.in").await;
        let catalog = Catalog::new(store);
        let desk = catalog
            .create(seller, listing("Desk", 100, "Furniture"))
            .await
            .unwrap();

        let detail = catalog.get(desk.id).await.unwrap();
        assert_eq!(detail.seller.contact_number, "9000000000");

        assert!(matches!(
            catalog.delete(other, desk.id).await,
            Err(AppError::Forbidden(_))
        ));
        catalog.delete(seller, desk.id).await.unwrap();

        assert!(matches!(catalog.get(desk.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            catalog.delete(seller, desk.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(catalog.list_by_seller(seller).await.unwrap().is_empty());
    }
}
