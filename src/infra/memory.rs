//! In-process store.
//!
//! Backs `serve --in-memory` and the test suites. All tables sit behind a
//! single mutex, so every multi-row write is atomic just like the
//! transactional paths in [`super::Persistence`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::repositories::{
    CartRepository, ItemRepository, OrderRepository, ReviewRepository, UserRepository,
};
use super::unit_of_work::UnitOfWork;
use crate::domain::{
    Cart, Item, ItemSearch, NewItem, NewOrder, NewReview, NewUser, Order, OrderParty, OrderStatus,
    ProfileUpdate, Review, User,
};
use crate::errors::{AppError, AppResult, OptionExt};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Insertion order doubles as creation order
    items: Vec<Item>,
    carts: HashMap<Uuid, Cart>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
}

#[derive(Default)]
pub struct MemoryTables {
    state: Mutex<Tables>,
}

impl MemoryTables {
    fn state(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.state
            .lock()
            .map_err(|_| AppError::internal("in-memory store poisoned"))
    }
}

/// UnitOfWork over [`MemoryTables`]
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<MemoryTables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryTables {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .state()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        let state = self.state()?;
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut state = self.state()?;
        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict("Email already registered"));
        }

        let now = chrono::Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            age: new_user.age,
            contact_number: new_user.contact_number,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let mut state = self.state()?;
        let user = state.users.get_mut(&id).ok_or_not_found("User")?;
        update.apply(user);
        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> AppResult<()> {
        let mut state = self.state()?;
        let user = state.users.get_mut(&id).ok_or_not_found("User")?;
        user.password_hash = password_hash;
        user.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for MemoryTables {
    async fn create(&self, new_item: NewItem) -> AppResult<Item> {
        let now = chrono::Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            name: new_item.name,
            price: new_item.price,
            description: new_item.description,
            category: new_item.category,
            seller_id: new_item.seller_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.state()?.items.push(item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Item>> {
        Ok(self
            .state()?
            .items
            .iter()
            .find(|i| i.id == id && !i.is_deleted())
            .cloned())
    }

    async fn find_many_with_deleted(&self, ids: &[Uuid]) -> AppResult<Vec<Item>> {
        Ok(self
            .state()?
            .items
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn list_by_seller(&self, seller_id: Uuid) -> AppResult<Vec<Item>> {
        Ok(self
            .state()?
            .items
            .iter()
            .rev()
            .filter(|i| i.seller_id == seller_id && !i.is_deleted())
            .cloned()
            .collect())
    }

    async fn search(&self, filter: ItemSearch) -> AppResult<Vec<Item>> {
        Ok(self
            .state()?
            .items
            .iter()
            .rev()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CartRepository for MemoryTables {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Cart>> {
        Ok(self.state()?.carts.get(&user_id).cloned())
    }

    async fn get_or_create(&self, user_id: Uuid) -> AppResult<Cart> {
        Ok(self
            .state()?
            .carts
            .entry(user_id)
            .or_insert_with(|| Cart::empty(user_id))
            .clone())
    }

    async fn save(&self, mut cart: Cart) -> AppResult<Cart> {
        let mut state = self.state()?;
        let current = state
            .carts
            .get(&cart.user_id)
            .map(|c| c.version)
            .ok_or_not_found("Cart")?;

        if current != cart.version {
            return Err(AppError::invalid_state("Cart was modified concurrently"));
        }

        cart.version += 1;
        state.carts.insert(cart.user_id, cart.clone());
        Ok(cart)
    }
}

#[async_trait]
impl OrderRepository for MemoryTables {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.state()?.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_for(
        &self,
        party: OrderParty,
        user_id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Vec<Order>> {
        Ok(self
            .state()?
            .orders
            .iter()
            .rev()
            .filter(|o| o.status == status)
            .filter(|o| match party {
                OrderParty::Buyer => o.buyer_id == user_id,
                OrderParty::Seller => o.seller_id == user_id,
            })
            .cloned()
            .collect())
    }

    async fn complete_pending(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state()?;
        match state.orders.iter_mut().find(|o| o.id == id && o.is_pending()) {
            Some(order) => {
                order.status = OrderStatus::Completed;
                order.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ReviewRepository for MemoryTables {
    async fn find_by_pair(&self, reviewer_id: Uuid, seller_id: Uuid) -> AppResult<Option<Review>> {
        Ok(self
            .state()?
            .reviews
            .iter()
            .find(|r| r.reviewer_id == reviewer_id && r.seller_id == seller_id)
            .cloned())
    }

    async fn create(&self, new_review: NewReview) -> AppResult<Review> {
        let mut state = self.state()?;
        let duplicate = state
            .reviews
            .iter()
            .any(|r| r.reviewer_id == new_review.reviewer_id && r.seller_id == new_review.seller_id);
        if duplicate {
            return Err(AppError::conflict("You have already reviewed this seller"));
        }

        let review = new_review.into_review(chrono::Utc::now());
        state.reviews.push(review.clone());
        Ok(review)
    }

    async fn list_for_seller(&self, seller_id: Uuid) -> AppResult<Vec<Review>> {
        Ok(self
            .state()?
            .reviews
            .iter()
            .rev()
            .filter(|r| r.seller_id == seller_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.tables.clone()
    }

    fn items(&self) -> Arc<dyn ItemRepository> {
        self.tables.clone()
    }

    fn carts(&self) -> Arc<dyn CartRepository> {
        self.tables.clone()
    }

    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.tables.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewRepository> {
        self.tables.clone()
    }

    async fn commit_checkout(&self, cart: &Cart, orders: Vec<NewOrder>) -> AppResult<Vec<Order>> {
        if orders.is_empty() {
            return Err(AppError::invalid_state("Cart is empty"));
        }

        let mut state = self.tables.state()?;
        let stored = state.carts.get_mut(&cart.user_id).ok_or_not_found("Cart")?;
        if stored.version != cart.version {
            return Err(AppError::invalid_state("Cart changed during checkout"));
        }

        stored.clear();
        stored.version += 1;

        let now = chrono::Utc::now();
        let created: Vec<Order> = orders.into_iter().map(|o| o.into_order(now)).collect();
        state.orders.extend(created.iter().cloned());
        Ok(created)
    }

    async fn withdraw_item(&self, item_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut state = self.tables.state()?;
        let now = chrono::Utc::now();

        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == item_id && !i.is_deleted())
            .ok_or_not_found("Item")?;
        item.deleted_at = Some(now);
        item.updated_at = now;

        let mut holders = Vec::new();
        for cart in state.carts.values_mut() {
            if cart.remove_item(item_id) {
                cart.version += 1;
                holders.push(cart.user_id);
            }
        }
        Ok(holders)
    }
}
