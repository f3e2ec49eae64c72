//! Cart service - Cart edits and checkout.
//!
//! Every cart write runs under the `cart:{user_id}` lock, and the store
//! additionally rejects saves based on a stale version. Checkout reads and
//! hashes outside the lock and commits inside it against the version it read.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::directory::{party, party_summaries};
use crate::domain::{
    Cart, CartLineView, CartView, CheckoutReceipt, Item, ItemRef, NewOrder, OneTimeCode,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{cart_resource, LockProvider, UnitOfWork};

#[async_trait]
pub trait CartService: Send + Sync {
    async fn get(&self, user_id: Uuid) -> AppResult<CartView>;

    /// Add one unit of a listed item
    async fn add(&self, user_id: Uuid, item_id: Uuid) -> AppResult<CartView>;

    /// Drop a line. Absent lines are ignored.
    async fn remove(&self, user_id: Uuid, item_id: Uuid) -> AppResult<CartView>;

    async fn set_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32)
        -> AppResult<CartView>;

    /// Turn every line into a pending order and empty the cart.
    ///
    /// The returned receipts carry the plaintext handoff codes, one per
    /// line and in cart order. They are not retrievable afterwards.
    async fn checkout(&self, user_id: Uuid) -> AppResult<Vec<CheckoutReceipt>>;
}

pub struct CartManager<U: UnitOfWork> {
    uow: Arc<U>,
    locks: Arc<dyn LockProvider>,
}

impl<U: UnitOfWork> CartManager<U> {
    pub fn new(uow: Arc<U>, locks: Arc<dyn LockProvider>) -> Self {
        Self { uow, locks }
    }

    /// Load (or create) the cart, apply `edit`, and save it, all under the
    /// user's cart lock.
    async fn modify<F>(&self, user_id: Uuid, edit: F) -> AppResult<Cart>
    where
        F: FnOnce(&mut Cart) -> AppResult<()> + Send,
    {
        let _guard = self.locks.acquire(&cart_resource(user_id)).await?;

        let mut cart = self.uow.carts().get_or_create(user_id).await?;
        edit(&mut cart)?;
        self.uow.carts().save(cart).await
    }

    async fn items_by_id(&self, cart: &Cart) -> AppResult<HashMap<Uuid, Item>> {
        let ids: Vec<Uuid> = cart.lines.iter().map(|l| l.item_id).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let items = self.uow.items().find_many_with_deleted(&ids).await?;
        Ok(items.into_iter().map(|i| (i.id, i)).collect())
    }

    /// Drop lines whose item was withdrawn after they were added.
    ///
    /// Withdrawal strips carts itself, but an add racing it can still save
    /// a line for the item.
    async fn prune_withdrawn(&self, user_id: Uuid) -> AppResult<Cart> {
        let _guard = self.locks.acquire(&cart_resource(user_id)).await?;

        let mut cart = self.uow.carts().get_or_create(user_id).await?;
        let items = self.items_by_id(&cart).await?;
        if cart.retain_items(|id| is_listed(&items, id)) {
            tracing::info!(user_id = %user_id, "Withdrawn items pruned from cart");
            cart = self.uow.carts().save(cart).await?;
        }
        Ok(cart)
    }

    async fn view(&self, cart: Cart) -> AppResult<CartView> {
        let items = self.items_by_id(&cart).await?;
        self.render(cart, items).await
    }

    async fn render(&self, cart: Cart, items: HashMap<Uuid, Item>) -> AppResult<CartView> {
        let sellers =
            party_summaries(self.uow.users().as_ref(), items.values().map(|i| i.seller_id))
                .await?;

        let lines = cart
            .lines
            .iter()
            .filter_map(|line| {
                let item = items.get(&line.item_id).filter(|i| !i.is_deleted())?;
                Some(CartLineView::new(
                    item,
                    party(&sellers, item.seller_id),
                    line.quantity,
                ))
            })
            .collect();

        Ok(CartView::new(&cart, lines))
    }
}

fn is_listed(items: &HashMap<Uuid, Item>, item_id: Uuid) -> bool {
    items.get(&item_id).is_some_and(|i| !i.is_deleted())
}

/// Draw and hash one code per line.
///
/// Argon2 is slow, so this runs on the blocking pool and before the cart
/// lock is taken. The commit's version check catches any edit made
/// meanwhile.
async fn issue_codes(
    buyer_id: Uuid,
    lines: Vec<(Item, i32)>,
) -> AppResult<(Vec<NewOrder>, Vec<CheckoutReceipt>)> {
    tokio::task::spawn_blocking(move || {
        let mut orders = Vec::with_capacity(lines.len());
        let mut receipts = Vec::with_capacity(lines.len());
        for (item, quantity) in &lines {
            let code = OneTimeCode::generate();
            let code_hash = code.hash()?.into_string();
            orders.push(NewOrder::for_line(buyer_id, item, *quantity, code_hash));
            receipts.push(CheckoutReceipt {
                item: ItemRef {
                    id: item.id,
                    name: item.name.clone(),
                },
                plain_code: code.into_plain(),
            });
        }
        AppResult::Ok((orders, receipts))
    })
    .await
    .map_err(|e| AppError::internal(format!("Code issuing task failed: {}", e)))?
}

#[async_trait]
impl<U: UnitOfWork> CartService for CartManager<U> {
    async fn get(&self, user_id: Uuid) -> AppResult<CartView> {
        let cart = self.uow.carts().get_or_create(user_id).await?;
        let items = self.items_by_id(&cart).await?;
        if cart.lines.iter().all(|l| is_listed(&items, l.item_id)) {
            return self.render(cart, items).await;
        }

        let cart = self.prune_withdrawn(user_id).await?;
        self.view(cart).await
    }

    async fn add(&self, user_id: Uuid, item_id: Uuid) -> AppResult<CartView> {
        let guard = self.locks.acquire(&cart_resource(user_id)).await?;

        // Checked inside the section so a prune or checkout sees the same listing state
        self.uow
            .items()
            .find_by_id(item_id)
            .await?
            .ok_or_not_found("Item")?;

        let mut cart = self.uow.carts().get_or_create(user_id).await?;
        cart.add_item(item_id);
        let cart = self.uow.carts().save(cart).await?;
        drop(guard);

        tracing::debug!(user_id = %user_id, item_id = %item_id, "Item added to cart");
        self.view(cart).await
    }

    async fn remove(&self, user_id: Uuid, item_id: Uuid) -> AppResult<CartView> {
        let guard = self.locks.acquire(&cart_resource(user_id)).await?;

        let mut cart = self
            .uow
            .carts()
            .find_by_user(user_id)
            .await?
            .ok_or_not_found("Cart")?;
        if cart.remove_item(item_id) {
            cart = self.uow.carts().save(cart).await?;
        }
        drop(guard);

        self.view(cart).await
    }

    async fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> AppResult<CartView> {
        let cart = self
            .modify(user_id, |cart| cart.set_quantity(item_id, quantity))
            .await?;
        self.view(cart).await
    }

    async fn checkout(&self, user_id: Uuid) -> AppResult<Vec<CheckoutReceipt>> {
        let cart = self
            .uow
            .carts()
            .find_by_user(user_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or_else(|| AppError::invalid_state("Cart is empty"))?;

        let items = self.items_by_id(&cart).await?;
        if !cart.lines.iter().all(|l| is_listed(&items, l.item_id)) {
            // Leave the cart showing what can still be bought
            self.prune_withdrawn(user_id).await?;
            return Err(AppError::not_found("Item"));
        }

        let lines = cart
            .lines
            .iter()
            .filter_map(|l| items.get(&l.item_id).map(|i| (i.clone(), l.quantity)))
            .collect();
        let (orders, receipts) = issue_codes(user_id, lines).await?;

        let _guard = self.locks.acquire(&cart_resource(user_id)).await?;
        let created = self.uow.commit_checkout(&cart, orders).await?;
        tracing::info!(user_id = %user_id, orders = created.len(), "Checkout completed");
        Ok(receipts)
    }
}
