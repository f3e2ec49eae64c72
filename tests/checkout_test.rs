//! Checkout and handoff tests against the in-memory services.
//!
//! Covers the end-to-end purchase scenario and the concurrency guarantees:
//! one checkout per cart, one completion per order, no lost cart updates.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use campus_market::config::Config;
use campus_market::domain::{OrderQuery, OrderStatus};
use campus_market::errors::AppError;
use campus_market::services::{ItemListing, Registration, ServiceContainer, Services};

const CONCURRENCY: usize = 8;

async fn register(services: &Services, first_name: &str) -> Uuid {
    services
        .auth()
        .register(Registration {
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@students.iiit.ac.in", first_name.to_lowercase()),
            age: 20,
            contact_number: "9876543210".to_string(),
            password: "SecurePass123!".to_string(),
        })
        .await
        .unwrap()
        .id
}

async fn list(services: &Services, seller: Uuid, name: &str, price: i64) -> Uuid {
    services
        .catalog()
        .create(
            seller,
            ItemListing {
                name: name.to_string(),
                price: Decimal::new(price, 0),
                description: String::new(),
                category: "Furniture".to_string(),
            },
        )
        .await
        .unwrap()
        .id
}

fn services() -> Services {
    Services::in_memory(Config::for_tests())
}

// =============================================================================
// Purchase Scenario
// =============================================================================

#[tokio::test]
async fn test_desk_and_chair_purchase() {
    let services = services();
    let seller = register(&services, "Sam").await;
    let buyer = register(&services, "Bea").await;
    let desk = list(&services, seller, "Desk", 100).await;
    let chair = list(&services, seller, "Chair", 50).await;

    let carts = services.carts();
    carts.add(buyer, desk).await.unwrap();
    carts.add(buyer, desk).await.unwrap();
    carts.add(buyer, chair).await.unwrap();

    let receipts = carts.checkout(buyer).await.unwrap();
    assert_eq!(receipts.len(), 2);
    assert_ne!(receipts[0].plain_code, receipts[1].plain_code);
    assert!(carts.get(buyer).await.unwrap().lines.is_empty());

    let orders = services.orders();
    let deliveries = orders
        .list(seller, OrderQuery::PendingDeliveries)
        .await
        .unwrap();
    assert_eq!(deliveries.len(), 2);

    let desk_order = deliveries.iter().find(|o| o.item.id == desk).unwrap();
    assert_eq!(desk_order.quantity, 2);
    assert_eq!(desk_order.total_price, Decimal::new(200, 0));
    assert_eq!(desk_order.buyer.id, buyer);

    let desk_code = &receipts.iter().find(|r| r.item.id == desk).unwrap().plain_code;
    let completed = orders.verify(seller, desk_order.id, desk_code).await.unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);

    assert_eq!(orders.list(buyer, OrderQuery::Purchases).await.unwrap().len(), 1);
    assert_eq!(
        orders
            .list(buyer, OrderQuery::PendingPurchases)
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(orders.list(seller, OrderQuery::Sales).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_withdrawn_item_leaves_carts() {
    let services = services();
    let seller = register(&services, "Sam").await;
    let buyer = register(&services, "Bea").await;
    let desk = list(&services, seller, "Desk", 100).await;

    services.carts().add(buyer, desk).await.unwrap();
    services.catalog().delete(seller, desk).await.unwrap();

    assert!(services.carts().get(buyer).await.unwrap().lines.is_empty());
    assert!(matches!(
        services.carts().checkout(buyer).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        services.carts().add(buyer, desk).await,
        Err(AppError::NotFound(_))
    ));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_produce_one_batch() {
    let services = services();
    let seller = register(&services, "Sam").await;
    let buyer = register(&services, "Bea").await;
    let desk = list(&services, seller, "Desk", 100).await;
    services.carts().add(buyer, desk).await.unwrap();

    let carts = services.carts();
    let handles: Vec<_> = (0..CONCURRENCY)
        .map(|_| {
            let carts = Arc::clone(&carts);
            tokio::spawn(async move { carts.checkout(buyer).await })
        })
        .collect();

    let mut batches = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipts) => {
                assert_eq!(receipts.len(), 1);
                batches += 1;
            }
            Err(e) => assert!(matches!(e, AppError::InvalidState(_)), "unexpected: {:?}", e),
        }
    }
    assert_eq!(batches, 1);

    let pending = services
        .orders()
        .list(buyer, OrderQuery::PendingPurchases)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verifies_complete_once() {
    let services = services();
    let seller = register(&services, "Sam").await;
    let buyer = register(&services, "Bea").await;
    let desk = list(&services, seller, "Desk", 100).await;
    services.carts().add(buyer, desk).await.unwrap();

    let code = services.carts().checkout(buyer).await.unwrap()[0]
        .plain_code
        .clone();
    let order_id = services
        .orders()
        .list(seller, OrderQuery::PendingDeliveries)
        .await
        .unwrap()[0]
        .id;

    let orders = services.orders();
    let handles: Vec<_> = (0..CONCURRENCY)
        .map(|_| {
            let orders = Arc::clone(&orders);
            let code = code.clone();
            tokio::spawn(async move { orders.verify(seller, order_id, &code).await })
        })
        .collect();

    let mut completions = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => {
                assert_eq!(order.status, OrderStatus::Completed);
                completions += 1;
            }
            Err(e) => assert!(matches!(e, AppError::InvalidState(_)), "unexpected: {:?}", e),
        }
    }
    assert_eq!(completions, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_are_not_lost() {
    let services = services();
    let seller = register(&services, "Sam").await;
    let buyer = register(&services, "Bea").await;
    let desk = list(&services, seller, "Desk", 100).await;

    let carts = services.carts();
    let handles: Vec<_> = (0..CONCURRENCY)
        .map(|_| {
            let carts = Arc::clone(&carts);
            tokio::spawn(async move { carts.add(buyer, desk).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let cart = services.carts().get(buyer).await.unwrap();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity, CONCURRENCY as i32);
}
