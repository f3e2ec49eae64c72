//! Integration tests for API endpoints.
//!
//! The full router runs over the in-memory store, so these tests need no
//! database or Redis connection.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use campus_market::api::{create_router, AppState};
use campus_market::config::Config;

// =============================================================================
// Helpers
// =============================================================================

fn app() -> Router {
    create_router(AppState::in_memory(Config::for_tests()))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

/// Register and log in; returns (user id, access token)
async fn sign_up(app: &Router, first_name: &str, email: &str) -> (String, String) {
    let (status, user) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "first_name": first_name,
            "last_name": "Tester",
            "email": email,
            "age": 20,
            "contact_number": "9876543210",
            "password": "SecurePass123!"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", user);

    let (status, token) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "SecurePass123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", token);

    (
        user["id"].as_str().unwrap().to_string(),
        token["access_token"].as_str().unwrap().to_string(),
    )
}

async fn list_item(app: &Router, token: &str, name: &str, price: &str, category: &str) -> String {
    let (status, item) = send(
        app,
        Method::POST,
        "/items",
        Some(token),
        Some(json!({ "name": name, "price": price, "category": category })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create item failed: {}", item);
    item["id"].as_str().unwrap().to_string()
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

// =============================================================================
// Public Endpoints
// =============================================================================

#[tokio::test]
async fn test_root_endpoint_returns_welcome_message() {
    let (status, body) = send(&app(), Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Campus Market API".to_string()));
}

#[tokio::test]
async fn test_health_reports_disabled_dependencies_in_memory() {
    let (status, body) = send(&app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"]["status"], "disabled");
    assert_eq!(body["services"]["redis"]["status"], "disabled");
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_register_rules() {
    let app = app();
    sign_up(&app, "Asha", "asha@students.iiit.ac.in").await;

    let duplicate = json!({
        "first_name": "Asha",
        "last_name": "Again",
        "email": "asha@students.iiit.ac.in",
        "age": 21,
        "contact_number": "9876543210",
        "password": "SecurePass123!"
    });
    let (status, body) = send(&app, Method::POST, "/auth/register", None, Some(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let foreign = json!({
        "first_name": "Eve",
        "last_name": "Outsider",
        "email": "eve@gmail.com",
        "age": 21,
        "contact_number": "9876543210",
        "password": "SecurePass123!"
    });
    let (status, body) = send(&app, Method::POST, "/auth/register", None, Some(foreign)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = app();
    sign_up(&app, "Asha", "asha@students.iiit.ac.in").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "asha@students.iiit.ac.in", "password": "WrongPass123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, Method::GET, "/users/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Profiles
// =============================================================================

#[tokio::test]
async fn test_profile_update_and_public_card() {
    let app = app();
    let (asha_id, asha) = sign_up(&app, "Asha", "asha@students.iiit.ac.in").await;
    let (_, ravi) = sign_up(&app, "Ravi", "ravi@students.iiit.ac.in").await;

    let (status, me) = send(
        &app,
        Method::PUT,
        "/users/me",
        Some(&asha),
        Some(json!({ "contact_number": "9000000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["contact_number"], "9000000000");
    assert_eq!(me["first_name"], "Asha");
    assert!(me.get("password_hash").is_none());

    let (status, card) = send(&app, Method::GET, &format!("/users/{}", asha_id), Some(&ravi), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(card["first_name"], "Asha");
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_search_excludes_own_items_and_filters() {
    let app = app();
    let (_, seller) = sign_up(&app, "Sam", "sam@students.iiit.ac.in").await;
    let (_, buyer) = sign_up(&app, "Bea", "bea@students.iiit.ac.in").await;

    list_item(&app, &seller, "Study desk", "100.00", "Furniture").await;
    list_item(&app, &seller, "Calculus textbook", "350.00", "Books").await;

    let (status, mine) = send(&app, Method::GET, "/items/search", Some(&seller), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 0);

    let (_, all) = send(&app, Method::GET, "/items/search", Some(&buyer), None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, desks) = send(&app, Method::GET, "/items/search?search=DESK", Some(&buyer), None).await;
    assert_eq!(desks.as_array().unwrap().len(), 1);
    assert_eq!(desks[0]["name"], "Study desk");

    let (_, books) = send(
        &app,
        Method::GET,
        "/items/search?categories=Books&categories=Electronics",
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(books.as_array().unwrap().len(), 1);
    assert_eq!(books[0]["category"], "Books");

    let (_, dashboard) = send(&app, Method::GET, "/items/mine", Some(&seller), None).await;
    assert_eq!(dashboard.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_only_the_seller_can_delete_an_item() {
    let app = app();
    let (_, seller) = sign_up(&app, "Sam", "sam@students.iiit.ac.in").await;
    let (_, buyer) = sign_up(&app, "Bea", "bea@students.iiit.ac.in").await;
    let desk = list_item(&app, &seller, "Study desk", "100.00", "Furniture").await;

    let (status, _) = send(&app, Method::DELETE, &format!("/items/{}", desk), Some(&buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &format!("/items/{}", desk), Some(&seller), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item deleted");

    let (status, _) = send(&app, Method::GET, &format!("/items/{}", desk), Some(&buyer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Cart, Checkout and Handoff
// =============================================================================

#[tokio::test]
async fn test_checkout_and_handoff_flow() {
    let app = app();
    let (_, seller) = sign_up(&app, "Sam", "sam@students.iiit.ac.in").await;
    let (_, buyer) = sign_up(&app, "Bea", "bea@students.iiit.ac.in").await;
    let desk = list_item(&app, &seller, "Study desk", "100.00", "Furniture").await;
    let chair = list_item(&app, &seller, "Chair", "50.00", "Furniture").await;

    let cart_line = format!("/cart/items/{}", desk);
    send(&app, Method::POST, &cart_line, Some(&buyer), None).await;
    let (status, cart) = send(&app, Method::POST, &cart_line, Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["lines"][0]["quantity"], 2);

    send(&app, Method::POST, &format!("/cart/items/{}", chair), Some(&buyer), None).await;
    let (_, cart) = send(&app, Method::GET, "/cart", Some(&buyer), None).await;
    assert_eq!(decimal(&cart["total"]), Decimal::new(250, 0));

    let (status, receipts) = send(&app, Method::POST, "/cart/checkout", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    let receipts = receipts.as_array().unwrap().clone();
    assert_eq!(receipts.len(), 2);
    for receipt in &receipts {
        let code = receipt["plainCode"].as_str().unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    let (_, cart) = send(&app, Method::GET, "/cart", Some(&buyer), None).await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 0);

    let (_, pending) = send(&app, Method::GET, "/orders/pending-purchases", Some(&buyer), None).await;
    assert_eq!(pending.as_array().unwrap().len(), 2);

    let (_, deliveries) =
        send(&app, Method::GET, "/orders/pending-deliveries", Some(&seller), None).await;
    let desk_order = deliveries
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["item"]["id"] == desk.as_str())
        .unwrap()
        .clone();
    assert_eq!(desk_order["quantity"], 2);
    assert_eq!(decimal(&desk_order["total_price"]), Decimal::new(200, 0));
    assert_eq!(desk_order["status"], "pending");
    assert!(desk_order.get("code_hash").is_none());

    let code = receipts
        .iter()
        .find(|r| r["item"]["id"] == desk.as_str())
        .unwrap()["plainCode"]
        .as_str()
        .unwrap()
        .to_string();
    let wrong = if code == "000000" { "111111" } else { "000000" };
    let verify = format!("/orders/{}/verify", desk_order["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::POST, &verify, Some(&buyer), Some(json!({ "otp": code }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, &verify, Some(&seller), Some(json!({ "otp": wrong }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid code");

    let (status, body) = send(&app, Method::POST, &verify, Some(&seller), Some(json!({ "otp": "12ab" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, order) = send(&app, Method::POST, &verify, Some(&seller), Some(json!({ "otp": code }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "completed");

    let (status, body) = send(&app, Method::POST, &verify, Some(&seller), Some(json!({ "otp": code }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    let (_, sales) = send(&app, Method::GET, "/orders/sales", Some(&seller), None).await;
    assert_eq!(sales.as_array().unwrap().len(), 1);
    let (_, purchases) = send(&app, Method::GET, "/orders/purchases", Some(&buyer), None).await;
    assert_eq!(purchases.as_array().unwrap().len(), 1);
    let (_, pending) = send(&app, Method::GET, "/orders/pending-purchases", Some(&buyer), None).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cart_edits() {
    let app = app();
    let (_, seller) = sign_up(&app, "Sam", "sam@students.iiit.ac.in").await;
    let (_, buyer) = sign_up(&app, "Bea", "bea@students.iiit.ac.in").await;
    let desk = list_item(&app, &seller, "Study desk", "100.00", "Furniture").await;
    let line = format!("/cart/items/{}", desk);

    let (status, _) = send(&app, Method::PUT, &line, Some(&buyer), Some(json!({ "quantity": 3 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, Method::POST, &line, Some(&buyer), None).await;
    let (status, cart) = send(&app, Method::PUT, &line, Some(&buyer), Some(json!({ "quantity": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["lines"][0]["quantity"], 3);
    assert_eq!(decimal(&cart["total"]), Decimal::new(300, 0));

    let (status, _) = send(&app, Method::PUT, &line, Some(&buyer), Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cart) = send(&app, Method::DELETE, &line, Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["lines"].as_array().unwrap().len(), 0);

    let (status, body) = send(&app, Method::POST, "/cart/checkout", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn test_review_a_seller() {
    let app = app();
    let (seller_id, seller) = sign_up(&app, "Sam", "sam@students.iiit.ac.in").await;
    let (_, buyer) = sign_up(&app, "Bea", "bea@students.iiit.ac.in").await;
    let review = format!("/reviews/{}", seller_id);

    let (status, body) = send(&app, Method::POST, &review, Some(&buyer), Some(json!({ "rating": 6 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, Method::POST, &review, Some(&seller), Some(json!({ "rating": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = send(
        &app,
        Method::POST,
        &review,
        Some(&buyer),
        Some(json!({ "rating": 4, "comment": "Quick handoff" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["reviewer"]["first_name"], "Bea");

    let (status, _) = send(&app, Method::POST, &review, Some(&buyer), Some(json!({ "rating": 5 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, list) = send(
        &app,
        Method::GET,
        &format!("/reviews/seller/{}", seller_id),
        Some(&seller),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);
    assert_eq!(list["average_rating"], 4.0);
    assert_eq!(list["reviews"][0]["comment"], "Quick handoff");
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_without_api_key_is_unavailable() {
    let app = app();
    let (_, token) = sign_up(&app, "Asha", "asha@students.iiit.ac.in").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/chat",
        Some(&token),
        Some(json!({ "messages": [{ "role": "user", "content": "How do I sell a bike?" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(body["error"]["message"], "The service is temporarily unavailable");

    let (status, _) = send(&app, Method::POST, "/chat", Some(&token), Some(json!({ "messages": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
