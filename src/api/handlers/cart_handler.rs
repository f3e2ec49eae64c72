//! Cart handlers.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{CartView, CheckoutReceipt};
use crate::errors::AppResult;

/// New quantity for a cart line
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QuantityRequest {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    #[schema(example = 2, minimum = 1)]
    pub quantity: i32,
}

/// Create cart routes
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route(
            "/items/:item_id",
            post(add_to_cart).put(set_quantity).delete(remove_from_cart),
        )
        .route("/checkout", post(checkout))
}

/// The caller's cart with resolved lines
#[utoipa::path(
    get,
    path = "/cart",
    tag = "Cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current cart", body = CartView),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_cart(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<CartView>> {
    Ok(Json(state.cart_service.get(current_user.id).await?))
}

/// Add one unit of an item
#[utoipa::path(
    post,
    path = "/cart/items/{item_id}",
    tag = "Cart",
    security(("bearer_auth" = [])),
    params(
        ("item_id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn add_to_cart(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<CartView>> {
    Ok(Json(state.cart_service.add(current_user.id, item_id).await?))
}

/// Overwrite a line's quantity
#[utoipa::path(
    put,
    path = "/cart/items/{item_id}",
    tag = "Cart",
    security(("bearer_auth" = [])),
    params(
        ("item_id" = Uuid, Path, description = "Item ID")
    ),
    request_body = QuantityRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 400, description = "Quantity below 1"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not in cart")
    )
)]
pub async fn set_quantity(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<QuantityRequest>,
) -> AppResult<Json<CartView>> {
    let cart = state
        .cart_service
        .set_quantity(current_user.id, item_id, payload.quantity)
        .await?;
    Ok(Json(cart))
}

/// Drop a line (no-op if the item is not in the cart)
#[utoipa::path(
    delete,
    path = "/cart/items/{item_id}",
    tag = "Cart",
    security(("bearer_auth" = [])),
    params(
        ("item_id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No cart yet")
    )
)]
pub async fn remove_from_cart(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<CartView>> {
    Ok(Json(state.cart_service.remove(current_user.id, item_id).await?))
}

/// Convert the cart into pending orders
///
/// Each receipt carries the plaintext handoff code for one order. Codes
/// are shown only here.
#[utoipa::path(
    post,
    path = "/cart/checkout",
    tag = "Cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "One receipt per order, in cart order", body = Vec<CheckoutReceipt>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "An item is no longer listed"),
        (status = 409, description = "Cart is empty or changed concurrently")
    )
)]
pub async fn checkout(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CheckoutReceipt>>> {
    Ok(Json(state.cart_service.checkout(current_user.id).await?))
}
