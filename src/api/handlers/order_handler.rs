//! Order handlers.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{OrderQuery, OrderView, VerifyCodeRequest};
use crate::errors::AppResult;

/// Create order routes
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/pending-purchases", get(pending_purchases))
        .route("/purchases", get(purchases))
        .route("/sales", get(sales))
        .route("/pending-deliveries", get(pending_deliveries))
        .route("/:id/verify", post(verify_order))
}

async fn list(
    state: &AppState,
    user: &CurrentUser,
    query: OrderQuery,
) -> AppResult<Json<Vec<OrderView>>> {
    Ok(Json(state.order_service.list(user.id, query).await?))
}

/// Orders the caller placed that are awaiting handoff
#[utoipa::path(
    get,
    path = "/orders/pending-purchases",
    tag = "Orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending purchases, newest first", body = Vec<OrderView>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn pending_purchases(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<OrderView>>> {
    list(&state, &current_user, OrderQuery::PendingPurchases).await
}

/// Completed purchases
#[utoipa::path(
    get,
    path = "/orders/purchases",
    tag = "Orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Completed purchases, newest first", body = Vec<OrderView>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn purchases(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<OrderView>>> {
    list(&state, &current_user, OrderQuery::Purchases).await
}

/// Completed sales
#[utoipa::path(
    get,
    path = "/orders/sales",
    tag = "Orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Completed sales, newest first", body = Vec<OrderView>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn sales(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<OrderView>>> {
    list(&state, &current_user, OrderQuery::Sales).await
}

/// Sales awaiting handoff
#[utoipa::path(
    get,
    path = "/orders/pending-deliveries",
    tag = "Orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending deliveries, newest first", body = Vec<OrderView>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn pending_deliveries(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<OrderView>>> {
    list(&state, &current_user, OrderQuery::PendingDeliveries).await
}

/// Complete an order with the buyer's handoff code
#[utoipa::path(
    post,
    path = "/orders/{id}/verify",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Order completed", body = OrderView),
        (status = 400, description = "Invalid code"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the seller of this order"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already completed")
    )
)]
pub async fn verify_order(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<VerifyCodeRequest>,
) -> AppResult<Json<OrderView>> {
    let order = state
        .order_service
        .verify(current_user.id, id, &payload.otp)
        .await?;
    Ok(Json(order))
}
