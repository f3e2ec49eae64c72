//! Item handlers.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use axum_extra::extract::Query;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{ItemDetail, ItemResponse};
use crate::errors::AppResult;
use crate::services::ItemListing;
use crate::types::{Created, MessageResponse};

/// New listing
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Calculus textbook")]
    pub name: String,
    #[schema(value_type = String, example = "350.00")]
    pub price: Decimal,
    #[serde(default)]
    #[schema(example = "Barely used, no markings")]
    pub description: String,
    #[validate(length(min = 1, message = "Category is required"))]
    #[schema(example = "Books")]
    pub category: String,
}

/// Search filters. `categories` may repeat (`categories=a&categories=b`).
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Case-insensitive text matched against name and description
    pub search: Option<String>,
    /// Category allow-list
    #[serde(default, alias = "categories[]")]
    pub categories: Vec<String>,
}

/// Create item routes
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item))
        .route("/mine", get(list_my_items))
        .route("/search", get(search_items))
        .route("/:id", get(get_item).delete(delete_item))
}

/// List an item for sale
#[utoipa::path(
    post,
    path = "/items",
    tag = "Items",
    security(("bearer_auth" = [])),
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item listed", body = ItemResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_item(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateItemRequest>,
) -> AppResult<Created<ItemResponse>> {
    let item = state
        .catalog_service
        .create(
            current_user.id,
            ItemListing {
                name: payload.name,
                price: payload.price,
                description: payload.description,
                category: payload.category,
            },
        )
        .await?;
    Ok(Created(item))
}

/// The caller's own live listings, newest first
#[utoipa::path(
    get,
    path = "/items/mine",
    tag = "Items",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own listings", body = Vec<ItemResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_my_items(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ItemResponse>>> {
    let items = state.catalog_service.list_by_seller(current_user.id).await?;
    Ok(Json(items))
}

/// Search other sellers' listings
#[utoipa::path(
    get,
    path = "/items/search",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(SearchParams),
    responses(
        (status = 200, description = "Matching listings, newest first", body = Vec<ItemResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn search_items(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<ItemResponse>>> {
    let items = state
        .catalog_service
        .search(current_user.id, params.search, params.categories)
        .await?;
    Ok(Json(items))
}

/// Item detail with the seller's contact card
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item detail", body = ItemDetail),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ItemDetail>> {
    let item = state.catalog_service.get(id).await?;
    Ok(Json(item))
}

/// Withdraw an own listing
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the seller"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn delete_item(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.catalog_service.delete(current_user.id, id).await?;
    Ok(Json(MessageResponse::new("Item deleted")))
}
