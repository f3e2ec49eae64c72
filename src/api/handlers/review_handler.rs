//! Review handlers.

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
use crate::domain::{ReviewInput, ReviewList, ReviewView};
use crate::errors::AppResult;
use crate::types::Created;

/// Create review routes
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/seller/:seller_id", get(list_seller_reviews))
        .route("/:seller_id", post(add_review))
}

/// A seller's reviews with the average rating
#[utoipa::path(
    get,
    path = "/reviews/seller/{seller_id}",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(
        ("seller_id" = Uuid, Path, description = "Seller user ID")
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = ReviewList),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Seller not found")
    )
)]
pub async fn list_seller_reviews(
    State(state): State<AppState>,
    Path(seller_id): Path<Uuid>,
) -> AppResult<Json<ReviewList>> {
    Ok(Json(state.review_service.list_for_seller(seller_id).await?))
}

/// Review a seller (once per reviewer)
#[utoipa::path(
    post,
    path = "/reviews/{seller_id}",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(
        ("seller_id" = Uuid, Path, description = "Seller user ID")
    ),
    request_body = ReviewInput,
    responses(
        (status = 201, description = "Review added", body = ReviewView),
        (status = 400, description = "Rating out of range or self-review"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Seller not found"),
        (status = 409, description = "Already reviewed")
    )
)]
pub async fn add_review(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(seller_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewInput>,
) -> AppResult<Created<ReviewView>> {
    let review = state
        .review_service
        .add(current_user.id, seller_id, payload)
        .await?;
    Ok(Created(review))
}
