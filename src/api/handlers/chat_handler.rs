//! Chat assistant handler.

use axum::{extract::State, response::Json, routing::post, Router};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{ChatReply, ChatRequest};
use crate::errors::AppResult;

/// Create chat routes
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/", post(chat))
}

/// Ask the marketplace assistant
#[utoipa::path(
    post,
    path = "/chat",
    tag = "Chat",
    security(("bearer_auth" = [])),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReply),
        (status = 400, description = "Empty conversation or last message not from the user"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Assistant unavailable")
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ChatRequest>,
) -> AppResult<Json<ChatReply>> {
    Ok(Json(state.chat_service.chat(payload.messages).await?))
}
