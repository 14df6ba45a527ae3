use axum::{Json, Router, extract::State, routing::post};

use crate::{
    assistant::ChatReply,
    dto::assistant::ChatRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

#[utoipa::path(
    post,
    path = "/api/assistant/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply, possibly carrying a client-side intent", body = ApiResponse<ChatReply>)
    ),
    security(("bearer_auth" = [])),
    tag = "Assistant"
)]
pub async fn chat(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatReply>>> {
    let products = product_service::active_products(&state).await?;
    let reply = state
        .assistant
        .chat(&products, &payload.message, &payload.history)
        .await;

    Ok(Json(ApiResponse::success("OK", reply, Some(Meta::empty()))))
}
