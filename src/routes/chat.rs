use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::chat::{ChatMessageDto, PostMessageRequest},
    error::AppError,
    services::chat_service,
    state::{SharedState, session::PlayerId},
};

/// Chat routes of the player's session.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/players/{player_id}/chat",
        get(get_messages).post(post_message),
    )
}

/// Post a chat message.
#[utoipa::path(
    post,
    path = "/players/{player_id}/chat",
    tag = "chat",
    params(("player_id" = u64, Path, description = "Author of the message")),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = ChatMessageDto),
        (status = 400, description = "Empty or too long message"),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Session already ended")
    )
)]
pub async fn post_message(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessageDto>), AppError> {
    let message = chat_service::post_message(&state, player_id, payload).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Chat history, oldest first.
#[utoipa::path(
    get,
    path = "/players/{player_id}/chat",
    tag = "chat",
    params(("player_id" = u64, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Chat history", body = [ChatMessageDto]),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_messages(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<Vec<ChatMessageDto>>, AppError> {
    Ok(Json(chat_service::get_messages(&state, player_id).await?))
}
