use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        player::{JoinSessionRequest, PlayerJoined},
        session::{SessionActionRequest, SessionStatus},
    },
    error::AppError,
    services::{player_service, session_service},
    state::SharedState,
};

/// Routes addressing a session directly.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions/{session_id}", get(get_session))
        .route("/sessions/{session_id}/action", put(update_session_action))
        .route("/sessions/{session_id}/players", post(join_session))
}

/// Current state of a session.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    tag = "session",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session state", body = SessionStatus),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionStatus>, AppError> {
    Ok(Json(session_service::get_session(&state, session_id).await?))
}

/// Apply a host action (`NEXT_QUESTION`, `GO_TO_ANSWER`, `SHOW_ANSWER`, `FINISH`, `END`).
#[utoipa::path(
    put,
    path = "/sessions/{session_id}/action",
    tag = "session",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = SessionActionRequest,
    responses(
        (status = 200, description = "Action applied", body = SessionStatus),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Action not allowed in the current phase")
    )
)]
pub async fn update_session_action(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SessionActionRequest>,
) -> Result<Json<SessionStatus>, AppError> {
    let status = session_service::update_session_action(&state, session_id, payload).await?;
    Ok(Json(status))
}

/// Join a session waiting in the lobby.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/players",
    tag = "session",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = JoinSessionRequest,
    responses(
        (status = 201, description = "Player joined", body = PlayerJoined),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Session not in lobby or name already used")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<JoinSessionRequest>,
) -> Result<(StatusCode, Json<PlayerJoined>), AppError> {
    let joined = player_service::join_session(&state, session_id, payload).await?;
    Ok((StatusCode::CREATED, Json(joined)))
}
