use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        quiz::QuizSummary,
        session::{CreateSessionRequest, SessionCreated, SessionList},
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes listing quizzes and opening sessions from them.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quizzes", get(list_quizzes))
        .route(
            "/quizzes/{quiz_id}/sessions",
            get(list_sessions).post(create_session),
        )
}

/// List the quizzes sessions can be created from.
#[utoipa::path(
    get,
    path = "/quizzes",
    tag = "quiz",
    responses(
        (status = 200, description = "Available quizzes", body = [QuizSummary])
    )
)]
pub async fn list_quizzes(State(state): State<SharedState>) -> Json<Vec<QuizSummary>> {
    Json(session_service::list_quizzes(&state))
}

/// Open a new session of a quiz.
#[utoipa::path(
    post,
    path = "/quizzes/{quiz_id}/sessions",
    tag = "quiz",
    params(("quiz_id" = Uuid, Path, description = "Quiz to play")),
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionCreated),
        (status = 400, description = "Invalid quiz or session settings"),
        (status = 404, description = "Unknown quiz"),
        (status = 409, description = "Too many active sessions for this quiz")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionCreated>), AppError> {
    let created = session_service::create_session(&state, quiz_id, payload)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List the active and ended sessions of a quiz.
#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}/sessions",
    tag = "quiz",
    params(("quiz_id" = Uuid, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Sessions of the quiz", body = SessionList),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn list_sessions(
    State(state): State<SharedState>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<SessionList>, AppError> {
    Ok(Json(session_service::list_sessions(&state, quiz_id)?))
}
