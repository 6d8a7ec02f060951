use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use crate::{
    dto::{
        player::{PlayerStatus, QuestionInfo, SubmitAnswerRequest},
        results::{FinalResults, QuestionResultResponse},
    },
    error::AppError,
    services::{answer_service, player_service},
    state::{SharedState, session::PlayerId},
};

/// Player-scoped routes: status, questions, answers and results.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players/{player_id}", get(get_player_status))
        .route(
            "/players/{player_id}/questions/{position}",
            get(get_current_question_info),
        )
        .route(
            "/players/{player_id}/questions/{position}/answer",
            put(submit_answer),
        )
        .route(
            "/players/{player_id}/questions/{position}/results",
            get(get_question_results),
        )
        .route("/players/{player_id}/results", get(get_final_results))
}

/// Phase and progress of the player's session.
#[utoipa::path(
    get,
    path = "/players/{player_id}",
    tag = "player",
    params(("player_id" = u64, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player status", body = PlayerStatus),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_player_status(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerStatus>, AppError> {
    Ok(Json(player_service::get_player_status(&state, player_id).await?))
}

/// Question currently displayed to the player.
#[utoipa::path(
    get,
    path = "/players/{player_id}/questions/{position}",
    tag = "player",
    params(
        ("player_id" = u64, Path, description = "Player identifier"),
        ("position" = usize, Path, description = "Position of the current question")
    ),
    responses(
        (status = 200, description = "Question without its correct answers", body = QuestionInfo),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "No question displayed or position is not the current one")
    )
)]
pub async fn get_current_question_info(
    State(state): State<SharedState>,
    Path((player_id, position)): Path<(PlayerId, usize)>,
) -> Result<Json<QuestionInfo>, AppError> {
    let info = player_service::get_current_question_info(&state, player_id, position).await?;
    Ok(Json(info))
}

/// Submit or replace the player's answer to the open question.
#[utoipa::path(
    put,
    path = "/players/{player_id}/questions/{position}/answer",
    tag = "player",
    params(
        ("player_id" = u64, Path, description = "Player identifier"),
        ("position" = usize, Path, description = "Position of the open question")
    ),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 204, description = "Answer recorded"),
        (status = 400, description = "Empty, duplicate or unknown answer ids"),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Question not open or not the current one")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path((player_id, position)): Path<(PlayerId, usize)>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<StatusCode, AppError> {
    answer_service::submit_answer(&state, player_id, position, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Results of a question whose answer was shown.
#[utoipa::path(
    get,
    path = "/players/{player_id}/questions/{position}/results",
    tag = "player",
    params(
        ("player_id" = u64, Path, description = "Player identifier"),
        ("position" = usize, Path, description = "Question position")
    ),
    responses(
        (status = 200, description = "Question results", body = QuestionResultResponse),
        (status = 400, description = "Position out of range"),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Question not scored yet")
    )
)]
pub async fn get_question_results(
    State(state): State<SharedState>,
    Path((player_id, position)): Path<(PlayerId, usize)>,
) -> Result<Json<QuestionResultResponse>, AppError> {
    let results = answer_service::get_question_results(&state, player_id, position).await?;
    Ok(Json(results))
}

/// Final ranking of the player's session.
#[utoipa::path(
    get,
    path = "/players/{player_id}/results",
    tag = "player",
    params(("player_id" = u64, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Final ranking", body = FinalResults),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Session not finished yet")
    )
)]
pub async fn get_final_results(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<FinalResults>, AppError> {
    Ok(Json(answer_service::get_final_results(&state, player_id).await?))
}
