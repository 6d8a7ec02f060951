use tokio::time::Instant;
use tracing::debug;

use crate::{
    dto::{
        player::SubmitAnswerRequest,
        results::{FinalResults, QuestionResultResponse},
    },
    error::ServiceError,
    state::{SharedState, session::PlayerId, state_machine::SessionPhase},
};

/// Record the player's answer to the open question.
///
/// Submitting again before the question closes replaces the earlier answer.
pub async fn submit_answer(
    state: &SharedState,
    player_id: PlayerId,
    question_position: usize,
    request: SubmitAnswerRequest,
) -> Result<(), ServiceError> {
    let handle = state.session_of_player(player_id)?;
    let mut session = handle.lock().await;
    session.submit_answer(player_id, question_position, &request.answer_ids, Instant::now())?;
    debug!(
        session_id = %session.id(),
        player_id,
        question_position,
        submissions = session.submission_count(question_position),
        "answer recorded"
    );
    Ok(())
}

/// Results of a question once its answer has been shown.
pub async fn get_question_results(
    state: &SharedState,
    player_id: PlayerId,
    question_position: usize,
) -> Result<QuestionResultResponse, ServiceError> {
    let handle = state.session_of_player(player_id)?;
    let session = handle.lock().await;
    session.player(player_id)?;

    if question_position >= session.num_questions() {
        return Err(ServiceError::InvalidQuestionPosition(question_position));
    }

    let result = session.question_result(question_position).ok_or_else(|| {
        ServiceError::ResultsNotAvailable(format!(
            "question {question_position} has not been scored yet"
        ))
    })?;
    Ok(QuestionResultResponse::new(&session, result))
}

/// Final ranking of the player's session.
pub async fn get_final_results(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<FinalResults, ServiceError> {
    let handle = state.session_of_player(player_id)?;
    let session = handle.lock().await;
    session.player(player_id)?;

    match session.phase() {
        SessionPhase::FinalResults | SessionPhase::End => Ok(FinalResults::from(&*session)),
        phase => Err(ServiceError::ResultsNotAvailable(format!(
            "final results are not shown while in {phase:?}"
        ))),
    }
}
