use tracing::info;
use uuid::Uuid;

use crate::{
    dto::player::{JoinSessionRequest, PlayerJoined, PlayerStatus, QuestionInfo},
    error::ServiceError,
    services::sse_events::broadcast_player_joined,
    state::{
        SharedState, session::PlayerId, state_machine::SessionPhase,
        transitions::try_auto_start,
    },
};

/// Add a player to a session waiting in the lobby.
///
/// A blank name is replaced by a generated one. When the player count reaches
/// the session's auto-start threshold the first question countdown starts
/// before the lock is released.
pub async fn join_session(
    state: &SharedState,
    session_id: Uuid,
    request: JoinSessionRequest,
) -> Result<PlayerJoined, ServiceError> {
    let handle = state.session(session_id)?;
    let mut session = handle.lock().await;

    if session.phase() != SessionPhase::Lobby {
        return Err(ServiceError::SessionNotInLobby(session.phase()));
    }

    let requested = request.name.as_deref().map(str::trim).unwrap_or_default();
    let name = if requested.is_empty() {
        let mut rng = rand::rng();
        state
            .config()
            .name_generator
            .generate_unique(&mut rng, |candidate| session.name_taken(candidate))
            .ok_or_else(|| {
                ServiceError::Internal("could not generate an unused player name".into())
            })?
    } else if session.name_taken(requested) {
        return Err(ServiceError::NameAlreadyUsed(requested.to_string()));
    } else {
        requested.to_string()
    };

    let player_id = state.allocate_player_id();
    let player = session.add_player(player_id, name).clone();
    state.register_player(player_id, session_id);
    info!(%session_id, player_id, name = %player.name, "player joined");
    broadcast_player_joined(&session, &player);

    try_auto_start(state, &mut session)?;

    Ok(PlayerJoined {
        player_id,
        session_id,
        name: player.name,
    })
}

/// Phase and progress of the player's session.
pub async fn get_player_status(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<PlayerStatus, ServiceError> {
    let handle = state.session_of_player(player_id)?;
    let session = handle.lock().await;
    let player = session.player(player_id)?;
    Ok(PlayerStatus::new(&session, player))
}

/// The question currently displayed, without its correct answers.
pub async fn get_current_question_info(
    state: &SharedState,
    player_id: PlayerId,
    question_position: usize,
) -> Result<QuestionInfo, ServiceError> {
    let handle = state.session_of_player(player_id)?;
    let session = handle.lock().await;
    session.player(player_id)?;

    match session.phase() {
        SessionPhase::QuestionOpen | SessionPhase::QuestionClose | SessionPhase::AnswerShow => {}
        phase => return Err(ServiceError::QuestionNotAvailable(phase)),
    }

    let current = session.question_position();
    if current != Some(question_position) {
        return Err(ServiceError::QuestionPositionMismatch {
            requested: question_position,
            current,
        });
    }

    let question = session
        .question(question_position)
        .ok_or(ServiceError::InvalidQuestionPosition(question_position))?;
    Ok(QuestionInfo::new(question_position, question))
}
