use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        quiz::QuizSummary,
        session::{
            CreateSessionRequest, SessionActionRequest, SessionCreated, SessionList, SessionStatus,
        },
    },
    error::ServiceError,
    state::{SharedState, session::Session, transitions::run_transition},
};

/// Every quiz a session can be created from, sorted by name.
pub fn list_quizzes(state: &SharedState) -> Vec<QuizSummary> {
    state
        .quizzes()
        .list()
        .iter()
        .map(|quiz| QuizSummary::from(quiz.as_ref()))
        .collect()
}

/// Open a new session of `quiz_id` in the lobby.
pub fn create_session(
    state: &SharedState,
    quiz_id: Uuid,
    request: CreateSessionRequest,
) -> Result<SessionCreated, ServiceError> {
    let quiz = state
        .quizzes()
        .get(quiz_id)
        .ok_or(ServiceError::QuizNotFound(quiz_id))?;

    if quiz.questions.is_empty() {
        return Err(ServiceError::InvalidQuiz(format!(
            "quiz `{}` has no questions",
            quiz.name
        )));
    }

    let auto_start_num = validate_auto_start_num(state, request.auto_start_num)?;

    let session = Session::new(
        Uuid::new_v4(),
        &quiz,
        auto_start_num,
        state.config().last_question_policy,
    );
    let session_id = session.id();
    state.insert_session(session)?;

    info!(%session_id, %quiz_id, auto_start_num, "session created");
    Ok(SessionCreated { session_id })
}

/// Current state of a session.
pub async fn get_session(state: &SharedState, session_id: Uuid) -> Result<SessionStatus, ServiceError> {
    let handle = state.session(session_id)?;
    let session = handle.lock().await;
    Ok(SessionStatus::from(&*session))
}

/// Session ids of a quiz, split into active and ended.
pub fn list_sessions(state: &SharedState, quiz_id: Uuid) -> Result<SessionList, ServiceError> {
    if state.quizzes().get(quiz_id).is_none() {
        return Err(ServiceError::QuizNotFound(quiz_id));
    }
    let (active, inactive) = state.sessions_of_quiz(quiz_id);
    Ok(SessionList { active, inactive })
}

/// Apply a host action to a session and return its new state.
pub async fn update_session_action(
    state: &SharedState,
    session_id: Uuid,
    request: SessionActionRequest,
) -> Result<SessionStatus, ServiceError> {
    let handle = state.session(session_id)?;
    let mut session = handle.lock().await;
    run_transition(state, &mut session, request.action.into())?;
    Ok(SessionStatus::from(&*session))
}

fn validate_auto_start_num(state: &SharedState, requested: i64) -> Result<usize, ServiceError> {
    let max = state.config().max_auto_start_num;
    usize::try_from(requested)
        .ok()
        .filter(|value| *value <= max)
        .ok_or_else(|| {
            ServiceError::InvalidConfig(format!("auto_start_num must be between 0 and {max}"))
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::phase::VisiblePhase,
        error::ErrorKind,
        state::{AppState, session::tests::sample_quiz, state_machine::SessionAction},
    };

    pub(crate) fn state_with_quiz(questions: usize, config: AppConfig) -> (SharedState, Uuid) {
        let state = AppState::new(config);
        let quiz_id = state.quizzes().insert(sample_quiz(questions));
        (state, quiz_id)
    }

    pub(crate) fn new_session(state: &SharedState, quiz_id: Uuid, auto_start_num: i64) -> Uuid {
        create_session(state, quiz_id, CreateSessionRequest { auto_start_num })
            .unwrap()
            .session_id
    }

    pub(crate) async fn act(
        state: &SharedState,
        session_id: Uuid,
        action: SessionAction,
    ) -> Result<SessionStatus, ServiceError> {
        update_session_action(state, session_id, SessionActionRequest { action }).await
    }

    #[tokio::test]
    async fn create_and_get_session() {
        let (state, quiz_id) = state_with_quiz(3, AppConfig::default());
        let session_id = new_session(&state, quiz_id, 0);

        let status = get_session(&state, session_id).await.unwrap();
        assert_eq!(status.phase, VisiblePhase::Lobby);
        assert_eq!(status.question_position, None);
        assert_eq!(status.num_questions, 3);
        assert!(status.players.is_empty());
    }

    #[test]
    fn create_session_validation() {
        let (state, quiz_id) = state_with_quiz(1, AppConfig::default());
        let empty_quiz = state.quizzes().insert(sample_quiz(0));

        let unknown = create_session(&state, Uuid::new_v4(), CreateSessionRequest::default());
        assert!(matches!(unknown, Err(ServiceError::QuizNotFound(_))));

        let empty = create_session(&state, empty_quiz, CreateSessionRequest::default());
        assert!(matches!(empty, Err(ServiceError::InvalidQuiz(_))));

        for auto_start_num in [-1, 51] {
            let err = create_session(&state, quiz_id, CreateSessionRequest { auto_start_num })
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn active_session_limit_counts_only_non_ended_sessions() {
        let config = AppConfig {
            max_active_sessions_per_quiz: 2,
            ..AppConfig::default()
        };
        let (state, quiz_id) = state_with_quiz(1, config);
        new_session(&state, quiz_id, 0);
        new_session(&state, quiz_id, 0);

        let err = create_session(&state, quiz_id, CreateSessionRequest::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn ended_sessions_are_listed_as_inactive() {
        let (state, quiz_id) = state_with_quiz(1, AppConfig::default());
        let first = new_session(&state, quiz_id, 0);
        let second = new_session(&state, quiz_id, 0);

        act(&state, first, SessionAction::End).await.unwrap();

        let list = list_sessions(&state, quiz_id).unwrap();
        assert_eq!(list.active, vec![second]);
        assert_eq!(list.inactive, vec![first]);
        assert!(matches!(
            list_sessions(&state, Uuid::new_v4()),
            Err(ServiceError::QuizNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn question_position_is_monotonic_and_bounded() {
        let (state, quiz_id) = state_with_quiz(3, AppConfig::default());
        let session_id = new_session(&state, quiz_id, 0);

        let mut positions = Vec::new();
        act(&state, session_id, SessionAction::NextQuestion).await.unwrap();
        loop {
            tokio::time::sleep(Duration::from_millis(3_100)).await;
            let status = act(&state, session_id, SessionAction::GoToAnswer).await.unwrap();
            positions.push(status.question_position.unwrap());
            act(&state, session_id, SessionAction::ShowAnswer).await.unwrap();

            match act(&state, session_id, SessionAction::NextQuestion).await {
                Ok(_) => continue,
                Err(err) => {
                    assert!(matches!(err, ServiceError::NoMoreQuestions));
                    break;
                }
            }
        }

        assert_eq!(positions, vec![0, 1, 2]);
        let status = act(&state, session_id, SessionAction::Finish).await.unwrap();
        assert_eq!(status.phase, VisiblePhase::FinalResults);
        assert_eq!(status.question_position, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn finish_before_last_question_is_rejected() {
        let (state, quiz_id) = state_with_quiz(2, AppConfig::default());
        let session_id = new_session(&state, quiz_id, 0);

        act(&state, session_id, SessionAction::NextQuestion).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_100)).await;
        act(&state, session_id, SessionAction::GoToAnswer).await.unwrap();
        act(&state, session_id, SessionAction::ShowAnswer).await.unwrap();

        let err = act(&state, session_id, SessionAction::Finish).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidAction { .. }));
        let status = get_session(&state, session_id).await.unwrap();
        assert_eq!(status.phase, VisiblePhase::AnswerShow);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_policy_ends_on_next_question() {
        let config = AppConfig {
            last_question_policy: crate::state::state_machine::LastQuestionPolicy::Finish,
            ..AppConfig::default()
        };
        let (state, quiz_id) = state_with_quiz(1, config);
        let session_id = new_session(&state, quiz_id, 0);

        act(&state, session_id, SessionAction::NextQuestion).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_100)).await;
        act(&state, session_id, SessionAction::GoToAnswer).await.unwrap();
        act(&state, session_id, SessionAction::ShowAnswer).await.unwrap();

        let status = act(&state, session_id, SessionAction::NextQuestion).await.unwrap();
        assert_eq!(status.phase, VisiblePhase::FinalResults);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (state, _) = state_with_quiz(1, AppConfig::default());
        let err = act(&state, Uuid::new_v4(), SessionAction::End).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
