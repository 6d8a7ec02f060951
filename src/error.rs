use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::state::{
    session::PlayerId,
    state_machine::{ApplyError, PlanError, SessionEvent, SessionPhase},
};

/// Broad classification of service failures, used for transport status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Session, player, quiz or question absent.
    NotFound,
    /// Action illegal for the current phase.
    InvalidState,
    /// Malformed input.
    Validation,
    /// Name collision, exhausted policy limit or already-ended session.
    Conflict,
    /// Broken internal invariant.
    Internal,
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No quiz with this id is registered.
    #[error("quiz `{0}` not found")]
    QuizNotFound(Uuid),
    /// No session with this id exists.
    #[error("session `{0}` not found")]
    SessionNotFound(Uuid),
    /// No player with this id joined the session.
    #[error("player `{0}` not found")]
    PlayerNotFound(PlayerId),
    /// The quiz cannot be played.
    #[error("invalid quiz: {0}")]
    InvalidQuiz(String),
    /// Session settings are out of range.
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),
    /// The quiz already runs the maximum number of sessions.
    #[error("quiz `{quiz_id}` already has {limit} active sessions")]
    TooManyActiveSessions {
        /// Quiz whose limit is reached.
        quiz_id: Uuid,
        /// Configured limit.
        limit: usize,
    },
    /// Players may only join while the session is in the lobby.
    #[error("session is not in the lobby (current phase {0:?})")]
    SessionNotInLobby(SessionPhase),
    /// Another player of the session already uses this name.
    #[error("name `{0}` is already used in this session")]
    NameAlreadyUsed(String),
    /// The requested action is not allowed in the current phase.
    #[error("action {event:?} cannot be applied while in {phase:?}")]
    InvalidAction {
        /// Rejected event.
        event: SessionEvent,
        /// Phase the session was in.
        phase: SessionPhase,
    },
    /// The session is already on its last question.
    #[error("no more questions in this session")]
    NoMoreQuestions,
    /// The session reached its terminal phase.
    #[error("session already ended")]
    SessionAlreadyEnded,
    /// Answers are only accepted while a question is open.
    #[error("question is not open (current phase {0:?})")]
    SessionNotQuestionOpen(SessionPhase),
    /// The caller refers to a question other than the current one.
    #[error("question position {requested} is not the current one ({current:?})")]
    QuestionPositionMismatch {
        /// Position supplied by the caller.
        requested: usize,
        /// Position of the session.
        current: Option<usize>,
    },
    /// The position does not exist in the session.
    #[error("question position {0} is out of range")]
    InvalidQuestionPosition(usize),
    /// Question details are hidden in the current phase.
    #[error("question is not available while in {0:?}")]
    QuestionNotAvailable(SessionPhase),
    /// Results have not been computed yet.
    #[error("results are not available: {0}")]
    ResultsNotAvailable(String),
    /// No answer id was supplied.
    #[error("at least one answer id must be supplied")]
    EmptyAnswerIds,
    /// The same answer id was supplied more than once.
    #[error("answer ids must not repeat")]
    DuplicateAnswerIds,
    /// Some answer ids do not belong to the current question.
    #[error("answer ids {0:?} do not belong to the current question")]
    InvalidAnswerIds(Vec<u64>),
    /// Blank chat message.
    #[error("message must not be empty")]
    EmptyMessage,
    /// Chat message above the configured cap.
    #[error("message is {actual} characters long, the limit is {max}")]
    MessageTooLong {
        /// Configured cap.
        max: usize,
        /// Length of the rejected body.
        actual: usize,
    },
    /// Broken internal invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Classify the error for transport status mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::QuizNotFound(_)
            | ServiceError::SessionNotFound(_)
            | ServiceError::PlayerNotFound(_) => ErrorKind::NotFound,
            ServiceError::SessionNotInLobby(_)
            | ServiceError::InvalidAction { .. }
            | ServiceError::NoMoreQuestions
            | ServiceError::SessionNotQuestionOpen(_)
            | ServiceError::QuestionPositionMismatch { .. }
            | ServiceError::QuestionNotAvailable(_)
            | ServiceError::ResultsNotAvailable(_) => ErrorKind::InvalidState,
            ServiceError::InvalidQuiz(_)
            | ServiceError::InvalidConfig(_)
            | ServiceError::InvalidQuestionPosition(_)
            | ServiceError::EmptyAnswerIds
            | ServiceError::DuplicateAnswerIds
            | ServiceError::InvalidAnswerIds(_)
            | ServiceError::EmptyMessage
            | ServiceError::MessageTooLong { .. } => ErrorKind::Validation,
            ServiceError::TooManyActiveSessions { .. }
            | ServiceError::NameAlreadyUsed(_)
            | ServiceError::SessionAlreadyEnded => ErrorKind::Conflict,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable identifier of the error.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::QuizNotFound(_) => "QuizNotFound",
            ServiceError::SessionNotFound(_) => "SessionNotFound",
            ServiceError::PlayerNotFound(_) => "PlayerNotFound",
            ServiceError::InvalidQuiz(_) => "InvalidQuiz",
            ServiceError::InvalidConfig(_) => "InvalidConfig",
            ServiceError::TooManyActiveSessions { .. } => "TooManyActiveSessions",
            ServiceError::SessionNotInLobby(_) => "SessionNotInLobby",
            ServiceError::NameAlreadyUsed(_) => "NameAlreadyUsed",
            ServiceError::InvalidAction { .. } => "InvalidAction",
            ServiceError::NoMoreQuestions => "NoMoreQuestions",
            ServiceError::SessionAlreadyEnded => "SessionAlreadyEnded",
            ServiceError::SessionNotQuestionOpen(_) => "SessionNotQuestionOpen",
            ServiceError::QuestionPositionMismatch { .. } => "QuestionPositionMismatch",
            ServiceError::InvalidQuestionPosition(_) => "InvalidQuestionPosition",
            ServiceError::QuestionNotAvailable(_) => "QuestionNotAvailable",
            ServiceError::ResultsNotAvailable(_) => "ResultsNotAvailable",
            ServiceError::EmptyAnswerIds => "EmptyAnswerIds",
            ServiceError::DuplicateAnswerIds => "DuplicateAnswerIds",
            ServiceError::InvalidAnswerIds(_) => "InvalidAnswerIds",
            ServiceError::EmptyMessage => "EmptyMessage",
            ServiceError::MessageTooLong { .. } => "MessageTooLong",
            ServiceError::Internal(_) => "Internal",
        }
    }
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::InvalidTransition(invalid) => ServiceError::InvalidAction {
                event: invalid.event,
                phase: invalid.from,
            },
            PlanError::NoMoreQuestions => ServiceError::NoMoreQuestions,
            PlanError::AlreadyEnded => ServiceError::SessionAlreadyEnded,
        }
    }
}

impl From<ApplyError> for ServiceError {
    fn from(err: ApplyError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input.
    #[error("{message}")]
    BadRequest {
        /// Machine-readable error code.
        code: &'static str,
        /// Human-readable description.
        message: String,
    },
    /// Requested resource not found.
    #[error("{message}")]
    NotFound {
        /// Machine-readable error code.
        code: &'static str,
        /// Human-readable description.
        message: String,
    },
    /// Conflict with the current state.
    #[error("{message}")]
    Conflict {
        /// Machine-readable error code.
        code: &'static str,
        /// Human-readable description.
        message: String,
    },
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => AppError::NotFound { code, message },
            ErrorKind::Validation => AppError::BadRequest { code, message },
            ErrorKind::InvalidState | ErrorKind::Conflict => AppError::Conflict { code, message },
            ErrorKind::Internal => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            AppError::BadRequest { code, .. } => (StatusCode::BAD_REQUEST, *code),
            AppError::NotFound { code, .. } => (StatusCode::NOT_FOUND, *code),
            AppError::Conflict { code, .. } => (StatusCode::CONFLICT, *code),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal"),
        };

        let payload = Json(ErrorBody {
            error: code,
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::InvalidTransition;

    #[test]
    fn invalid_transition_maps_to_invalid_action() {
        let err: ServiceError = PlanError::InvalidTransition(InvalidTransition {
            from: SessionPhase::Lobby,
            event: SessionEvent::ShowAnswer,
        })
        .into();

        assert_eq!(err.code(), "InvalidAction");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn kinds_map_to_status_codes() {
        let cases = [
            (ServiceError::PlayerNotFound(4), StatusCode::NOT_FOUND),
            (ServiceError::EmptyMessage, StatusCode::BAD_REQUEST),
            (ServiceError::NameAlreadyUsed("bob".into()), StatusCode::CONFLICT),
            (
                ServiceError::SessionNotInLobby(SessionPhase::QuestionOpen),
                StatusCode::CONFLICT,
            ),
            (ServiceError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
