use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::SessionPhase;

/// Session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisiblePhase {
    /// Waiting for players.
    Lobby,
    /// Countdown before the next question.
    QuestionCountdown,
    /// Question accepting answers.
    QuestionOpen,
    /// Question closed, answer not revealed yet.
    QuestionClose,
    /// Answer and question results displayed.
    AnswerShow,
    /// Final ranking displayed.
    FinalResults,
    /// Session archived.
    End,
}

impl From<SessionPhase> for VisiblePhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Lobby => VisiblePhase::Lobby,
            SessionPhase::QuestionCountdown => VisiblePhase::QuestionCountdown,
            SessionPhase::QuestionOpen => VisiblePhase::QuestionOpen,
            SessionPhase::QuestionClose => VisiblePhase::QuestionClose,
            SessionPhase::AnswerShow => VisiblePhase::AnswerShow,
            SessionPhase::FinalResults => VisiblePhase::FinalResults,
            SessionPhase::End => VisiblePhase::End,
        }
    }
}
