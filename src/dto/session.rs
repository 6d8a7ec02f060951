use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{format_system_time, phase::VisiblePhase},
    state::{session::Session, state_machine::SessionAction},
};

/// Payload used to open a new session of a quiz.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Player count that starts the session automatically; 0 disables auto-start.
    #[serde(default)]
    pub auto_start_num: i64,
}

/// Identifier of a freshly created session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// Host action applied to a session.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SessionActionRequest {
    pub action: SessionAction,
}

/// Public state of a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub quiz_id: Uuid,
    pub quiz_name: String,
    pub phase: VisiblePhase,
    /// Index of the current question, absent before the first one opened.
    pub question_position: Option<usize>,
    pub num_questions: usize,
    pub auto_start_num: usize,
    /// Player names in join order.
    pub players: Vec<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<&Session> for SessionStatus {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id(),
            quiz_id: session.quiz_id(),
            quiz_name: session.quiz_name().to_string(),
            phase: session.phase().into(),
            question_position: session.question_position(),
            num_questions: session.num_questions(),
            auto_start_num: session.auto_start_num(),
            players: session.players().map(|player| player.name.clone()).collect(),
            created_at: format_system_time(session.created_at()),
        }
    }
}

/// Sessions of a quiz split by whether they ended.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionList {
    pub active: Vec<Uuid>,
    pub inactive: Vec<Uuid>,
}
