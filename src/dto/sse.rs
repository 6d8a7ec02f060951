use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::phase::VisiblePhase, state::session::PlayerId};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    pub session_id: Uuid,
    pub phase: VisiblePhase,
    pub question_position: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the session phase changes.
pub struct PhaseChangedEvent {
    pub session_id: Uuid,
    pub phase: VisiblePhase,
    pub question_position: Option<usize>,
    /// Number of transitions applied so far.
    pub version: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player joins the lobby.
pub struct PlayerJoinedEvent {
    #[schema(value_type = u64)]
    pub player_id: PlayerId,
    pub name: String,
    pub player_count: usize,
}
