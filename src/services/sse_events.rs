use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        chat::ChatMessageDto,
        sse::{PhaseChangedEvent, PlayerJoinedEvent, ServerEvent},
    },
    state::{
        SseHub,
        chat::ChatMessage,
        session::{Player, Session},
    },
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_PLAYER_JOINED: &str = "player.joined";
const EVENT_CHAT_MESSAGE: &str = "chat.message";

/// Broadcast a session phase change notification.
pub fn broadcast_phase_changed(session: &Session) {
    let payload = PhaseChangedEvent {
        session_id: session.id(),
        phase: session.phase().into(),
        question_position: session.question_position(),
        version: session.version(),
    };
    send_session_event(session.events(), EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast that a player joined the lobby.
pub fn broadcast_player_joined(session: &Session, player: &Player) {
    let payload = PlayerJoinedEvent {
        player_id: player.id,
        name: player.name.clone(),
        player_count: session.player_count(),
    };
    send_session_event(session.events(), EVENT_PLAYER_JOINED, &payload);
}

/// Broadcast a newly posted chat message.
pub fn broadcast_chat_message(hub: &SseHub, message: &ChatMessage) {
    let payload = ChatMessageDto::from(message);
    send_session_event(hub, EVENT_CHAT_MESSAGE, &payload);
}

fn send_session_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize session SSE payload"),
    }
}
