use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    state::{chat::ChatMessage, session::PlayerId},
};

/// Chat message posted by a player.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    pub body: String,
}

/// Chat message as returned to clients and broadcast on the event stream.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatMessageDto {
    pub sequence: u64,
    #[schema(value_type = u64)]
    pub author_player_id: PlayerId,
    pub author_name: String,
    pub body: String,
    /// RFC 3339 timestamp.
    pub sent_at: String,
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            sequence: message.sequence,
            author_player_id: message.author_player_id,
            author_name: message.author_name.clone(),
            body: message.body.clone(),
            sent_at: format_system_time(message.sent_at),
        }
    }
}
