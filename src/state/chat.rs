use std::time::SystemTime;

use crate::state::session::PlayerId;

/// Message posted by a player in a session chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Ordering key, strictly increasing within the session.
    pub sequence: u64,
    /// Player who posted the message.
    pub author_player_id: PlayerId,
    /// Display name of the author at posting time.
    pub author_name: String,
    /// Message body.
    pub body: String,
    /// Wall-clock time the message was accepted.
    pub sent_at: SystemTime,
}

/// Append-only chat log of one session.
#[derive(Debug, Default)]
pub struct ChatFeed {
    messages: Vec<ChatMessage>,
    next_sequence: u64,
}

impl ChatFeed {
    /// Append a message and return it with its sequence number.
    pub fn append(&mut self, author_player_id: PlayerId, author_name: &str, body: String) -> &ChatMessage {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.messages.push(ChatMessage {
            sequence,
            author_player_id,
            author_name: author_name.to_string(),
            body,
            sent_at: SystemTime::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Full history, ordered by sequence.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}
