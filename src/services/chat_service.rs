use tracing::debug;

use crate::{
    dto::chat::{ChatMessageDto, PostMessageRequest},
    error::ServiceError,
    services::sse_events::broadcast_chat_message,
    state::{SharedState, session::PlayerId},
};

/// Append a message to the chat of the player's session.
pub async fn post_message(
    state: &SharedState,
    player_id: PlayerId,
    request: PostMessageRequest,
) -> Result<ChatMessageDto, ServiceError> {
    let handle = state.session_of_player(player_id)?;
    let mut session = handle.lock().await;
    let author_name = session.player(player_id)?.name.clone();

    if session.phase().is_ended() {
        return Err(ServiceError::SessionAlreadyEnded);
    }

    if request.body.trim().is_empty() {
        return Err(ServiceError::EmptyMessage);
    }

    let max = state.config().chat_max_length;
    let actual = request.body.chars().count();
    if actual > max {
        return Err(ServiceError::MessageTooLong { max, actual });
    }

    let session_id = session.id();
    let message = session
        .chat_mut()
        .append(player_id, &author_name, request.body)
        .clone();
    debug!(%session_id, player_id, sequence = message.sequence, "chat message posted");
    broadcast_chat_message(session.events(), &message);

    Ok(ChatMessageDto::from(&message))
}

/// Full chat history of the player's session, oldest first.
pub async fn get_messages(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<Vec<ChatMessageDto>, ServiceError> {
    let handle = state.session_of_player(player_id)?;
    let session = handle.lock().await;
    session.player(player_id)?;

    Ok(session
        .chat()
        .messages()
        .iter()
        .map(ChatMessageDto::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        error::ErrorKind,
        services::{
            player_service::tests::join,
            session_service::tests::{act, new_session, state_with_quiz},
        },
        state::state_machine::SessionAction,
    };

    fn message(body: &str) -> PostMessageRequest {
        PostMessageRequest { body: body.into() }
    }

    #[tokio::test]
    async fn unknown_player_cannot_chat() {
        let (state, _) = state_with_quiz(1, AppConfig::default());

        let err = post_message(&state, 999, message("hello")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = get_messages(&state, 999).await.unwrap_err();
        assert!(matches!(err, ServiceError::PlayerNotFound(999)));
    }

    #[tokio::test]
    async fn messages_come_back_in_sequence_order() {
        let (state, quiz_id) = state_with_quiz(1, AppConfig::default());
        let session_id = new_session(&state, quiz_id, 0);
        let alice = join(&state, session_id, "alice").await.unwrap().player_id;
        let bob = join(&state, session_id, "bob").await.unwrap().player_id;

        post_message(&state, alice, message("hi")).await.unwrap();
        post_message(&state, bob, message("hello")).await.unwrap();
        post_message(&state, alice, message("ready?")).await.unwrap();

        let history = get_messages(&state, bob).await.unwrap();
        let lines: Vec<_> = history
            .iter()
            .map(|m| (m.sequence, m.author_name.as_str(), m.body.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![(0, "alice", "hi"), (1, "bob", "hello"), (2, "alice", "ready?")]
        );
    }

    #[tokio::test]
    async fn body_length_is_checked() {
        let config = AppConfig {
            chat_max_length: 5,
            ..AppConfig::default()
        };
        let (state, quiz_id) = state_with_quiz(1, config);
        let session_id = new_session(&state, quiz_id, 0);
        let alice = join(&state, session_id, "alice").await.unwrap().player_id;

        assert!(matches!(
            post_message(&state, alice, message("   ")).await,
            Err(ServiceError::EmptyMessage)
        ));
        assert!(matches!(
            post_message(&state, alice, message("toolong")).await,
            Err(ServiceError::MessageTooLong { max: 5, actual: 7 })
        ));
        assert!(matches!(
            post_message(&state, alice, message("  hey  ")).await,
            Err(ServiceError::MessageTooLong { max: 5, actual: 7 })
        ));
        post_message(&state, alice, message("héllo")).await.unwrap();
        let stored = post_message(&state, alice, message(" hi ")).await.unwrap();
        assert_eq!(stored.body, " hi ");
    }

    #[tokio::test]
    async fn chat_is_frozen_after_end_but_still_readable() {
        let (state, quiz_id) = state_with_quiz(1, AppConfig::default());
        let session_id = new_session(&state, quiz_id, 0);
        let alice = join(&state, session_id, "alice").await.unwrap().player_id;
        post_message(&state, alice, message("bye")).await.unwrap();

        act(&state, session_id, SessionAction::End).await.unwrap();

        let err = post_message(&state, alice, message("late")).await.unwrap_err();
        assert!(matches!(err, ServiceError::SessionAlreadyEnded));
        assert_eq!(get_messages(&state, alice).await.unwrap().len(), 1);
    }
}
