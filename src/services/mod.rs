/// Answer submission and results.
pub mod answer_service;
/// Session chat.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Player admission and player-scoped views.
pub mod player_service;
/// Session creation, lookup and host actions.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming.
pub mod sse_service;
