use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness with in-memory session, player and timer counts.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(
        state.session_count(),
        state.player_count(),
        state.timers().pending(),
    )
}
