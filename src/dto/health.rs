use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the process serves requests.
    pub status: String,
    /// Sessions held in memory, ended ones included.
    pub sessions: usize,
    /// Players registered across all sessions.
    pub players: usize,
    /// Countdown and question timers waiting to fire.
    pub pending_timers: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(sessions: usize, players: usize, pending_timers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            sessions,
            players,
            pending_timers,
        }
    }
}
