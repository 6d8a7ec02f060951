//! Drives session transitions: plan, side effects, apply, broadcast.
//!
//! Every function here expects the caller to hold the session lock, except
//! [`on_timer_fired`] which acquires it itself.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    services::sse_events::broadcast_phase_changed,
    state::{
        SharedState,
        session::Session,
        state_machine::{SessionEvent, SessionPhase},
        timer::TimerId,
    },
};

/// Apply `event` to `session`.
///
/// The transition is validated before anything changes; an invalid event
/// leaves phase, position, scores and the pending timer untouched.
pub fn run_transition(
    state: &SharedState,
    session: &mut Session,
    event: SessionEvent,
) -> Result<SessionPhase, ServiceError> {
    let plan = session.plan(event)?;

    if let Some(handle) = session.take_pending_timer() {
        state.timers().cancel(handle);
    }

    match plan.to {
        SessionPhase::QuestionCountdown => {
            schedule(
                state,
                session,
                state.config().countdown,
                SessionEvent::CountdownElapsed,
            );
        }
        SessionPhase::QuestionOpen => {
            let position = session.open_next_question(Instant::now());
            let duration = session
                .question(position)
                .map(|question| Duration::from_secs(question.duration_secs.into()))
                .unwrap_or_default();
            schedule(state, session, duration, SessionEvent::DurationElapsed);
        }
        SessionPhase::AnswerShow => {
            session.finalize_current(state.config().scoring);
        }
        SessionPhase::End => {
            state.release_active_slot(session.quiz_id(), session.id());
        }
        SessionPhase::Lobby | SessionPhase::QuestionClose | SessionPhase::FinalResults => {}
    }

    let next = session.apply(plan)?;
    info!(
        session_id = %session.id(),
        from = ?plan.from,
        to = ?next,
        event = ?event,
        question_position = ?session.question_position(),
        "session transition applied"
    );
    broadcast_phase_changed(session);
    Ok(next)
}

/// Leave the lobby once the player count reaches the session's auto-start threshold.
///
/// Returns the new phase when the session started, `None` when nothing happened.
pub fn try_auto_start(
    state: &SharedState,
    session: &mut Session,
) -> Result<Option<SessionPhase>, ServiceError> {
    let threshold = session.auto_start_num();
    if threshold == 0
        || session.player_count() != threshold
        || session.phase() != SessionPhase::Lobby
    {
        return Ok(None);
    }

    info!(session_id = %session.id(), players = threshold, "auto-starting session");
    run_transition(state, session, SessionEvent::NextQuestion).map(Some)
}

/// Timer callback: apply `event` unless the timer was superseded in the meantime.
pub async fn on_timer_fired(
    state: SharedState,
    session_id: Uuid,
    timer_id: TimerId,
    event: SessionEvent,
) {
    let Ok(handle) = state.session(session_id) else {
        debug!(%session_id, timer = %timer_id, "timer fired for unknown session");
        return;
    };
    let mut session = handle.lock().await;

    if session.pending_timer() != Some((timer_id, event)) {
        debug!(
            %session_id,
            timer = %timer_id,
            event = ?event,
            phase = ?session.phase(),
            "stale timer ignored"
        );
        return;
    }

    // The firing task is the one in the slot; drop the handle without aborting it.
    drop(session.take_pending_timer());

    if let Err(err) = run_transition(&state, &mut session, event) {
        debug!(%session_id, timer = %timer_id, error = %err, "timer transition skipped");
    }
}

fn schedule(state: &SharedState, session: &mut Session, delay: Duration, event: SessionEvent) {
    let session_id = session.id();
    let owner = SharedState::clone(state);
    let handle = state.timers().schedule_after(delay, move |timer_id| {
        on_timer_fired(owner, session_id, timer_id, event)
    });
    debug!(%session_id, timer = %handle.id(), event = ?event, ?delay, "timer scheduled");

    if let Some(previous) = session.set_pending_timer(handle, event) {
        state.timers().cancel(previous);
    }
}
