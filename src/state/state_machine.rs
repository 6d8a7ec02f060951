use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle phases a quiz session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Players may join; no question has been shown yet.
    Lobby,
    /// Short countdown before the next question opens.
    QuestionCountdown,
    /// The current question accepts answers until its duration elapses.
    QuestionOpen,
    /// Answers are no longer accepted; waiting for the host to reveal.
    QuestionClose,
    /// The correct answer and the question results are displayed.
    AnswerShow,
    /// Final ranking is displayed.
    FinalResults,
    /// Terminal state; the session is archived.
    End,
}

impl SessionPhase {
    /// Whether the session has been archived.
    pub fn is_ended(self) -> bool {
        matches!(self, SessionPhase::End)
    }
}

/// What the session does when the host asks for another question after the last one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastQuestionPolicy {
    /// Fail with `NoMoreQuestions`; the host has to finish explicitly.
    #[default]
    Reject,
    /// Move straight to the final results.
    Finish,
}

/// Actions a host may request through `UpdateSessionAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionAction {
    /// Leave the lobby or move on from the answer display.
    NextQuestion,
    /// Close the open question before its timer elapses.
    GoToAnswer,
    /// Reveal the answer of the closed question and score it.
    ShowAnswer,
    /// Show the final results after the last question.
    Finish,
    /// Archive the session.
    End,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Host action or auto-start asking for the next question.
    NextQuestion,
    /// Countdown timer fired.
    CountdownElapsed,
    /// Question duration timer fired.
    DurationElapsed,
    /// Host forced the question closed.
    GoToAnswer,
    /// Host revealed the answer.
    ShowAnswer,
    /// Host displayed the final results.
    Finish,
    /// Host ended the session.
    End,
}

impl From<SessionAction> for SessionEvent {
    fn from(action: SessionAction) -> Self {
        match action {
            SessionAction::NextQuestion => SessionEvent::NextQuestion,
            SessionAction::GoToAnswer => SessionEvent::GoToAnswer,
            SessionAction::ShowAnswer => SessionEvent::ShowAnswer,
            SessionAction::Finish => SessionEvent::Finish,
            SessionAction::End => SessionEvent::End,
        }
    }
}

/// Question progress needed to decide transitions that depend on the quiz length.
#[derive(Debug, Clone, Copy)]
pub struct QuestionCursor {
    /// Index of the current question, `None` before the first one opened.
    pub position: Option<usize>,
    /// Number of questions in the session snapshot.
    pub num_questions: usize,
}

impl QuestionCursor {
    /// Index the next question would have.
    pub fn next_position(&self) -> usize {
        self.position.map_or(0, |position| position + 1)
    }

    /// Whether another question exists after the current one.
    pub fn has_next(&self) -> bool {
        self.next_position() < self.num_questions
    }

    /// Whether the current question is the last one of the quiz.
    pub fn on_last(&self) -> bool {
        self.position
            .is_some_and(|position| position + 1 == self.num_questions)
    }
}

/// Error returned when an event is not allowed from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the event was received.
    pub from: SessionPhase,
    /// The rejected event.
    pub event: SessionEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The event is not part of the transition table for the current phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// The host asked for a question after the last one.
    #[error("no more questions in this session")]
    NoMoreQuestions,
    /// The session already reached its terminal state.
    #[error("session already ended")]
    AlreadyEnded,
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// State machine phase changed since the plan was created.
    #[error("phase changed during transition (expected {expected:?}, got {actual:?})")]
    PhaseMismatch {
        /// Phase when the plan was created.
        expected: SessionPhase,
        /// Current phase.
        actual: SessionPhase,
    },
    /// State machine version changed since the plan was created.
    #[error("version changed during transition (expected {expected}, got {actual})")]
    VersionMismatch {
        /// Version the plan expects to produce.
        expected: u64,
        /// Version the machine would produce now.
        actual: u64,
    },
}

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Phase the state machine is currently in.
    pub from: SessionPhase,
    /// Phase the state machine will move to.
    pub to: SessionPhase,
    /// Event that triggered this transition.
    pub event: SessionEvent,
    /// Version number after applying this transition.
    pub version_next: u64,
}

/// Per-session state machine enforcing the lifecycle transition table.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    version: u64,
    last_question_policy: LastQuestionPolicy,
}

impl SessionStateMachine {
    /// Create a state machine in the lobby.
    pub fn new(last_question_policy: LastQuestionPolicy) -> Self {
        Self {
            phase: SessionPhase::Lobby,
            version: 0,
            last_question_policy,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Validate that `event` can be applied from the current phase.
    ///
    /// Planning has no side effects; callers perform the transition's work and
    /// then [`apply`](Self::apply) the plan, so a failure in between leaves the
    /// machine untouched.
    pub fn plan(&self, event: SessionEvent, cursor: QuestionCursor) -> Result<Plan, PlanError> {
        let to = self.compute_transition(event, cursor)?;
        Ok(Plan {
            from: self.phase,
            to,
            event,
            version_next: self.version + 1,
        })
    }

    /// Apply a plan produced by [`plan`](Self::plan) and return the new phase.
    pub fn apply(&mut self, plan: Plan) -> Result<SessionPhase, ApplyError> {
        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        Ok(self.phase)
    }

    fn compute_transition(
        &self,
        event: SessionEvent,
        cursor: QuestionCursor,
    ) -> Result<SessionPhase, PlanError> {
        use SessionEvent as E;
        use SessionPhase as P;

        let next = match (self.phase, event) {
            (P::End, E::End) => return Err(PlanError::AlreadyEnded),
            (_, E::End) => P::End,
            (P::Lobby, E::NextQuestion) => P::QuestionCountdown,
            (P::QuestionCountdown, E::CountdownElapsed) => P::QuestionOpen,
            (P::QuestionOpen, E::DurationElapsed | E::GoToAnswer) => P::QuestionClose,
            (P::QuestionClose, E::ShowAnswer) => P::AnswerShow,
            (P::AnswerShow, E::NextQuestion) if cursor.has_next() => P::QuestionCountdown,
            (P::AnswerShow, E::NextQuestion) => match self.last_question_policy {
                LastQuestionPolicy::Reject => return Err(PlanError::NoMoreQuestions),
                LastQuestionPolicy::Finish => P::FinalResults,
            },
            (P::AnswerShow, E::Finish) if cursor.on_last() => P::FinalResults,
            (from, event) => return Err(InvalidTransition { from, event }.into()),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(position: Option<usize>, num_questions: usize) -> QuestionCursor {
        QuestionCursor {
            position,
            num_questions,
        }
    }

    fn apply(sm: &mut SessionStateMachine, event: SessionEvent, at: QuestionCursor) -> SessionPhase {
        let plan = sm.plan(event, at).unwrap();
        sm.apply(plan).unwrap()
    }

    #[test]
    fn initial_state_is_lobby() {
        let sm = SessionStateMachine::new(LastQuestionPolicy::Reject);
        assert_eq!(sm.phase(), SessionPhase::Lobby);
        assert_eq!(sm.version(), 0);
    }

    #[test]
    fn full_happy_path_through_two_questions() {
        let mut sm = SessionStateMachine::new(LastQuestionPolicy::Reject);

        assert_eq!(
            apply(&mut sm, SessionEvent::NextQuestion, cursor(None, 2)),
            SessionPhase::QuestionCountdown
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::CountdownElapsed, cursor(None, 2)),
            SessionPhase::QuestionOpen
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::DurationElapsed, cursor(Some(0), 2)),
            SessionPhase::QuestionClose
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::ShowAnswer, cursor(Some(0), 2)),
            SessionPhase::AnswerShow
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::NextQuestion, cursor(Some(0), 2)),
            SessionPhase::QuestionCountdown
        );
        apply(&mut sm, SessionEvent::CountdownElapsed, cursor(Some(0), 2));
        apply(&mut sm, SessionEvent::GoToAnswer, cursor(Some(1), 2));
        apply(&mut sm, SessionEvent::ShowAnswer, cursor(Some(1), 2));
        assert_eq!(
            apply(&mut sm, SessionEvent::Finish, cursor(Some(1), 2)),
            SessionPhase::FinalResults
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::End, cursor(Some(1), 2)),
            SessionPhase::End
        );
        assert_eq!(sm.version(), 10);
    }

    #[test]
    fn next_question_after_last_is_rejected_by_default() {
        let mut sm = SessionStateMachine::new(LastQuestionPolicy::Reject);
        apply(&mut sm, SessionEvent::NextQuestion, cursor(None, 1));
        apply(&mut sm, SessionEvent::CountdownElapsed, cursor(None, 1));
        apply(&mut sm, SessionEvent::GoToAnswer, cursor(Some(0), 1));
        apply(&mut sm, SessionEvent::ShowAnswer, cursor(Some(0), 1));

        let err = sm
            .plan(SessionEvent::NextQuestion, cursor(Some(0), 1))
            .unwrap_err();
        assert_eq!(err, PlanError::NoMoreQuestions);
        assert_eq!(sm.phase(), SessionPhase::AnswerShow);
    }

    #[test]
    fn next_question_after_last_finishes_with_finish_policy() {
        let mut sm = SessionStateMachine::new(LastQuestionPolicy::Finish);
        apply(&mut sm, SessionEvent::NextQuestion, cursor(None, 1));
        apply(&mut sm, SessionEvent::CountdownElapsed, cursor(None, 1));
        apply(&mut sm, SessionEvent::GoToAnswer, cursor(Some(0), 1));
        apply(&mut sm, SessionEvent::ShowAnswer, cursor(Some(0), 1));

        assert_eq!(
            apply(&mut sm, SessionEvent::NextQuestion, cursor(Some(0), 1)),
            SessionPhase::FinalResults
        );
    }

    #[test]
    fn finish_before_last_question_is_invalid() {
        let mut sm = SessionStateMachine::new(LastQuestionPolicy::Reject);
        apply(&mut sm, SessionEvent::NextQuestion, cursor(None, 3));
        apply(&mut sm, SessionEvent::CountdownElapsed, cursor(None, 3));
        apply(&mut sm, SessionEvent::GoToAnswer, cursor(Some(0), 3));
        apply(&mut sm, SessionEvent::ShowAnswer, cursor(Some(0), 3));

        let err = sm.plan(SessionEvent::Finish, cursor(Some(0), 3)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition(_)));
    }

    #[test]
    fn end_is_reachable_from_every_phase_but_end() {
        let mut sm = SessionStateMachine::new(LastQuestionPolicy::Reject);
        apply(&mut sm, SessionEvent::NextQuestion, cursor(None, 1));
        assert_eq!(
            apply(&mut sm, SessionEvent::End, cursor(None, 1)),
            SessionPhase::End
        );

        let err = sm.plan(SessionEvent::End, cursor(None, 1)).unwrap_err();
        assert_eq!(err, PlanError::AlreadyEnded);
    }

    #[test]
    fn timer_events_are_invalid_outside_their_phase() {
        let sm = SessionStateMachine::new(LastQuestionPolicy::Reject);
        for event in [SessionEvent::CountdownElapsed, SessionEvent::DurationElapsed] {
            match sm.plan(event, cursor(None, 1)).unwrap_err() {
                PlanError::InvalidTransition(invalid) => {
                    assert_eq!(invalid.from, SessionPhase::Lobby);
                    assert_eq!(invalid.event, event);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn stale_plan_is_refused() {
        let mut sm = SessionStateMachine::new(LastQuestionPolicy::Reject);
        let stale = sm.plan(SessionEvent::NextQuestion, cursor(None, 1)).unwrap();
        apply(&mut sm, SessionEvent::End, cursor(None, 1));

        let err = sm.apply(stale).unwrap_err();
        assert_eq!(
            err,
            ApplyError::PhaseMismatch {
                expected: SessionPhase::Lobby,
                actual: SessionPhase::End,
            }
        );
    }
}
