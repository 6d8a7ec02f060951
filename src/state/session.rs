//! In-memory aggregate for one quiz session: phase, players, question
//! snapshot, submissions, results and chat.
//!
//! A `Session` is always accessed through its own mutex; none of the methods
//! here synchronize on their own.

use std::{collections::BTreeSet, time::SystemTime};

use indexmap::IndexMap;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    state::{
        chat::ChatFeed,
        quiz::{Question, Quiz},
        scoring::{QuestionResult, ScoringFormula, Submission, finalize_question},
        sse::SseHub,
        state_machine::{
            ApplyError, LastQuestionPolicy, Plan, PlanError, QuestionCursor, SessionEvent,
            SessionPhase, SessionStateMachine,
        },
        timer::{TimerHandle, TimerId},
    },
};

/// Player identifier, allocated from a process-wide increasing counter.
pub type PlayerId = u64;

/// Capacity of each session's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Player who joined a session.
#[derive(Debug, Clone)]
pub struct Player {
    /// Identifier of the player.
    pub id: PlayerId,
    /// Display name, unique within the session.
    pub name: String,
    /// Score accumulated over finalized questions.
    pub score: f64,
    /// When the player joined.
    pub joined_at: SystemTime,
}

#[derive(Debug)]
struct PendingTimer {
    handle: TimerHandle,
    event: SessionEvent,
}

#[derive(Debug, Default)]
struct QuestionRound {
    opened_at: Option<Instant>,
    submissions: IndexMap<PlayerId, Submission>,
    result: Option<QuestionResult>,
}

/// Aggregate state of one session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    quiz_id: Uuid,
    quiz_name: String,
    created_at: SystemTime,
    auto_start_num: usize,
    machine: SessionStateMachine,
    question_position: Option<usize>,
    questions: Vec<Question>,
    rounds: Vec<QuestionRound>,
    players: IndexMap<PlayerId, Player>,
    pending_timer: Option<PendingTimer>,
    next_submission: u64,
    chat: ChatFeed,
    events: SseHub,
}

impl Session {
    /// Snapshot `quiz` into a new session waiting in the lobby.
    pub fn new(
        id: Uuid,
        quiz: &Quiz,
        auto_start_num: usize,
        last_question_policy: LastQuestionPolicy,
    ) -> Self {
        Self {
            id,
            quiz_id: quiz.id,
            quiz_name: quiz.name.clone(),
            created_at: SystemTime::now(),
            auto_start_num,
            machine: SessionStateMachine::new(last_question_policy),
            question_position: None,
            questions: quiz.questions.clone(),
            rounds: quiz.questions.iter().map(|_| QuestionRound::default()).collect(),
            players: IndexMap::new(),
            pending_timer: None,
            next_submission: 0,
            chat: ChatFeed::default(),
            events: SseHub::new(EVENT_CHANNEL_CAPACITY),
        }
    }

    /// Identifier of the session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Quiz the session was created from.
    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    /// Name of the quiz at creation time.
    pub fn quiz_name(&self) -> &str {
        &self.quiz_name
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Player count that starts the session automatically, 0 when disabled.
    pub fn auto_start_num(&self) -> usize {
        self.auto_start_num
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> u64 {
        self.machine.version()
    }

    /// Index of the current question, `None` before the first one opened.
    pub fn question_position(&self) -> Option<usize> {
        self.question_position
    }

    /// Number of questions in the snapshot.
    pub fn num_questions(&self) -> usize {
        self.questions.len()
    }

    /// Question progress used by the transition table.
    pub fn cursor(&self) -> QuestionCursor {
        QuestionCursor {
            position: self.question_position,
            num_questions: self.questions.len(),
        }
    }

    /// Question at `position`.
    pub fn question(&self, position: usize) -> Option<&Question> {
        self.questions.get(position)
    }

    /// Question the session is currently on.
    pub fn current_question(&self) -> Option<&Question> {
        self.question_position.and_then(|position| self.question(position))
    }

    /// Broadcast hub for this session's events.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Validate a transition against the current phase.
    pub fn plan(&self, event: SessionEvent) -> Result<Plan, PlanError> {
        self.machine.plan(event, self.cursor())
    }

    /// Apply a previously planned transition.
    pub fn apply(&mut self, plan: Plan) -> Result<SessionPhase, ApplyError> {
        self.machine.apply(plan)
    }

    /// Advance to the next question and stamp its opening time.
    pub fn open_next_question(&mut self, now: Instant) -> usize {
        let position = self.cursor().next_position();
        debug_assert!(position < self.questions.len());
        self.question_position = Some(position);
        self.rounds[position].opened_at = Some(now);
        position
    }

    /// Remember the timer that will fire `event`, returning any timer it replaces.
    pub fn set_pending_timer(
        &mut self,
        handle: TimerHandle,
        event: SessionEvent,
    ) -> Option<TimerHandle> {
        self.pending_timer
            .replace(PendingTimer { handle, event })
            .map(|pending| pending.handle)
    }

    /// Take the pending timer out, leaving none scheduled.
    pub fn take_pending_timer(&mut self) -> Option<TimerHandle> {
        self.pending_timer.take().map(|pending| pending.handle)
    }

    /// Identifier and event of the pending timer, if any.
    pub fn pending_timer(&self) -> Option<(TimerId, SessionEvent)> {
        self.pending_timer
            .as_ref()
            .map(|pending| (pending.handle.id(), pending.event))
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Number of joined players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Look a player of this session up.
    pub fn player(&self, player_id: PlayerId) -> Result<&Player, ServiceError> {
        self.players
            .get(&player_id)
            .ok_or(ServiceError::PlayerNotFound(player_id))
    }

    /// Whether a player already uses `name` (case-sensitive).
    pub fn name_taken(&self, name: &str) -> bool {
        self.players.values().any(|player| player.name == name)
    }

    /// Register a player. Callers enforce the lobby and unique-name rules.
    pub fn add_player(&mut self, id: PlayerId, name: String) -> &Player {
        self.players.insert(
            id,
            Player {
                id,
                name,
                score: 0.0,
                joined_at: SystemTime::now(),
            },
        );
        &self.players[&id]
    }

    /// Players ordered by total score descending, ties by ascending id.
    pub fn ranking(&self) -> Vec<&Player> {
        let mut ranking: Vec<&Player> = self.players.values().collect();
        ranking.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        ranking
    }

    // -----------------------------------------------------------------------
    // Answers and scoring
    // -----------------------------------------------------------------------

    /// Record `player_id`'s answer to the open question, replacing any earlier one.
    pub fn submit_answer(
        &mut self,
        player_id: PlayerId,
        question_position: usize,
        answer_ids: &[u64],
        now: Instant,
    ) -> Result<(), ServiceError> {
        self.player(player_id)?;

        if self.phase() != SessionPhase::QuestionOpen {
            return Err(ServiceError::SessionNotQuestionOpen(self.phase()));
        }

        let current = self.question_position;
        if current != Some(question_position) {
            return Err(ServiceError::QuestionPositionMismatch {
                requested: question_position,
                current,
            });
        }

        if answer_ids.is_empty() {
            return Err(ServiceError::EmptyAnswerIds);
        }

        let chosen: BTreeSet<u64> = answer_ids.iter().copied().collect();
        if chosen.len() != answer_ids.len() {
            return Err(ServiceError::DuplicateAnswerIds);
        }

        let question = &self.questions[question_position];
        let unknown: Vec<u64> = chosen
            .iter()
            .copied()
            .filter(|id| !question.has_answer(*id))
            .collect();
        if !unknown.is_empty() {
            return Err(ServiceError::InvalidAnswerIds(unknown));
        }

        let sequence = self.next_submission;
        self.next_submission += 1;
        self.rounds[question_position].submissions.insert(
            player_id,
            Submission {
                answer_ids: chosen,
                submitted_at: now,
                sequence,
            },
        );
        Ok(())
    }

    /// Number of players who submitted an answer for `question_position`.
    pub fn submission_count(&self, question_position: usize) -> usize {
        self.rounds
            .get(question_position)
            .map_or(0, |round| round.submissions.len())
    }

    /// Score the current question and add the awards to the players' totals.
    ///
    /// Finalizing an already scored question returns the stored result and
    /// leaves every total untouched.
    pub fn finalize_current(&mut self, formula: ScoringFormula) -> Option<&QuestionResult> {
        let position = self.question_position?;
        let round = &self.rounds[position];

        if round.result.is_none() {
            let player_ids: Vec<PlayerId> = self.players.keys().copied().collect();
            let result = finalize_question(
                position,
                &self.questions[position],
                round.opened_at.unwrap_or_else(Instant::now),
                &player_ids,
                &round.submissions,
                formula,
            );

            for entry in &result.entries {
                if let Some(player) = self.players.get_mut(&entry.player_id) {
                    player.score += entry.score;
                }
            }
            self.rounds[position].result = Some(result);
        }

        self.rounds[position].result.as_ref()
    }

    /// Stored result of a finalized question.
    pub fn question_result(&self, position: usize) -> Option<&QuestionResult> {
        self.rounds.get(position).and_then(|round| round.result.as_ref())
    }

    /// Results of every finalized question, in question order.
    pub fn question_results(&self) -> impl Iterator<Item = &QuestionResult> {
        self.rounds.iter().filter_map(|round| round.result.as_ref())
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    /// Chat feed of this session.
    pub fn chat(&self) -> &ChatFeed {
        &self.chat
    }

    /// Mutable chat feed of this session.
    pub fn chat_mut(&mut self) -> &mut ChatFeed {
        &mut self.chat
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::quiz::AnswerOption;

    pub(crate) fn sample_quiz(question_count: usize) -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            name: "General knowledge".into(),
            questions: (0..question_count as u64)
                .map(|index| Question {
                    question_id: index + 1,
                    prompt: format!("Question {}", index + 1),
                    duration_secs: 5,
                    points: 10,
                    answers: vec![
                        AnswerOption {
                            answer_id: 1,
                            text: "right".into(),
                            is_correct: true,
                        },
                        AnswerOption {
                            answer_id: 2,
                            text: "wrong".into(),
                            is_correct: false,
                        },
                    ],
                })
                .collect(),
        }
    }

    fn open_first_question(session: &mut Session) {
        for event in [SessionEvent::NextQuestion, SessionEvent::CountdownElapsed] {
            let plan = session.plan(event).unwrap();
            if plan.to == SessionPhase::QuestionOpen {
                session.open_next_question(Instant::now());
            }
            session.apply(plan).unwrap();
        }
    }

    fn close_and_show(session: &mut Session) {
        for event in [SessionEvent::GoToAnswer, SessionEvent::ShowAnswer] {
            let plan = session.plan(event).unwrap();
            session.apply(plan).unwrap();
        }
    }

    #[test]
    fn new_session_snapshots_quiz() {
        let mut quiz = sample_quiz(2);
        let session = Session::new(Uuid::new_v4(), &quiz, 0, LastQuestionPolicy::Reject);
        quiz.questions.clear();

        assert_eq!(session.num_questions(), 2);
        assert_eq!(session.phase(), SessionPhase::Lobby);
        assert_eq!(session.question_position(), None);
    }

    #[test]
    fn submission_validation_order() {
        let quiz = sample_quiz(1);
        let mut session = Session::new(Uuid::new_v4(), &quiz, 0, LastQuestionPolicy::Reject);
        session.add_player(1, "alice".into());
        let now = Instant::now();

        assert!(matches!(
            session.submit_answer(1, 0, &[1], now),
            Err(ServiceError::SessionNotQuestionOpen(SessionPhase::Lobby))
        ));

        open_first_question(&mut session);

        assert!(matches!(
            session.submit_answer(99, 0, &[1], now),
            Err(ServiceError::PlayerNotFound(99))
        ));
        assert!(matches!(
            session.submit_answer(1, 1, &[1], now),
            Err(ServiceError::QuestionPositionMismatch { requested: 1, current: Some(0) })
        ));
        assert!(matches!(
            session.submit_answer(1, 0, &[], now),
            Err(ServiceError::EmptyAnswerIds)
        ));
        assert!(matches!(
            session.submit_answer(1, 0, &[1, 1], now),
            Err(ServiceError::DuplicateAnswerIds)
        ));
        assert!(matches!(
            session.submit_answer(1, 0, &[1, 5], now),
            Err(ServiceError::InvalidAnswerIds(ids)) if ids == vec![5]
        ));
        assert!(session.submit_answer(1, 0, &[1], now).is_ok());
    }

    #[test]
    fn resubmission_replaces_previous_answer() {
        let quiz = sample_quiz(1);
        let mut session = Session::new(Uuid::new_v4(), &quiz, 0, LastQuestionPolicy::Reject);
        session.add_player(1, "alice".into());
        open_first_question(&mut session);

        let now = Instant::now();
        session.submit_answer(1, 0, &[2], now).unwrap();
        session
            .submit_answer(1, 0, &[1], now + Duration::from_secs(1))
            .unwrap();
        assert_eq!(session.submission_count(0), 1);

        close_and_show(&mut session);
        let result = session.finalize_current(ScoringFormula::RankDivided).unwrap();
        assert_eq!(result.score_for(1), 10.0);
    }

    #[test]
    fn finalizing_twice_adds_scores_once() {
        let quiz = sample_quiz(1);
        let mut session = Session::new(Uuid::new_v4(), &quiz, 0, LastQuestionPolicy::Reject);
        session.add_player(1, "alice".into());
        session.add_player(2, "bob".into());
        open_first_question(&mut session);
        session.submit_answer(1, 0, &[1], Instant::now()).unwrap();
        close_and_show(&mut session);

        let first = session.finalize_current(ScoringFormula::RankDivided).cloned();
        let second = session.finalize_current(ScoringFormula::RankDivided).cloned();

        assert_eq!(first, second);
        assert_eq!(session.player(1).unwrap().score, 10.0);
        assert_eq!(session.player(2).unwrap().score, 0.0);
    }

    #[test]
    fn ranking_breaks_ties_by_player_id() {
        let quiz = sample_quiz(1);
        let mut session = Session::new(Uuid::new_v4(), &quiz, 0, LastQuestionPolicy::Reject);
        session.add_player(5, "eve".into());
        session.add_player(3, "carol".into());
        session.add_player(4, "dave".into());
        session.players.get_mut(&4).unwrap().score = 7.0;

        let order: Vec<_> = session.ranking().iter().map(|p| p.id).collect();
        assert_eq!(order, vec![4, 3, 5]);
    }

    #[test]
    fn names_are_case_sensitive() {
        let quiz = sample_quiz(1);
        let mut session = Session::new(Uuid::new_v4(), &quiz, 0, LastQuestionPolicy::Reject);
        session.add_player(1, "Alice".into());

        assert!(session.name_taken("Alice"));
        assert!(!session.name_taken("alice"));
    }
}
