pub mod chat;
pub mod names;
pub mod quiz;
pub mod scoring;
pub mod session;
mod sse;
pub mod state_machine;
pub mod timer;
pub mod transitions;

use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AppConfig,
    error::ServiceError,
    state::{
        quiz::{Quiz, QuizCatalog},
        session::{PlayerId, Session},
        timer::TimerService,
    },
};

pub use self::sse::SseHub;

/// Application state shared by handlers and timer callbacks.
pub type SharedState = Arc<AppState>;

/// Session guarded by its own lock; every operation on it holds the lock throughout.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Sessions created from one quiz, split by whether they reached the end.
#[derive(Debug, Default)]
struct QuizSessions {
    active: BTreeSet<Uuid>,
    ended: BTreeSet<Uuid>,
}

/// Central application state: quiz catalog, live sessions and the player index.
pub struct AppState {
    config: AppConfig,
    quizzes: QuizCatalog,
    sessions: DashMap<Uuid, SessionHandle>,
    players: DashMap<PlayerId, Uuid>,
    quiz_sessions: DashMap<Uuid, QuizSessions>,
    timers: TimerService,
    next_player_id: AtomicU64,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Quizzes listed in the configuration are validated and registered;
    /// invalid entries are skipped.
    pub fn new(config: AppConfig) -> SharedState {
        let quizzes = QuizCatalog::new();
        for definition in &config.quizzes {
            if let Err(err) = definition.validate() {
                warn!(name = %definition.name, error = %err, "skipping invalid quiz definition");
                continue;
            }
            let quiz: Quiz = definition.clone().into();
            debug!(quiz_id = %quiz.id, name = %quiz.name, "registered quiz");
            quizzes.insert(quiz);
        }

        Arc::new(Self {
            config,
            quizzes,
            sessions: DashMap::new(),
            players: DashMap::new(),
            quiz_sessions: DashMap::new(),
            timers: TimerService::new(),
            next_player_id: AtomicU64::new(1),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Quizzes sessions can be created from.
    pub fn quizzes(&self) -> &QuizCatalog {
        &self.quizzes
    }

    /// Scheduler driving countdown and question timers.
    pub fn timers(&self) -> &TimerService {
        &self.timers
    }

    /// Look a session up by id.
    pub fn session(&self, session_id: Uuid) -> Result<SessionHandle, ServiceError> {
        self.sessions
            .get(&session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ServiceError::SessionNotFound(session_id))
    }

    /// Session the player joined.
    pub fn session_of_player(&self, player_id: PlayerId) -> Result<SessionHandle, ServiceError> {
        let session_id = self
            .players
            .get(&player_id)
            .map(|entry| *entry.value())
            .ok_or(ServiceError::PlayerNotFound(player_id))?;
        self.session(session_id)
    }

    /// Register a new session, enforcing the per-quiz active session limit.
    ///
    /// The quiz's registry entry stays locked while the session is inserted
    /// so concurrent creations cannot overshoot the limit.
    pub fn insert_session(&self, session: Session) -> Result<SessionHandle, ServiceError> {
        let quiz_id = session.quiz_id();
        let session_id = session.id();
        let limit = self.config.max_active_sessions_per_quiz;

        let mut entry = self.quiz_sessions.entry(quiz_id).or_default();
        if entry.active.len() >= limit {
            return Err(ServiceError::TooManyActiveSessions { quiz_id, limit });
        }

        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(session_id, Arc::clone(&handle));
        entry.active.insert(session_id);
        Ok(handle)
    }

    /// Move an ended session out of its quiz's active set.
    pub fn release_active_slot(&self, quiz_id: Uuid, session_id: Uuid) {
        if let Some(mut entry) = self.quiz_sessions.get_mut(&quiz_id)
            && entry.active.remove(&session_id)
        {
            entry.ended.insert(session_id);
        }
    }

    /// Active and ended session ids of a quiz, each in ascending order.
    pub fn sessions_of_quiz(&self, quiz_id: Uuid) -> (Vec<Uuid>, Vec<Uuid>) {
        self.quiz_sessions
            .get(&quiz_id)
            .map(|entry| {
                (
                    entry.active.iter().copied().collect(),
                    entry.ended.iter().copied().collect(),
                )
            })
            .unwrap_or_default()
    }

    /// Allocate the next player id.
    pub fn allocate_player_id(&self) -> PlayerId {
        self.next_player_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Index a joined player so player-scoped operations find their session.
    pub fn register_player(&self, player_id: PlayerId, session_id: Uuid) {
        self.players.insert(player_id, session_id);
    }

    /// Number of sessions held in memory.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of players across all sessions.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        quiz::{AnswerDefinition, QuestionDefinition, QuizDefinition},
        session::tests::sample_quiz,
        state_machine::LastQuestionPolicy,
    };

    fn config_with_limit(limit: usize) -> AppConfig {
        AppConfig {
            max_active_sessions_per_quiz: limit,
            ..AppConfig::default()
        }
    }

    #[test]
    fn invalid_quiz_definitions_are_skipped() {
        let valid = QuizDefinition {
            id: None,
            name: "Capitals".into(),
            questions: vec![QuestionDefinition {
                prompt: "Capital of France?".into(),
                duration_secs: 10,
                points: 5,
                answers: vec![
                    AnswerDefinition {
                        text: "Paris".into(),
                        correct: true,
                    },
                    AnswerDefinition {
                        text: "Lyon".into(),
                        correct: false,
                    },
                ],
            }],
        };
        let invalid = QuizDefinition {
            name: String::new(),
            ..valid.clone()
        };
        let config = AppConfig {
            quizzes: vec![valid, invalid],
            ..AppConfig::default()
        };

        let state = AppState::new(config);
        let quizzes = state.quizzes().list();
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].name, "Capitals");
    }

    #[test]
    fn active_session_limit_is_per_quiz() {
        let state = AppState::new(config_with_limit(1));
        let quiz = sample_quiz(1);
        let other = sample_quiz(1);

        let first = Session::new(Uuid::new_v4(), &quiz, 0, LastQuestionPolicy::Reject);
        let first_id = first.id();
        state.insert_session(first).unwrap();

        let second = Session::new(Uuid::new_v4(), &quiz, 0, LastQuestionPolicy::Reject);
        assert!(matches!(
            state.insert_session(second),
            Err(ServiceError::TooManyActiveSessions { limit: 1, .. })
        ));
        state
            .insert_session(Session::new(Uuid::new_v4(), &other, 0, LastQuestionPolicy::Reject))
            .unwrap();

        state.release_active_slot(quiz.id, first_id);
        let third = Session::new(Uuid::new_v4(), &quiz, 0, LastQuestionPolicy::Reject);
        let third_id = third.id();
        state.insert_session(third).unwrap();

        let (active, ended) = state.sessions_of_quiz(quiz.id);
        assert_eq!(active, vec![third_id]);
        assert_eq!(ended, vec![first_id]);
    }

    #[test]
    fn player_ids_increase() {
        let state = AppState::new(AppConfig::default());
        let a = state.allocate_player_id();
        let b = state.allocate_player_id();
        assert!(b > a);
        assert!(matches!(
            state.session_of_player(a),
            Err(ServiceError::PlayerNotFound(_))
        ));
    }
}
