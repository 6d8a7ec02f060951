//! Application-level configuration loading: session policies and the quizzes
//! available to hosts.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{
    names::NameGenerator, quiz::QuizDefinition, scoring::ScoringFormula,
    state_machine::LastQuestionPolicy,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZLIVE_BACK_CONFIG_PATH";

const DEFAULT_COUNTDOWN_SECS: u64 = 3;
const DEFAULT_MAX_ACTIVE_SESSIONS_PER_QUIZ: usize = 10;
const DEFAULT_MAX_AUTO_START_NUM: usize = 50;
const DEFAULT_CHAT_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Time between leaving the lobby (or the answer display) and the question opening.
    pub countdown: Duration,
    /// Concurrently non-ended sessions allowed per quiz.
    pub max_active_sessions_per_quiz: usize,
    /// Largest accepted auto-start player count.
    pub max_auto_start_num: usize,
    /// Largest accepted chat message, in characters.
    pub chat_max_length: usize,
    /// Formula used when finalizing a question.
    pub scoring: ScoringFormula,
    /// Behaviour of `NEXT_QUESTION` on the last question.
    pub last_question_policy: LastQuestionPolicy,
    /// Shape of names generated for players joining without one.
    pub name_generator: NameGenerator,
    /// Quizzes to register at startup.
    pub quizzes: Vec<QuizDefinition>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        quizzes = app_config.quizzes.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    countdown_secs: u64,
    max_active_sessions_per_quiz: usize,
    max_auto_start_num: usize,
    chat_max_length: usize,
    scoring: ScoringFormula,
    last_question_policy: LastQuestionPolicy,
    name_generator: NameGenerator,
    quizzes: Vec<QuizDefinition>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            max_active_sessions_per_quiz: DEFAULT_MAX_ACTIVE_SESSIONS_PER_QUIZ,
            max_auto_start_num: DEFAULT_MAX_AUTO_START_NUM,
            chat_max_length: DEFAULT_CHAT_MAX_LENGTH,
            scoring: ScoringFormula::default(),
            last_question_policy: LastQuestionPolicy::default(),
            name_generator: NameGenerator::default(),
            quizzes: Vec::new(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let name_generator = if value.name_generator.is_usable() {
            value.name_generator
        } else {
            warn!(
                letters = value.name_generator.letters,
                digits = value.name_generator.digits,
                "name generator cannot produce enough distinct names; using defaults"
            );
            NameGenerator::default()
        };

        Self {
            countdown: Duration::from_secs(value.countdown_secs),
            max_active_sessions_per_quiz: value.max_active_sessions_per_quiz,
            max_auto_start_num: value.max_auto_start_num,
            chat_max_length: value.chat_max_length,
            scoring: value.scoring,
            last_question_policy: value.last_question_policy,
            name_generator,
            quizzes: value.quizzes,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
