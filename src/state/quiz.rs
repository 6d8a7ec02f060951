//! Read-only catalog of authored quizzes that sessions snapshot from.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Lower bound on answers per question.
pub const MIN_ANSWERS_PER_QUESTION: usize = 2;
/// Upper bound on answers per question.
pub const MAX_ANSWERS_PER_QUESTION: usize = 6;

/// Authored quiz as handed over by the quiz-authoring side.
#[derive(Debug, Clone)]
pub struct Quiz {
    /// Stable identifier of the quiz.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Ordered questions.
    pub questions: Vec<Question>,
}

/// Question of a quiz. Sessions keep their own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Identifier, unique within the quiz.
    pub question_id: u64,
    /// Prompt shown to players.
    pub prompt: String,
    /// Seconds the question stays open.
    pub duration_secs: u32,
    /// Weight awarded to the first correct answer.
    pub points: u32,
    /// Ordered answer options.
    pub answers: Vec<AnswerOption>,
}

impl Question {
    /// Ids of every correct answer, in declaration order.
    pub fn correct_answer_ids(&self) -> Vec<u64> {
        self.answers
            .iter()
            .filter(|answer| answer.is_correct)
            .map(|answer| answer.answer_id)
            .collect()
    }

    /// Whether `answer_id` is one of this question's options.
    pub fn has_answer(&self, answer_id: u64) -> bool {
        self.answers.iter().any(|answer| answer.answer_id == answer_id)
    }
}

/// Single answer option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    /// Identifier, unique within the question.
    pub answer_id: u64,
    /// Text shown to players.
    pub text: String,
    /// Whether picking this option is part of the correct answer.
    pub is_correct: bool,
}

/// Quiz definition accepted from configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuizDefinition {
    /// Pin the quiz id so clients can address it; generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Display name.
    #[validate(length(min = 1, max = 30))]
    pub name: String,
    /// Ordered questions.
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
}

/// Question definition accepted from configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionDefinition {
    /// Prompt shown to players.
    #[validate(length(min = 1, max = 200))]
    pub prompt: String,
    /// Seconds the question stays open.
    #[validate(range(min = 1))]
    pub duration_secs: u32,
    /// Weight awarded to the first correct answer.
    #[validate(range(min = 1))]
    pub points: u32,
    /// Answer options in display order.
    #[validate(custom(function = validate_answer_mix))]
    pub answers: Vec<AnswerDefinition>,
}

/// Answer definition accepted from configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerDefinition {
    /// Text shown to players.
    pub text: String,
    /// Whether the option belongs to the correct answer set.
    #[serde(default)]
    pub correct: bool,
}

fn validate_answer_mix(answers: &[AnswerDefinition]) -> Result<(), ValidationError> {
    if !(MIN_ANSWERS_PER_QUESTION..=MAX_ANSWERS_PER_QUESTION).contains(&answers.len()) {
        let mut err = ValidationError::new("answer_count");
        err.message = Some(
            format!(
                "a question needs between {MIN_ANSWERS_PER_QUESTION} and {MAX_ANSWERS_PER_QUESTION} answers"
            )
            .into(),
        );
        return Err(err);
    }
    let correct = answers.iter().filter(|answer| answer.correct).count();
    if correct == 0 {
        let mut err = ValidationError::new("no_correct_answer");
        err.message = Some("a question needs at least one correct answer".into());
        return Err(err);
    }
    if correct == answers.len() {
        let mut err = ValidationError::new("no_incorrect_answer");
        err.message = Some("a question needs at least one incorrect answer".into());
        return Err(err);
    }
    if answers.iter().any(|answer| answer.text.trim().is_empty()) {
        let mut err = ValidationError::new("empty_answer");
        err.message = Some("answer text must not be empty".into());
        return Err(err);
    }
    Ok(())
}

impl From<QuizDefinition> for Quiz {
    fn from(value: QuizDefinition) -> Self {
        let questions = value
            .questions
            .into_iter()
            .zip(1..)
            .map(|(question, question_id)| Question {
                question_id,
                prompt: question.prompt,
                duration_secs: question.duration_secs,
                points: question.points,
                answers: question
                    .answers
                    .into_iter()
                    .zip(1..)
                    .map(|(answer, answer_id)| AnswerOption {
                        answer_id,
                        text: answer.text,
                        is_correct: answer.correct,
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: value.id.unwrap_or_else(Uuid::new_v4),
            name: value.name,
            questions,
        }
    }
}

/// In-memory registry of quizzes keyed by id.
#[derive(Default)]
pub struct QuizCatalog {
    quizzes: DashMap<Uuid, Arc<Quiz>>,
}

impl QuizCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a quiz. Running sessions keep their own snapshot.
    pub fn insert(&self, quiz: Quiz) -> Uuid {
        let id = quiz.id;
        self.quizzes.insert(id, Arc::new(quiz));
        id
    }

    /// Look a quiz up by id.
    pub fn get(&self, id: Uuid) -> Option<Arc<Quiz>> {
        self.quizzes.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Every registered quiz, sorted by name.
    pub fn list(&self) -> Vec<Arc<Quiz>> {
        let mut quizzes: Vec<_> = self
            .quizzes
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        quizzes.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        quizzes
    }
}
