use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::quiz::Quiz;

/// Quiz a host can start a session from.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizSummary {
    pub quiz_id: Uuid,
    pub name: String,
    pub num_questions: usize,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            quiz_id: quiz.id,
            name: quiz.name.clone(),
            num_questions: quiz.questions.len(),
        }
    }
}
