use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::phase::VisiblePhase,
    state::{
        quiz::Question,
        session::{Player, PlayerId, Session},
    },
};

/// Payload used to join a session. A blank name asks for a generated one.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct JoinSessionRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Identity handed to a player after joining.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerJoined {
    #[schema(value_type = u64)]
    pub player_id: PlayerId,
    pub session_id: Uuid,
    /// Name the player ended up with, generated or not.
    pub name: String,
}

/// What a player needs to know to follow the session.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStatus {
    #[schema(value_type = u64)]
    pub player_id: PlayerId,
    pub name: String,
    pub score: f64,
    pub phase: VisiblePhase,
    pub question_position: Option<usize>,
    pub num_questions: usize,
}

impl PlayerStatus {
    pub fn new(session: &Session, player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            score: player.score,
            phase: session.phase().into(),
            question_position: session.question_position(),
            num_questions: session.num_questions(),
        }
    }
}

/// Answer option as shown to players, without its correctness flag.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerChoice {
    pub answer_id: u64,
    pub text: String,
}

/// Current question as shown to players.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionInfo {
    pub question_position: usize,
    pub question_id: u64,
    pub prompt: String,
    pub duration_secs: u32,
    pub points: u32,
    pub answers: Vec<AnswerChoice>,
}

impl QuestionInfo {
    pub fn new(question_position: usize, question: &Question) -> Self {
        Self {
            question_position,
            question_id: question.question_id,
            prompt: question.prompt.clone(),
            duration_secs: question.duration_secs,
            points: question.points,
            answers: question
                .answers
                .iter()
                .map(|answer| AnswerChoice {
                    answer_id: answer.answer_id,
                    text: answer.text.clone(),
                })
                .collect(),
        }
    }
}

/// Answer submitted for the open question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    pub answer_ids: Vec<u64>,
}
