use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    scoring::QuestionResult,
    session::{PlayerId, Session},
};

/// Outcome of one player for a finalized question.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultEntryDto {
    #[schema(value_type = u64)]
    pub player_id: PlayerId,
    pub name: String,
    pub answered: bool,
    pub correct: bool,
    /// Rank among correct answers, 1 being the fastest.
    pub rank: Option<usize>,
    pub score: f64,
}

/// Results of a finalized question.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionResultResponse {
    pub question_position: usize,
    pub question_id: u64,
    pub correct_answer_ids: Vec<u64>,
    /// One entry per player, in join order.
    pub entries: Vec<ResultEntryDto>,
    /// Names of the players who answered correctly, fastest first.
    pub players_correct: Vec<String>,
    pub average_answer_time_secs: f64,
    pub percent_correct: u8,
}

impl QuestionResultResponse {
    pub fn new(session: &Session, result: &QuestionResult) -> Self {
        let name_of = |player_id: PlayerId| {
            session
                .player(player_id)
                .map(|player| player.name.clone())
                .unwrap_or_default()
        };

        Self {
            question_position: result.question_position,
            question_id: result.question_id,
            correct_answer_ids: session
                .question(result.question_position)
                .map(|question| question.correct_answer_ids())
                .unwrap_or_default(),
            entries: result
                .entries
                .iter()
                .map(|entry| ResultEntryDto {
                    player_id: entry.player_id,
                    name: name_of(entry.player_id),
                    answered: entry.answered,
                    correct: entry.correct,
                    rank: entry.rank,
                    score: entry.score,
                })
                .collect(),
            players_correct: result.correct_players().into_iter().map(name_of).collect(),
            average_answer_time_secs: result.average_answer_time.as_secs_f64(),
            percent_correct: result.percent_correct,
        }
    }
}

/// Line of the final ranking.
#[derive(Debug, Serialize, ToSchema)]
pub struct RankingEntry {
    /// 1-based place; players with equal scores get distinct places by id.
    pub place: usize,
    #[schema(value_type = u64)]
    pub player_id: PlayerId,
    pub name: String,
    pub score: f64,
}

/// Session-wide results.
#[derive(Debug, Serialize, ToSchema)]
pub struct FinalResults {
    /// Players by total score descending, ties by ascending id.
    pub ranking: Vec<RankingEntry>,
    /// Results of every finalized question, in question order.
    pub questions: Vec<QuestionResultResponse>,
}

impl From<&Session> for FinalResults {
    fn from(session: &Session) -> Self {
        Self {
            ranking: session
                .ranking()
                .into_iter()
                .enumerate()
                .map(|(index, player)| RankingEntry {
                    place: index + 1,
                    player_id: player.id,
                    name: player.name.clone(),
                    score: player.score,
                })
                .collect(),
            questions: session
                .question_results()
                .map(|result| QuestionResultResponse::new(session, result))
                .collect(),
        }
    }
}
