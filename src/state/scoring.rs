//! Answer correctness and rank-based scoring for a closed question.

use std::{collections::BTreeSet, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use tokio::time::Instant;

use crate::state::{quiz::Question, session::PlayerId};

/// How points are distributed among the players who answered correctly.
///
/// Every formula gives a later correct answer strictly less than an earlier one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFormula {
    /// `points / rank`: the first correct answer gets full weight, the second half, ...
    #[default]
    RankDivided,
    /// `points * (n - rank + 1) / n` with `n` the number of correct answers.
    LinearDecay,
}

impl ScoringFormula {
    /// Score of the correct answer ranked `rank` (1-based) out of `correct_count`.
    pub fn award(self, points: u32, rank: usize, correct_count: usize) -> f64 {
        debug_assert!(rank >= 1 && rank <= correct_count);
        let points = f64::from(points);
        match self {
            ScoringFormula::RankDivided => points / rank as f64,
            ScoringFormula::LinearDecay => {
                let n = correct_count as f64;
                points * (n - rank as f64 + 1.0) / n
            }
        }
    }
}

/// Latest answer a player submitted for a question.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Chosen answer ids.
    pub answer_ids: BTreeSet<u64>,
    /// When the submission arrived.
    pub submitted_at: Instant,
    /// Arrival order within the session; breaks timestamp ties.
    pub sequence: u64,
}

/// Per-player outcome of a finalized question.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    /// Player the entry belongs to.
    pub player_id: PlayerId,
    /// Whether the player submitted anything.
    pub answered: bool,
    /// Whether the submission matched the correct answer set exactly.
    pub correct: bool,
    /// Rank among correct submissions (1 is fastest).
    pub rank: Option<usize>,
    /// Points awarded for this question.
    pub score: f64,
    /// Time between the question opening and the counted submission.
    pub answer_time: Option<Duration>,
}

/// Outcome of a finalized question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionResult {
    /// Position of the question inside the session.
    pub question_position: usize,
    /// Identifier of the question.
    pub question_id: u64,
    /// One entry per player in join order.
    pub entries: Vec<ResultEntry>,
    /// Average answer time over every submission, zero when nobody answered.
    pub average_answer_time: Duration,
    /// Share of players that answered correctly, rounded to the nearest percent.
    pub percent_correct: u8,
}

impl QuestionResult {
    /// Score delta awarded to `player_id` by this question.
    pub fn score_for(&self, player_id: PlayerId) -> f64 {
        self.entries
            .iter()
            .find(|entry| entry.player_id == player_id)
            .map_or(0.0, |entry| entry.score)
    }

    /// Players that answered correctly, fastest first.
    pub fn correct_players(&self) -> Vec<PlayerId> {
        let mut correct: Vec<_> = self
            .entries
            .iter()
            .filter_map(|entry| entry.rank.map(|rank| (rank, entry.player_id)))
            .collect();
        correct.sort_unstable();
        correct.into_iter().map(|(_, player_id)| player_id).collect()
    }
}

/// Score a closed question.
///
/// `players` lists every player of the session in join order so that players
/// without a submission still get a zero entry. Ranks follow `submitted_at`,
/// then arrival sequence.
pub fn finalize_question(
    question_position: usize,
    question: &Question,
    opened_at: Instant,
    players: &[PlayerId],
    submissions: &IndexMap<PlayerId, Submission>,
    formula: ScoringFormula,
) -> QuestionResult {
    let correct_set: BTreeSet<u64> = question.correct_answer_ids().into_iter().collect();

    let mut correct: Vec<(PlayerId, &Submission)> = submissions
        .iter()
        .filter(|(_, submission)| submission.answer_ids == correct_set)
        .map(|(player_id, submission)| (*player_id, submission))
        .collect();
    correct.sort_by_key(|(_, submission)| (submission.submitted_at, submission.sequence));

    let correct_count = correct.len();
    let ranks: IndexMap<PlayerId, usize> = correct
        .iter()
        .enumerate()
        .map(|(index, (player_id, _))| (*player_id, index + 1))
        .collect();

    let entries: Vec<ResultEntry> = players
        .iter()
        .map(|player_id| {
            let submission = submissions.get(player_id);
            let rank = ranks.get(player_id).copied();
            ResultEntry {
                player_id: *player_id,
                answered: submission.is_some(),
                correct: rank.is_some(),
                rank,
                score: rank.map_or(0.0, |rank| {
                    formula.award(question.points, rank, correct_count)
                }),
                answer_time: submission
                    .map(|submission| submission.submitted_at.saturating_duration_since(opened_at)),
            }
        })
        .collect();

    let answer_times: Vec<Duration> = entries.iter().filter_map(|e| e.answer_time).collect();
    let average_answer_time = if answer_times.is_empty() {
        Duration::ZERO
    } else {
        answer_times.iter().sum::<Duration>() / answer_times.len() as u32
    };

    let percent_correct = if players.is_empty() {
        0
    } else {
        ((correct_count as f64 / players.len() as f64) * 100.0).round() as u8
    };

    QuestionResult {
        question_position,
        question_id: question.question_id,
        entries,
        average_answer_time,
        percent_correct,
    }
}
