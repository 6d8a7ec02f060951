//! Random display names handed to players who join without one.

use rand::{Rng, seq::IndexedRandom};
use serde::Deserialize;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Draws attempted before [`NameGenerator::generate_unique`] gives up.
const MAX_ATTEMPTS: usize = 1_000;
/// Smallest name space accepted from configuration.
pub const MIN_DISTINCT_NAMES: u128 = 1_000;

/// Shape of generated names: `letters` distinct letters followed by `digits` distinct digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NameGenerator {
    /// Number of letters, at most 26.
    pub letters: usize,
    /// Number of digits, at most 10.
    pub digits: usize,
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self {
            letters: 5,
            digits: 3,
        }
    }
}

impl NameGenerator {
    /// Draw one name. Characters never repeat within the letter or the digit group.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let letters = LETTERS.choose_multiple(rng, self.letters.min(LETTERS.len()));
        let digits = DIGITS.choose_multiple(rng, self.digits.min(DIGITS.len()));
        letters.chain(digits).map(|byte| char::from(*byte)).collect()
    }

    /// Number of distinct names this shape can produce.
    pub fn distinct_names(&self) -> u128 {
        fn arrangements(pool: usize, picked: usize) -> u128 {
            (0..picked.min(pool)).map(|i| (pool - i) as u128).product()
        }
        arrangements(LETTERS.len(), self.letters) * arrangements(DIGITS.len(), self.digits)
    }

    /// Whether the shape yields non-empty names from a large enough space.
    pub fn is_usable(&self) -> bool {
        self.letters > 0
            && self.letters <= LETTERS.len()
            && self.digits <= DIGITS.len()
            && self.distinct_names() >= MIN_DISTINCT_NAMES
    }

    /// Draw names until one is not rejected by `taken`.
    ///
    /// Returns `None` when every draw of a bounded number of attempts is taken.
    pub fn generate_unique<R, F>(&self, rng: &mut R, taken: F) -> Option<String>
    where
        R: Rng + ?Sized,
        F: Fn(&str) -> bool,
    {
        (0..MAX_ATTEMPTS)
            .map(|_| self.generate(rng))
            .find(|candidate| !candidate.is_empty() && !taken(candidate))
    }
}
