use crate::belief::BeliefState;
use crate::card::Rank;

/// Below this many cards in the draw pile the game counts as late.
pub const LATE_GAME_DECK_SIZE: usize = 10;

pub const LATE_GAME_MULTIPLIER: f64 = 1.2;

/// Strategic value of asking for `rank`.
///
/// Starts from the rank value (2..=14), is boosted once the draw pile runs
/// low, and is scaled by `1 + s / (s + f + 1)` where `s`/`f` are the
/// computer's own hits and misses on this rank.
pub fn score(rank: Rank, belief: &BeliefState) -> f64 {
    let mut base_score = rank.value() as f64;

    if belief.deck_remaining() < LATE_GAME_DECK_SIZE {
        base_score *= LATE_GAME_MULTIPLIER;
    }

    base_score * (1.0 + success_rate(rank, belief))
}

/// Laplace-smoothed hit rate of the computer's requests for `rank`.
pub fn success_rate(rank: Rank, belief: &BeliefState) -> f64 {
    let successes = belief.success_count(rank) as f64;
    let failures = belief.failure_count(rank) as f64;
    successes / (successes + failures + 1.0)
}

/// `probability * score`, the figure near-complete sets and duplicates are ranked by.
pub fn expected_score(rank: Rank, belief: &BeliefState) -> f64 {
    belief.probability(rank) * score(rank, belief)
}
