//! Rank selection for the computer player.
//!
//! [`STRATEGIES`] is tried in order and the first strategy that produces a
//! rank wins. The last entry never comes back empty, so [`decide`] is total.

use crate::belief::BeliefState;
use crate::card::{Rank, RankCounts};
use crate::scoring::{expected_score, score};
use smallvec::SmallVec;
use tracing::{Level, event};

pub type Candidates = SmallVec<[Rank; Rank::COUNT]>;

pub type StrategyFn = fn(&RankCounts, &BeliefState) -> Option<Rank>;

/// Probability above which any rank is worth asking for outright.
pub const HIGH_PROBABILITY_THRESHOLD: f64 = 0.3;

/// Probability a recently requested opponent rank needs before it is mirrored.
pub const BEHAVIOUR_PROBABILITY_THRESHOLD: f64 = 0.2;

/// Score every recent opponent request has to beat to count as "going high".
pub const HIGH_VALUE_SCORE: f64 = 10.0;

/// How many distinct opponent requests the behaviour strategy looks back on.
pub const BEHAVIOUR_WINDOW: usize = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StrategyKind {
    NearCompleteSet,
    HighProbability,
    HandDuplicate,
    OpponentBehaviour,
    HighestUnrequested,
}

pub const STRATEGIES: &[(StrategyKind, StrategyFn)] = &[
    (StrategyKind::NearCompleteSet, near_complete_set),
    (StrategyKind::HighProbability, high_probability),
    (StrategyKind::HandDuplicate, hand_duplicate),
    (StrategyKind::OpponentBehaviour, opponent_behaviour),
    (StrategyKind::HighestUnrequested, highest_unrequested_strategy),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub rank: Rank,
    pub strategy: StrategyKind,
}

/// Picks the rank to request. `belief` must have been refreshed for this turn.
pub fn decide(hand: &RankCounts, belief: &BeliefState) -> Decision {
    let decision = STRATEGIES
        .iter()
        .find_map(|&(strategy, propose)| {
            propose(hand, belief).map(|rank| Decision { rank, strategy })
        })
        .unwrap_or_else(|| Decision {
            rank: highest_unrequested(belief),
            strategy: StrategyKind::HighestUnrequested,
        });

    log_decision(hand, belief, &decision);
    decision
}

pub fn choose_rank(hand: &RankCounts, belief: &BeliefState) -> Rank {
    decide(hand, belief).rank
}

/// Ranks held two or three times: one or two cards short of a book.
pub fn near_complete_candidates(hand: &RankCounts) -> Candidates {
    hand.ranks_where(|count| (2..=3).contains(&count)).collect()
}

pub fn near_complete_set(hand: &RankCounts, belief: &BeliefState) -> Option<Rank> {
    let candidates = near_complete_candidates(hand);
    first_max_by(&candidates, |rank| expected_score(rank, belief))
        .or_else(|| candidates.first().copied())
}

pub fn high_probability_candidates(belief: &BeliefState) -> Candidates {
    Rank::ALL
        .iter()
        .copied()
        .filter(|&rank| belief.probability(rank) > HIGH_PROBABILITY_THRESHOLD)
        .collect()
}

pub fn high_probability(_hand: &RankCounts, belief: &BeliefState) -> Option<Rank> {
    first_max_by(&high_probability_candidates(belief), |rank| score(rank, belief))
}

pub fn hand_duplicate_candidates(hand: &RankCounts) -> Candidates {
    hand.ranks_where(|count| count >= 2).collect()
}

pub fn hand_duplicate(hand: &RankCounts, belief: &BeliefState) -> Option<Rank> {
    first_max_by(&hand_duplicate_candidates(hand), |rank| {
        expected_score(rank, belief)
    })
}

/// Mirrors what the opponent has been asking for.
///
/// If every one of the last few distinct ranks it requested scores above
/// [`HIGH_VALUE_SCORE`], the opponent is chasing high cards and the highest
/// unrequested rank is returned. Otherwise the most recent of those ranks
/// that still looks likely is returned.
pub fn opponent_behaviour(_hand: &RankCounts, belief: &BeliefState) -> Option<Rank> {
    let recent = belief.recent_opponent_ranks(BEHAVIOUR_WINDOW);
    if recent.is_empty() {
        return None;
    }

    if recent.iter().all(|&rank| score(rank, belief) > HIGH_VALUE_SCORE) {
        return Some(highest_unrequested(belief));
    }

    recent
        .into_iter()
        .find(|&rank| belief.probability(rank) > BEHAVIOUR_PROBABILITY_THRESHOLD)
}

/// Highest rank the computer has never asked for, or the lowest rank once
/// everything has been asked.
pub fn highest_unrequested(belief: &BeliefState) -> Rank {
    let asked = belief.asked_by_self();
    Rank::ALL
        .iter()
        .rev()
        .copied()
        .find(|&rank| !asked.contains(rank))
        .unwrap_or(Rank::ALL[0])
}

fn highest_unrequested_strategy(_hand: &RankCounts, belief: &BeliefState) -> Option<Rank> {
    Some(highest_unrequested(belief))
}

/// First candidate with the strictly greatest key.
fn first_max_by<F>(candidates: &[Rank], key: F) -> Option<Rank>
where
    F: Fn(Rank) -> f64,
{
    let mut best: Option<(Rank, f64)> = None;
    for &rank in candidates {
        let value = key(rank);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((rank, value)),
        }
    }
    best.map(|(rank, _)| rank)
}

fn log_decision(hand: &RankCounts, belief: &BeliefState, decision: &Decision) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    event!(
        target: "gofish::engine",
        Level::DEBUG,
        rank = %decision.rank,
        strategy = ?decision.strategy,
        probability = belief.probability(decision.rank),
        score = score(decision.rank, belief),
        hand_size = hand.total(),
        held = hand.get(decision.rank),
        deck_remaining = belief.deck_remaining(),
        unknown = belief.unknown_card_count(),
        misses_in_a_row = belief.consecutive_failures(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::{Party, RequestOutcome};

    fn hand(ranks: &[Rank]) -> RankCounts {
        ranks.iter().copied().collect()
    }

    fn refreshed(own: &RankCounts, opponent_hand_size: usize, deck_remaining: usize) -> BeliefState {
        let mut belief = BeliefState::new();
        belief.refresh(own, opponent_hand_size, deck_remaining);
        belief
    }

    #[test]
    fn near_complete_set_prefers_three_sevens() {
        // Three 7s, 7 believed at 0.5, deck of 20.
        let own = hand(&[Rank::Two, Rank::Seven, Rank::Seven, Rank::Seven, Rank::Jack]);
        let belief = refreshed(&own, 5, 20).with_probability(Rank::Seven, 0.5);
        let decision = decide(&own, &belief);
        assert_eq!(decision.rank, Rank::Seven);
        assert_eq!(decision.strategy, StrategyKind::NearCompleteSet);
    }

    #[test]
    fn near_complete_set_falls_back_to_first_candidate() {
        let own = hand(&[Rank::Four, Rank::Four, Rank::Nine, Rank::Nine, Rank::Nine]);
        let belief = refreshed(&own, 5, 20);
        // Both ranks are in hand, so both are known and score zero.
        assert_eq!(near_complete_set(&own, &belief), Some(Rank::Four));
    }

    #[test]
    fn near_complete_set_weighs_probability_by_score() {
        let own = hand(&[Rank::Four, Rank::Four, Rank::Nine, Rank::Nine]);
        let belief = refreshed(&own, 5, 20)
            .with_probability(Rank::Four, 0.4)
            .with_probability(Rank::Nine, 0.1);
        // 0.4 * 4 = 1.6 beats 0.1 * 9 = 0.9
        assert_eq!(near_complete_set(&own, &belief), Some(Rank::Four));
    }

    #[test]
    fn singles_and_books_are_not_near_complete() {
        let own = hand(&[Rank::Two, Rank::Five, Rank::Five, Rank::Five, Rank::Five]);
        assert!(near_complete_candidates(&own).is_empty());
        assert_eq!(hand_duplicate_candidates(&own).as_slice(), &[Rank::Five]);
    }

    #[test]
    fn high_probability_picks_highest_scoring_rank() {
        // Distinct hand, the opponent already won an Ace: K is the best unknown rank.
        let own = hand(&[Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six]);
        let mut belief = BeliefState::new();
        belief.observe_request(Party::Opponent, Rank::Ace, RequestOutcome::Hit);
        belief.refresh(&own, 5, 6);

        assert!((belief.probability(Rank::King) - 0.4).abs() < 1e-12);
        let decision = decide(&own, &belief);
        assert_eq!(decision.rank, Rank::King);
        assert_eq!(decision.strategy, StrategyKind::HighProbability);
    }

    #[test]
    fn high_probability_needs_the_threshold() {
        let own = hand(&[Rank::Two]);
        let belief = refreshed(&own, 20, 20);
        assert!(high_probability_candidates(&belief).is_empty());
        assert_eq!(high_probability(&own, &belief), None);
    }

    #[test]
    fn hand_duplicate_handles_four_of_a_kind() {
        let own = hand(&[Rank::Eight, Rank::Eight, Rank::Eight, Rank::Eight, Rank::Two]);
        let belief = refreshed(&own, 20, 20);
        assert_eq!(near_complete_set(&own, &belief), None);
        assert_eq!(hand_duplicate(&own, &belief), Some(Rank::Eight));
        assert_eq!(decide(&own, &belief).strategy, StrategyKind::HandDuplicate);
    }

    #[test]
    fn opponent_behaviour_mirrors_likely_recent_request() {
        let mut belief = BeliefState::new();
        belief.observe_request(Party::Opponent, Rank::Three, RequestOutcome::Miss);
        belief.observe_request(Party::Opponent, Rank::Six, RequestOutcome::Miss);
        let own = hand(&[Rank::Two]);
        belief.refresh(&own, 5, 10);
        // 16 cards, one known rank: 4/15 > 0.2 for both, newest first.
        assert_eq!(opponent_behaviour(&own, &belief), Some(Rank::Six));
    }

    #[test]
    fn opponent_behaviour_yields_nothing_when_unlikely() {
        let mut belief = BeliefState::new();
        belief.observe_request(Party::Opponent, Rank::Three, RequestOutcome::Miss);
        let own = hand(&[Rank::Two]);
        belief.refresh(&own, 20, 20);
        assert_eq!(opponent_behaviour(&own, &belief), None);
    }

    #[test]
    fn opponent_chasing_high_cards_redirects_to_highest_unrequested() {
        let mut belief = BeliefState::new();
        for rank in [Rank::Jack, Rank::Queen, Rank::King] {
            belief.observe_request(Party::Opponent, rank, RequestOutcome::Miss);
        }
        belief.observe_request(Party::Engine, Rank::Ace, RequestOutcome::Miss);
        let own = hand(&[Rank::Two]);
        belief.refresh(&own, 30, 30);
        assert_eq!(opponent_behaviour(&own, &belief), Some(Rank::King));
    }

    #[test]
    fn opponent_behaviour_without_history_is_empty() {
        let belief = refreshed(&RankCounts::default(), 5, 5);
        assert_eq!(opponent_behaviour(&RankCounts::default(), &belief), None);
    }

    #[test]
    fn highest_unrequested_walks_down_from_ace() {
        let mut belief = BeliefState::new();
        assert_eq!(highest_unrequested(&belief), Rank::Ace);
        belief.observe_request(Party::Engine, Rank::Ace, RequestOutcome::Miss);
        belief.observe_request(Party::Engine, Rank::King, RequestOutcome::Hit);
        assert_eq!(highest_unrequested(&belief), Rank::Queen);
    }

    #[test]
    fn everything_asked_falls_back_to_lowest_rank() {
        let mut belief = BeliefState::new();
        for rank in Rank::ALL {
            belief.observe_request(Party::Engine, rank, RequestOutcome::Miss);
        }
        let empty = RankCounts::default();
        belief.refresh(&empty, 0, 0);
        let decision = decide(&empty, &belief);
        assert_eq!(decision.rank, Rank::Two);
        assert_eq!(decision.strategy, StrategyKind::HighestUnrequested);
    }

    #[test]
    fn first_max_keeps_earliest_tie() {
        let ranks = [Rank::Three, Rank::Nine, Rank::Jack];
        assert_eq!(first_max_by(&ranks, |_| 1.0), Some(Rank::Three));
        assert_eq!(first_max_by(&ranks, |rank| rank.value() as f64), Some(Rank::Jack));
        assert_eq!(first_max_by(&[], |_| 1.0), None);
    }

    quickcheck::quickcheck! {
        fn decide_is_total(own: Vec<Rank>, asked: Vec<Rank>, opponent: Vec<Rank>, deck: u8, opponent_hand: u8) -> bool {
            let own: RankCounts = own.into_iter().take(20).collect();
            let mut belief = BeliefState::new();
            for rank in asked {
                belief.observe_request(Party::Engine, rank, RequestOutcome::Miss);
            }
            for rank in opponent {
                belief.observe_request(Party::Opponent, rank, RequestOutcome::Miss);
            }
            belief.refresh(&own, opponent_hand as usize, deck as usize);
            let rank = choose_rank(&own, &belief);
            Rank::ALL.contains(&rank)
        }
    }
}
