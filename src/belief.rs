//! What the computer player believes about the cards it cannot see.
//!
//! The primitive observations (who asked for what, and how it went) are the
//! only state that accumulates. Everything derived from them is rebuilt by
//! [`BeliefState::refresh`] at the start of every computer turn.

use crate::card::{Rank, RankCounts, RankSet};

/// Cards of each rank in a standard deck.
pub const CARDS_PER_RANK: u32 = 4;

/// Side of the table a request came from, seen from the computer player.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Party {
    Engine,
    Opponent,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RequestOutcome {
    Hit,
    Miss,
}

impl RequestOutcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            RequestOutcome::Hit
        } else {
            RequestOutcome::Miss
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BeliefState {
    asked_by_self: RankSet,
    asked_by_opponent: RankSet,
    received_by_self: RankSet,
    received_by_opponent: RankSet,
    success_count: [u32; Rank::COUNT],
    failure_count: [u32; Rank::COUNT],
    /// Opponent requests, oldest first. Repeats are kept.
    opponent_requests: Vec<Rank>,
    consecutive_failures: u32,
    turns_observed: u32,

    known_ranks: RankSet,
    rank_probability: [f64; Rank::COUNT],
    deck_remaining: usize,
    unknown_card_count: usize,
}

impl BeliefState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one request. Must be called for every request made by either
    /// side, before the next [`refresh`](Self::refresh).
    pub fn observe_request(&mut self, requester: Party, rank: Rank, outcome: RequestOutcome) {
        match requester {
            Party::Engine => {
                self.asked_by_self.insert(rank);
                match outcome {
                    RequestOutcome::Hit => {
                        self.received_by_self.insert(rank);
                        self.success_count[rank.index()] += 1;
                        self.consecutive_failures = 0;
                    }
                    RequestOutcome::Miss => {
                        self.failure_count[rank.index()] += 1;
                        self.consecutive_failures += 1;
                    }
                }
            }
            Party::Opponent => {
                self.asked_by_opponent.insert(rank);
                self.opponent_requests.push(rank);
                if outcome == RequestOutcome::Hit {
                    self.received_by_opponent.insert(rank);
                }
            }
        }
    }

    /// Rebuilds every derived field from the recorded observations and the
    /// current table.
    ///
    /// The estimate for a rank nobody has accounted for is the number of its
    /// cards not yet won by the computer, divided over the unknown cards, and
    /// clamped to `[0, 1]`. Accounted-for ranks, and every rank once no
    /// unknown cards remain, get 0.
    pub fn refresh(
        &mut self,
        own_hand: &RankCounts,
        opponent_hand_size: usize,
        deck_remaining: usize,
    ) {
        self.known_ranks = own_hand
            .present()
            .union(self.received_by_self)
            .union(self.received_by_opponent);
        self.deck_remaining = deck_remaining;

        let total_cards = deck_remaining + opponent_hand_size + own_hand.total();
        self.unknown_card_count = total_cards.saturating_sub(self.known_ranks.len());

        for rank in Rank::ALL {
            let unknown = !self.known_ranks.contains(rank);
            self.rank_probability[rank.index()] = if unknown && self.unknown_card_count > 0 {
                let remaining = CARDS_PER_RANK.saturating_sub(self.success_count[rank.index()]);
                (remaining as f64 / self.unknown_card_count as f64).clamp(0.0, 1.0)
            } else {
                0.0
            };
        }

        self.turns_observed += 1;
    }

    pub fn probability(&self, rank: Rank) -> f64 {
        self.rank_probability[rank.index()]
    }

    pub fn success_count(&self, rank: Rank) -> u32 {
        self.success_count[rank.index()]
    }

    pub fn failure_count(&self, rank: Rank) -> u32 {
        self.failure_count[rank.index()]
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck_remaining
    }

    pub fn unknown_card_count(&self) -> usize {
        self.unknown_card_count
    }

    pub fn known_ranks(&self) -> RankSet {
        self.known_ranks
    }

    pub fn asked_by_self(&self) -> RankSet {
        self.asked_by_self
    }

    pub fn asked_by_opponent(&self) -> RankSet {
        self.asked_by_opponent
    }

    pub fn received_by_self(&self) -> RankSet {
        self.received_by_self
    }

    pub fn received_by_opponent(&self) -> RankSet {
        self.received_by_opponent
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn turns_observed(&self) -> u32 {
        self.turns_observed
    }

    /// Up to `limit` distinct ranks the opponent asked for, most recent first.
    pub fn recent_opponent_ranks(&self, limit: usize) -> Vec<Rank> {
        let mut seen = RankSet::empty();
        self.opponent_requests
            .iter()
            .rev()
            .copied()
            .filter(|rank| seen.insert(*rank))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
impl BeliefState {
    /// Overrides derived fields so strategies can be exercised on states
    /// that `refresh` alone would not produce.
    pub(crate) fn with_probability(mut self, rank: Rank, probability: f64) -> Self {
        self.rank_probability[rank.index()] = probability;
        self
    }

    pub(crate) fn with_deck_remaining(mut self, deck_remaining: usize) -> Self {
        self.deck_remaining = deck_remaining;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    fn hand(ranks: &[Rank]) -> RankCounts {
        ranks.iter().copied().collect()
    }

    #[test]
    fn engine_requests_update_counts_and_sets() {
        let mut belief = BeliefState::new();
        belief.observe_request(Party::Engine, Rank::Nine, RequestOutcome::Miss);
        belief.observe_request(Party::Engine, Rank::Nine, RequestOutcome::Hit);
        belief.observe_request(Party::Engine, Rank::Four, RequestOutcome::Miss);

        assert_eq!(belief.success_count(Rank::Nine), 1);
        assert_eq!(belief.failure_count(Rank::Nine), 1);
        assert_eq!(belief.failure_count(Rank::Four), 1);
        assert!(belief.asked_by_self().contains(Rank::Four));
        assert!(belief.received_by_self().contains(Rank::Nine));
        assert!(!belief.received_by_self().contains(Rank::Four));
        assert_eq!(belief.consecutive_failures(), 1);
    }

    #[test]
    fn opponent_requests_do_not_touch_engine_tallies() {
        let mut belief = BeliefState::new();
        belief.observe_request(Party::Opponent, Rank::King, RequestOutcome::Hit);
        belief.observe_request(Party::Opponent, Rank::Two, RequestOutcome::Miss);

        assert_eq!(belief.success_count(Rank::King), 0);
        assert!(belief.asked_by_opponent().contains(Rank::Two));
        assert!(belief.received_by_opponent().contains(Rank::King));
        assert!(!belief.received_by_opponent().contains(Rank::Two));
        assert!(belief.asked_by_self().is_empty());
    }

    #[test]
    fn refresh_zeroes_known_ranks() {
        let mut belief = BeliefState::new();
        belief.observe_request(Party::Opponent, Rank::Queen, RequestOutcome::Hit);
        let own = hand(&[Rank::Three, Rank::Three, Rank::Eight]);
        belief.refresh(&own, 5, 30);

        // 30 + 5 + 3 cards, three ranks accounted for.
        assert_eq!(belief.unknown_card_count(), 35);
        assert_eq!(belief.probability(Rank::Three), 0.0);
        assert_eq!(belief.probability(Rank::Eight), 0.0);
        assert_eq!(belief.probability(Rank::Queen), 0.0);
        assert!((belief.probability(Rank::Ace) - 4.0 / 35.0).abs() < 1e-12);
    }

    #[test]
    fn successes_lower_the_estimate() {
        let mut belief = BeliefState::new();
        belief.success_count[Rank::Six.index()] = 2;
        belief.refresh(&RankCounts::default(), 10, 10);
        assert!((belief.probability(Rank::Six) - 2.0 / 20.0).abs() < 1e-12);
        assert!((belief.probability(Rank::Seven) - 4.0 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn a_hit_makes_the_rank_known() {
        let mut belief = BeliefState::new();
        belief.observe_request(Party::Engine, Rank::Six, RequestOutcome::Hit);
        belief.refresh(&RankCounts::default(), 10, 10);
        assert!(belief.known_ranks().contains(Rank::Six));
        assert_eq!(belief.probability(Rank::Six), 0.0);
    }

    #[test]
    fn zero_unknown_cards_yield_zero_probability() {
        let mut belief = BeliefState::new();
        belief.refresh(&RankCounts::default(), 0, 0);
        assert_eq!(belief.unknown_card_count(), 0);
        for rank in Rank::ALL {
            assert_eq!(belief.probability(rank), 0.0);
        }
    }

    #[test]
    fn small_unknown_pool_is_clamped() {
        let mut belief = BeliefState::new();
        belief.refresh(&RankCounts::default(), 1, 0);
        assert_eq!(belief.unknown_card_count(), 1);
        assert_eq!(belief.probability(Rank::Two), 1.0);
    }

    #[test]
    fn recent_opponent_ranks_are_distinct_and_newest_first() {
        let mut belief = BeliefState::new();
        for rank in [Rank::Two, Rank::Five, Rank::Two, Rank::Nine, Rank::Nine, Rank::Jack] {
            belief.observe_request(Party::Opponent, rank, RequestOutcome::Miss);
        }
        assert_eq!(
            belief.recent_opponent_ranks(3),
            vec![Rank::Jack, Rank::Nine, Rank::Two]
        );
        assert_eq!(belief.recent_opponent_ranks(10).len(), 4);
    }

    #[test]
    fn refresh_is_repeatable() {
        let mut belief = BeliefState::new();
        belief.observe_request(Party::Engine, Rank::Ten, RequestOutcome::Miss);
        let own = hand(&[Rank::Ace, Rank::Two]);
        belief.refresh(&own, 4, 12);
        let first = belief.rank_probability;
        belief.refresh(&own, 4, 12);
        assert_eq!(first, belief.rank_probability);
        assert_eq!(belief.turns_observed(), 2);
    }

    #[derive(Clone, Debug)]
    struct Observation {
        requester: Party,
        rank: Rank,
        outcome: RequestOutcome,
    }

    impl Arbitrary for Observation {
        fn arbitrary(g: &mut Gen) -> Self {
            Observation {
                requester: if bool::arbitrary(g) { Party::Engine } else { Party::Opponent },
                rank: Rank::arbitrary(g),
                outcome: RequestOutcome::from_success(bool::arbitrary(g)),
            }
        }
    }

    quickcheck::quickcheck! {
        fn probabilities_stay_in_unit_interval(
            observations: Vec<Observation>,
            own: Vec<Rank>,
            opponent_hand_size: u8,
            deck_remaining: u8
        ) -> bool {
            let mut belief = BeliefState::new();
            for obs in &observations {
                belief.observe_request(obs.requester, obs.rank, obs.outcome);
            }
            belief.refresh(&own.iter().copied().collect(), opponent_hand_size as usize, deck_remaining as usize);
            Rank::ALL.iter().all(|&rank| {
                let p = belief.probability(rank);
                (0.0..=1.0).contains(&p)
            })
        }

        fn known_ranks_always_zero(observations: Vec<Observation>, own: Vec<Rank>, deck_remaining: u8) -> bool {
            let mut belief = BeliefState::new();
            for obs in &observations {
                belief.observe_request(obs.requester, obs.rank, obs.outcome);
            }
            belief.refresh(&own.iter().copied().collect(), 7, deck_remaining as usize);
            belief.known_ranks().iter().all(|rank| belief.probability(rank) == 0.0)
        }
    }
}
