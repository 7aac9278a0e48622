use std::cmp::Ordering;
use std::str::FromStr;

use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(u8)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("`{0}` does not match any known rank")]
pub struct ParseRankError(pub String);

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank.value().cmp(&other.rank.value())
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Rank {
    pub const COUNT: usize = 13;

    #[rustfmt::skip]
    pub const ALL: [Rank; Rank::COUNT] = [
        Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six,
        Rank::Seven, Rank::Eight, Rank::Nine, Rank::Ten,
        Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];

    /// Numeric value used for ordering and scoring: 2..=10 for pips, 11..=14 for faces.
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Position of the rank inside [`Rank::ALL`].
    pub const fn index(self) -> usize {
        (self as u8 - 2) as usize
    }

    pub fn from_index(index: usize) -> Option<Rank> {
        Rank::ALL.get(index).copied()
    }

    #[rustfmt::skip]
    pub const fn label(self) -> &'static str {
        match self {
            Rank::Two => "2", Rank::Three => "3", Rank::Four => "4",
            Rank::Five => "5", Rank::Six => "6", Rank::Seven => "7",
            Rank::Eight => "8", Rank::Nine => "9", Rank::Ten => "10",
            Rank::Jack => "J", Rank::Queen => "Q", Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

impl FromStr for Rank {
    type Err = ParseRankError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        Rank::ALL
            .iter()
            .copied()
            .find(|rank| rank.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseRankError(trimmed.to_string()))
    }
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    pub const fn name(self) -> &'static str {
        match self {
            Suit::Hearts => "Hearts",
            Suit::Diamonds => "Diamonds",
            Suit::Clubs => "Clubs",
            Suit::Spades => "Spades",
        }
    }
}

/// Set of ranks packed into the low 13 bits of a `u16`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct RankSet(u16);

impl RankSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, rank: Rank) -> bool {
        let was_present = self.contains(rank);
        self.0 |= 1 << rank.index();
        !was_present
    }

    pub fn contains(&self, rank: Rank) -> bool {
        self.0 & (1 << rank.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: RankSet) -> RankSet {
        RankSet(self.0 | other.0)
    }

    /// Ranks in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Rank> {
        let bits = self.0;
        (0..Rank::COUNT)
            .filter(move |index| bits & (1 << index) != 0)
            .filter_map(Rank::from_index)
    }
}

impl FromIterator<Rank> for RankSet {
    fn from_iter<I: IntoIterator<Item = Rank>>(iter: I) -> Self {
        let mut set = RankSet::empty();
        for rank in iter {
            set.insert(rank);
        }
        set
    }
}

/// Multiset of ranks, e.g. the rank profile of a hand.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct RankCounts([u8; Rank::COUNT]);

impl RankCounts {
    pub fn from_cards<'a, I>(cards: I) -> Self
    where
        I: IntoIterator<Item = &'a Card>,
    {
        cards.into_iter().map(|card| card.rank).collect()
    }

    pub fn get(&self, rank: Rank) -> u8 {
        self.0[rank.index()]
    }

    pub fn add(&mut self, rank: Rank) {
        self.0[rank.index()] = self.0[rank.index()].saturating_add(1);
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|&count| count as usize).sum()
    }

    /// Ranks held at least once.
    pub fn present(&self) -> RankSet {
        self.ranks_where(|count| count > 0).collect()
    }

    /// Ranks (ascending) whose count satisfies `predicate`.
    pub fn ranks_where<F>(&self, predicate: F) -> impl Iterator<Item = Rank>
    where
        F: Fn(u8) -> bool,
    {
        Rank::ALL
            .iter()
            .copied()
            .filter(move |rank| predicate(self.get(*rank)))
    }
}

impl FromIterator<Rank> for RankCounts {
    fn from_iter<I: IntoIterator<Item = Rank>>(iter: I) -> Self {
        let mut counts = RankCounts::default();
        for rank in iter {
            counts.add(rank);
        }
        counts
    }
}

use quickcheck::{Arbitrary, Gen};

impl Arbitrary for Rank {
    fn arbitrary(g: &mut Gen) -> Self {
        g.choose(&Rank::ALL).copied().unwrap_or(Rank::Two)
    }
}

impl Arbitrary for Suit {
    fn arbitrary(g: &mut Gen) -> Self {
        g.choose(&Suit::ALL).copied().unwrap_or(Suit::Hearts)
    }
}

impl Arbitrary for Card {
    fn arbitrary(g: &mut Gen) -> Self {
        Card {
            suit: Suit::arbitrary(g),
            rank: Rank::arbitrary(g),
        }
    }
}
