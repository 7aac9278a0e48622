use crate::belief::{BeliefState, Party, RequestOutcome};
use crate::card::{Card, Rank, RankCounts, Suit};
use crate::config::GameConfig;
use crate::strategy::{StrategyKind, decide};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{Level, event};

pub const BOOK_SIZE: u8 = 4;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deck {
    draw_pile: VecDeque<Card>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Hand {
    cards: Vec<Card>,
}

/// Seat 0 is the human, seat 1 the computer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Seat {
    Human,
    Computer,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn { current: Seat },
    #[error("The game is over")]
    GameOver,
}

/// Result of one request, hit or miss.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub requester: Seat,
    pub rank: Rank,
    pub success: bool,
    /// Cards handed over by the other seat. Empty on a miss.
    pub cards: Vec<Card>,
    /// Card drawn from the pile after a miss, if any were left.
    pub drawn: Option<Card>,
    /// Books completed by the requester during this turn.
    pub books: Vec<Rank>,
    /// Set when the computer chose the rank.
    pub strategy: Option<StrategyKind>,
}

#[derive(Clone, Debug)]
pub struct Game {
    deck: Deck,
    hands: [Hand; 2],
    books: [u32; 2],
    current: Seat,
    belief: BeliefState,
}

impl Deck {
    /// All 52 cards, suit by suit, in rank order.
    pub fn standard() -> Self {
        let draw_pile = Suit::ALL
            .iter()
            .flat_map(|&suit| Rank::ALL.iter().map(move |&rank| Card::new(suit, rank)))
            .collect();
        Self { draw_pile }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards: Vec<Card> = Self::standard().draw_pile.into();
        cards.shuffle(rng);
        Self::from_cards(cards)
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    /// A deck drawn front to back in the given order.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            draw_pile: VecDeque::from(cards),
        }
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.draw_pile.pop_front()
    }

    pub fn len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draw_pile.is_empty()
    }
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        let mut hand = Self { cards };
        hand.sort();
        hand
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
        self.sort();
    }

    pub fn extend<I: IntoIterator<Item = Card>>(&mut self, cards: I) {
        self.cards.extend(cards);
        self.sort();
    }

    /// Removes and returns every card of `rank`.
    pub fn take_rank(&mut self, rank: Rank) -> Vec<Card> {
        let (taken, kept): (Vec<Card>, Vec<Card>) =
            self.cards.drain(..).partition(|card| card.rank == rank);
        self.cards = kept;
        taken
    }

    /// Removes every complete book and returns the ranks that formed one.
    pub fn remove_books(&mut self) -> Vec<Rank> {
        let counts = self.rank_counts();
        let books: Vec<Rank> = counts.ranks_where(|count| count >= BOOK_SIZE).collect();
        self.cards.retain(|card| !books.contains(&card.rank));
        books
    }

    pub fn count_of(&self, rank: Rank) -> usize {
        self.cards.iter().filter(|card| card.rank == rank).count()
    }

    pub fn rank_counts(&self) -> RankCounts {
        RankCounts::from_cards(&self.cards)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn sort(&mut self) {
        self.cards.sort();
    }
}

impl Seat {
    pub const fn index(self) -> usize {
        match self {
            Seat::Human => 0,
            Seat::Computer => 1,
        }
    }

    pub const fn from_index(index: usize) -> Option<Seat> {
        match index {
            0 => Some(Seat::Human),
            1 => Some(Seat::Computer),
            _ => None,
        }
    }

    pub const fn other(self) -> Seat {
        match self {
            Seat::Human => Seat::Computer,
            Seat::Computer => Seat::Human,
        }
    }

    /// How the computer's belief state sees a request from this seat.
    pub const fn party(self) -> Party {
        match self {
            Seat::Human => Party::Opponent,
            Seat::Computer => Party::Engine,
        }
    }
}

impl Game {
    pub fn new(config: &GameConfig) -> Self {
        let deck = match config.seed {
            Some(seed) => Deck::shuffled_with_seed(seed),
            None => Deck::shuffled(&mut rand::rng()),
        };
        Self::with_deck(deck, config.hand_size)
    }

    /// Deals `hand_size` cards to each seat, alternating, human first.
    pub fn with_deck(mut deck: Deck, hand_size: usize) -> Self {
        let mut hands = [Hand::new(), Hand::new()];
        for _ in 0..hand_size {
            for hand in hands.iter_mut() {
                if let Some(card) = deck.draw() {
                    hand.add(card);
                }
            }
        }

        let mut books = [0, 0];
        for (hand, score) in hands.iter_mut().zip(books.iter_mut()) {
            *score += hand.remove_books().len() as u32;
        }

        Self {
            deck,
            hands,
            books,
            current: Seat::Human,
            belief: BeliefState::new(),
        }
    }

    /// Starts from hands already in place. Used to set up specific positions.
    pub fn from_parts(deck: Deck, human: Hand, computer: Hand, current: Seat) -> Self {
        Self {
            deck,
            hands: [human, computer],
            books: [0, 0],
            current,
            belief: BeliefState::new(),
        }
    }

    /// `from` asks the other seat for every card of `rank`.
    ///
    /// A hit keeps the turn with `from`. A miss draws one card for `from`
    /// (when the pile has any) and passes the turn.
    pub fn ask_for_cards(&mut self, from: Seat, rank: Rank) -> Result<TurnOutcome, GameError> {
        self.check_turn(from)?;
        Ok(self.resolve_request(from, rank, None))
    }

    /// Lets the computer pick a rank and ask for it.
    pub fn computer_move(&mut self) -> Result<TurnOutcome, GameError> {
        self.check_turn(Seat::Computer)?;

        let own = self.hand(Seat::Computer).rank_counts();
        let opponent_hand_size = self.hand(Seat::Human).len();
        let deck_remaining = self.deck.len();
        self.belief.refresh(&own, opponent_hand_size, deck_remaining);
        let decision = decide(&own, &self.belief);

        Ok(self.resolve_request(Seat::Computer, decision.rank, Some(decision.strategy)))
    }

    pub fn is_game_over(&self) -> bool {
        self.deck.is_empty() && self.hands.iter().any(Hand::is_empty)
    }

    /// The seat that ran out of cards once the game is over, human first
    /// when both hands are empty. Books don't decide the winner.
    pub fn winner(&self) -> Option<Seat> {
        if !self.is_game_over() {
            return None;
        }
        [Seat::Human, Seat::Computer]
            .into_iter()
            .find(|&seat| self.hand(seat).is_empty())
    }

    pub fn hand(&self, seat: Seat) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn books(&self) -> [u32; 2] {
        self.books
    }

    pub fn current_player(&self) -> Seat {
        self.current
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.len()
    }

    pub fn belief(&self) -> &BeliefState {
        &self.belief
    }

    fn check_turn(&self, seat: Seat) -> Result<(), GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        if seat != self.current {
            return Err(GameError::NotYourTurn {
                current: self.current,
            });
        }
        Ok(())
    }

    fn resolve_request(
        &mut self,
        from: Seat,
        rank: Rank,
        strategy: Option<StrategyKind>,
    ) -> TurnOutcome {
        let cards = self.hands[from.other().index()].take_rank(rank);
        let success = !cards.is_empty();

        let drawn = if success {
            self.hands[from.index()].extend(cards.iter().copied());
            None
        } else {
            let drawn = self.deck.draw();
            if let Some(card) = drawn {
                self.hands[from.index()].add(card);
            }
            drawn
        };

        self.belief
            .observe_request(from.party(), rank, RequestOutcome::from_success(success));

        let books = self.hands[from.index()].remove_books();
        self.books[from.index()] += books.len() as u32;

        if !success {
            self.current = from.other();
        }

        let outcome = TurnOutcome {
            requester: from,
            rank,
            success,
            cards,
            drawn,
            books,
            strategy,
        };
        log_turn(self, &outcome);
        outcome
    }
}

fn log_turn(game: &Game, outcome: &TurnOutcome) {
    event!(
        target: "gofish::game",
        Level::INFO,
        requester = ?outcome.requester,
        rank = %outcome.rank,
        success = outcome.success,
        received = outcome.cards.len(),
        drew = outcome.drawn.is_some(),
        books = outcome.books.len(),
        strategy = ?outcome.strategy,
        deck_remaining = game.deck_remaining(),
        next = ?game.current_player(),
        game_over = game.is_game_over(),
    );
}
