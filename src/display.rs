use crate::belief::BeliefState;
use crate::card::{Card, Rank, Suit};
use crate::game::{Hand, Seat, TurnOutcome};
use crate::scoring::score;
use crate::simulation::SimulationSummary;
use std::fmt;

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} of {}", self.rank, self.suit)
    }
}

impl Card {
    /// Two or three character form used by the terminal game, e.g. `10♡`.
    pub fn short(&self) -> String {
        let suit_char = match self.suit {
            Suit::Hearts => '♡',
            Suit::Diamonds => '♢',
            Suit::Clubs => '♧',
            Suit::Spades => '♤',
        };
        format!("{}{suit_char}", self.rank)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cards = self
            .cards()
            .iter()
            .map(Card::short)
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{cards}")
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Seat::Human => f.write_str("You"),
            Seat::Computer => f.write_str("Computer"),
        }
    }
}

impl fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} asked for {}s: ", self.requester, self.rank)?;
        if self.success {
            write!(f, "got {} card(s)", self.cards.len())?;
        } else {
            match self.drawn {
                Some(_) => write!(f, "go fish")?,
                None => write!(f, "go fish, but the pile is empty")?,
            }
        }
        if !self.books.is_empty() {
            let books = self
                .books
                .iter()
                .map(|rank| rank.label())
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " and completed a book of {books}")?;
        }
        Ok(())
    }
}

impl fmt::Display for BeliefState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "=== Belief (turn {}, deck {}, unknown {}, misses in a row {}) ===",
            self.turns_observed(),
            self.deck_remaining(),
            self.unknown_card_count(),
            self.consecutive_failures()
        )?;
        writeln!(f, "rank  prob   score  hit miss  flags")?;
        for rank in Rank::ALL {
            let mut flags = String::new();
            if self.known_ranks().contains(rank) {
                flags.push('K');
            }
            if self.asked_by_self().contains(rank) {
                flags.push('a');
            }
            if self.asked_by_opponent().contains(rank) {
                flags.push('o');
            }
            writeln!(
                f,
                "{:>4}  {:.3}  {:>5.1}  {:>3} {:>4}  {}",
                rank.label(),
                self.probability(rank),
                score(rank, self),
                self.success_count(rank),
                self.failure_count(rank),
                flags
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pct = |count: usize| {
            if self.games == 0 {
                0.0
            } else {
                count as f64 * 100.0 / self.games as f64
            }
        };

        writeln!(f, "=== Simulation ({} games) ===", self.games)?;
        writeln!(
            f,
            "  Computer wins: {} ({:.1}%)",
            self.computer_wins,
            pct(self.computer_wins)
        )?;
        writeln!(
            f,
            "  Opponent wins: {} ({:.1}%)",
            self.opponent_wins,
            pct(self.opponent_wins)
        )?;
        writeln!(f, "  Stalled: {}", self.stalled)?;
        writeln!(f, "  Average turns: {:.1}", self.average_turns)?;
        writeln!(
            f,
            "  Average books: computer {:.2}, opponent {:.2}",
            self.average_books[1], self.average_books[0]
        )?;
        writeln!(f, "  Computer hit rate: {:.1}%", self.computer_hit_rate * 100.0)?;
        Ok(())
    }
}
