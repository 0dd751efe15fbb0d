use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::entities::{ACE, Card, MIN_VALUE, Suit};
use super::errors::DeckError;

pub const DECK_SIZE: usize = 52;

/// An ordered, non-repeating permutation of the 52 cards, consumed front
/// to back. A deck is created once per hand and never reshuffled.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: [Card; DECK_SIZE],
    pub deck_idx: usize,
    seed: u64,
}

impl Deck {
    /// Shuffle a fresh deck. The same seed always yields the same order;
    /// without a seed one is drawn from the thread RNG.
    #[must_use]
    pub fn shuffled(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        let mut deck = Self::ordered(seed);
        let mut rng = StdRng::seed_from_u64(seed);
        deck.cards.shuffle(&mut rng);
        deck
    }

    fn ordered(seed: u64) -> Self {
        let mut cards: [Card; DECK_SIZE] = [Card(MIN_VALUE, Suit::Club); DECK_SIZE];
        for (i, value) in (MIN_VALUE..=ACE).enumerate() {
            for (j, suit) in Suit::ALL.into_iter().enumerate() {
                cards[4 * i + j] = Card(value, suit);
            }
        }
        Self {
            cards,
            deck_idx: 0,
            seed,
        }
    }

    pub fn deal_card(&mut self) -> Result<Card, DeckError> {
        let card = *self.cards.get(self.deck_idx).ok_or(DeckError::Exhausted {
            requested: 1,
            remaining: 0,
        })?;
        self.deck_idx += 1;
        Ok(card)
    }

    /// Take the next `n` cards. Nothing is consumed when fewer remain.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        if n > self.remaining() {
            return Err(DeckError::Exhausted {
                requested: n,
                remaining: self.remaining(),
            });
        }
        let cards = self.cards[self.deck_idx..self.deck_idx + n].to_vec();
        self.deck_idx += n;
        Ok(cards)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        DECK_SIZE - self.deck_idx
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::shuffled(None)
    }
}
