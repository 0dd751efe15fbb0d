//! Street progression: Preflop -> Flop -> Turn -> River -> Showdown.

use super::deck::Deck;
use super::entities::{Card, Chips, Round};
use super::errors::DeckError;
use super::seat::Seat;

impl Round {
    /// The street that follows this one. Showdown is terminal.
    #[must_use]
    pub fn next(self) -> Option<Round> {
        match self {
            Self::Preflop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => Some(Self::Showdown),
            Self::Showdown => None,
        }
    }

    /// Community cards revealed when entering this street.
    #[must_use]
    pub fn cards_dealt_on_entry(self) -> usize {
        match self {
            Self::Flop => 3,
            Self::Turn | Self::River => 1,
            Self::Preflop | Self::Showdown => 0,
        }
    }
}

/// What a street transition produced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreetTransition {
    Dealt { round: Round, cards: Vec<Card> },
    Showdown,
    /// Already at showdown; nothing to do.
    Terminal,
}

/// Move the hand to its next street, dealing from the hand's single deck
/// and resetting the betting round. On a deck failure nothing is changed.
pub fn advance(
    round: &mut Round,
    deck: &mut Deck,
    board: &mut Vec<Card>,
    seats: &mut [Option<Seat>],
    table_bet: &mut Chips,
) -> Result<StreetTransition, DeckError> {
    let Some(next) = round.next() else {
        return Ok(StreetTransition::Terminal);
    };

    let cards = deck.draw(next.cards_dealt_on_entry())?;
    *round = next;
    *table_bet = 0;
    for seat in seats.iter_mut().flatten() {
        seat.current_bet = 0;
        seat.has_acted = false;
        seat.is_turn = false;
    }

    if next == Round::Showdown {
        return Ok(StreetTransition::Showdown);
    }

    board.extend_from_slice(&cards);
    Ok(StreetTransition::Dealt { round: next, cards })
}
