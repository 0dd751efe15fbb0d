use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::TableError;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

/// Lowest and highest card values. Aces are always high (14) in the deck;
/// the evaluator handles the wheel straight separately.
pub const MIN_VALUE: Value = 2;
pub const ACE: Value = 14;

/// A card is a tuple of a value (deuce=2u8 ... ace=14u8) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

/// Type alias for whole chips. Bets, stacks and pots are all counted in
/// indivisible chip units.
pub type Chips = u32;

/// Type alias for seat positions around the table (0-based, clockwise).
pub type SeatIndex = usize;

/// External identity of whoever occupies a seat.
pub type PlayerId = i64;

/// Table identity.
pub type TableId = i64;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = format!("${}/{}", self.small, self.big);
        write!(f, "{repr}")
    }
}

/// Table lifecycle.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum TableStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Betting street of the current hand.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Round {
    #[default]
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}

/// A requested player action. Bet and raise amounts are totals for the
/// current betting round.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    Check,
    Call,
    Bet(Chips),
    Raise(Chips),
    Fold,
    AllIn,
}

impl Action {
    /// Build an action from a kind and an optional amount, the shape
    /// external callers submit. Bet and raise require an amount.
    pub fn from_parts(kind: ActionKind, amount: Option<Chips>) -> Result<Self, TableError> {
        match (kind, amount) {
            (ActionKind::Check, _) => Ok(Self::Check),
            (ActionKind::Call, _) => Ok(Self::Call),
            (ActionKind::Fold, _) => Ok(Self::Fold),
            (ActionKind::AllIn, _) => Ok(Self::AllIn),
            (ActionKind::Bet, Some(amount)) => Ok(Self::Bet(amount)),
            (ActionKind::Raise, Some(amount)) => Ok(Self::Raise(amount)),
            (ActionKind::Bet | ActionKind::Raise, None) => Err(TableError::InvalidAmount),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Check => ActionKind::Check,
            Self::Call => ActionKind::Call,
            Self::Bet(_) => ActionKind::Bet,
            Self::Raise(_) => ActionKind::Raise,
            Self::Fold => ActionKind::Fold,
            Self::AllIn => ActionKind::AllIn,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Check => "checks",
            Self::Call => "calls",
            Self::Bet(amount) => &format!("bets ${amount}"),
            Self::Raise(amount) => &format!("raises to ${amount}"),
            Self::Fold => "folds",
            Self::AllIn => "goes all-in",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ActionKind {
    Check,
    Call,
    Bet,
    Raise,
    Fold,
    AllIn,
}

/// Immutable log entry of a committed action. `amount` is the number of
/// chips the action moved into the pot, if any.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionRecord {
    pub seat: SeatIndex,
    pub kind: ActionKind,
    pub amount: Option<Chips>,
    pub round: Round,
    /// Set when the action was synthesized by the turn timer.
    pub timed_out: bool,
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            ActionKind::Check => "checked",
            ActionKind::Call => "called",
            ActionKind::Bet => "bet",
            ActionKind::Raise => "raised",
            ActionKind::Fold => "folded",
            ActionKind::AllIn => "went all-in",
        };
        match self.amount {
            Some(amount) => write!(f, "seat {} {verb} ${amount} ({})", self.seat, self.round),
            None => write!(f, "seat {} {verb} ({})", self.seat, self.round),
        }
    }
}

/// Request to take a seat.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SeatRequest {
    pub player_id: PlayerId,
    pub buy_in: Chips,
    pub preferred_seat: Option<SeatIndex>,
    /// Balance the player holds outside the table, if the caller tracks one.
    pub available_balance: Option<Chips>,
}

impl SeatRequest {
    #[must_use]
    pub fn new(player_id: PlayerId, buy_in: Chips) -> Self {
        Self {
            player_id,
            buy_in,
            preferred_seat: None,
            available_balance: None,
        }
    }

    #[must_use]
    pub fn at_seat(mut self, seat: SeatIndex) -> Self {
        self.preferred_seat = Some(seat);
        self
    }

    #[must_use]
    pub fn with_balance(mut self, balance: Chips) -> Self {
        self.available_balance = Some(balance);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_display_face_cards() {
        assert_eq!(Card(14, Suit::Spade).to_string(), " A/♠");
        assert_eq!(Card(11, Suit::Heart).to_string(), " J/♥");
        assert_eq!(Card(10, Suit::Club).to_string(), "10/♣");
    }

    #[test]
    fn test_round_ordering() {
        assert!(Round::Preflop < Round::Flop);
        assert!(Round::Flop < Round::Turn);
        assert!(Round::Turn < Round::River);
        assert!(Round::River < Round::Showdown);
    }

    #[test]
    fn test_action_from_parts_requires_amount_for_bets() {
        assert_eq!(
            Action::from_parts(ActionKind::Bet, None),
            Err(TableError::InvalidAmount)
        );
        assert_eq!(
            Action::from_parts(ActionKind::Raise, Some(40)),
            Ok(Action::Raise(40))
        );
        assert_eq!(
            Action::from_parts(ActionKind::Check, Some(40)),
            Ok(Action::Check)
        );
    }

    #[test]
    fn test_action_kind_roundtrip() {
        for action in [
            Action::Check,
            Action::Call,
            Action::Bet(10),
            Action::Raise(20),
            Action::Fold,
            Action::AllIn,
        ] {
            let amount = match action {
                Action::Bet(a) | Action::Raise(a) => Some(a),
                _ => None,
            };
            assert_eq!(Action::from_parts(action.kind(), amount), Ok(action));
        }
    }

    #[test]
    fn test_action_record_display() {
        let record = ActionRecord {
            seat: 3,
            kind: ActionKind::Raise,
            amount: Some(80),
            round: Round::Flop,
            timed_out: false,
        };
        assert_eq!(record.to_string(), "seat 3 raised $80 (flop)");
    }

    #[test]
    fn test_blinds_display() {
        let blinds = Blinds { small: 5, big: 10 };
        assert_eq!(blinds.to_string(), "$5/10");
    }

    #[test]
    fn test_seat_request_builder() {
        let request = SeatRequest::new(7, 500).at_seat(2).with_balance(900);
        assert_eq!(request.preferred_seat, Some(2));
        assert_eq!(request.available_balance, Some(900));
    }
}
