//! Engine error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Chips, SeatIndex, TableId};

/// Errors raised by the deck.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum DeckError {
    #[error("deck exhausted: requested {requested}, {remaining} remaining")]
    Exhausted { requested: usize, remaining: usize },
}

/// Errors returned by table operations.
///
/// Validation errors never mutate table state. `DeckExhausted` and
/// `ChipConservation` are fatal: the table halts and every later mutation
/// fails with `TableHalted`.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum TableError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("invalid amount")]
    InvalidAmount,
    #[error("insufficient chips")]
    InsufficientChips,
    #[error("can't check facing a bet")]
    IllegalCheck,
    #[error("illegal raise")]
    IllegalRaise,
    #[error("can't bet into an open bet")]
    IllegalBet,
    #[error("nothing to call")]
    IllegalCall,
    #[error("seat {0} is taken")]
    SeatTaken(SeatIndex),
    #[error("table is full")]
    TableFull,
    #[error("buy-in of ${buy_in} is outside the table limits or your balance")]
    InvalidBuyIn { buy_in: Chips },
    #[error("seat {0} does not exist at this table")]
    InvalidSeat(SeatIndex),
    #[error("no player in seat {0}")]
    SeatNotFound(SeatIndex),
    #[error("player is already seated")]
    AlreadySeated,
    #[error("hand in progress")]
    HandInProgress,
    #[error("need 2+ funded players")]
    NotEnoughPlayers,
    #[error("table is not playing")]
    TableNotPlaying,
    #[error(transparent)]
    DeckExhausted(#[from] DeckError),
    #[error("chip conservation violated: expected {expected}, found {actual}")]
    ChipConservation { expected: u64, actual: u64 },
    #[error("table halted: {0}")]
    TableHalted(String),
    #[error("table is closed")]
    TableClosed,
    #[error("table {0} not found")]
    TableNotFound(TableId),
    #[error("invalid table config: {0}")]
    InvalidConfig(String),
}

impl TableError {
    /// Whether this error halts the table.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DeckExhausted(_) | Self::ChipConservation { .. }
        )
    }
}
