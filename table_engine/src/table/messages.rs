//! Table actor message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::game::{
    entities::{Action, Chips, PlayerId, SeatIndex, SeatRequest, TableId},
    errors::TableError,
    table::{TableEvent, TableSnapshot},
};

/// Identifies one subscription on a table.
pub type SubscriberId = u64;

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Join table request
    Join {
        request: SeatRequest,
        response: oneshot::Sender<Result<SeatIndex, TableError>>,
    },

    /// Leave table request; answers with the refunded chips
    Leave {
        seat: SeatIndex,
        response: oneshot::Sender<Result<Chips, TableError>>,
    },

    /// Player action (check, call, bet, raise, fold, all-in)
    TakeAction {
        seat: SeatIndex,
        action: Action,
        response: oneshot::Sender<Result<(), TableError>>,
    },

    /// Get current table snapshot, masked for `viewer`
    GetSnapshot {
        viewer: Option<PlayerId>,
        response: oneshot::Sender<TableSnapshot>,
    },

    /// Start a hand now instead of waiting for the automatic start
    StartHand {
        response: oneshot::Sender<Result<(), TableError>>,
    },

    /// Subscribe to table updates. The first update is a snapshot.
    Subscribe {
        viewer: Option<PlayerId>,
        sender: mpsc::Sender<TableUpdate>,
        response: oneshot::Sender<SubscriberId>,
    },

    /// Unsubscribe from table updates
    Unsubscribe { subscriber: SubscriberId },

    /// Internal: the turn timer for `(seat, turn_id)` ran out
    TimerExpired { seat: SeatIndex, turn_id: u64 },

    /// Internal: the pause between hands is over
    NextHand { hand_number: u64 },

    /// Close table, paying out every seat
    Close {
        response: oneshot::Sender<Vec<(SeatIndex, PlayerId, Chips)>>,
    },
}

/// A committed event with delivery metadata. `sequence` increases by one
/// per event on a table so at-least-once consumers can deduplicate.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventEnvelope {
    pub table_id: TableId,
    pub sequence: u64,
    pub at: DateTime<Utc>,
    pub event: TableEvent,
}

/// What subscribers receive.
#[derive(Clone, Debug, PartialEq)]
pub enum TableUpdate {
    Snapshot(Box<TableSnapshot>),
    Event(EventEnvelope),
}

impl TableUpdate {
    /// The event, if this update carries one.
    pub fn event(&self) -> Option<&TableEvent> {
        match self {
            TableUpdate::Event(envelope) => Some(&envelope.event),
            TableUpdate::Snapshot(_) => None,
        }
    }
}
