//! Poker table engine - the synchronous core.
//!
//! Leaf modules hold the rules:
//! - [`deck`]: seeded, reproducible shuffles
//! - [`seat`]: per-seat state and chip movement
//! - [`betting`]: legality and chip math of one action
//! - [`turns`]: next actor, round completion, button rotation
//! - [`rounds`]: street transitions
//! - [`showdown`]: side pots and pot distribution
//!
//! [`table::TableState`] ties them together into one transaction per
//! operation.

pub mod betting;
pub mod deck;
pub mod entities;
pub mod errors;
pub mod eval;
pub mod rounds;
pub mod seat;
pub mod showdown;
pub mod table;
pub mod turns;

pub use errors::{DeckError, TableError};
pub use table::{TableEvent, TableSnapshot, TableState};
