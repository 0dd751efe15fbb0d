//! # Table Engine
//!
//! An authoritative Texas Hold'em table engine.
//!
//! The engine tracks seats, chips, bets, community cards and turn order
//! for each table, enforces legal actions, advances betting rounds, deals
//! from a seeded deck, folds players whose turn timer runs out and settles
//! hands at showdown with side pots.
//!
//! ## Core Modules
//!
//! - [`game`]: Pure, synchronous table state and poker rules
//! - [`table`]: One Tokio actor per table, turn timers, subscriptions and
//!   event publishing
//!
//! ## Example
//!
//! ```
//! use table_engine::game::entities::{Action, Round, SeatRequest};
//! use table_engine::{TableConfig, TableState};
//!
//! let config = TableConfig {
//!     small_blind: 5,
//!     big_blind: 10,
//!     ..TableConfig::default()
//! };
//! let mut table = TableState::new(1, config);
//! table.join(SeatRequest::new(1, 1000)).unwrap();
//! table.join(SeatRequest::new(2, 1000)).unwrap();
//! table.start_hand().unwrap();
//!
//! // Heads-up the dealer posts the small blind and acts first.
//! assert_eq!(table.pot(), 15);
//! table.act(0, Action::Call).unwrap();
//! assert_eq!(table.round(), Round::Flop);
//! ```

/// Core game logic, entities, and table state.
pub mod game;
pub use game::{
    TableError, TableEvent, TableSnapshot, TableState,
    entities::{self, Action, Chips, SeatIndex, TableId},
};

/// Async table actors and their manager.
pub mod table;
pub use table::{TableConfig, TableHandle, TableManager};
