//! Table module providing multi-table support with async actor model.
//!
//! This module implements:
//! - TableActor: Async actor owning a single table's state
//! - TableManager: Registry spawning and addressing table actors
//! - Turn timers driven by a pluggable [`TimerSource`]
//! - Write-behind event publishing through an [`EventSink`]
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! Joins, leaves, actions and timer expiries all arrive through that inbox,
//! so they are applied strictly one after another. Subscribers and the
//! event sink are fed after each committed operation and never awaited.
//!
//! ## Example
//!
//! ```no_run
//! use table_engine::game::entities::{Action, SeatRequest};
//! use table_engine::table::{TableConfig, TableManager};
//!
//! # async fn demo() -> Result<(), table_engine::TableError> {
//! let manager = TableManager::new();
//! let table = manager.create_table(TableConfig::default()).await?;
//! let seat = manager.join_table(table, SeatRequest::new(1, 500)).await?;
//! manager.join_table(table, SeatRequest::new(2, 500)).await?;
//! manager.submit_action(table, seat, Action::Call).await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;
pub mod publisher;
pub mod timer;

pub use actor::{TableActor, TableHandle};
pub use config::{TableConfig, TableSpeed};
pub use manager::{TableManager, TableMetadata};
pub use messages::{EventEnvelope, SubscriberId, TableMessage, TableUpdate};
pub use publisher::{EventSink, LogSink, RetryPolicy, SinkError};
pub use timer::{ManualTimerSource, TimerSource, TokioTimerSource, TurnTimer};
