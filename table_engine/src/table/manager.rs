//! Table manager for spawning and managing multiple table actors.

use super::{
    actor::{TableActor, TableHandle},
    config::TableConfig,
    messages::{SubscriberId, TableUpdate},
    publisher::EventSink,
    timer::{TimerSource, TokioTimerSource},
};
use crate::game::{
    entities::{Action, Blinds, Chips, PlayerId, SeatIndex, SeatRequest, TableId, TableStatus},
    errors::TableError,
    eval::StandardRanker,
    showdown::HandRanker,
    table::TableSnapshot,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};

/// Table metadata for discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    pub id: TableId,
    pub name: String,
    pub player_count: usize,
    pub max_seats: usize,
    pub blinds: Blinds,
    pub status: TableStatus,
    pub hand_number: u64,
}

impl From<&TableSnapshot> for TableMetadata {
    fn from(snapshot: &TableSnapshot) -> Self {
        Self {
            id: snapshot.table_id,
            name: snapshot.name.clone(),
            player_count: snapshot
                .seats
                .iter()
                .flatten()
                .filter(|s| !s.departed)
                .count(),
            max_seats: snapshot.seats.len(),
            blinds: snapshot.blinds,
            status: snapshot.status,
            hand_number: snapshot.hand_number,
        }
    }
}

/// Table manager for managing multiple table instances. Tables share
/// nothing but the collaborators handed to them here.
pub struct TableManager {
    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,

    /// Next table ID
    next_table_id: Arc<RwLock<TableId>>,

    timers: Arc<dyn TimerSource>,

    ranker: Arc<dyn HandRanker>,

    sink: Option<Arc<dyn EventSink>>,
}

impl Default for TableManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TableManager {
    /// Create a new table manager using real time and the standard ranker
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            next_table_id: Arc::new(RwLock::new(1)),
            timers: Arc::new(TokioTimerSource),
            ranker: Arc::new(StandardRanker),
            sink: None,
        }
    }

    #[must_use]
    pub fn with_timer_source(mut self, timers: Arc<dyn TimerSource>) -> Self {
        self.timers = timers;
        self
    }

    #[must_use]
    pub fn with_ranker(mut self, ranker: Arc<dyn HandRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    /// Every table created afterwards publishes its events to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Create and spawn a new table
    pub async fn create_table(&self, config: TableConfig) -> Result<TableId, TableError> {
        // Validate configuration
        config.validate().map_err(TableError::InvalidConfig)?;

        // Get next table ID
        let mut next_id = self.next_table_id.write().await;
        let table_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let (actor, handle) = TableActor::new(table_id, config);
        let mut actor = actor
            .with_timer_source(self.timers.clone())
            .with_ranker(self.ranker.clone());
        if let Some(sink) = &self.sink {
            actor = actor.with_sink(sink.clone());
        }

        // Store handle
        let mut tables = self.tables.write().await;
        tables.insert(table_id, handle);
        drop(tables);

        // Spawn actor task
        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned table {}", table_id);

        Ok(table_id)
    }

    /// Get a table handle
    pub async fn get_table(&self, table_id: TableId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&table_id).cloned()
    }

    async fn handle(&self, table_id: TableId) -> Result<TableHandle, TableError> {
        self.get_table(table_id)
            .await
            .ok_or(TableError::TableNotFound(table_id))
    }

    /// List all active tables, ordered by id
    pub async fn list_tables(&self) -> Vec<TableMetadata> {
        let handles: Vec<TableHandle> = {
            let tables = self.tables.read().await;
            tables.values().cloned().collect()
        };

        let mut metadata_list = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.snapshot(None).await {
                Ok(snapshot) => metadata_list.push(TableMetadata::from(&snapshot)),
                Err(e) => log::debug!("Skipping table {}: {}", handle.table_id(), e),
            }
        }
        metadata_list.sort_by_key(|m| m.id);
        metadata_list
    }

    /// Close a table, returning what every seat was paid out
    pub async fn close_table(
        &self,
        table_id: TableId,
    ) -> Result<Vec<(SeatIndex, PlayerId, Chips)>, TableError> {
        // Remove from active tables
        let handle = {
            let mut tables = self.tables.write().await;
            tables.remove(&table_id)
        }
        .ok_or(TableError::TableNotFound(table_id))?;

        let payouts = handle.close().await?;
        log::info!("Closed table {}", table_id);
        Ok(payouts)
    }

    /// Join a table
    pub async fn join_table(
        &self,
        table_id: TableId,
        request: SeatRequest,
    ) -> Result<SeatIndex, TableError> {
        self.handle(table_id).await?.join(request).await
    }

    /// Leave a table, returning the refunded chips
    pub async fn leave_table(&self, table_id: TableId, seat: SeatIndex) -> Result<Chips, TableError> {
        self.handle(table_id).await?.leave(seat).await
    }

    /// Submit a player action
    pub async fn submit_action(
        &self,
        table_id: TableId,
        seat: SeatIndex,
        action: Action,
    ) -> Result<(), TableError> {
        self.handle(table_id).await?.act(seat, action).await
    }

    /// Subscribe to a table's snapshot and event stream
    pub async fn subscribe(
        &self,
        table_id: TableId,
        viewer: Option<PlayerId>,
    ) -> Result<(SubscriberId, mpsc::Receiver<TableUpdate>), TableError> {
        self.handle(table_id).await?.subscribe(viewer).await
    }

    /// Get table snapshot
    pub async fn get_snapshot(
        &self,
        table_id: TableId,
        viewer: Option<PlayerId>,
    ) -> Result<TableSnapshot, TableError> {
        self.handle(table_id).await?.snapshot(viewer).await
    }

    /// Get active table count
    pub async fn active_table_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str) -> TableConfig {
        TableConfig {
            name: name.to_string(),
            small_blind: 1,
            big_blind: 2,
            min_buy_in: 40,
            max_buy_in: 200,
            max_seats: 6,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_table_validates_config() {
        let manager = TableManager::new();
        let bad = TableConfig {
            small_blind: 2,
            big_blind: 1,
            ..config("Broken")
        };
        assert!(matches!(
            manager.create_table(bad).await,
            Err(TableError::InvalidConfig(_))
        ));
        assert_eq!(manager.active_table_count().await, 0);
    }

    #[tokio::test]
    async fn test_table_ids_are_sequential() {
        let manager = TableManager::new();
        assert_eq!(manager.create_table(config("A")).await, Ok(1));
        assert_eq!(manager.create_table(config("B")).await, Ok(2));
        assert_eq!(manager.active_table_count().await, 2);
    }

    #[tokio::test]
    async fn test_list_tables() {
        let manager = TableManager::new();
        let a = manager.create_table(config("Alpha")).await.unwrap();
        let b = manager.create_table(config("Beta")).await.unwrap();
        manager
            .join_table(b, SeatRequest::new(5, 100))
            .await
            .unwrap();

        let tables = manager.list_tables().await;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].id, a);
        assert_eq!(tables[0].name, "Alpha");
        assert_eq!(tables[0].player_count, 0);
        assert_eq!(tables[1].player_count, 1);
        assert_eq!(tables[1].blinds, Blinds { small: 1, big: 2 });
        assert_eq!(tables[1].max_seats, 6);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let manager = TableManager::new();
        assert_eq!(
            manager.join_table(9, SeatRequest::new(1, 100)).await,
            Err(TableError::TableNotFound(9))
        );
        assert!(matches!(
            manager.close_table(9).await,
            Err(TableError::TableNotFound(9))
        ));
    }

    #[tokio::test]
    async fn test_close_table_pays_out() {
        let manager = TableManager::new();
        let id = manager.create_table(config("Gamma")).await.unwrap();
        manager
            .join_table(id, SeatRequest::new(1, 150))
            .await
            .unwrap();

        let payouts = manager.close_table(id).await.unwrap();
        assert_eq!(payouts, vec![(0, 1, 150)]);
        assert_eq!(manager.active_table_count().await, 0);
        assert!(manager.get_snapshot(id, None).await.is_err());
    }
}
