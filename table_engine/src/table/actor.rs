//! Table actor implementation with async message handling.

use super::{
    config::TableConfig,
    messages::{EventEnvelope, SubscriberId, TableMessage, TableUpdate},
    publisher::{EventSink, RetryPolicy, spawn_publisher},
    timer::{self, TimerSource, TokioTimerSource, TurnTimer},
};
use crate::game::{
    entities::{Action, Chips, PlayerId, SeatIndex, SeatRequest, TableId, TableStatus},
    errors::TableError,
    showdown::HandRanker,
    table::{TableEvent, TableSnapshot, TableState},
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Capacity of a table inbox.
const INBOX_CAPACITY: usize = 100;

/// Default capacity of a subscriber channel.
pub const SUBSCRIBER_CAPACITY: usize = 256;

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), TableError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::TableClosed)
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> TableMessage,
    ) -> Result<T, TableError> {
        let (tx, rx) = oneshot::channel();
        self.send(message(tx)).await?;
        rx.await.map_err(|_| TableError::TableClosed)
    }

    pub async fn join(&self, request: SeatRequest) -> Result<SeatIndex, TableError> {
        self.request(|response| TableMessage::Join { request, response })
            .await?
    }

    pub async fn leave(&self, seat: SeatIndex) -> Result<Chips, TableError> {
        self.request(|response| TableMessage::Leave { seat, response })
            .await?
    }

    pub async fn act(&self, seat: SeatIndex, action: Action) -> Result<(), TableError> {
        self.request(|response| TableMessage::TakeAction {
            seat,
            action,
            response,
        })
        .await?
    }

    pub async fn start_hand(&self) -> Result<(), TableError> {
        self.request(|response| TableMessage::StartHand { response })
            .await?
    }

    pub async fn snapshot(&self, viewer: Option<PlayerId>) -> Result<TableSnapshot, TableError> {
        self.request(|response| TableMessage::GetSnapshot { viewer, response })
            .await
    }

    /// Subscribe to updates. The first update received is a snapshot.
    pub async fn subscribe(
        &self,
        viewer: Option<PlayerId>,
    ) -> Result<(SubscriberId, mpsc::Receiver<TableUpdate>), TableError> {
        let (sender, updates) = mpsc::channel(SUBSCRIBER_CAPACITY);
        let id = self
            .request(|response| TableMessage::Subscribe {
                viewer,
                sender,
                response,
            })
            .await?;
        Ok((id, updates))
    }

    pub async fn unsubscribe(&self, subscriber: SubscriberId) -> Result<(), TableError> {
        self.send(TableMessage::Unsubscribe { subscriber }).await
    }

    /// Close the table and get every seat's payout.
    pub async fn close(&self) -> Result<Vec<(SeatIndex, PlayerId, Chips)>, TableError> {
        self.request(|response| TableMessage::Close { response })
            .await
    }
}

struct Subscriber {
    viewer: Option<PlayerId>,
    sender: mpsc::Sender<TableUpdate>,
}

/// Table actor owning one table's state. Every request, timer expiry
/// included, goes through the inbox and is handled one at a time.
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Authoritative table state
    state: TableState,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Own inbox, for timers
    self_sender: mpsc::WeakSender<TableMessage>,

    timers: Arc<dyn TimerSource>,

    turn_timer: TurnTimer,

    /// Pending start of the next hand
    next_hand: Option<JoinHandle<()>>,

    /// External sink, moved into the publisher task on start
    sink: Option<Arc<dyn EventSink>>,

    publisher: Option<mpsc::UnboundedSender<EventEnvelope>>,

    /// Last event sequence number handed out
    sequence: u64,

    /// Subscribers for table updates
    subscribers: HashMap<SubscriberId, Subscriber>,

    next_subscriber: SubscriberId,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(id: TableId, config: TableConfig) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let timers: Arc<dyn TimerSource> = Arc::new(TokioTimerSource);

        let actor = Self {
            id,
            state: TableState::new(id, config),
            inbox,
            self_sender: sender.downgrade(),
            turn_timer: TurnTimer::new(timers.clone()),
            timers,
            next_hand: None,
            sink: None,
            publisher: None,
            sequence: 0,
            subscribers: HashMap::new(),
            next_subscriber: 1,
            is_closed: false,
        };

        let handle = TableHandle::new(sender, id);

        (actor, handle)
    }

    #[must_use]
    pub fn with_timer_source(mut self, timers: Arc<dyn TimerSource>) -> Self {
        self.turn_timer = TurnTimer::new(timers.clone());
        self.timers = timers;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn with_ranker(mut self, ranker: Arc<dyn HandRanker>) -> Self {
        let config = self.state.config().clone();
        self.state = TableState::with_ranker(self.id, config, ranker);
        self
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        let name = self.state.config().name.clone();
        log::info!("Table {} '{}' starting", self.id, name);

        if let Some(sink) = self.sink.take() {
            let (publisher, _task) = spawn_publisher(sink, RetryPolicy::default());
            self.publisher = Some(publisher);
        }

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);

            if self.is_closed {
                break;
            }
        }

        self.turn_timer.cancel();
        if let Some(task) = self.next_hand.take() {
            task.abort();
        }
        log::info!("Table {} '{}' closed", self.id, name);
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Join { request, response } => {
                let result = self.state.join(request);
                self.after_commit();
                let _ = response.send(result);
            }

            TableMessage::Leave { seat, response } => {
                let result = self.state.leave(seat);
                self.after_commit();
                let _ = response.send(result);
            }

            TableMessage::TakeAction {
                seat,
                action,
                response,
            } => {
                let result = self.state.act(seat, action);
                if let Err(e) = &result {
                    log::debug!("Table {}: seat {seat} action {action} rejected: {e}", self.id);
                }
                self.after_commit();
                let _ = response.send(result);
            }

            TableMessage::GetSnapshot { viewer, response } => {
                let _ = response.send(self.state.snapshot(viewer));
            }

            TableMessage::StartHand { response } => {
                let result = self.state.start_hand();
                self.after_commit();
                let _ = response.send(result);
            }

            TableMessage::Subscribe {
                viewer,
                sender,
                response,
            } => {
                let id = self.next_subscriber;
                self.next_subscriber += 1;
                let snapshot = TableUpdate::Snapshot(Box::new(self.state.snapshot(viewer)));
                if sender.try_send(snapshot).is_ok() {
                    self.subscribers.insert(id, Subscriber { viewer, sender });
                    log::debug!("Subscriber {} subscribed to table {}", id, self.id);
                }
                let _ = response.send(id);
            }

            TableMessage::Unsubscribe { subscriber } => {
                self.subscribers.remove(&subscriber);
                log::debug!("Subscriber {} unsubscribed from table {}", subscriber, self.id);
            }

            TableMessage::TimerExpired { seat, turn_id } => {
                match self.state.timer_expired(seat, turn_id) {
                    Ok(true) => {
                        self.turn_timer.cancel();
                    }
                    Ok(false) => {}
                    Err(e) => log::error!("Table {}: timeout fold failed: {e}", self.id),
                }
                self.after_commit();
            }

            TableMessage::NextHand { hand_number } => {
                self.next_hand = None;
                if self.state.hand_number() == hand_number && self.state.can_start_hand() {
                    if let Err(e) = self.state.start_hand() {
                        log::warn!("Table {}: could not start next hand: {e}", self.id);
                    }
                }
                self.after_commit();
            }

            TableMessage::Close { response } => {
                let payouts = self.state.close();
                self.is_closed = true;
                self.after_commit();
                let _ = response.send(payouts);
            }
        }
    }

    /// Follow-up after any mutation: start a hand if one is due, publish
    /// what happened and keep the turn timer in step with the turn.
    fn after_commit(&mut self) {
        self.maybe_start_hand();
        self.flush_events();
        self.sync_turn_timer();
    }

    fn maybe_start_hand(&mut self) {
        if self.is_closed || self.next_hand.is_some() || !self.state.can_start_hand() {
            return;
        }
        match self.state.config().next_hand_delay() {
            Some(delay) if self.state.hand_number() > 0 => {
                let message = TableMessage::NextHand {
                    hand_number: self.state.hand_number(),
                };
                log::debug!("Table {}: next hand in {:?}", self.id, delay);
                self.next_hand = Some(timer::schedule(
                    self.timers.clone(),
                    delay,
                    self.self_sender.clone(),
                    message,
                ));
            }
            _ => {
                if let Err(e) = self.state.start_hand() {
                    log::warn!("Table {}: could not start hand: {e}", self.id);
                }
            }
        }
    }

    fn flush_events(&mut self) {
        let events = self.state.drain_events();
        if events.is_empty() {
            return;
        }
        let reveal = events.iter().any(|e| {
            matches!(
                e,
                TableEvent::HandStarted { .. } | TableEvent::HandsRevealed { .. }
            )
        });

        for event in events {
            self.sequence += 1;
            let envelope = EventEnvelope {
                table_id: self.id,
                sequence: self.sequence,
                at: Utc::now(),
                event,
            };
            if let Some(publisher) = &self.publisher
                && publisher.send(envelope.clone()).is_err()
            {
                log::warn!("Table {}: publisher stopped, event {} not delivered", self.id, envelope.sequence);
            }
            self.notify(TableUpdate::Event(envelope));
        }

        // Hole cards only travel in masked snapshots.
        if reveal {
            self.push_snapshots();
        }
    }

    fn sync_turn_timer(&mut self) {
        match (self.state.status(), self.state.active_seat()) {
            (TableStatus::Playing, Some(seat)) => {
                let turn_id = self.state.turn_id();
                if self.turn_timer.armed_for() != Some((seat, turn_id)) {
                    self.turn_timer.arm(
                        seat,
                        turn_id,
                        self.state.config().action_timeout(),
                        self.self_sender.clone(),
                    );
                }
            }
            _ => self.turn_timer.cancel(),
        }
    }

    /// Broadcast an update to all subscribers
    fn notify(&mut self, update: TableUpdate) {
        self.subscribers.retain(|id, subscriber| {
            match subscriber.sender.try_send(update.clone()) {
                Ok(_) => true, // Keep subscriber
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Subscriber {} channel full, dropping update", id);
                    true // Keep subscriber but drop this update
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", id);
                    false // Remove subscriber
                }
            }
        });
    }

    /// Send every subscriber a snapshot masked for its viewer
    fn push_snapshots(&mut self) {
        let state = &self.state;
        self.subscribers.retain(|id, subscriber| {
            let snapshot = TableUpdate::Snapshot(Box::new(state.snapshot(subscriber.viewer)));
            match subscriber.sender.try_send(snapshot) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Subscriber {} channel full, dropping snapshot", id);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}
