//! Pluggable clock for turn deadlines and the pause between hands.

use async_trait::async_trait;
use log::debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::messages::TableMessage;
use crate::game::entities::SeatIndex;

/// Source of delays. Tables never read a clock directly, so tests can
/// swap in [`ManualTimerSource`] and fast-forward deterministically.
#[async_trait]
pub trait TimerSource: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real time through `tokio::time`, which also honours a paused test clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimerSource;

#[async_trait]
impl TimerSource for TokioTimerSource {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Default)]
struct ManualClock {
    now: Duration,
    sleepers: Vec<(Duration, oneshot::Sender<()>)>,
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualTimerSource {
    clock: Mutex<ManualClock>,
}

impl ManualTimerSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward and wake every sleeper whose deadline passed.
    /// Sleeps whose task was aborted are dropped along the way.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        clock.now += by;
        let now = clock.now;
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut clock.sleepers)
            .into_iter()
            .filter(|(_, waker)| !waker.is_closed())
            .partition(|(deadline, _)| *deadline <= now);
        clock.sleepers = waiting;
        drop(clock);

        for (_, waker) in due {
            let _ = waker.send(());
        }
    }

    /// Time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner).now
    }

    /// Sleeps that have not fired yet and are still awaited.
    pub fn pending(&self) -> usize {
        self.clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sleepers
            .iter()
            .filter(|(_, waker)| !waker.is_closed())
            .count()
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sleepers
            .len()
    }
}

#[async_trait]
impl TimerSource for ManualTimerSource {
    async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let (waker, fired) = oneshot::channel();
        {
            let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
            let deadline = clock.now + duration;
            clock.sleepers.retain(|(_, waker)| !waker.is_closed());
            clock.sleepers.push((deadline, waker));
        }
        let _ = fired.await;
    }
}

/// Deliver `message` to a table inbox after `delay`. The weak sender keeps
/// pending timers from holding a table open.
pub fn schedule(
    source: Arc<dyn TimerSource>,
    delay: Duration,
    inbox: mpsc::WeakSender<TableMessage>,
    message: TableMessage,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        source.sleep(delay).await;
        if let Some(inbox) = inbox.upgrade() {
            let _ = inbox.send(message).await;
        }
    })
}

/// The single countdown for the seat holding the turn.
pub struct TurnTimer {
    source: Arc<dyn TimerSource>,
    armed: Option<(SeatIndex, u64, JoinHandle<()>)>,
}

impl TurnTimer {
    pub fn new(source: Arc<dyn TimerSource>) -> Self {
        Self {
            source,
            armed: None,
        }
    }

    /// Start the countdown for `(seat, turn_id)`, replacing any other.
    pub fn arm(
        &mut self,
        seat: SeatIndex,
        turn_id: u64,
        timeout: Duration,
        inbox: mpsc::WeakSender<TableMessage>,
    ) {
        self.cancel();
        let task = schedule(
            self.source.clone(),
            timeout,
            inbox,
            TableMessage::TimerExpired { seat, turn_id },
        );
        debug!("Turn timer armed for seat {seat} turn {turn_id} ({timeout:?})");
        self.armed = Some((seat, turn_id, task));
    }

    /// Stop the countdown without side effects.
    pub fn cancel(&mut self) {
        if let Some((_, _, task)) = self.armed.take() {
            task.abort();
        }
    }

    pub fn armed_for(&self) -> Option<(SeatIndex, u64)> {
        self.armed.as_ref().map(|(seat, turn_id, _)| (*seat, *turn_id))
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_manual_source_fires_on_advance() {
        let source = Arc::new(ManualTimerSource::new());
        let (tx, mut rx) = mpsc::channel(4);
        let _task = schedule(
            source.clone(),
            Duration::from_secs(30),
            tx.downgrade(),
            TableMessage::TimerExpired { seat: 2, turn_id: 7 },
        );
        settle().await;
        assert_eq!(source.pending(), 1);

        source.advance(Duration::from_secs(29));
        settle().await;
        assert!(rx.try_recv().is_err());

        source.advance(Duration::from_secs(1));
        settle().await;
        match rx.try_recv() {
            Ok(TableMessage::TimerExpired { seat, turn_id }) => {
                assert_eq!((seat, turn_id), (2, 7));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(source.now(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_rearming_without_advancing_drops_stale_sleeps() {
        let source = Arc::new(ManualTimerSource::new());
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = TurnTimer::new(source.clone());
        for turn_id in 0..50 {
            timer.arm(0, turn_id, Duration::from_secs(30), tx.downgrade());
            settle().await;
        }
        assert!(source.tracked() <= 2);
        assert_eq!(source.pending(), 1);

        source.advance(Duration::ZERO);
        assert_eq!(source.tracked(), 1);

        source.advance(Duration::from_secs(30));
        settle().await;
        match rx.try_recv() {
            Ok(TableMessage::TimerExpired { turn_id, .. }) => assert_eq!(turn_id, 49),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(source.tracked(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = TurnTimer::new(Arc::new(TokioTimerSource));
        timer.arm(0, 1, Duration::from_secs(5), tx.downgrade());
        assert_eq!(timer.armed_for(), Some((0, 1)));
        timer.cancel();
        assert_eq!(timer.armed_for(), None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_replaces_previous_turn() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = TurnTimer::new(Arc::new(TokioTimerSource));
        timer.arm(0, 1, Duration::from_secs(5), tx.downgrade());
        timer.arm(1, 2, Duration::from_secs(5), tx.downgrade());

        tokio::time::sleep(Duration::from_secs(6)).await;
        match rx.try_recv() {
            Ok(TableMessage::TimerExpired { seat, turn_id }) => assert_eq!((seat, turn_id), (1, 2)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
