//! Scripted players that sit down at a table and act on their turns.

use log::{debug, info};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Arc;
use table_engine::entities::{PlayerId, SeatRequest};
use table_engine::table::{TableManager, TableUpdate};
use table_engine::{Action, Chips, SeatIndex, TableError, TableEvent, TableId, TableSnapshot};
use tokio::sync::mpsc;

/// A simulated player bound to one table.
pub struct Bot {
    pub player_id: PlayerId,
    pub table: TableId,
    pub buy_in: Chips,
    /// Never acts, so every turn runs into the timer.
    pub idle: bool,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId, table: TableId, buy_in: Chips, idle: bool, seed: u64) -> Self {
        Self {
            player_id,
            table,
            buy_in,
            idle,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sit down and play until the table closes.
    pub async fn run(mut self, manager: Arc<TableManager>) -> Result<(), TableError> {
        let (_, mut updates) = manager.subscribe(self.table, Some(self.player_id)).await?;

        let seat = loop {
            match manager
                .join_table(self.table, SeatRequest::new(self.player_id, self.buy_in))
                .await
            {
                Ok(seat) => break seat,
                Err(TableError::HandInProgress) => wait_for_break(&mut updates).await?,
                Err(e) => return Err(e),
            }
        };
        info!(
            "Player {} sat at table {} seat {seat}{}",
            self.player_id,
            self.table,
            if self.idle { " (idle)" } else { "" }
        );

        while let Some(update) = updates.recv().await {
            let Some(event) = update.event() else {
                continue;
            };
            match event {
                TableEvent::TurnStarted { seat: turn, .. } if *turn == seat && !self.idle => {
                    let snapshot = manager.get_snapshot(self.table, Some(self.player_id)).await?;
                    let Some(action) = choose_action(&snapshot, seat, &mut self.rng) else {
                        continue;
                    };
                    if let Err(e) = manager.submit_action(self.table, seat, action).await {
                        debug!("Player {} could not {action}: {e}", self.player_id);
                    }
                }
                TableEvent::PlayerLeft { player_id, .. } if *player_id == self.player_id => break,
                _ => {}
            }
        }
        Ok(())
    }
}

/// Wait until the current hand is over.
async fn wait_for_break(updates: &mut mpsc::Receiver<TableUpdate>) -> Result<(), TableError> {
    while let Some(update) = updates.recv().await {
        if let Some(TableEvent::StatusChanged { status }) = update.event()
            && *status != table_engine::entities::TableStatus::Playing
        {
            return Ok(());
        }
    }
    Err(TableError::TableClosed)
}

/// Pick an action for `seat`, mostly passive with the occasional raise.
/// Returns `None` when the seat holds no turn.
pub fn choose_action<R: Rng>(
    snapshot: &TableSnapshot,
    seat: SeatIndex,
    rng: &mut R,
) -> Option<Action> {
    let me = snapshot.seat(seat).filter(|s| s.is_turn)?;
    let to_call = snapshot.current_bet.saturating_sub(me.current_bet);
    let big_blind = snapshot.blinds.big;
    let roll = rng.random_range(0..100u32);

    let action = if to_call == 0 {
        match roll {
            75.. if snapshot.current_bet == 0 => Action::Bet((big_blind * 2).min(me.chips)),
            _ => Action::Check,
        }
    } else {
        match roll {
            0..15 => Action::Fold,
            15..90 => Action::Call,
            _ => {
                let target = snapshot.current_bet * 2;
                if target < me.chips + me.current_bet {
                    Action::Raise(target)
                } else {
                    Action::AllIn
                }
            }
        }
    };
    Some(action)
}
