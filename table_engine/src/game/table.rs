//! The authoritative state of one table and every operation that mutates it.
//!
//! [`TableState`] is synchronous and owns no clock or channel. Each public
//! operation is one transaction: it either fails validation and leaves the
//! table untouched, or commits and queues the resulting [`TableEvent`]s for
//! [`TableState::drain_events`]. Fatal errors (deck exhaustion, a chip
//! conservation violation) halt the table; every later mutation fails with
//! [`TableError::TableHalted`].

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::betting;
use super::deck::Deck;
use super::entities::{
    Action, ActionRecord, Blinds, Card, Chips, PlayerId, Round, SeatIndex, SeatRequest, TableId,
    TableStatus,
};
use super::errors::TableError;
use super::eval::StandardRanker;
use super::rounds::{self, StreetTransition};
use super::seat::Seat;
use super::showdown::{self, Contender, HandRanker};
use super::turns::{self, ButtonPositions, NextToAct};
use crate::table::config::TableConfig;

/// Upper bound on hands started back to back without any player turn,
/// e.g. when every stack is all-in from the blinds.
const MAX_CHAINED_HANDS: usize = 100;

/// State deltas produced by committed operations.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    PlayerJoined {
        seat: SeatIndex,
        player_id: PlayerId,
        chips: Chips,
    },
    PlayerLeft {
        seat: SeatIndex,
        player_id: PlayerId,
        refunded: Chips,
    },
    HandStarted {
        hand_id: Uuid,
        hand_number: u64,
        positions: ButtonPositions,
    },
    BlindPosted {
        seat: SeatIndex,
        amount: Chips,
    },
    /// Cards themselves only travel in viewer-masked snapshots.
    HoleCardsDealt {
        seat: SeatIndex,
    },
    ActionTaken {
        record: ActionRecord,
        pot: Chips,
        table_bet: Chips,
    },
    TurnStarted {
        seat: SeatIndex,
        turn_id: u64,
    },
    TurnTimedOut {
        seat: SeatIndex,
        turn_id: u64,
    },
    StreetDealt {
        round: Round,
        cards: Vec<Card>,
    },
    HandsRevealed {
        hands: Vec<(SeatIndex, Vec<Card>)>,
    },
    PotAwarded {
        seat: SeatIndex,
        amount: Chips,
        at_showdown: bool,
    },
    HandFinished {
        hand_id: Uuid,
        hand_number: u64,
    },
    StatusChanged {
        status: TableStatus,
    },
    Halted {
        reason: String,
    },
}

impl fmt::Display for TableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PlayerJoined {
                seat,
                player_id,
                chips,
            } => format!("player {player_id} sat at seat {seat} with ${chips}"),
            Self::PlayerLeft {
                seat,
                player_id,
                refunded,
            } => format!("player {player_id} left seat {seat} with ${refunded}"),
            Self::HandStarted {
                hand_number,
                positions,
                ..
            } => format!(
                "hand #{hand_number} started, dealer seat {}",
                positions.dealer
            ),
            Self::BlindPosted { seat, amount } => format!("seat {seat} posted ${amount}"),
            Self::HoleCardsDealt { seat } => format!("seat {seat} was dealt in"),
            Self::ActionTaken { record, pot, .. } => format!("{record}, pot ${pot}"),
            Self::TurnStarted { seat, .. } => format!("seat {seat} to act"),
            Self::TurnTimedOut { seat, .. } => format!("seat {seat} timed out"),
            Self::StreetDealt { round, cards } => {
                let cards: Vec<String> = cards.iter().map(|c| c.to_string().trim().to_string()).collect();
                format!("{round}: {}", cards.join(" "))
            }
            Self::HandsRevealed { hands } => format!("{} hands shown", hands.len()),
            Self::PotAwarded {
                seat,
                amount,
                at_showdown,
            } => {
                if *at_showdown {
                    format!("seat {seat} wins pot of ${amount}")
                } else {
                    format!("seat {seat} wins pot of ${amount} uncontested")
                }
            }
            Self::HandFinished { hand_number, .. } => format!("hand #{hand_number} finished"),
            Self::StatusChanged { status } => format!("table is {status}"),
            Self::Halted { reason } => format!("table halted: {reason}"),
        };
        write!(f, "{repr}")
    }
}

/// What one viewer may see of a seat.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatView {
    pub seat: SeatIndex,
    pub player_id: PlayerId,
    pub chips: Chips,
    pub current_bet: Chips,
    /// Face-down cards are `None`.
    pub hole_cards: Vec<Option<Card>>,
    pub is_folded: bool,
    pub is_all_in: bool,
    pub is_turn: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub departed: bool,
}

/// Point-in-time view of a table, masked for one viewer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableSnapshot {
    pub table_id: TableId,
    pub name: String,
    pub status: TableStatus,
    pub round: Round,
    pub blinds: Blinds,
    pub pot: Chips,
    pub current_bet: Chips,
    pub dealer_seat: Option<SeatIndex>,
    pub active_seat: Option<SeatIndex>,
    pub turn_id: u64,
    pub hand_number: u64,
    pub community_cards: Vec<Card>,
    pub seats: Vec<Option<SeatView>>,
    pub halted: Option<String>,
}

impl TableSnapshot {
    #[must_use]
    pub fn seat(&self, seat: SeatIndex) -> Option<&SeatView> {
        self.seats.get(seat).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn seat_of(&self, player_id: PlayerId) -> Option<&SeatView> {
        self.seats.iter().flatten().find(|s| s.player_id == player_id)
    }

    /// Number of seats flagged as holding the turn.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.seats.iter().flatten().filter(|s| s.is_turn).count()
    }
}

pub struct TableState {
    id: TableId,
    config: TableConfig,
    status: TableStatus,
    round: Round,
    /// Every chip committed this hand, current street included.
    pot: Chips,
    current_bet: Chips,
    dealer_seat: Option<SeatIndex>,
    active_seat: Option<SeatIndex>,
    community_cards: Vec<Card>,
    seats: Vec<Option<Seat>>,
    /// The single deck for the current hand.
    deck: Deck,
    hand_id: Option<Uuid>,
    hand_number: u64,
    /// Bumped every time a turn starts; identifies turn timers.
    turn_id: u64,
    chips_in: u64,
    chips_out: u64,
    halted: Option<String>,
    actions: Vec<ActionRecord>,
    events: VecDeque<TableEvent>,
    ranker: Arc<dyn HandRanker>,
}

impl fmt::Debug for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableState")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("round", &self.round)
            .field("pot", &self.pot)
            .field("current_bet", &self.current_bet)
            .field("active_seat", &self.active_seat)
            .field("hand_number", &self.hand_number)
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}

impl TableState {
    #[must_use]
    pub fn new(id: TableId, config: TableConfig) -> Self {
        Self::with_ranker(id, config, Arc::new(StandardRanker))
    }

    #[must_use]
    pub fn with_ranker(id: TableId, config: TableConfig, ranker: Arc<dyn HandRanker>) -> Self {
        Self {
            id,
            seats: vec![None; config.max_seats],
            config,
            status: TableStatus::Waiting,
            round: Round::Preflop,
            pot: 0,
            current_bet: 0,
            dealer_seat: None,
            active_seat: None,
            community_cards: Vec::with_capacity(5),
            deck: Deck::default(),
            hand_id: None,
            hand_number: 0,
            turn_id: 0,
            chips_in: 0,
            chips_out: 0,
            halted: None,
            actions: Vec::new(),
            events: VecDeque::new(),
            ranker,
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    pub fn current_bet(&self) -> Chips {
        self.current_bet
    }

    pub fn dealer_seat(&self) -> Option<SeatIndex> {
        self.dealer_seat
    }

    pub fn active_seat(&self) -> Option<SeatIndex> {
        self.active_seat
    }

    pub fn turn_id(&self) -> u64 {
        self.turn_id
    }

    pub fn hand_id(&self) -> Option<Uuid> {
        self.hand_id
    }

    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    pub fn community_cards(&self) -> &[Card] {
        &self.community_cards
    }

    pub fn seats(&self) -> &[Option<Seat>] {
        &self.seats
    }

    pub fn seat(&self, seat: SeatIndex) -> Option<&Seat> {
        self.seats.get(seat).and_then(Option::as_ref)
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<SeatIndex> {
        self.seats
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.player_id == player_id && !s.departed))
    }

    /// Actions committed during the current (or last) hand, in order.
    pub fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    /// Seed of the current hand's deck, for replay.
    pub fn hand_seed(&self) -> Option<u64> {
        self.hand_id.map(|_| self.deck.seed())
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    pub fn seated_count(&self) -> usize {
        self.seats.iter().flatten().filter(|s| !s.departed).count()
    }

    pub fn funded_count(&self) -> usize {
        self.seats.iter().flatten().filter(|s| s.is_funded()).count()
    }

    /// A hand could start right now.
    pub fn can_start_hand(&self) -> bool {
        self.halted.is_none() && self.status == TableStatus::Waiting && self.funded_count() >= 2
    }

    /// Chips bought in minus chips paid out.
    pub fn expected_chips(&self) -> u64 {
        self.chips_in.saturating_sub(self.chips_out)
    }

    /// Chips currently on the table: the pot plus every stack.
    pub fn chips_on_table(&self) -> u64 {
        u64::from(self.pot)
            + self
                .seats
                .iter()
                .flatten()
                .map(|s| u64::from(s.chips))
                .sum::<u64>()
    }

    pub fn drain_events(&mut self) -> VecDeque<TableEvent> {
        std::mem::take(&mut self.events)
    }

    /// Seat a player. Only allowed between hands.
    pub fn join(&mut self, request: SeatRequest) -> Result<SeatIndex, TableError> {
        self.ensure_open()?;
        if self.status == TableStatus::Playing {
            return Err(TableError::HandInProgress);
        }
        if self.seat_of(request.player_id).is_some() {
            return Err(TableError::AlreadySeated);
        }

        let seat = match request.preferred_seat {
            Some(idx) if idx >= self.seats.len() => return Err(TableError::InvalidSeat(idx)),
            _ if self.seats.iter().all(Option::is_some) => return Err(TableError::TableFull),
            Some(idx) if self.seats[idx].is_some() => return Err(TableError::SeatTaken(idx)),
            Some(idx) => idx,
            None => self
                .seats
                .iter()
                .position(Option::is_none)
                .ok_or(TableError::TableFull)?,
        };

        let within_balance = request
            .available_balance
            .is_none_or(|balance| request.buy_in <= balance);
        if !self.config.accepts_buy_in(request.buy_in) || !within_balance {
            return Err(TableError::InvalidBuyIn {
                buy_in: request.buy_in,
            });
        }

        self.seats[seat] = Some(Seat::new(request.player_id, request.buy_in));
        self.chips_in += u64::from(request.buy_in);
        debug!(
            "table {}: player {} sat at seat {seat} with ${}",
            self.id, request.player_id, request.buy_in
        );
        self.events.push_back(TableEvent::PlayerJoined {
            seat,
            player_id: request.player_id,
            chips: request.buy_in,
        });
        Ok(seat)
    }

    /// Leave the table, returning the chips refunded. Mid-hand the seat
    /// is folded through the normal action path, refunded its chips
    /// behind and removed once the hand ends.
    pub fn leave(&mut self, seat: SeatIndex) -> Result<Chips, TableError> {
        self.ensure_open()?;
        let occupant = self.occupied(seat)?;
        let (player_id, in_hand, live) = (occupant.player_id, occupant.in_hand, occupant.is_live());

        if self.status != TableStatus::Playing || !in_hand {
            let refunded = self.seats[seat].take().map_or(0, |s| s.chips);
            self.chips_out += u64::from(refunded);
            info!("table {}: player {player_id} left with ${refunded}", self.id);
            self.events.push_back(TableEvent::PlayerLeft {
                seat,
                player_id,
                refunded,
            });
            return Ok(refunded);
        }

        let occupant = self.occupied_mut(seat)?;
        occupant.departed = true;
        let refunded = std::mem::take(&mut occupant.chips);
        self.chips_out += u64::from(refunded);
        info!(
            "table {}: player {player_id} left mid-hand with ${refunded}",
            self.id
        );
        self.events.push_back(TableEvent::PlayerLeft {
            seat,
            player_id,
            refunded,
        });

        if live {
            let was_active = self.active_seat == Some(seat);
            self.transact(|table| {
                table.commit_action(seat, Action::Fold, false)?;
                match table.active_seat {
                    _ if was_active => table.progress(seat),
                    Some(active) => match turns::next_to_act(&table.seats, table.current_bet, active) {
                        NextToAct::Seat(_) => Ok(()),
                        _ => table.progress(active),
                    },
                    None => Ok(()),
                }
            })?;
        }
        Ok(refunded)
    }

    /// Start a hand: rotate the button, post blinds, deal hole cards and
    /// hand the first turn out.
    pub fn start_hand(&mut self) -> Result<(), TableError> {
        self.ensure_open()?;
        if self.status == TableStatus::Playing {
            return Err(TableError::HandInProgress);
        }
        if self.funded_count() < 2 {
            return Err(TableError::NotEnoughPlayers);
        }
        self.transact(Self::begin_hand)
    }

    /// Apply a player action for the seat holding the turn.
    pub fn act(&mut self, seat: SeatIndex, action: Action) -> Result<(), TableError> {
        self.ensure_open()?;
        if self.status != TableStatus::Playing {
            return Err(TableError::TableNotPlaying);
        }
        self.occupied(seat)?;
        if self.active_seat != Some(seat) {
            return Err(TableError::NotYourTurn);
        }
        self.transact(|table| {
            table.commit_action(seat, action, false)?;
            table.progress(seat)
        })
    }

    /// Turn timer expiry. Folds the seat if `(seat, turn_id)` still holds
    /// the turn; otherwise does nothing and returns `false`.
    pub fn timer_expired(&mut self, seat: SeatIndex, turn_id: u64) -> Result<bool, TableError> {
        if self.halted.is_some()
            || self.status != TableStatus::Playing
            || self.active_seat != Some(seat)
            || self.turn_id != turn_id
        {
            debug!(
                "table {}: ignoring stale timer for seat {seat} turn {turn_id}",
                self.id
            );
            return Ok(false);
        }

        info!("table {}: seat {seat} timed out", self.id);
        self.events
            .push_back(TableEvent::TurnTimedOut { seat, turn_id });
        self.transact(|table| {
            table.commit_action(seat, Action::Fold, true)?;
            table.progress(seat)
        })?;
        Ok(true)
    }

    /// Close the table for good. A hand in progress is abandoned and every
    /// contribution returned; all stacks are paid out.
    pub fn close(&mut self) -> Vec<(SeatIndex, PlayerId, Chips)> {
        if self.status == TableStatus::Playing {
            for seat in self.seats.iter_mut().flatten() {
                seat.chips += seat.total_committed;
                seat.total_committed = 0;
                seat.current_bet = 0;
            }
            self.pot = 0;
            self.current_bet = 0;
        }
        self.clear_turn();

        let mut payouts = Vec::new();
        for (idx, slot) in self.seats.iter_mut().enumerate() {
            if let Some(seat) = slot.take() {
                self.chips_out += u64::from(seat.chips);
                self.events.push_back(TableEvent::PlayerLeft {
                    seat: idx,
                    player_id: seat.player_id,
                    refunded: seat.chips,
                });
                payouts.push((idx, seat.player_id, seat.chips));
            }
        }

        self.status = TableStatus::Finished;
        self.events.push_back(TableEvent::StatusChanged {
            status: TableStatus::Finished,
        });
        info!("table {} closed, {} seats paid out", self.id, payouts.len());
        payouts
    }

    /// View of the table for `viewer`. Hole cards are visible only to
    /// their owner, or to everyone once shown at showdown.
    #[must_use]
    pub fn snapshot(&self, viewer: Option<PlayerId>) -> TableSnapshot {
        let seats = self
            .seats
            .iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.as_ref().map(|seat| {
                    let visible = seat.showing || viewer == Some(seat.player_id);
                    SeatView {
                        seat: idx,
                        player_id: seat.player_id,
                        chips: seat.chips,
                        current_bet: seat.current_bet,
                        hole_cards: seat
                            .hole_cards
                            .iter()
                            .map(|&card| visible.then_some(card))
                            .collect(),
                        is_folded: seat.is_folded,
                        is_all_in: seat.is_all_in,
                        is_turn: seat.is_turn,
                        is_dealer: seat.is_dealer,
                        is_small_blind: seat.is_small_blind,
                        is_big_blind: seat.is_big_blind,
                        departed: seat.departed,
                    }
                })
            })
            .collect();

        TableSnapshot {
            table_id: self.id,
            name: self.config.name.clone(),
            status: self.status,
            round: self.round,
            blinds: self.config.blinds(),
            pot: self.pot,
            current_bet: self.current_bet,
            dealer_seat: self.dealer_seat,
            active_seat: self.active_seat,
            turn_id: self.turn_id,
            hand_number: self.hand_number,
            community_cards: self.community_cards.clone(),
            seats,
            halted: self.halted.clone(),
        }
    }

    /// Check `pot + Σ chips == chips in − chips out`.
    pub fn verify_chips(&self) -> Result<(), TableError> {
        let expected = self.expected_chips();
        let actual = self.chips_on_table();
        if expected != actual {
            return Err(TableError::ChipConservation { expected, actual });
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), TableError> {
        if let Some(reason) = &self.halted {
            return Err(TableError::TableHalted(reason.clone()));
        }
        if self.status == TableStatus::Finished {
            return Err(TableError::TableClosed);
        }
        Ok(())
    }

    fn occupied(&self, seat: SeatIndex) -> Result<&Seat, TableError> {
        match self.seats.get(seat) {
            None => Err(TableError::InvalidSeat(seat)),
            Some(Some(s)) if !s.departed => Ok(s),
            Some(_) => Err(TableError::SeatNotFound(seat)),
        }
    }

    fn occupied_mut(&mut self, seat: SeatIndex) -> Result<&mut Seat, TableError> {
        match self.seats.get_mut(seat) {
            None => Err(TableError::InvalidSeat(seat)),
            Some(Some(s)) => Ok(s),
            Some(None) => Err(TableError::SeatNotFound(seat)),
        }
    }

    /// Run one mutation, then chain immediate hands and check conservation.
    /// Fatal errors halt the table.
    fn transact<F>(&mut self, op: F) -> Result<(), TableError>
    where
        F: FnOnce(&mut Self) -> Result<(), TableError>,
    {
        let result = op(self)
            .and_then(|()| self.chain_hands())
            .and_then(|()| self.verify_chips());
        if let Err(err) = &result
            && err.is_fatal()
        {
            self.halt(err.to_string());
        }
        result
    }

    fn halt(&mut self, reason: String) {
        error!("table {} halted: {reason}", self.id);
        self.clear_turn();
        self.halted = Some(reason.clone());
        self.events.push_back(TableEvent::Halted { reason });
    }

    /// With no inter-hand delay, keep dealing while the table can play.
    fn chain_hands(&mut self) -> Result<(), TableError> {
        if self.config.next_hand_delay().is_some() {
            return Ok(());
        }
        for _ in 0..MAX_CHAINED_HANDS {
            if !self.can_start_hand() {
                return Ok(());
            }
            self.begin_hand()?;
        }
        Ok(())
    }

    fn begin_hand(&mut self) -> Result<(), TableError> {
        let positions = turns::rotate_button(&self.seats, self.dealer_seat, Seat::is_funded)
            .ok_or(TableError::NotEnoughPlayers)?;
        let hand_number = self.hand_number + 1;
        let seed = self
            .config
            .deck_seed
            .map(|seed| seed.wrapping_add(hand_number));
        let mut deck = Deck::shuffled(seed);
        let dealt_in = turns::seats_after(&self.seats, positions.dealer, Seat::is_funded);
        let hole_cards = deck.draw(2 * dealt_in.len())?;

        let hand_id = Uuid::new_v4();
        self.deck = deck;
        self.hand_number = hand_number;
        self.hand_id = Some(hand_id);
        self.status = TableStatus::Playing;
        self.round = Round::Preflop;
        self.pot = 0;
        self.current_bet = 0;
        self.community_cards.clear();
        self.actions.clear();
        self.active_seat = None;
        self.dealer_seat = Some(positions.dealer);

        for seat in self.seats.iter_mut().flatten() {
            seat.reset();
            seat.in_hand = seat.is_funded();
        }
        if let Some(seat) = self.seats[positions.dealer].as_mut() {
            seat.is_dealer = true;
        }
        if let Some(seat) = self.seats[positions.small_blind].as_mut() {
            seat.is_small_blind = true;
        }
        if let Some(seat) = self.seats[positions.big_blind].as_mut() {
            seat.is_big_blind = true;
        }

        info!(
            "table {}: hand #{hand_number} started, dealer seat {}",
            self.id, positions.dealer
        );
        self.events.push_back(TableEvent::StatusChanged {
            status: TableStatus::Playing,
        });
        self.events.push_back(TableEvent::HandStarted {
            hand_id,
            hand_number,
            positions,
        });

        let small = self.post_blind(positions.small_blind, self.config.small_blind);
        let big = self.post_blind(positions.big_blind, self.config.big_blind);
        self.current_bet = small.max(big);
        if let Some(seat) = self.seats[positions.big_blind].as_mut() {
            seat.has_acted = !self.config.big_blind_option;
        }

        // One card at a time, starting left of the dealer.
        for (i, card) in hole_cards.into_iter().enumerate() {
            if let Some(seat) = self.seats[dealt_in[i % dealt_in.len()]].as_mut() {
                seat.hole_cards.push(card);
            }
        }
        for &seat in &dealt_in {
            self.events.push_back(TableEvent::HoleCardsDealt { seat });
        }

        self.progress(positions.big_blind)
    }

    fn post_blind(&mut self, seat: SeatIndex, amount: Chips) -> Chips {
        let Some(occupant) = self.seats[seat].as_mut() else {
            return 0;
        };
        let posted = occupant.commit(amount);
        self.pot += posted;
        self.events.push_back(TableEvent::BlindPosted {
            seat,
            amount: posted,
        });
        posted
    }

    /// Validate and apply one action. Nothing changes on a validation error.
    fn commit_action(
        &mut self,
        seat: SeatIndex,
        action: Action,
        timed_out: bool,
    ) -> Result<(), TableError> {
        let round = self.round;
        let occupant = self
            .seats
            .get_mut(seat)
            .and_then(Option::as_mut)
            .ok_or(TableError::SeatNotFound(seat))?;
        let effect = betting::validate(action, occupant, self.current_bet)?;
        betting::apply(&effect, occupant, &mut self.pot, &mut self.current_bet);
        occupant.is_turn = false;
        if self.active_seat == Some(seat) {
            self.active_seat = None;
        }

        let record = ActionRecord {
            seat,
            kind: effect.kind,
            amount: (effect.chips > 0).then_some(effect.chips),
            round,
            timed_out,
        };
        debug!("table {}: {record}", self.id);
        self.actions.push(record.clone());
        self.events.push_back(TableEvent::ActionTaken {
            record,
            pot: self.pot,
            table_bet: self.current_bet,
        });
        Ok(())
    }

    /// Hand the turn to the next seat, dealing streets and resolving the
    /// hand as betting rounds complete.
    fn progress(&mut self, after: SeatIndex) -> Result<(), TableError> {
        let mut after = after;
        loop {
            match turns::next_to_act(&self.seats, self.current_bet, after) {
                NextToAct::Seat(seat) => {
                    self.start_turn(seat);
                    return Ok(());
                }
                NextToAct::RoundComplete => match self.next_street()? {
                    StreetTransition::Dealt { .. } => after = self.dealer_seat.unwrap_or(after),
                    StreetTransition::Showdown | StreetTransition::Terminal => {
                        return self.settle(true);
                    }
                },
                NextToAct::HandComplete => {
                    if self.live_count() <= 1 {
                        return self.settle(false);
                    }
                    // Nobody can bet any more: run the board out.
                    while let StreetTransition::Dealt { .. } = self.next_street()? {}
                    return self.settle(true);
                }
            }
        }
    }

    fn live_count(&self) -> usize {
        self.seats.iter().flatten().filter(|s| s.is_live()).count()
    }

    fn start_turn(&mut self, seat: SeatIndex) {
        for occupant in self.seats.iter_mut().flatten() {
            occupant.is_turn = false;
        }
        if let Some(occupant) = self.seats[seat].as_mut() {
            occupant.is_turn = true;
        }
        self.active_seat = Some(seat);
        self.turn_id += 1;
        self.events.push_back(TableEvent::TurnStarted {
            seat,
            turn_id: self.turn_id,
        });
    }

    fn clear_turn(&mut self) {
        for seat in self.seats.iter_mut().flatten() {
            seat.is_turn = false;
        }
        self.active_seat = None;
    }

    fn next_street(&mut self) -> Result<StreetTransition, TableError> {
        self.clear_turn();
        let transition = rounds::advance(
            &mut self.round,
            &mut self.deck,
            &mut self.community_cards,
            &mut self.seats,
            &mut self.current_bet,
        )?;
        if let StreetTransition::Dealt { round, cards } = &transition {
            debug!("table {}: dealt the {round}", self.id);
            self.events.push_back(TableEvent::StreetDealt {
                round: *round,
                cards: cards.clone(),
            });
        }
        Ok(transition)
    }

    /// Distribute the pot and end the hand.
    fn settle(&mut self, at_showdown: bool) -> Result<(), TableError> {
        self.clear_turn();
        if at_showdown {
            let mut hands = Vec::new();
            for (idx, slot) in self.seats.iter_mut().enumerate() {
                if let Some(seat) = slot.as_mut().filter(|s| s.is_live()) {
                    seat.showing = true;
                    hands.push((idx, seat.hole_cards.clone()));
                }
            }
            self.events.push_back(TableEvent::HandsRevealed { hands });
        }

        let contenders: Vec<Contender> = self
            .seats
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                slot.as_ref().filter(|s| s.in_hand).map(|s| Contender {
                    seat: idx,
                    hole_cards: s.hole_cards.clone(),
                    committed: s.total_committed,
                    folded: s.is_folded,
                })
            })
            .collect();
        let dealer = self.dealer_seat.unwrap_or_default();
        let order = turns::seats_after(&self.seats, dealer, |s| s.in_hand);
        let awards = showdown::resolve(
            &contenders,
            &self.community_cards,
            self.ranker.as_ref(),
            &order,
        );

        for award in awards {
            if let Some(seat) = self.seats[award.seat].as_mut() {
                seat.chips += award.amount;
            }
            info!(
                "table {}: seat {} wins pot of ${}",
                self.id, award.seat, award.amount
            );
            self.events.push_back(TableEvent::PotAwarded {
                seat: award.seat,
                amount: award.amount,
                at_showdown,
            });
        }
        // Anything the awards did not cover shows up in the conservation check.
        self.pot = 0;
        self.finish_hand();
        Ok(())
    }

    fn finish_hand(&mut self) {
        self.current_bet = 0;
        for slot in &mut self.seats {
            if slot.as_ref().is_some_and(|s| s.departed) {
                *slot = None;
            } else if let Some(seat) = slot.as_mut() {
                seat.current_bet = 0;
                seat.is_turn = false;
            }
        }
        self.status = TableStatus::Waiting;
        info!("table {}: hand #{} finished", self.id, self.hand_number);
        self.events.push_back(TableEvent::HandFinished {
            hand_id: self.hand_id.unwrap_or_default(),
            hand_number: self.hand_number,
        });
        self.events.push_back(TableEvent::StatusChanged {
            status: TableStatus::Waiting,
        });
    }
}
