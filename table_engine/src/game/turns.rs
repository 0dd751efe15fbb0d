//! Turn order: who acts next, when a round or hand is over, and where the
//! button and blinds go between hands.

use serde::{Deserialize, Serialize};

use super::entities::{Chips, SeatIndex};
use super::seat::Seat;

/// Outcome of asking who should act next.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NextToAct {
    Seat(SeatIndex),
    /// Every eligible seat matched the table bet and acted since the last raise.
    RoundComplete,
    /// No further betting is possible this hand.
    HandComplete,
}

/// Button and blind positions for a hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ButtonPositions {
    pub dealer: SeatIndex,
    pub small_blind: SeatIndex,
    pub big_blind: SeatIndex,
}

/// Walk the table clockwise starting just after `start` (wrapping, ending
/// on `start` itself) and return the first seat matching `pred`.
pub fn next_seat_after<F>(seats: &[Option<Seat>], start: SeatIndex, pred: F) -> Option<SeatIndex>
where
    F: Fn(&Seat) -> bool,
{
    let n = seats.len();
    if n == 0 {
        return None;
    }
    (1..=n)
        .map(|offset| (start + offset) % n)
        .find(|&idx| seats[idx].as_ref().is_some_and(&pred))
}

/// Seat indices clockwise from just after `start`, filtered by `pred`.
pub fn seats_after<F>(seats: &[Option<Seat>], start: SeatIndex, pred: F) -> Vec<SeatIndex>
where
    F: Fn(&Seat) -> bool,
{
    let n = seats.len();
    (1..=n)
        .map(|offset| (start + offset) % n)
        .filter(|&idx| seats[idx].as_ref().is_some_and(&pred))
        .collect()
}

/// Decide who acts next, scanning clockwise from just after `after`.
pub fn next_to_act(seats: &[Option<Seat>], table_bet: Chips, after: SeatIndex) -> NextToAct {
    let live = seats.iter().flatten().filter(|s| s.is_live()).count();
    if live <= 1 {
        return NextToAct::HandComplete;
    }

    let eligible: Vec<&Seat> = seats.iter().flatten().filter(|s| s.is_eligible()).collect();
    // A lone eligible seat has nobody left to bet against; it only acts
    // when it still has to answer a bet.
    if eligible.len() <= 1 && eligible.iter().all(|s| s.current_bet >= table_bet) {
        return NextToAct::HandComplete;
    }

    if eligible.iter().all(|s| !s.needs_action(table_bet)) {
        return NextToAct::RoundComplete;
    }

    match next_seat_after(seats, after, |s| s.needs_action(table_bet)) {
        Some(idx) => NextToAct::Seat(idx),
        None => NextToAct::RoundComplete,
    }
}

/// Rotate the button for a new hand among seats matching `playing`.
///
/// The new dealer is the next playing seat clockwise from the previous
/// dealer (or the lowest playing seat for the first hand). Heads-up the
/// dealer posts the small blind.
pub fn rotate_button<F>(
    seats: &[Option<Seat>],
    previous_dealer: Option<SeatIndex>,
    playing: F,
) -> Option<ButtonPositions>
where
    F: Fn(&Seat) -> bool + Copy,
{
    let n = seats.len();
    let count = seats.iter().flatten().filter(|s| playing(s)).count();
    if count < 2 {
        return None;
    }

    // Starting "after" the last index makes the scan begin at seat 0.
    let dealer = next_seat_after(seats, previous_dealer.unwrap_or(n - 1), playing)?;
    let small_blind = if count == 2 {
        dealer
    } else {
        next_seat_after(seats, dealer, playing)?
    };
    let big_blind = next_seat_after(seats, small_blind, playing)?;

    Some(ButtonPositions {
        dealer,
        small_blind,
        big_blind,
    })
}
