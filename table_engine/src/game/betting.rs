//! Legality and chip math for a single player action.
//!
//! [`validate`] only reads state and returns the [`BetEffect`] the action
//! would have; [`apply`] commits it. Keeping the two apart is what makes
//! every action accept-or-reject atomic.

use super::entities::{Action, ActionKind, Chips};
use super::errors::TableError;
use super::seat::Seat;

/// What a validated action does to the seat and the table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BetEffect {
    pub kind: ActionKind,
    /// Chips moved from the stack into the pot.
    pub chips: Chips,
    /// The seat's bet for this round once the action is applied.
    pub seat_bet: Chips,
    pub fold: bool,
}

pub fn validate(action: Action, seat: &Seat, table_bet: Chips) -> Result<BetEffect, TableError> {
    let effect = |chips: Chips| BetEffect {
        kind: action.kind(),
        chips,
        seat_bet: seat.current_bet + chips,
        fold: false,
    };

    match action {
        Action::Check => {
            if seat.current_bet != table_bet {
                return Err(TableError::IllegalCheck);
            }
            Ok(effect(0))
        }

        Action::Call => {
            if table_bet <= seat.current_bet {
                return Err(TableError::IllegalCall);
            }
            Ok(effect((table_bet - seat.current_bet).min(seat.chips)))
        }

        Action::Bet(amount) => {
            if table_bet != 0 {
                return Err(TableError::IllegalBet);
            }
            if amount == 0 {
                return Err(TableError::InvalidAmount);
            }
            if amount > seat.chips {
                return Err(TableError::InsufficientChips);
            }
            Ok(effect(amount - seat.current_bet))
        }

        Action::Raise(amount) => {
            if amount == 0 {
                return Err(TableError::InvalidAmount);
            }
            if table_bet == 0 || amount <= table_bet {
                return Err(TableError::IllegalRaise);
            }
            if amount > seat.chips + seat.current_bet {
                return Err(TableError::InsufficientChips);
            }
            Ok(effect(amount - seat.current_bet))
        }

        Action::Fold => Ok(BetEffect {
            fold: true,
            ..effect(0)
        }),

        Action::AllIn => {
            if seat.chips == 0 {
                return Err(TableError::InsufficientChips);
            }
            Ok(effect(seat.chips))
        }
    }
}

/// Commit a validated effect. A seat whose bet now exceeds the table bet
/// lifts it, which reopens the action for everyone still in.
pub fn apply(effect: &BetEffect, seat: &mut Seat, pot: &mut Chips, table_bet: &mut Chips) {
    let moved = seat.commit(effect.chips);
    *pot += moved;
    seat.has_acted = true;
    if effect.fold {
        seat.is_folded = true;
    }
    *table_bet = (*table_bet).max(seat.current_bet);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(chips: Chips, current_bet: Chips) -> Seat {
        let mut seat = Seat::new(1, chips);
        seat.in_hand = true;
        seat.current_bet = current_bet;
        seat
    }

    #[test]
    fn test_check_only_when_matched() {
        assert!(validate(Action::Check, &seat(100, 10), 10).is_ok());
        assert_eq!(
            validate(Action::Check, &seat(100, 5), 10),
            Err(TableError::IllegalCheck)
        );
    }

    #[test]
    fn test_call_moves_difference() {
        let effect = validate(Action::Call, &seat(100, 5), 10).unwrap();
        assert_eq!(effect.chips, 5);
        assert_eq!(effect.seat_bet, 10);
        assert_eq!(effect.kind, ActionKind::Call);
    }

    #[test]
    fn test_short_call_goes_all_in() {
        let mut s = seat(40, 0);
        let effect = validate(Action::Call, &s, 100).unwrap();
        assert_eq!(effect.chips, 40);

        let (mut pot, mut table_bet) = (150, 100);
        apply(&effect, &mut s, &mut pot, &mut table_bet);
        assert_eq!(pot, 190);
        assert_eq!(table_bet, 100);
        assert_eq!(s.chips, 0);
        assert!(s.is_all_in);
    }

    #[test]
    fn test_call_with_nothing_to_call() {
        assert_eq!(
            validate(Action::Call, &seat(100, 10), 10),
            Err(TableError::IllegalCall)
        );
    }

    #[test]
    fn test_bet_rules() {
        assert!(validate(Action::Bet(50), &seat(100, 0), 0).is_ok());
        assert_eq!(
            validate(Action::Bet(0), &seat(100, 0), 0),
            Err(TableError::InvalidAmount)
        );
        assert_eq!(
            validate(Action::Bet(150), &seat(100, 0), 0),
            Err(TableError::InsufficientChips)
        );
        assert_eq!(
            validate(Action::Bet(20), &seat(100, 0), 10),
            Err(TableError::IllegalBet)
        );
    }

    #[test]
    fn test_raise_rules() {
        let effect = validate(Action::Raise(30), &seat(100, 10), 20).unwrap();
        assert_eq!(effect.chips, 20);
        assert_eq!(effect.seat_bet, 30);

        assert_eq!(
            validate(Action::Raise(50), &seat(500, 0), 100),
            Err(TableError::IllegalRaise)
        );
        assert_eq!(
            validate(Action::Raise(100), &seat(500, 0), 100),
            Err(TableError::IllegalRaise)
        );
        assert_eq!(
            validate(Action::Raise(40), &seat(500, 0), 0),
            Err(TableError::IllegalRaise)
        );
        assert_eq!(
            validate(Action::Raise(111), &seat(100, 10), 20),
            Err(TableError::InsufficientChips)
        );
        // Exactly the whole stack plus what is already in is fine.
        let mut s = seat(100, 10);
        let effect = validate(Action::Raise(110), &s, 20).unwrap();
        let (mut pot, mut table_bet) = (30, 20);
        apply(&effect, &mut s, &mut pot, &mut table_bet);
        assert!(s.is_all_in);
        assert_eq!(table_bet, 110);
    }

    #[test]
    fn test_fold_is_always_legal() {
        let mut s = seat(0, 0);
        let effect = validate(Action::Fold, &s, 300).unwrap();
        assert!(effect.fold);
        let (mut pot, mut table_bet) = (300, 300);
        apply(&effect, &mut s, &mut pot, &mut table_bet);
        assert!(s.is_folded);
        assert_eq!(pot, 300);
    }

    #[test]
    fn test_all_in_raises_table_bet() {
        let mut s = seat(250, 50);
        let effect = validate(Action::AllIn, &s, 100).unwrap();
        assert_eq!(effect.chips, 250);
        let (mut pot, mut table_bet) = (200, 100);
        apply(&effect, &mut s, &mut pot, &mut table_bet);
        assert_eq!(table_bet, 300);
        assert_eq!(pot, 450);
        assert!(s.is_all_in);
    }

    #[test]
    fn test_all_in_without_chips() {
        assert_eq!(
            validate(Action::AllIn, &seat(0, 10), 10),
            Err(TableError::InsufficientChips)
        );
    }
}
