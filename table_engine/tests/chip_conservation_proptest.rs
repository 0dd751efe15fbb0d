//! Property-based tests for chip conservation and turn ownership.
//!
//! Random stacks and random (often illegal) action streams are thrown at a
//! table that deals hands back to back. Whatever happens, chips are never
//! created or destroyed, at most one seat holds the turn, and a rejected
//! action leaves the table exactly as it was.

use proptest::prelude::*;
use std::collections::BTreeSet;
use table_engine::game::entities::{ACE, Action, Card, SeatRequest, Suit, TableStatus};
use table_engine::game::eval::best_hand;
use table_engine::table::TableConfig;
use table_engine::TableState;

fn config(seed: u64) -> TableConfig {
    TableConfig {
        name: "Property".to_string(),
        small_blind: 5,
        big_blind: 10,
        min_buy_in: 20,
        max_buy_in: 2000,
        max_seats: 6,
        next_hand_delay_secs: 0,
        deck_seed: Some(seed),
        ..Default::default()
    }
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        1 => Just(Action::Fold),
        3 => Just(Action::Check),
        3 => Just(Action::Call),
        1 => (1u32..=400).prop_map(Action::Bet),
        1 => (1u32..=800).prop_map(Action::Raise),
        1 => Just(Action::AllIn),
    ]
}

fn card_strategy() -> impl Strategy<Value = Card> {
    (2u8..=ACE, 0u8..=3).prop_map(|(value, suit_idx)| {
        let suit = match suit_idx {
            0 => Suit::Club,
            1 => Suit::Diamond,
            2 => Suit::Heart,
            _ => Suit::Spade,
        };
        Card(value, suit)
    })
}

fn seven_cards_strategy() -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), 7).prop_filter("Cards must be unique", |cards| {
        let set: BTreeSet<_> = cards.iter().collect();
        set.len() == cards.len()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_chips_are_conserved_under_random_play(
        stacks in prop::collection::vec(20u32..=2000, 2..=6),
        seed in any::<u64>(),
        actions in prop::collection::vec(action_strategy(), 1..300),
    ) {
        let mut table = TableState::new(1, config(seed));
        for (i, &stack) in stacks.iter().enumerate() {
            table.join(SeatRequest::new(i as i64 + 1, stack)).unwrap();
        }
        let total: u64 = stacks.iter().map(|&s| u64::from(s)).sum();
        table.start_hand().unwrap();

        for action in actions {
            if table.status() != TableStatus::Playing {
                break;
            }
            let seat = table.active_seat();
            prop_assert!(seat.is_some());
            let seat = seat.unwrap();

            let before = table.snapshot(None);
            if let Err(err) = table.act(seat, action) {
                prop_assert!(!err.is_fatal(), "fatal error {}", err);
                prop_assert_eq!(table.snapshot(None), before);
            }

            prop_assert!(table.verify_chips().is_ok());
            prop_assert_eq!(table.chips_on_table(), total);
            prop_assert!(table.snapshot(None).turn_count() <= 1);
            prop_assert!(!table.is_halted());
        }
    }

    #[test]
    fn test_timeouts_fold_and_conserve(
        stacks in prop::collection::vec(20u32..=500, 2..=6),
        seed in any::<u64>(),
        steps in prop::collection::vec(any::<bool>(), 1..200),
    ) {
        let mut table = TableState::new(1, config(seed));
        for (i, &stack) in stacks.iter().enumerate() {
            table.join(SeatRequest::new(i as i64 + 1, stack)).unwrap();
        }
        table.start_hand().unwrap();

        for time_out in steps {
            if table.status() != TableStatus::Playing {
                break;
            }
            let seat = table.active_seat().unwrap();
            let turn = table.turn_id();
            if time_out {
                prop_assert_eq!(table.timer_expired(seat, turn), Ok(true));
                // The same timer firing twice is a no-op.
                prop_assert_eq!(table.timer_expired(seat, turn), Ok(false));
            } else if table.act(seat, Action::Check).is_err() {
                table.act(seat, Action::Call).unwrap();
            }
            prop_assert!(table.verify_chips().is_ok());
        }
    }

    #[test]
    fn test_best_hand_ignores_card_order(cards in seven_cards_strategy()) {
        let mut reversed = cards.clone();
        reversed.reverse();
        prop_assert_eq!(best_hand(&cards), best_hand(&reversed));
    }

    #[test]
    fn test_best_hand_beats_every_five_card_subset(cards in seven_cards_strategy()) {
        let best = best_hand(&cards);
        for skip_a in 0..7 {
            for skip_b in (skip_a + 1)..7 {
                let five: Vec<Card> = cards
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip_a && *i != skip_b)
                    .map(|(_, c)| *c)
                    .collect();
                prop_assert!(best_hand(&five) <= best);
            }
        }
    }
}
