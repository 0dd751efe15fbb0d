//! Side pot and showdown settlement through full hands.
//!
//! Hand strengths are scripted per seat after the deal so each test
//! controls exactly who beats whom.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use table_engine::game::entities::{Action, Card, SeatRequest, TableStatus};
use table_engine::game::eval::{HandStrength, Rank};
use table_engine::game::showdown::HandRanker;
use table_engine::game::table::TableEvent;
use table_engine::table::TableConfig;
use table_engine::{SeatIndex, TableError, TableState};

/// Scores hands by their first hole card, as registered by the test.
#[derive(Default)]
struct ScriptedRanker {
    scores: Mutex<HashMap<Card, u8>>,
}

impl HandRanker for ScriptedRanker {
    fn strength(&self, hole_cards: &[Card], _board: &[Card]) -> HandStrength {
        let score = self.scores.lock().unwrap()[&hole_cards[0]];
        HandStrength {
            rank: Rank::HighCard,
            values: vec![score],
        }
    }
}

fn config() -> TableConfig {
    TableConfig {
        name: "Side pots".to_string(),
        small_blind: 5,
        big_blind: 10,
        min_buy_in: 50,
        max_buy_in: 1000,
        max_seats: 6,
        deck_seed: Some(99),
        ..Default::default()
    }
}

fn table(stacks: &[u32]) -> (TableState, Arc<ScriptedRanker>) {
    let ranker = Arc::new(ScriptedRanker::default());
    let mut table = TableState::with_ranker(1, config(), ranker.clone());
    for (i, &stack) in stacks.iter().enumerate() {
        table
            .join(SeatRequest::new(i as i64 + 1, stack).at_seat(i))
            .unwrap();
    }
    (table, ranker)
}

/// Give each listed seat a fixed score for the current hand.
fn script(table: &TableState, ranker: &ScriptedRanker, scores: &[(SeatIndex, u8)]) {
    let mut map = ranker.scores.lock().unwrap();
    map.clear();
    for &(seat, score) in scores {
        let first = table.seat(seat).unwrap().hole_cards[0];
        map.insert(first, score);
    }
}

fn stacks(table: &TableState) -> Vec<u32> {
    table.seats().iter().flatten().map(|s| s.chips).collect()
}

#[test]
fn test_three_way_all_in_builds_main_and_side_pot() {
    let (mut table, ranker) = table(&[100, 300, 300]);
    table.start_hand().unwrap();
    script(&table, &ranker, &[(0, 14), (1, 10), (2, 5)]);

    // Dealer 0, small blind 1, big blind 2: seat 0 opens.
    table.act(0, Action::AllIn).unwrap();
    table.act(1, Action::AllIn).unwrap();
    table.act(2, Action::Call).unwrap();

    assert_eq!(table.status(), TableStatus::Waiting);
    assert_eq!(table.community_cards().len(), 5);
    assert_eq!(stacks(&table), vec![300, 400, 0]);
    assert_eq!(table.chips_on_table(), 700);
    table.verify_chips().unwrap();

    let awards: Vec<(SeatIndex, u32)> = table
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            TableEvent::PotAwarded {
                seat,
                amount,
                at_showdown: true,
            } => Some((seat, amount)),
            _ => None,
        })
        .collect();
    assert_eq!(awards, vec![(0, 300), (1, 400)]);

    // The busted seat no longer counts towards a new hand.
    assert_eq!(table.funded_count(), 2);
}

#[test]
fn test_tied_pot_gives_odd_chip_left_of_dealer() {
    let (mut table, ranker) = table(&[500, 500, 500]);
    table.start_hand().unwrap();
    script(&table, &ranker, &[(0, 12), (2, 12)]);

    table.act(0, Action::Call).unwrap();
    table.act(1, Action::Fold).unwrap();
    table.act(2, Action::Check).unwrap();
    while table.status() == TableStatus::Playing {
        let seat = table.active_seat().unwrap();
        table.act(seat, Action::Check).unwrap();
    }

    // 25 in the pot: seat 2 sits closer to the dealer's left than seat 0.
    assert_eq!(stacks(&table), vec![502, 495, 503]);
    table.verify_chips().unwrap();
}

#[test]
fn test_folded_contributions_feed_the_pots_they_reached() {
    let (mut table, ranker) = table(&[50, 500, 500, 500]);
    table.start_hand().unwrap();
    script(&table, &ranker, &[(0, 14), (2, 9)]);

    table.act(3, Action::Raise(200)).unwrap();
    table.act(0, Action::AllIn).unwrap();
    table.act(1, Action::Call).unwrap();
    table.act(2, Action::Raise(500)).unwrap();
    table.act(3, Action::Fold).unwrap();
    table.act(1, Action::Fold).unwrap();

    assert_eq!(table.status(), TableStatus::Waiting);
    // Main pot 4 x 50 to seat 0; everything above it only seat 2 could win.
    assert_eq!(stacks(&table), vec![200, 300, 750, 300]);
    assert_eq!(table.chips_on_table(), 1550);
    table.verify_chips().unwrap();
}

#[test]
fn test_showdown_reveals_only_live_hands() {
    let (mut table, ranker) = table(&[500, 500, 500]);
    table.start_hand().unwrap();
    script(&table, &ranker, &[(1, 3), (2, 8)]);

    table.act(0, Action::Fold).unwrap();
    table.act(1, Action::Call).unwrap();
    table.act(2, Action::Check).unwrap();
    while table.status() == TableStatus::Playing {
        let seat = table.active_seat().unwrap();
        table.act(seat, Action::Check).unwrap();
    }

    let revealed: Vec<SeatIndex> = table
        .drain_events()
        .into_iter()
        .find_map(|e| match e {
            TableEvent::HandsRevealed { hands } => Some(hands.into_iter().map(|(s, _)| s).collect()),
            _ => None,
        })
        .unwrap();
    assert_eq!(revealed, vec![1, 2]);

    let public = table.snapshot(None);
    assert!(public.seat(0).unwrap().hole_cards.iter().all(Option::is_none));
    assert!(public.seat(1).unwrap().hole_cards.iter().all(Option::is_some));
    assert!(public.seat(2).unwrap().hole_cards.iter().all(Option::is_some));
    assert_eq!(stacks(&table), vec![500, 490, 510]);
}

#[test]
fn test_uncontested_pot_is_not_shown() {
    let (mut table, _ranker) = table(&[500, 500, 500]);
    table.start_hand().unwrap();

    // Nothing is scripted: ranking an uncontested hand would panic.
    table.act(0, Action::Fold).unwrap();
    table.act(1, Action::Fold).unwrap();

    let events = table.drain_events();
    assert!(!events.iter().any(|e| matches!(e, TableEvent::HandsRevealed { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        TableEvent::PotAwarded {
            seat: 2,
            amount: 15,
            at_showdown: false
        }
    )));
    assert_eq!(stacks(&table), vec![500, 495, 505]);
}

#[test]
fn test_busted_player_sits_out() {
    let (mut table, ranker) = table(&[50, 1000]);
    table.start_hand().unwrap();
    script(&table, &ranker, &[(0, 1), (1, 9)]);

    // Heads-up the dealer posts the small blind and opens the action.
    assert_eq!(table.active_seat(), Some(0));
    table.act(0, Action::AllIn).unwrap();
    table.act(1, Action::Call).unwrap();

    assert_eq!(table.status(), TableStatus::Waiting);
    assert_eq!(stacks(&table), vec![0, 1050]);
    assert_eq!(table.start_hand(), Err(TableError::NotEnoughPlayers));
    assert_eq!(table.chips_on_table(), 1050);
}
