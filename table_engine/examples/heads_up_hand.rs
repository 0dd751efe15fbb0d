//! Heads-up Hand Example
//!
//! Plays one seeded heads-up hand on the synchronous table state and prints
//! every event it produced, then shows how a showdown is settled.

use table_engine::entities::{Action, SeatRequest, TableStatus};
use table_engine::game::eval::best_hand;
use table_engine::{TableConfig, TableState};

fn main() {
    println!("=== Heads-up Hand Example ===\n");

    let config = TableConfig {
        name: "Example".to_string(),
        small_blind: 5,
        big_blind: 10,
        deck_seed: Some(2024),
        ..TableConfig::default()
    };
    let mut table = TableState::new(1, config);
    table.join(SeatRequest::new(1, 500)).unwrap();
    table.join(SeatRequest::new(2, 500)).unwrap();
    table.start_hand().unwrap();

    // The dealer completes the small blind, then both players check it down.
    while table.status() == TableStatus::Playing {
        let seat = table.active_seat().unwrap();
        if table.act(seat, Action::Check).is_err() {
            table.act(seat, Action::Call).unwrap();
        }
    }

    for event in table.drain_events() {
        println!("{event}");
    }

    println!("\nBoard: {:?}", table.community_cards());
    for seat in table.seats().iter().flatten() {
        let mut cards = seat.hole_cards.clone();
        cards.extend_from_slice(table.community_cards());
        println!(
            "Player {}: {:?} -> {} (stack ${})",
            seat.player_id,
            seat.hole_cards,
            best_hand(&cards),
            seat.chips
        );
    }
    table.verify_chips().unwrap();
}
