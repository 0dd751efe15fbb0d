//! Reference hand ranking: best five cards out of hole cards plus board.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::{ACE, Card, Value};
use super::showdown::HandRanker;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "hi",
            Self::OnePair => "1p",
            Self::TwoPair => "2p",
            Self::ThreeOfAKind => "3k",
            Self::Straight => "s8",
            Self::Flush => "fs",
            Self::FullHouse => "fh",
            Self::FourOfAKind => "4k",
            Self::StraightFlush => "sf",
        };
        write!(f, "{repr}")
    }
}

/// Totally ordered strength of a hand. Rank dominates; `values` break ties
/// in significance order (grouped cards first, then kickers).
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandStrength {
    pub rank: Rank,
    pub values: Vec<Value>,
}

impl fmt::Display for HandStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.rank, self.values)
    }
}

/// Exhaustive best-five-of-seven evaluator.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardRanker;

impl HandRanker for StandardRanker {
    fn strength(&self, hole_cards: &[Card], board: &[Card]) -> HandStrength {
        let cards: Vec<Card> = hole_cards.iter().chain(board).copied().collect();
        best_hand(&cards)
    }
}

/// Best hand out of any number of cards. Fewer than five cards are ranked
/// on pairs and high cards only.
#[must_use]
pub fn best_hand(cards: &[Card]) -> HandStrength {
    if cards.len() <= 5 {
        return eval_five(cards);
    }
    combinations(cards.len(), 5)
        .into_iter()
        .map(|idxs| {
            let hand: Vec<Card> = idxs.iter().map(|&i| cards[i]).collect();
            eval_five(&hand)
        })
        .max()
        .unwrap_or(HandStrength {
            rank: Rank::HighCard,
            values: Vec::new(),
        })
}

fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(k);
    fn recurse(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            recurse(i + 1, n, k, current, out);
            current.pop();
        }
    }
    recurse(0, n, k, &mut current, &mut out);
    out
}

fn eval_five(cards: &[Card]) -> HandStrength {
    // (count, value) groups, biggest group first, then highest value.
    let mut groups: Vec<(usize, Value)> = Vec::with_capacity(5);
    for card in cards {
        match groups.iter_mut().find(|(_, v)| *v == card.0) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, card.0)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let grouped: Vec<Value> = groups.iter().map(|&(_, v)| v).collect();

    let is_five = cards.len() == 5;
    let is_flush = is_five && cards.iter().all(|c| c.1 == cards[0].1);
    let straight_high = if is_five && groups.len() == 5 {
        straight_high(&grouped)
    } else {
        None
    };

    let (rank, values) = match (straight_high, is_flush, groups[..].first()) {
        (Some(high), true, _) => (Rank::StraightFlush, vec![high]),
        (_, _, Some((4, _))) => (Rank::FourOfAKind, grouped),
        (_, _, Some((3, _))) if groups.get(1).is_some_and(|g| g.0 == 2) => (Rank::FullHouse, grouped),
        (_, true, _) => (Rank::Flush, grouped),
        (Some(high), false, _) => (Rank::Straight, vec![high]),
        (_, _, Some((3, _))) => (Rank::ThreeOfAKind, grouped),
        (_, _, Some((2, _))) if groups.get(1).is_some_and(|g| g.0 == 2) => (Rank::TwoPair, grouped),
        (_, _, Some((2, _))) => (Rank::OnePair, grouped),
        _ => (Rank::HighCard, grouped),
    };
    HandStrength { rank, values }
}

/// High card of a straight given five distinct values sorted descending.
fn straight_high(values: &[Value]) -> Option<Value> {
    if values[0] - values[4] == 4 {
        return Some(values[0]);
    }
    // Wheel: A-5-4-3-2 plays as a five-high straight.
    if values == [ACE, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}
