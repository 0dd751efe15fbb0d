//! Pot distribution at the end of a hand.

use serde::{Deserialize, Serialize};

use super::entities::{Card, Chips, SeatIndex};
use super::eval::HandStrength;

/// Collaborator that totally orders hands. Higher is better; equal
/// strengths split.
pub trait HandRanker: Send + Sync {
    fn strength(&self, hole_cards: &[Card], board: &[Card]) -> HandStrength;
}

/// A seat's stake in the hand as seen by the resolver.
#[derive(Clone, Debug)]
pub struct Contender {
    pub seat: SeatIndex,
    pub hole_cards: Vec<Card>,
    /// Chips this seat put in over the whole hand.
    pub committed: Chips,
    pub folded: bool,
}

/// One main or side pot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    /// Live seats that can win this pot.
    pub eligible: Vec<SeatIndex>,
}

/// Chips awarded to a seat.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Award {
    pub seat: SeatIndex,
    pub amount: Chips,
}

/// Split contributions into a main pot and side pots. A layer nobody live
/// contributed to is folded into the pot below it.
#[must_use]
pub fn build_pots(contenders: &[Contender]) -> Vec<Pot> {
    let mut levels: Vec<Chips> = contenders
        .iter()
        .map(|c| c.committed)
        .filter(|&c| c > 0)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<Pot> = Vec::with_capacity(levels.len());
    let mut previous = 0;
    let mut orphaned: Chips = 0;
    for level in levels {
        let amount: Chips = contenders
            .iter()
            .map(|c| c.committed.min(level) - c.committed.min(previous))
            .sum();
        let mut eligible: Vec<SeatIndex> = contenders
            .iter()
            .filter(|c| !c.folded && c.committed >= level)
            .map(|c| c.seat)
            .collect();
        eligible.sort_unstable();
        previous = level;

        match pots.last_mut() {
            Some(last) if eligible.is_empty() || eligible == last.eligible => last.amount += amount,
            // Nothing below to merge into yet; carry it up to the next pot.
            None if eligible.is_empty() => orphaned += amount,
            _ => pots.push(Pot {
                amount: amount + std::mem::take(&mut orphaned),
                eligible,
            }),
        }
    }
    if orphaned > 0 {
        let mut eligible: Vec<SeatIndex> = contenders
            .iter()
            .filter(|c| !c.folded)
            .map(|c| c.seat)
            .collect();
        eligible.sort_unstable();
        pots.push(Pot {
            amount: orphaned,
            eligible,
        });
    }
    pots
}

/// Award every pot. `position_order` lists seats clockwise from the first
/// seat after the dealer; split remainders go to the earliest tied seat
/// in that order. Returned awards are aggregated per seat.
#[must_use]
pub fn resolve(
    contenders: &[Contender],
    board: &[Card],
    ranker: &dyn HandRanker,
    position_order: &[SeatIndex],
) -> Vec<Award> {
    let live: Vec<&Contender> = contenders.iter().filter(|c| !c.folded).collect();
    let strengths: Vec<(SeatIndex, Option<HandStrength>)> = live
        .iter()
        .map(|c| {
            // Uncontested hands are never ranked.
            let strength = (live.len() > 1).then(|| ranker.strength(&c.hole_cards, board));
            (c.seat, strength)
        })
        .collect();

    let mut awards: Vec<Award> = Vec::new();
    for pot in build_pots(contenders) {
        let best = pot
            .eligible
            .iter()
            .filter_map(|seat| strengths.iter().find(|(s, _)| s == seat))
            .map(|(_, strength)| strength)
            .max();
        let mut winners: Vec<SeatIndex> = pot
            .eligible
            .iter()
            .copied()
            .filter(|seat| {
                strengths
                    .iter()
                    .any(|(s, strength)| s == seat && Some(strength) == best)
            })
            .collect();
        if winners.is_empty() {
            continue;
        }
        winners.sort_by_key(|seat| {
            position_order
                .iter()
                .position(|s| s == seat)
                .unwrap_or(usize::MAX)
        });

        let share = pot.amount / winners.len() as Chips;
        let remainder = pot.amount % winners.len() as Chips;
        for (i, &seat) in winners.iter().enumerate() {
            let amount = if i == 0 { share + remainder } else { share };
            match awards.iter_mut().find(|a| a.seat == seat) {
                Some(award) => award.amount += amount,
                None => awards.push(Award { seat, amount }),
            }
        }
    }
    awards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::eval::Rank;

    /// Ranks hands by a fixed per-seat score carried in the first hole card.
    struct ScoreRanker;

    impl HandRanker for ScoreRanker {
        fn strength(&self, hole_cards: &[Card], _board: &[Card]) -> HandStrength {
            HandStrength {
                rank: Rank::HighCard,
                values: vec![hole_cards[0].0],
            }
        }
    }

    fn contender(seat: SeatIndex, score: u8, committed: Chips, folded: bool) -> Contender {
        Contender {
            seat,
            hole_cards: vec![Card(score, crate::game::entities::Suit::Club)],
            committed,
            folded,
        }
    }

    fn total(awards: &[Award]) -> Chips {
        awards.iter().map(|a| a.amount).sum()
    }

    #[test]
    fn test_single_pot_best_hand_wins() {
        let contenders = [
            contender(0, 9, 100, false),
            contender(1, 12, 100, false),
            contender(2, 14, 100, true),
        ];
        let awards = resolve(&contenders, &[], &ScoreRanker, &[1, 2, 0]);
        assert_eq!(awards, vec![Award { seat: 1, amount: 300 }]);
    }

    #[test]
    fn test_uncontested_pot_skips_ranking() {
        struct PanicRanker;
        impl HandRanker for PanicRanker {
            fn strength(&self, _: &[Card], _: &[Card]) -> HandStrength {
                panic!("uncontested pots must not be ranked")
            }
        }
        let contenders = [contender(0, 2, 30, false), contender(1, 14, 10, true)];
        let awards = resolve(&contenders, &[], &PanicRanker, &[1, 0]);
        assert_eq!(awards, vec![Award { seat: 0, amount: 40 }]);
    }

    #[test]
    fn test_tie_splits_with_remainder_to_earliest_position() {
        let contenders = [
            contender(0, 10, 35, false),
            contender(1, 10, 35, false),
            contender(2, 3, 31, true),
        ];
        // Position order starts left of a dealer in seat 0.
        let awards = resolve(&contenders, &[], &ScoreRanker, &[1, 2, 0]);
        assert_eq!(total(&awards), 101);
        assert!(awards.contains(&Award { seat: 1, amount: 51 }));
        assert!(awards.contains(&Award { seat: 0, amount: 50 }));
    }

    #[test]
    fn test_short_all_in_wins_only_main_pot() {
        let contenders = [
            contender(0, 14, 40, false),  // best hand, all-in short
            contender(1, 10, 100, false),
            contender(2, 5, 100, false),
        ];
        let pots = build_pots(&contenders);
        assert_eq!(
            pots,
            vec![
                Pot { amount: 120, eligible: vec![0, 1, 2] },
                Pot { amount: 120, eligible: vec![1, 2] },
            ]
        );
        let awards = resolve(&contenders, &[], &ScoreRanker, &[0, 1, 2]);
        assert!(awards.contains(&Award { seat: 0, amount: 120 }));
        assert!(awards.contains(&Award { seat: 1, amount: 120 }));
        assert_eq!(total(&awards), 240);
    }

    #[test]
    fn test_uncalled_excess_returns_to_bettor() {
        let contenders = [contender(0, 2, 50, false), contender(1, 14, 300, false)];
        let awards = resolve(&contenders, &[], &ScoreRanker, &[0, 1]);
        assert_eq!(awards, vec![Award { seat: 1, amount: 350 }]);

        let contenders = [contender(0, 14, 50, false), contender(1, 2, 300, false)];
        let awards = resolve(&contenders, &[], &ScoreRanker, &[0, 1]);
        assert!(awards.contains(&Award { seat: 0, amount: 100 }));
        assert!(awards.contains(&Award { seat: 1, amount: 250 }));
    }

    #[test]
    fn test_folded_money_above_live_levels_is_merged_down() {
        let contenders = [
            contender(0, 9, 50, false),
            contender(1, 14, 200, true),
        ];
        let pots = build_pots(&contenders);
        assert_eq!(pots, vec![Pot { amount: 250, eligible: vec![0] }]);
        let awards = resolve(&contenders, &[], &ScoreRanker, &[0, 1]);
        assert_eq!(awards, vec![Award { seat: 0, amount: 250 }]);
    }

    #[test]
    fn test_dead_money_below_every_live_stake_is_kept() {
        let contenders = [
            contender(0, 2, 5, true),
            contender(1, 9, 0, false),
            contender(2, 14, 0, false),
        ];
        let pots = build_pots(&contenders);
        assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), 5);
        let awards = resolve(&contenders, &[], &ScoreRanker, &[1, 2, 0]);
        assert_eq!(total(&awards), 5);
    }
}
