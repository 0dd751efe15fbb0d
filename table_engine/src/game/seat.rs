use serde::{Deserialize, Serialize};

use super::entities::{Card, Chips, PlayerId};

/// Mutable per-seat state. Chips only ever move between `chips`,
/// `current_bet` (and the table pot) through [`Seat::commit`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Seat {
    pub player_id: PlayerId,
    pub chips: Chips,
    pub hole_cards: Vec<Card>,
    /// Chips put in during the current betting round.
    pub current_bet: Chips,
    /// Chips put in during the whole hand; drives side pots.
    pub total_committed: Chips,
    pub is_folded: bool,
    pub is_all_in: bool,
    pub is_turn: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    /// Whether the seat has acted since the last bet or raise.
    pub has_acted: bool,
    /// Dealt into the current hand.
    pub in_hand: bool,
    /// Hole cards were shown at showdown.
    pub showing: bool,
    /// Left mid-hand; removed once the hand ends.
    pub departed: bool,
}

impl Seat {
    #[must_use]
    pub fn new(player_id: PlayerId, chips: Chips) -> Self {
        Self {
            player_id,
            chips,
            hole_cards: Vec::with_capacity(2),
            current_bet: 0,
            total_committed: 0,
            is_folded: false,
            is_all_in: false,
            is_turn: false,
            is_dealer: false,
            is_small_blind: false,
            is_big_blind: false,
            has_acted: false,
            in_hand: false,
            showing: false,
            departed: false,
        }
    }

    /// Clear everything scoped to a hand, keeping identity and chips.
    pub fn reset(&mut self) {
        self.hole_cards.clear();
        self.current_bet = 0;
        self.total_committed = 0;
        self.is_folded = false;
        self.is_all_in = false;
        self.is_turn = false;
        self.is_dealer = false;
        self.is_small_blind = false;
        self.is_big_blind = false;
        self.has_acted = false;
        self.in_hand = false;
        self.showing = false;
    }

    /// Move `amount` from the stack into this round's bet. Callers validate
    /// the amount first; the stack can never go negative.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        let amount = amount.min(self.chips);
        self.chips -= amount;
        self.current_bet += amount;
        self.total_committed += amount;
        if self.chips == 0 && self.in_hand {
            self.is_all_in = true;
        }
        amount
    }

    /// Still holding cards in the current hand.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.in_hand && !self.is_folded
    }

    /// Can still take betting actions this hand.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.is_live() && !self.is_all_in
    }

    /// Still owes an action in the current betting round.
    #[must_use]
    pub fn needs_action(&self, table_bet: Chips) -> bool {
        self.is_eligible() && (!self.has_acted || self.current_bet < table_bet)
    }

    /// Has chips to play the next hand.
    #[must_use]
    pub fn is_funded(&self) -> bool {
        self.chips > 0 && !self.departed
    }
}
