//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::entities::{Blinds, Chips};

/// Smallest and largest number of seats a table can have.
pub const MIN_SEATS: usize = 2;
pub const MAX_SEATS: usize = 10;

/// Table speed variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSpeed {
    #[default]
    Normal,
    Turbo,
    Hyper,
}

impl std::fmt::Display for TableSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSpeed::Normal => write!(f, "normal"),
            TableSpeed::Turbo => write!(f, "turbo"),
            TableSpeed::Hyper => write!(f, "hyper"),
        }
    }
}

impl std::str::FromStr for TableSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(TableSpeed::Normal),
            "turbo" => Ok(TableSpeed::Turbo),
            "hyper" => Ok(TableSpeed::Hyper),
            other => Err(format!("unknown table speed '{other}'")),
        }
    }
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Minimum buy-in in chips
    pub min_buy_in: Chips,

    /// Maximum buy-in in chips
    pub max_buy_in: Chips,

    /// Number of seats (2 to 10)
    pub max_seats: usize,

    /// Table speed
    pub speed: TableSpeed,

    /// Pause between hands. Zero starts the next hand as soon as the
    /// previous one is resolved.
    #[serde(default = "default_next_hand_delay")]
    pub next_hand_delay_secs: u64,

    /// Give the big blind a turn preflop even when everyone just called.
    #[serde(default)]
    pub big_blind_option: bool,

    /// Fixed deck seed for reproducible hands
    #[serde(default)]
    pub deck_seed: Option<u64>,
}

fn default_next_hand_delay() -> u64 {
    5
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            small_blind: 5,
            big_blind: 10,
            min_buy_in: 200,
            max_buy_in: 1000,
            max_seats: 9,
            speed: TableSpeed::Normal,
            next_hand_delay_secs: default_next_hand_delay(),
            big_blind_option: false,
            deck_seed: None,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Table name must not be empty".to_string());
        }

        if self.small_blind == 0 {
            return Err("Small blind must be greater than zero".to_string());
        }

        if self.big_blind <= self.small_blind {
            return Err("Big blind must be greater than small blind".to_string());
        }

        if self.min_buy_in < self.big_blind {
            return Err("Min buy-in must cover at least one big blind".to_string());
        }

        if self.max_buy_in < self.min_buy_in {
            return Err("Max buy-in must not be less than min buy-in".to_string());
        }

        if !(MIN_SEATS..=MAX_SEATS).contains(&self.max_seats) {
            return Err(format!(
                "Max seats must be between {MIN_SEATS} and {MAX_SEATS}"
            ));
        }

        // Every chip counter is a `Chips`, so a full table must fit in one.
        if u64::from(self.max_buy_in) * self.max_seats as u64 > u64::from(Chips::MAX) {
            return Err(format!(
                "Max buy-in times max seats must not exceed {}",
                Chips::MAX
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn blinds(&self) -> Blinds {
        Blinds {
            small: self.small_blind,
            big: self.big_blind,
        }
    }

    /// Whether a buy-in falls within the table limits
    #[must_use]
    pub fn accepts_buy_in(&self, buy_in: Chips) -> bool {
        (self.min_buy_in..=self.max_buy_in).contains(&buy_in)
    }

    /// Get action timeout based on table speed
    pub fn action_timeout_secs(&self) -> u64 {
        match self.speed {
            TableSpeed::Normal => 30,
            TableSpeed::Turbo => 15,
            TableSpeed::Hyper => 5,
        }
    }

    #[must_use]
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs())
    }

    #[must_use]
    pub fn next_hand_delay(&self) -> Option<Duration> {
        (self.next_hand_delay_secs > 0).then(|| Duration::from_secs(self.next_hand_delay_secs))
    }
}
