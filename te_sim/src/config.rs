//! Simulator configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use table_engine::table::{TableConfig, TableSpeed};

/// Complete simulator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of tables to run
    pub tables: usize,
    /// Bots seated at each table
    pub players_per_table: usize,
    /// Stop each table after this many hands
    pub hands: u64,
    /// Table defaults
    pub table: TableDefaults,
    /// Share of bots (percent) that never act and get timed out
    pub idle_percent: u8,
    /// Seed for decks and bot decisions; random when unset
    pub seed: Option<u64>,
    /// Write every table event as a JSON log line
    pub log_events: bool,
}

/// Default table configuration
#[derive(Debug, Clone)]
pub struct TableDefaults {
    pub small_blind: u32,
    pub big_blind: u32,
    /// Chips each bot buys in for
    pub buy_in: u32,
    pub speed: TableSpeed,
    pub next_hand_delay_secs: u64,
}

impl SimConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `tables_override` - Optional table count (from CLI args)
    /// * `hands_override` - Optional hand count (from CLI args)
    /// * `seed_override` - Optional seed (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        tables_override: Option<usize>,
        hands_override: Option<u64>,
        seed_override: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let speed = match std::env::var("SIM_TABLE_SPEED") {
            Ok(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                var: "SIM_TABLE_SPEED".to_string(),
                reason,
            })?,
            Err(_) => TableSpeed::Hyper,
        };

        let seed = match seed_override {
            Some(seed) => Some(seed),
            None => parse_env_opt("SIM_SEED")?,
        };

        let table = TableDefaults {
            small_blind: parse_env_or("SIM_SMALL_BLIND", 5),
            big_blind: parse_env_or("SIM_BIG_BLIND", 10),
            buy_in: parse_env_or("SIM_BUY_IN", 500),
            speed,
            next_hand_delay_secs: parse_env_or("SIM_NEXT_HAND_DELAY_SECS", 1),
        };

        Ok(SimConfig {
            tables: tables_override.unwrap_or_else(|| parse_env_or("SIM_TABLES", 2)),
            players_per_table: parse_env_or("SIM_PLAYERS_PER_TABLE", 6),
            hands: hands_override.unwrap_or_else(|| parse_env_or("SIM_HANDS", 20)),
            table,
            idle_percent: parse_env_or("SIM_IDLE_PERCENT", 10),
            seed,
            log_events: parse_env_or("SIM_LOG_EVENTS", false),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tables == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_TABLES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.players_per_table < table_engine::table::config::MIN_SEATS
            || self.players_per_table > table_engine::table::config::MAX_SEATS
        {
            return Err(ConfigError::Invalid {
                var: "SIM_PLAYERS_PER_TABLE".to_string(),
                reason: format!(
                    "Must be between {} and {}",
                    table_engine::table::config::MIN_SEATS,
                    table_engine::table::config::MAX_SEATS
                ),
            });
        }

        if self.idle_percent > 100 {
            return Err(ConfigError::Invalid {
                var: "SIM_IDLE_PERCENT".to_string(),
                reason: "Must be a percentage (0-100)".to_string(),
            });
        }

        // Joins are only accepted between hands.
        if self.table.next_hand_delay_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_NEXT_HAND_DELAY_SECS".to_string(),
                reason: "Must be at least 1 so late bots can sit down".to_string(),
            });
        }

        self.table_config(0)
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "SIM_SMALL_BLIND/SIM_BIG_BLIND/SIM_BUY_IN".to_string(),
                reason,
            })
    }

    /// Engine configuration for the table at `index`
    pub fn table_config(&self, index: usize) -> TableConfig {
        TableConfig {
            name: format!("Sim {}", index + 1),
            small_blind: self.table.small_blind,
            big_blind: self.table.big_blind,
            min_buy_in: self.table.buy_in,
            max_buy_in: self.table.buy_in,
            max_seats: self.players_per_table,
            speed: self.table.speed,
            next_hand_delay_secs: self.table.next_hand_delay_secs,
            deck_seed: self.seed.map(|seed| seed.wrapping_add(index as u64 * 1_000_003)),
            ..TableConfig::default()
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an optional variable, rejecting values that are set but malformed
fn parse_env_opt<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Cannot parse {value:?}"),
        }),
        Err(_) => Ok(None),
    }
}
