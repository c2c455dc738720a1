//! Configuration for the agent outcomes feed

pub mod prices;

use crate::market::{Tier, TierWeights};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use prices::PriceFeedConfig;

/// Row cap environment variable name
pub const OUTCOME_ROWS_ENV: &str = "OUTCOME_ROWS";
/// Seed environment variable name
pub const FEED_SEED_ENV: &str = "FEED_SEED";

/// Upper bound for every configured delay (one hour)
pub const MAX_DELAY_MS: u64 = 3_600_000;

/// Branch and outcome probabilities for the phase simulator
///
/// These are cosmetic knobs, not business rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationOdds {
    /// Chance a Validating row detours through Skipping
    pub skip_chance: f64,
    /// Chance an Entering row is Buying rather than Selling
    pub buy_chance: f64,
    /// Chance the Profit analysis detail is positive
    pub analysis_positive_chance: f64,
    /// Chance a completed row is a Win
    pub win_chance: f64,
    /// Chance a completed row is Neutral (Loss takes the remainder)
    pub neutral_chance: f64,
}

impl Default for SimulationOdds {
    fn default() -> Self {
        Self {
            skip_chance: 0.25,
            buy_chance: 0.5,
            analysis_positive_chance: 0.6,
            win_chance: 0.6,
            neutral_chance: 0.2,
        }
    }
}

impl SimulationOdds {
    fn validate(&self) -> Result<()> {
        let named = [
            ("skip_chance", self.skip_chance),
            ("buy_chance", self.buy_chance),
            ("analysis_positive_chance", self.analysis_positive_chance),
            ("win_chance", self.win_chance),
            ("neutral_chance", self.neutral_chance),
        ];
        for (name, p) in named {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::Config(format!("{name} must be within [0, 1], got {p}")));
            }
        }
        if self.win_chance + self.neutral_chance > 1.0 {
            return Err(Error::Config(format!(
                "win_chance + neutral_chance must not exceed 1, got {}",
                self.win_chance + self.neutral_chance
            )));
        }
        Ok(())
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Number of rows shown in the feed
    pub row_cap: usize,
    /// Polling tick interval (milliseconds)
    pub tick_interval_ms: u64,
    /// Lower bound of the per-transition delay
    pub step_delay_min_ms: u64,
    /// Upper bound of the per-transition delay
    pub step_delay_max_ms: u64,
    /// How long a placeholder stays before the new row replaces it
    pub replacement_delay_ms: u64,
    /// Seed for reproducible runs (entropy when unset)
    #[serde(default)]
    pub seed: Option<u64>,
    /// Branch and outcome probabilities
    #[serde(default)]
    pub odds: SimulationOdds,
    /// Tier assignment weights
    #[serde(default)]
    pub tier_weights: TierWeights,
    /// Closing price lookup
    #[serde(default)]
    pub prices: PriceFeedConfig,
    /// Path to the JSONL event journal
    #[serde(default)]
    pub journal_path: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            row_cap: 7,
            tick_interval_ms: 100,
            step_delay_min_ms: 250,
            step_delay_max_ms: 900,
            replacement_delay_ms: 3_000, // 3 seconds
            seed: None,
            odds: SimulationOdds::default(),
            tier_weights: TierWeights::default(),
            prices: PriceFeedConfig::default(),
            journal_path: None,
        }
    }
}

impl FeedConfig {
    /// Load a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Overlay environment variables onto this config
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var(OUTCOME_ROWS_ENV) {
            match raw.trim().parse::<i64>() {
                Ok(rows) => self.row_cap = rows.max(1) as usize,
                Err(e) => tracing::warn!(value = %raw, error = %e, "Ignoring invalid OUTCOME_ROWS"),
            }
        }
        if let Ok(raw) = std::env::var(FEED_SEED_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => self.seed = Some(seed),
                Err(e) => tracing::warn!(value = %raw, error = %e, "Ignoring invalid FEED_SEED"),
            }
        }
        self.prices.apply_env();
    }

    /// Reject settings the simulator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.row_cap == 0 {
            return Err(Error::Config("row_cap must be at least 1".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be positive".to_string()));
        }
        if self.step_delay_min_ms > self.step_delay_max_ms {
            return Err(Error::Config(format!(
                "step_delay_min_ms ({}) exceeds step_delay_max_ms ({})",
                self.step_delay_min_ms, self.step_delay_max_ms
            )));
        }
        for (name, value) in [
            ("tick_interval_ms", self.tick_interval_ms),
            ("step_delay_max_ms", self.step_delay_max_ms),
            ("replacement_delay_ms", self.replacement_delay_ms),
        ] {
            if value > MAX_DELAY_MS {
                return Err(Error::Config(format!(
                    "{name} ({value}) exceeds the {MAX_DELAY_MS}ms limit"
                )));
            }
        }
        self.odds.validate()?;
        if Tier::ALL.iter().any(|t| self.tier_weights.weight(*t) < 0.0) {
            return Err(Error::Config("tier weights must not be negative".to_string()));
        }
        if self.tier_weights.total() <= 0.0 {
            return Err(Error::Config("at least one tier weight must be positive".to_string()));
        }
        if self.prices.enabled {
            url::Url::parse(&self.prices.base_url)
                .map_err(|e| Error::Config(format!("invalid price base_url: {e}")))?;
        }
        Ok(())
    }
}
