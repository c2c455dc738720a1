//! Price feed configuration
//!
//! Resolved from (highest priority first):
//! 1. `COINGECKO_BASE_URL` / `COINGECKO_API_KEY` env vars
//! 2. The JSON config file
//! 3. Public CoinGecko endpoint defaults
//!
//! ```bash
//! # Optional demo key, sent as the x-cg-demo-api-key header
//! export COINGECKO_API_KEY="YOUR_KEY"
//! ```

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Environment variable names
pub mod env_vars {
    pub const COINGECKO_BASE_URL: &str = "COINGECKO_BASE_URL";
    pub const COINGECKO_API_KEY: &str = "COINGECKO_API_KEY";
}

/// Public CoinGecko v3 API root
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Settings for the periodic closing-price lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceFeedConfig {
    /// Poll the price source at all
    pub enabled: bool,
    /// API root, `/simple/price` is appended
    pub base_url: String,
    /// Milliseconds between refreshes
    pub poll_interval_ms: u64,
    /// Per-request timeout
    pub timeout_ms: u64,
    /// Optional API key (never serialized)
    #[serde(skip)]
    pub api_key: Option<SecretString>,
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 10_000, // 10 seconds
            timeout_ms: 5_000,
            api_key: None,
        }
    }
}

impl PriceFeedConfig {
    /// Overlay environment variables onto this config
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(env_vars::COINGECKO_BASE_URL) {
            tracing::debug!("Using COINGECKO_BASE_URL for price feed");
            self.base_url = url;
        }
        if let Ok(key) = std::env::var(env_vars::COINGECKO_API_KEY) {
            if !key.trim().is_empty() {
                tracing::debug!("Using COINGECKO_API_KEY for price feed");
                self.api_key = Some(SecretString::from(key));
            }
        }
    }
}
