//! Market symbols, agent tiers and the live price book
//!
//! Single source of truth for the ticker set the simulated agents trade and
//! the cosmetic tier metadata shown next to each row.

use crate::rng::RandomSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Tickers a simulated agent can pick at the Data Snapshot phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbol {
    Bnb,
    Btc,
    Etc,
    Sol,
    Doge,
    Pepe,
    Trump,
}

impl Symbol {
    pub const ALL: [Symbol; 7] = [
        Symbol::Bnb,
        Symbol::Btc,
        Symbol::Etc,
        Symbol::Sol,
        Symbol::Doge,
        Symbol::Pepe,
        Symbol::Trump,
    ];

    pub fn ticker(&self) -> &'static str {
        match self {
            Symbol::Bnb => "BNB",
            Symbol::Btc => "BTC",
            Symbol::Etc => "ETC",
            Symbol::Sol => "SOL",
            Symbol::Doge => "DOGE",
            Symbol::Pepe => "PEPE",
            Symbol::Trump => "TRUMP",
        }
    }

    /// CoinGecko coin id used by the price feed
    pub fn coingecko_id(&self) -> &'static str {
        match self {
            Symbol::Bnb => "binancecoin",
            Symbol::Btc => "bitcoin",
            Symbol::Etc => "ethereum-classic",
            Symbol::Sol => "solana",
            Symbol::Doge => "dogecoin",
            Symbol::Pepe => "pepe",
            Symbol::Trump => "trumpcoin",
        }
    }

    /// Display pair, always quoted in USDT
    pub fn market_pair(&self) -> String {
        format!("{}/USDT", self.ticker())
    }

    pub fn from_ticker(ticker: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.ticker().eq_ignore_ascii_case(ticker.trim()))
    }

    /// Uniform pick from the fixed ticker set
    pub fn pick(rng: &mut dyn RandomSource) -> Self {
        let idx = rng.int_inclusive(0, Self::ALL.len() as i64 - 1);
        Self::ALL[idx as usize]
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

/// Cosmetic agent tier, affects display only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Nova,
    Vega,
    Orion,
    Prime,
}

/// Display metadata for a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierInfo {
    pub persona: &'static str,
    pub tagline: &'static str,
    /// Accent color name
    pub accent: &'static str,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Nova, Tier::Vega, Tier::Orion, Tier::Prime];

    pub fn code(&self) -> &'static str {
        match self {
            Tier::Nova => "NOVA",
            Tier::Vega => "VEGA",
            Tier::Orion => "ORION",
            Tier::Prime => "PRIME",
        }
    }

    pub fn info(&self) -> TierInfo {
        match self {
            Tier::Nova => TierInfo {
                persona: "Nova",
                tagline: "Pattern Seeker",
                accent: "cyan",
            },
            Tier::Vega => TierInfo {
                persona: "Vega",
                tagline: "Momentum Scout",
                accent: "emerald",
            },
            Tier::Orion => TierInfo {
                persona: "Orion",
                tagline: "Risk Balancer",
                accent: "indigo",
            },
            Tier::Prime => TierInfo {
                persona: "Prime",
                tagline: "Alpha Hunter",
                accent: "amber",
            },
        }
    }
}

/// Relative weights used when assigning a tier to a new row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub nova: f64,
    pub vega: f64,
    pub orion: f64,
    pub prime: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            nova: 0.25,
            vega: 0.25,
            orion: 0.25,
            prime: 0.25,
        }
    }
}

impl TierWeights {
    pub fn weight(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Nova => self.nova,
            Tier::Vega => self.vega,
            Tier::Orion => self.orion,
            Tier::Prime => self.prime,
        }
    }

    pub fn total(&self) -> f64 {
        Tier::ALL.iter().map(|t| self.weight(*t)).sum()
    }

    /// Weighted pick with a single uniform draw
    pub fn pick(&self, rng: &mut dyn RandomSource) -> Tier {
        let total = self.total();
        let r = rng.unit() * total;
        let mut cumulative = 0.0;
        for tier in Tier::ALL {
            cumulative += self.weight(tier);
            if r < cumulative {
                return tier;
            }
        }
        // Float rounding at the upper edge
        Tier::ALL
            .iter()
            .rev()
            .copied()
            .find(|t| self.weight(*t) > 0.0)
            .unwrap_or(Tier::Prime)
    }
}

/// Latest known USD prices; a missing entry means "unknown"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBook {
    prices: HashMap<Symbol, f64>,
    /// When the book was last refreshed from a price source
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: Symbol, price_usd: f64) {
        self.prices.insert(symbol, price_usd);
    }

    pub fn get(&self, symbol: Symbol) -> Option<f64> {
        self.prices.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Prices sorted by ticker for stable output
    pub fn entries(&self) -> Vec<(Symbol, f64)> {
        let mut entries: Vec<_> = self.prices.iter().map(|(s, p)| (*s, *p)).collect();
        entries.sort_by_key(|(s, _)| *s);
        entries
    }
}
