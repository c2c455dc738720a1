//! Agent Outcomes Feed
//!
//! A live-looking feed of simulated "AI trading agent" rows:
//! - Each row cycles through a fixed sequence of named phases on random delays
//! - Validating occasionally detours through Skipping and restarts the cycle
//! - Completed rows show a random win/neutral/loss outcome with cosmetic PnL
//! - Completed rows are replaced, placeholder first, to keep the feed moving
//!
//! # Nothing here trades
//!
//! Every figure is drawn from an injectable [`rng::RandomSource`]. The only
//! external input is an optional closing price lookup used for display.
//! Timers are replaced by a discrete-event [`scheduler`], so a seeded feed is
//! fully reproducible.

pub mod config;
pub mod display;
pub mod feed;
pub mod journal;
pub mod market;
pub mod prices;
pub mod rng;
pub mod runner;
pub mod scheduler;
pub mod simulator;
pub mod stats;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{FeedConfig, PriceFeedConfig, SimulationOdds};
pub use error::{Error, Result};
pub use feed::{FeedEngine, FeedEvent, FeedSnapshot};
pub use market::{PriceBook, Symbol, Tier};
pub use runner::{FeedRunner, RunSummary};
pub use simulator::{AgentRow, Outcome, Phase, RowId};
pub use stats::OutcomeTally;
