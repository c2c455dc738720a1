//! Closing price lookup
//!
//! Prices are display-only: a completed row shows the last known USD price of
//! its symbol, or nothing when the source is unavailable. A failed refresh
//! keeps the previous book.

mod coingecko;

pub use coingecko::{parse_simple_price, CoinGeckoSource};

use crate::error::Result;
use crate::market::PriceBook;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Anything that can produce a fresh price book
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self) -> Result<PriceBook>;

    fn name(&self) -> &str;
}

/// Background task refreshing a shared price book on an interval
///
/// The task is aborted when the feed is dropped.
pub struct PriceFeed {
    book: Arc<RwLock<PriceBook>>,
    handle: JoinHandle<()>,
}

impl PriceFeed {
    /// Spawn the refresh loop; the first fetch happens immediately
    pub fn spawn(source: Arc<dyn PriceSource>, interval: Duration) -> Self {
        let book = Arc::new(RwLock::new(PriceBook::new()));
        let shared = Arc::clone(&book);
        let period = interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match source.fetch().await {
                    Ok(fresh) => {
                        tracing::debug!(source = source.name(), prices = fresh.len(), "Price book refreshed");
                        *shared.write().await = fresh;
                    }
                    Err(e) => {
                        tracing::warn!(source = source.name(), error = %e, "Price refresh failed, keeping last book");
                    }
                }
            }
        });

        Self { book, handle }
    }

    /// Copy of the most recent book
    pub async fn latest(&self) -> PriceBook {
        self.book.read().await.clone()
    }
}

impl Drop for PriceFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
