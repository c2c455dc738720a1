//! Feed runner
//!
//! Drives a [`FeedEngine`] either against the wall clock (one poll per tick
//! interval, elapsed real time mapped to simulated milliseconds) or headless
//! as fast as possible.

use crate::config::FeedConfig;
use crate::error::Result;
use crate::feed::{FeedEngine, FeedEvent, FeedItemView, FeedSnapshot};
use crate::journal::EventJournal;
use crate::prices::{PriceFeed, PriceSource};
use crate::scheduler::Millis;
use crate::stats::OutcomeTally;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Final state of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sim_ms: Millis,
    pub tally: OutcomeTally,
    pub snapshot: FeedSnapshot,
}

pub struct FeedRunner {
    engine: FeedEngine,
    journal: Option<EventJournal>,
    price_source: Option<Arc<dyn PriceSource>>,
    render: bool,
}

impl FeedRunner {
    /// Create a runner; the journal is opened when the config names one
    pub fn new(config: FeedConfig) -> Result<Self> {
        let journal = match &config.journal_path {
            Some(path) => Some(EventJournal::open(path)?),
            None => None,
        };
        Ok(Self {
            engine: FeedEngine::new(config),
            journal,
            price_source: None,
            render: false,
        })
    }

    /// Decorate completed rows with closing prices from `source`
    pub fn with_price_source(mut self, source: Arc<dyn PriceSource>) -> Self {
        self.price_source = Some(source);
        self
    }

    /// Print the feed to stdout whenever it changes
    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    pub fn engine(&self) -> &FeedEngine {
        &self.engine
    }

    /// Real-time loop; stops on Ctrl-C or once `duration` has elapsed
    pub async fn run(mut self, duration: Option<Duration>) -> Result<RunSummary> {
        let tick = Duration::from_millis(self.engine.config().tick_interval_ms.max(1));
        let price_feed = self.price_source.take().map(|source| {
            let interval = Duration::from_millis(self.engine.config().prices.poll_interval_ms);
            info!(source = source.name(), interval_ms = interval.as_millis() as u64, "Starting price feed");
            PriceFeed::spawn(source, interval)
        });

        let started = Instant::now();
        let events = self.engine.start(0);
        self.handle(&events);

        info!(
            rows = self.engine.list().len(),
            tick_ms = tick.as_millis() as u64,
            duration_secs = duration.map(|d| d.as_secs()),
            "Feed running"
        );

        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let elapsed = started.elapsed();
                    if let Some(feed) = &price_feed {
                        let book = feed.latest().await;
                        if book.updated_at != self.engine.prices().updated_at {
                            self.engine.set_prices(book);
                        }
                    }
                    let events = self.engine.poll(elapsed.as_millis() as Millis);
                    self.handle(&events);

                    if duration.is_some_and(|d| elapsed >= d) {
                        info!("Run duration reached");
                        break;
                    }
                }
                res = &mut shutdown => {
                    match res {
                        Ok(()) => info!("Interrupted, stopping feed"),
                        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C, stopping feed"),
                    }
                    break;
                }
            }
        }

        Ok(self.finish())
    }

    /// Run `sim_ms` of simulated time without waiting on the clock
    pub fn run_headless(mut self, sim_ms: Millis) -> RunSummary {
        let events = self.engine.run_until(sim_ms);
        self.handle(&events);
        self.finish()
    }

    fn handle(&mut self, events: &[FeedEvent]) {
        if events.is_empty() {
            return;
        }
        if let Some(journal) = &mut self.journal {
            journal.record_all(events);
        }
        if self.render {
            print!("{}", render_snapshot(&self.engine.snapshot()));
        }
    }

    fn finish(mut self) -> RunSummary {
        if let Some(journal) = &mut self.journal {
            journal.flush();
        }
        let tally = self.engine.tally().clone();
        info!(
            sim_ms = self.engine.now(),
            completed = tally.completed,
            wins = tally.wins,
            skips = tally.skips,
            cumulative_pnl_usd = tally.cumulative_pnl_usd,
            "Feed stopped"
        );
        RunSummary {
            sim_ms: self.engine.now(),
            tally,
            snapshot: self.engine.snapshot(),
        }
    }
}

/// Terminal rendering of a snapshot, newest row first
pub fn render_snapshot(snapshot: &FeedSnapshot) -> String {
    let mut out = format!("── t+{:.1}s ──\n", snapshot.at as f64 / 1000.0);
    for item in &snapshot.items {
        match item {
            FeedItemView::Agent(view) => out.push_str(&view.render_line()),
            FeedItemView::Placeholder { .. } => out.push_str("           ... new agent warming up"),
        }
        out.push('\n');
    }
    out
}
