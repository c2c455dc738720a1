//! Feed engine: list manager + row simulators on a discrete-event clock

use super::list::{FeedItem, FeedList, PlaceholderId};
use crate::config::FeedConfig;
use crate::market::{PriceBook, Tier};
use crate::rng::{RandomSource, SeededRandom};
use crate::scheduler::{Millis, ScheduledEvent, Scheduler};
use crate::simulator::{AgentRow, CompletionSummary, DelayRange, Phase, RowId, RowView, Step, StepContext};
use crate::stats::OutcomeTally;
use serde::Serialize;
use std::collections::HashMap;

/// Observable change produced by a poll
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    RowAdvanced {
        row: RowId,
        from: Phase,
        to: Phase,
        at: Millis,
    },
    /// Skip cycle finished, row is back at Analyzing
    RowReset { row: RowId, at: Millis },
    RowCompleted {
        row: RowId,
        summary: CompletionSummary,
        at: Millis,
    },
    PlaceholderInserted {
        placeholder: PlaceholderId,
        at: Millis,
    },
    /// A fresh row entered the list, either at start or replacing a placeholder
    RowInserted {
        row: RowId,
        tier: Tier,
        placeholder: Option<PlaceholderId>,
        /// False when the placeholder had already been evicted and the row was prepended
        in_place: bool,
        at: Millis,
    },
    ItemEvicted { item: FeedItem, at: Millis },
}

impl FeedEvent {
    pub fn at(&self) -> Millis {
        match self {
            FeedEvent::RowAdvanced { at, .. }
            | FeedEvent::RowReset { at, .. }
            | FeedEvent::RowCompleted { at, .. }
            | FeedEvent::PlaceholderInserted { at, .. }
            | FeedEvent::RowInserted { at, .. }
            | FeedEvent::ItemEvicted { at, .. } => *at,
        }
    }
}

/// Display state of one slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedItemView {
    Agent(RowView),
    Placeholder { id: PlaceholderId },
}

/// Ordered display state of the whole feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub at: Millis,
    pub capacity: usize,
    pub items: Vec<FeedItemView>,
}

impl FeedSnapshot {
    pub fn rows(&self) -> impl Iterator<Item = &RowView> {
        self.items.iter().filter_map(|item| match item {
            FeedItemView::Agent(view) => Some(view),
            FeedItemView::Placeholder { .. } => None,
        })
    }
}

/// Replacement row waiting for its placeholder delay to elapse
#[derive(Debug, Clone, Copy)]
struct PendingRow {
    id: RowId,
    tier: Tier,
}

/// Continuously refreshing feed of simulated agent rows
///
/// Time only moves when the caller polls, which makes the whole feed
/// reproducible for a given seed.
pub struct FeedEngine {
    config: FeedConfig,
    delay: DelayRange,
    rng: Box<dyn RandomSource>,
    scheduler: Scheduler,
    rows: HashMap<RowId, AgentRow>,
    list: FeedList,
    pending: HashMap<PlaceholderId, PendingRow>,
    prices: PriceBook,
    tally: OutcomeTally,
    next_row_id: u64,
    next_placeholder_id: u64,
    now: Millis,
    started: bool,
}

impl FeedEngine {
    /// Engine seeded from `config.seed` (entropy when unset)
    pub fn new(config: FeedConfig) -> Self {
        let rng = SeededRandom::from_optional_seed(config.seed);
        Self::with_random(config, Box::new(rng))
    }

    /// Engine drawing from a caller-supplied random source
    pub fn with_random(config: FeedConfig, rng: Box<dyn RandomSource>) -> Self {
        let delay = DelayRange::from_config(&config);
        let list = FeedList::new(config.row_cap);
        Self {
            config,
            delay,
            rng,
            scheduler: Scheduler::new(),
            rows: HashMap::new(),
            list,
            pending: HashMap::new(),
            prices: PriceBook::new(),
            tally: OutcomeTally::new(),
            next_row_id: 1,
            next_placeholder_id: 1,
            now: 0,
            started: false,
        }
    }

    /// Fill the list with fresh rows at Analyzing
    ///
    /// Calling it again is a no-op.
    pub fn start(&mut self, now: Millis) -> Vec<FeedEvent> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        self.now = now;

        let mut events = Vec::with_capacity(self.list.capacity());
        while !self.list.is_full() {
            let tier = self.config.tier_weights.pick(self.rng.as_mut());
            let id = self.allocate_row_id();
            self.spawn_row(id, tier, now);
            self.list.push_back(FeedItem::Row(id));
            events.push(FeedEvent::RowInserted {
                row: id,
                tier,
                placeholder: None,
                in_place: true,
                at: now,
            });
        }

        tracing::info!(rows = self.list.len(), "Feed started");
        events
    }

    /// Process every event due at or before `now`
    ///
    /// Time never moves backwards; an earlier `now` is treated as the
    /// current time.
    pub fn poll(&mut self, now: Millis) -> Vec<FeedEvent> {
        self.now = self.now.max(now);
        let now = self.now;

        let mut events = Vec::new();
        while let Some((_, event)) = self.scheduler.pop_due(now) {
            match event {
                ScheduledEvent::RowDue(id) => self.advance_row(id, now, &mut events),
                ScheduledEvent::ReplacementDue(placeholder) => {
                    self.swap_in_replacement(placeholder, now, &mut events)
                }
            }
        }
        events
    }

    /// Poll on every tick boundary up to and including `end`
    pub fn run_until(&mut self, end: Millis) -> Vec<FeedEvent> {
        let mut events = if self.started {
            Vec::new()
        } else {
            self.start(self.now)
        };

        let step = self.config.tick_interval_ms.max(1);
        let mut next = (self.now / step).checked_add(1).and_then(|n| n.checked_mul(step));
        while let Some(t) = next.filter(|t| *t <= end) {
            events.extend(self.poll(t));
            next = t.checked_add(step);
        }
        events
    }

    fn allocate_row_id(&mut self) -> RowId {
        let id = RowId(self.next_row_id);
        self.next_row_id += 1;
        id
    }

    fn spawn_row(&mut self, id: RowId, tier: Tier, now: Millis) {
        let row = AgentRow::new(id, tier, now, self.delay, self.rng.as_mut());
        self.schedule_row(id, row.next_step_at(), now);
        self.rows.insert(id, row);
    }

    fn schedule_row(&mut self, id: RowId, next_step_at: Millis, now: Millis) {
        // A zero delay must still land on a later poll
        let fire_at = next_step_at.max(now.saturating_add(1));
        self.scheduler.schedule(fire_at, ScheduledEvent::RowDue(id));
    }

    fn advance_row(&mut self, id: RowId, now: Millis, events: &mut Vec<FeedEvent>) {
        // Evicted rows leave a stale event behind
        let Some(row) = self.rows.get_mut(&id) else {
            return;
        };

        let ctx = StepContext {
            odds: &self.config.odds,
            delay: self.delay,
            prices: &self.prices,
        };
        let step = row.tick(now, self.rng.as_mut(), &ctx);
        let next_step_at = row.next_step_at();
        let summary = row.completion();

        match step {
            Step::Waiting => self.schedule_row(id, next_step_at, now),
            Step::Advanced { from, to } => {
                self.schedule_row(id, next_step_at, now);
                events.push(FeedEvent::RowAdvanced {
                    row: id,
                    from,
                    to,
                    at: now,
                });
            }
            Step::Reset => {
                self.tally.record_skip();
                self.schedule_row(id, next_step_at, now);
                events.push(FeedEvent::RowReset { row: id, at: now });
            }
            Step::Completed => {
                if let Some(summary) = summary {
                    self.tally.record_completion(&summary);
                    tracing::debug!(
                        row = %id,
                        outcome = ?summary.outcome,
                        profit_pct = summary.profit_pct,
                        volume_usd = summary.summary_volume_usd,
                        "Row completed"
                    );
                    events.push(FeedEvent::RowCompleted {
                        row: id,
                        summary,
                        at: now,
                    });
                }
                self.insert_placeholder(now, events);
            }
            Step::Frozen => {}
        }
    }

    /// Prepend a placeholder and schedule its replacement row
    fn insert_placeholder(&mut self, now: Millis, events: &mut Vec<FeedEvent>) {
        let tier = self.config.tier_weights.pick(self.rng.as_mut());
        let row = self.allocate_row_id();
        let placeholder = PlaceholderId(self.next_placeholder_id);
        self.next_placeholder_id += 1;

        self.pending.insert(placeholder, PendingRow { id: row, tier });
        let evicted = self.list.prepend(FeedItem::Placeholder(placeholder));
        events.push(FeedEvent::PlaceholderInserted {
            placeholder,
            at: now,
        });
        self.drop_evicted(evicted, now, events);

        self.scheduler.schedule(
            now.saturating_add(self.config.replacement_delay_ms),
            ScheduledEvent::ReplacementDue(placeholder),
        );
    }

    fn swap_in_replacement(&mut self, placeholder: PlaceholderId, now: Millis, events: &mut Vec<FeedEvent>) {
        let Some(pending) = self.pending.remove(&placeholder) else {
            return;
        };

        self.spawn_row(pending.id, pending.tier, now);
        let item = FeedItem::Row(pending.id);
        let in_place = self.list.replace_placeholder(placeholder, item);
        let evicted = if in_place {
            Vec::new()
        } else {
            self.list.prepend(item)
        };

        tracing::debug!(row = %pending.id, %placeholder, in_place, "Replacement row inserted");
        events.push(FeedEvent::RowInserted {
            row: pending.id,
            tier: pending.tier,
            placeholder: Some(placeholder),
            in_place,
            at: now,
        });
        self.drop_evicted(evicted, now, events);
    }

    fn drop_evicted(&mut self, evicted: Vec<FeedItem>, now: Millis, events: &mut Vec<FeedEvent>) {
        for item in evicted {
            if let FeedItem::Row(id) = item {
                self.rows.remove(&id);
            }
            events.push(FeedEvent::ItemEvicted { item, at: now });
        }
    }

    /// Replace the price book consulted when rows complete
    pub fn set_prices(&mut self, prices: PriceBook) {
        self.prices = prices;
    }

    pub fn prices(&self) -> &PriceBook {
        &self.prices
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let items = self
            .list
            .items()
            .iter()
            .filter_map(|item| match item {
                FeedItem::Row(id) => self.rows.get(id).map(|row| FeedItemView::Agent(row.view())),
                FeedItem::Placeholder(id) => Some(FeedItemView::Placeholder { id: *id }),
            })
            .collect();
        FeedSnapshot {
            at: self.now,
            capacity: self.list.capacity(),
            items,
        }
    }

    pub fn list(&self) -> &FeedList {
        &self.list
    }

    pub fn row(&self, id: RowId) -> Option<&AgentRow> {
        self.rows.get(&id)
    }

    pub fn tally(&self) -> &OutcomeTally {
        &self.tally
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Placeholders still waiting for their replacement row
    pub fn pending_replacements(&self) -> usize {
        self.pending.len()
    }
}
