//! Phase simulator
//!
//! Advances one feed row through its phase sequence:
//! - Each transition waits a fresh random delay (250-900ms by default)
//! - Validating branches to Skipping (rare detour, never twice in a row) or
//!   straight to Entering
//! - Skipping resets the row to Analyzing with all market fields cleared
//! - Completed freezes the row and reports completion exactly once
//!
//! Nothing here is derived from real market data; every figure is drawn from
//! the injected [`RandomSource`]. The only outside input is the optional
//! closing price looked up in a [`PriceBook`], which is display-only.

mod phase;

pub use phase::Phase;

use crate::config::{FeedConfig, SimulationOdds};
use crate::display::{format_price, format_usd_k, outcome_banner, pct_label, pnl_label, pnl_usd};
use crate::market::{PriceBook, Symbol, Tier};
use crate::rng::RandomSource;
use crate::scheduler::Millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a simulated row, unique for the lifetime of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Buying,
    Selling,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Buying => "Buying",
            Direction::Selling => "Selling",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Neutral,
    Loss,
}

/// Inclusive bounds of the random delay between transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: Millis,
    pub max_ms: Millis,
}

impl DelayRange {
    pub fn new(min_ms: Millis, max_ms: Millis) -> Self {
        Self {
            min_ms,
            max_ms: max_ms.max(min_ms),
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.step_delay_min_ms, config.step_delay_max_ms)
    }

    pub fn draw(&self, rng: &mut dyn RandomSource) -> Millis {
        let min = i64::try_from(self.min_ms).unwrap_or(i64::MAX);
        let max = i64::try_from(self.max_ms).unwrap_or(i64::MAX);
        rng.int_inclusive(min, max).max(0) as Millis
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::new(250, 900)
    }
}

/// Read-only inputs a tick needs besides the random source
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub odds: &'a SimulationOdds,
    pub delay: DelayRange,
    pub prices: &'a PriceBook,
}

/// What a single tick did to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Scheduled transition time not reached yet
    Waiting,
    /// Moved to the next phase
    Advanced { from: Phase, to: Phase },
    /// Skipping finished; row is back at Analyzing
    Reset,
    /// First tick after reaching Completed; the owner must replace the row
    Completed,
    /// Already reported completion, nothing left to do
    Frozen,
}

/// Final figures of a completed cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub outcome: Outcome,
    pub profit_pct: i32,
    pub summary_volume_usd: u32,
    /// `summary_volume_usd × profit_pct / 100`
    pub pnl_usd: f64,
    pub closing_price: Option<f64>,
}

/// One animated feed entry
#[derive(Debug, Clone)]
pub struct AgentRow {
    id: RowId,
    tier: Tier,
    phase: Phase,
    detail: String,
    symbol: Option<Symbol>,
    direction: Option<Direction>,
    volume_usd: Option<u32>,
    outcome: Option<Outcome>,
    profit_pct: Option<i32>,
    summary_volume_usd: Option<u32>,
    closing_price: Option<f64>,
    skipped_last_cycle: bool,
    next_step_at: Millis,
    completion_reported: bool,
}

impl AgentRow {
    /// Create a row at Analyzing with its first transition scheduled
    pub fn new(id: RowId, tier: Tier, now: Millis, delay: DelayRange, rng: &mut dyn RandomSource) -> Self {
        Self {
            id,
            tier,
            phase: Phase::Analyzing,
            detail: String::new(),
            symbol: None,
            direction: None,
            volume_usd: None,
            outcome: None,
            profit_pct: None,
            summary_volume_usd: None,
            closing_price: None,
            skipped_last_cycle: false,
            next_step_at: now.saturating_add(delay.draw(rng)),
            completion_reported: false,
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn symbol(&self) -> Option<Symbol> {
        self.symbol
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn volume_usd(&self) -> Option<u32> {
        self.volume_usd
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn profit_pct(&self) -> Option<i32> {
        self.profit_pct
    }

    pub fn summary_volume_usd(&self) -> Option<u32> {
        self.summary_volume_usd
    }

    pub fn closing_price(&self) -> Option<f64> {
        self.closing_price
    }

    /// Whether the previous cycle ended in Skipping
    pub fn skipped_last_cycle(&self) -> bool {
        self.skipped_last_cycle
    }

    pub fn next_step_at(&self) -> Millis {
        self.next_step_at
    }

    pub fn completion_reported(&self) -> bool {
        self.completion_reported
    }

    /// Final figures, once the row is Completed
    pub fn completion(&self) -> Option<CompletionSummary> {
        if self.phase != Phase::Completed {
            return None;
        }
        let outcome = self.outcome?;
        let profit_pct = self.profit_pct?;
        let summary_volume_usd = self.summary_volume_usd?;
        Some(CompletionSummary {
            outcome,
            profit_pct,
            summary_volume_usd,
            pnl_usd: pnl_usd(summary_volume_usd, profit_pct),
            closing_price: self.closing_price,
        })
    }

    /// Advance the row if its scheduled transition time has passed
    pub fn tick(&mut self, now: Millis, rng: &mut dyn RandomSource, ctx: &StepContext<'_>) -> Step {
        if now < self.next_step_at {
            return Step::Waiting;
        }

        if self.phase.is_terminal() {
            if self.completion_reported {
                return Step::Frozen;
            }
            self.completion_reported = true;
            return Step::Completed;
        }
        if self.phase == Phase::Skipping {
            self.reset(now, ctx.delay, rng);
            return Step::Reset;
        }

        let from = self.phase;
        let to = match from {
            Phase::Validating => {
                let will_skip = !self.skipped_last_cycle && rng.chance(ctx.odds.skip_chance);
                if will_skip {
                    Phase::Skipping
                } else {
                    Phase::Entering
                }
            }
            other => other.successor().unwrap_or(Phase::Completed),
        };

        self.enter(to, rng, ctx);
        self.phase = to;
        self.next_step_at = now.saturating_add(ctx.delay.draw(rng));

        tracing::trace!(row = %self.id, from = %from, to = %to, "Row advanced");
        Step::Advanced { from, to }
    }

    /// Populate the display fields of the phase being entered
    fn enter(&mut self, phase: Phase, rng: &mut dyn RandomSource, ctx: &StepContext<'_>) {
        match phase {
            Phase::Snapshot => {
                if self.symbol.is_none() {
                    self.symbol = Some(Symbol::pick(rng));
                }
            }
            Phase::Skipping => {
                self.detail = "opportunity filtered".to_string();
            }
            Phase::Entering => {
                let direction = if rng.chance(ctx.odds.buy_chance) {
                    Direction::Buying
                } else {
                    Direction::Selling
                };
                let symbol = match self.symbol {
                    Some(symbol) => symbol,
                    None => {
                        let symbol = Symbol::pick(rng);
                        self.symbol = Some(symbol);
                        symbol
                    }
                };
                let volume = rng.int_inclusive(1_000, 25_000) as u32;
                self.direction = Some(direction);
                self.volume_usd = Some(volume);
                self.detail = format!(
                    "{} {} · Vol {}",
                    direction.label(),
                    symbol.market_pair(),
                    format_usd_k(volume)
                );
                self.skipped_last_cycle = false;
            }
            Phase::Viability => {
                self.detail = format!("{}%", rng.int_inclusive(75, 90));
            }
            Phase::Outcome => {
                self.detail = format!("{}%", rng.int_inclusive(2, 15));
            }
            Phase::Analysis => {
                let positive = rng.chance(ctx.odds.analysis_positive_chance);
                let magnitude = rng.int_inclusive(1, 15) as i32;
                let signed = if positive { magnitude } else { -magnitude };
                self.detail = pct_label(signed);
            }
            Phase::Completed => {
                let r = rng.unit();
                let (outcome, pct) = if r < ctx.odds.win_chance {
                    (Outcome::Win, rng.int_inclusive(1, 15) as i32)
                } else if r < ctx.odds.win_chance + ctx.odds.neutral_chance {
                    (Outcome::Neutral, 0)
                } else {
                    (Outcome::Loss, -(rng.int_inclusive(1, 12) as i32))
                };
                self.outcome = Some(outcome);
                self.profit_pct = Some(pct);
                self.summary_volume_usd = Some(
                    self.volume_usd
                        .unwrap_or_else(|| rng.int_inclusive(1_000, 50_000) as u32),
                );
                self.closing_price = self.symbol.and_then(|s| ctx.prices.get(s));
            }
            Phase::Analyzing | Phase::Opportunity | Phase::Validating | Phase::Closing => {}
        }
    }

    /// Back to Analyzing with market and outcome fields cleared
    fn reset(&mut self, now: Millis, delay: DelayRange, rng: &mut dyn RandomSource) {
        self.phase = Phase::Analyzing;
        self.detail.clear();
        self.symbol = None;
        self.direction = None;
        self.volume_usd = None;
        self.outcome = None;
        self.profit_pct = None;
        self.summary_volume_usd = None;
        self.closing_price = None;
        self.skipped_last_cycle = true;
        self.next_step_at = now.saturating_add(delay.draw(rng));
        tracing::trace!(row = %self.id, "Row reset after skip");
    }

    /// Serializable display view
    pub fn view(&self) -> RowView {
        let info = self.tier.info();
        RowView {
            id: self.id,
            display_id: format!("{}-{}", self.tier.code(), self.id.0),
            tier: self.tier,
            persona: info.persona,
            tagline: info.tagline,
            phase: self.phase,
            phase_label: self.phase.label(),
            state_key: self.phase.state_key(),
            detail: self.detail.clone(),
            market_pair: self.symbol.map(|s| s.market_pair()),
            direction: self.direction,
            volume_usd: self.volume_usd,
            outcome: self.outcome,
            banner: self.outcome.map(outcome_banner),
            pct_label: self.profit_pct.map(pct_label),
            pnl_label: pnl_label(self.summary_volume_usd, self.profit_pct),
            closing_price: self.closing_price.map(format_price),
            progress_percent: self.phase.progress_percent(),
        }
    }
}

/// Market column text before a symbol is chosen
pub const AWAITING_MARKET: &str = "Awaiting Market";

/// Flattened, display-ready state of a row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub id: RowId,
    pub display_id: String,
    pub tier: Tier,
    pub persona: &'static str,
    pub tagline: &'static str,
    pub phase: Phase,
    pub phase_label: &'static str,
    pub state_key: &'static str,
    pub detail: String,
    pub market_pair: Option<String>,
    pub direction: Option<Direction>,
    pub volume_usd: Option<u32>,
    pub outcome: Option<Outcome>,
    pub banner: Option<&'static str>,
    pub pct_label: Option<String>,
    pub pnl_label: String,
    pub closing_price: Option<String>,
    pub progress_percent: u8,
}

impl RowView {
    /// Single terminal line for the CLI
    pub fn render_line(&self) -> String {
        let status = match (self.banner, &self.pct_label) {
            (Some(banner), Some(pct)) => format!("{} {} {}", banner, pct, self.pnl_label),
            _ => self.detail.clone(),
        };
        format!(
            "{:<10} {:<8} {:<24} {:>3}% {:<15} {}",
            self.display_id,
            self.persona,
            self.phase_label,
            self.progress_percent,
            self.market_pair.as_deref().unwrap_or(AWAITING_MARKET),
            status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedRandom, SeededRandom};

    const FIXED: DelayRange = DelayRange {
        min_ms: 300,
        max_ms: 300,
    };

    fn ctx<'a>(odds: &'a SimulationOdds, prices: &'a PriceBook) -> StepContext<'a> {
        StepContext {
            odds,
            delay: FIXED,
            prices,
        }
    }

    /// Tick at the row's own due time until it reaches `target`
    fn drive_to(
        row: &mut AgentRow,
        target: Phase,
        rng: &mut dyn RandomSource,
        ctx: &StepContext<'_>,
    ) -> Millis {
        let mut now = row.next_step_at();
        for _ in 0..64 {
            if row.phase() == target {
                return now;
            }
            now = row.next_step_at();
            row.tick(now, rng, ctx);
        }
        panic!("row never reached {target:?}, stuck at {:?}", row.phase());
    }

    #[test]
    fn test_new_row_starts_analyzing() {
        let mut rng = SeededRandom::from_seed(1);
        let row = AgentRow::new(RowId(1), Tier::Nova, 1_000, DelayRange::default(), &mut rng);
        assert_eq!(row.phase(), Phase::Analyzing);
        assert!((1_250..=1_900).contains(&row.next_step_at()));
        assert!(row.symbol().is_none());
        assert!(row.completion().is_none());
    }

    #[test]
    fn test_huge_delay_does_not_wrap() {
        let mut rng = SeededRandom::from_seed(3);
        let delay = DelayRange::new(250, u64::MAX);
        for _ in 0..100 {
            assert!(delay.draw(&mut rng) >= 250);
        }

        let pinned = DelayRange::new(u64::MAX, u64::MAX);
        assert_eq!(pinned.draw(&mut rng), i64::MAX as Millis);

        let row = AgentRow::new(RowId(1), Tier::Nova, Millis::MAX - 10, DelayRange::new(100, 100), &mut rng);
        assert_eq!(row.next_step_at(), Millis::MAX);
    }

    #[test]
    fn test_render_line_market_column() {
        let odds = SimulationOdds::default();
        let mut prices = PriceBook::new();
        prices.insert(Symbol::Btc, 64_250.5);
        let ctx = ctx(&odds, &prices);
        let mut rng = ScriptedRandom::new(12)
            .push_int(0, 6, 1) // BTC
            .push_unit(0.9) // no skip
            .push_unit(0.1) // buying
            .push_int(1_000, 25_000, 12_500)
            .push_unit(0.1) // positive analysis
            .push_int(1, 15, 3)
            .push_unit(0.1) // win
            .push_int(1, 15, 1);
        let mut row = AgentRow::new(RowId(5), Tier::Vega, 0, FIXED, &mut rng);

        let line = row.view().render_line();
        assert!(line.starts_with("VEGA-5"));
        assert!(line.contains(AWAITING_MARKET));

        drive_to(&mut row, Phase::Completed, &mut rng, &ctx);
        let view = row.view();
        assert_eq!(view.closing_price.as_deref(), Some("$64250.5"));
        let line = view.render_line();
        assert!(line.contains("BTC/USDT"));
        assert!(line.ends_with("PROFIT +1% +$0.13K"));
    }

    #[test]
    fn test_waits_until_due() {
        let odds = SimulationOdds::default();
        let prices = PriceBook::new();
        let ctx = ctx(&odds, &prices);
        let mut rng = SeededRandom::from_seed(2);
        let mut row = AgentRow::new(RowId(1), Tier::Vega, 0, FIXED, &mut rng);

        assert_eq!(row.tick(100, &mut rng, &ctx), Step::Waiting);
        assert_eq!(row.tick(299, &mut rng, &ctx), Step::Waiting);
        assert_eq!(
            row.tick(300, &mut rng, &ctx),
            Step::Advanced {
                from: Phase::Analyzing,
                to: Phase::Snapshot
            }
        );
        assert!(row.symbol().is_some());
        assert_eq!(row.next_step_at(), 600);
    }

    #[test]
    fn test_skip_branch_resets_row() {
        let odds = SimulationOdds::default();
        let prices = PriceBook::new();
        let ctx = ctx(&odds, &prices);
        // 0.1 < 0.25 skip chance
        let mut rng = ScriptedRandom::new(3).push_unit(0.1);
        let mut row = AgentRow::new(RowId(1), Tier::Orion, 0, FIXED, &mut rng);

        let now = drive_to(&mut row, Phase::Validating, &mut rng, &ctx);
        assert!(row.symbol().is_some());

        let step = row.tick(now + 300, &mut rng, &ctx);
        assert_eq!(
            step,
            Step::Advanced {
                from: Phase::Validating,
                to: Phase::Skipping
            }
        );
        assert_eq!(row.detail(), "opportunity filtered");

        let step = row.tick(row.next_step_at(), &mut rng, &ctx);
        assert_eq!(step, Step::Reset);
        assert_eq!(row.phase(), Phase::Analyzing);
        assert!(row.symbol().is_none());
        assert!(row.direction().is_none());
        assert!(row.volume_usd().is_none());
        assert!(row.outcome().is_none());
        assert!(row.detail().is_empty());
        assert!(row.skipped_last_cycle());
    }

    #[test]
    fn test_no_skip_twice_in_a_row() {
        let odds = SimulationOdds {
            skip_chance: 1.0,
            ..Default::default()
        };
        let prices = PriceBook::new();
        let ctx = ctx(&odds, &prices);
        let mut rng = SeededRandom::from_seed(4);
        let mut row = AgentRow::new(RowId(1), Tier::Prime, 0, FIXED, &mut rng);

        drive_to(&mut row, Phase::Skipping, &mut rng, &ctx);
        row.tick(row.next_step_at(), &mut rng, &ctx);
        assert!(row.skipped_last_cycle());

        drive_to(&mut row, Phase::Validating, &mut rng, &ctx);
        let step = row.tick(row.next_step_at(), &mut rng, &ctx);
        assert_eq!(
            step,
            Step::Advanced {
                from: Phase::Validating,
                to: Phase::Entering
            }
        );
        // Entering clears the flag, so the next cycle may skip again
        assert!(!row.skipped_last_cycle());
    }

    #[test]
    fn test_entering_populates_trade_fields() {
        let odds = SimulationOdds::default();
        let prices = PriceBook::new();
        let ctx = ctx(&odds, &prices);
        let mut rng = ScriptedRandom::new(5)
            .push_int(0, 6, 1) // BTC at Snapshot
            .push_unit(0.9) // no skip
            .push_unit(0.2) // buying
            .push_int(1_000, 25_000, 12_345);
        let mut row = AgentRow::new(RowId(7), Tier::Nova, 0, FIXED, &mut rng);

        drive_to(&mut row, Phase::Entering, &mut rng, &ctx);
        assert_eq!(row.symbol(), Some(Symbol::Btc));
        assert_eq!(row.direction(), Some(Direction::Buying));
        assert_eq!(row.volume_usd(), Some(12_345));
        assert_eq!(row.detail(), "Buying BTC/USDT · Vol $12.3K");
    }

    #[test]
    fn test_phase_details() {
        let odds = SimulationOdds::default();
        let prices = PriceBook::new();
        let ctx = ctx(&odds, &prices);
        let mut rng = ScriptedRandom::new(6)
            .push_unit(0.9) // no skip
            .push_unit(0.9) // selling
            .push_int(75, 90, 82)
            .push_int(2, 15, 7)
            .push_unit(0.7) // negative analysis (>= 0.6)
            .push_int(1, 15, 4);
        let mut row = AgentRow::new(RowId(2), Tier::Vega, 0, FIXED, &mut rng);

        drive_to(&mut row, Phase::Viability, &mut rng, &ctx);
        assert_eq!(row.direction(), Some(Direction::Selling));
        assert_eq!(row.detail(), "82%");
        drive_to(&mut row, Phase::Outcome, &mut rng, &ctx);
        assert_eq!(row.detail(), "7%");
        drive_to(&mut row, Phase::Analysis, &mut rng, &ctx);
        assert_eq!(row.detail(), "-4%");
    }

    #[test]
    fn test_completed_win_scenario() {
        let odds = SimulationOdds::default();
        let mut prices = PriceBook::new();
        prices.insert(Symbol::Sol, 150.25);
        let ctx = ctx(&odds, &prices);
        let mut rng = ScriptedRandom::new(7)
            .push_int(0, 6, 3) // SOL
            .push_unit(0.9) // no skip
            .push_unit(0.1) // buying
            .push_int(1_000, 25_000, 2_000)
            .push_unit(0.1) // positive analysis
            .push_int(1, 15, 5)
            .push_unit(0.3) // win
            .push_int(1, 15, 10);
        let mut row = AgentRow::new(RowId(3), Tier::Orion, 0, FIXED, &mut rng);

        drive_to(&mut row, Phase::Completed, &mut rng, &ctx);
        let summary = row.completion().expect("completed");
        assert_eq!(summary.outcome, Outcome::Win);
        assert_eq!(summary.profit_pct, 10);
        assert_eq!(summary.summary_volume_usd, 2_000);
        assert_eq!(summary.pnl_usd, 200.0);
        assert_eq!(summary.closing_price, Some(150.25));

        let view = row.view();
        assert_eq!(view.pnl_label, "+$0.20K");
        assert_eq!(view.pct_label.as_deref(), Some("+10%"));
        assert_eq!(view.banner, Some("PROFIT"));
        assert_eq!(view.progress_percent, 100);
    }

    #[test]
    fn test_completion_reported_once() {
        let odds = SimulationOdds::default();
        let prices = PriceBook::new();
        let ctx = ctx(&odds, &prices);
        let mut rng = SeededRandom::from_seed(8);
        let mut row = AgentRow::new(RowId(4), Tier::Nova, 0, FIXED, &mut rng);

        let mut now = 0;
        let mut completions = 0;
        for _ in 0..200 {
            now += 300;
            if row.tick(now, &mut rng, &ctx) == Step::Completed {
                completions += 1;
            }
        }
        assert_eq!(row.phase(), Phase::Completed);
        assert_eq!(completions, 1);
        assert!(row.completion_reported());
        assert_eq!(row.tick(now + 10_000, &mut rng, &ctx), Step::Frozen);
    }

    #[test]
    fn test_outcome_bands_and_missing_price() {
        let odds = SimulationOdds::default();
        let prices = PriceBook::new();
        let ctx = ctx(&odds, &prices);
        let mut rng = SeededRandom::from_seed(9);

        for n in 0..300 {
            let mut row = AgentRow::new(RowId(n), Tier::Nova, 0, FIXED, &mut rng);
            drive_to(&mut row, Phase::Completed, &mut rng, &ctx);
            let summary = row.completion().unwrap();
            match summary.outcome {
                Outcome::Win => assert!((1..=15).contains(&summary.profit_pct)),
                Outcome::Neutral => assert_eq!(summary.profit_pct, 0),
                Outcome::Loss => assert!((-12..=-1).contains(&summary.profit_pct)),
            }
            assert_eq!(
                summary.pnl_usd,
                summary.summary_volume_usd as f64 * summary.profit_pct as f64 / 100.0
            );
            // Rows that went through Entering keep their entering volume
            assert_eq!(Some(summary.summary_volume_usd), row.volume_usd());
            assert!(summary.closing_price.is_none());
        }
    }
}
