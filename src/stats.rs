//! Running tally of simulated outcomes
//!
//! Purely cosmetic bookkeeping over the rows a feed has completed.

use crate::simulator::{CompletionSummary, Outcome};
use serde::{Deserialize, Serialize};

/// Outcome counts and cumulative cosmetic PnL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTally {
    /// Rows that reported completion
    pub completed: u32,
    pub wins: u32,
    pub neutrals: u32,
    pub losses: u32,
    /// Cycles that ended in Skipping
    pub skips: u32,
    /// Sum of summary volumes over completed rows
    pub total_volume_usd: f64,
    /// Sum of displayed PnL over completed rows
    pub cumulative_pnl_usd: f64,
    /// Wins over completed rows (0-1)
    pub win_rate: f64,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completion(&mut self, summary: &CompletionSummary) {
        self.completed += 1;
        match summary.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Neutral => self.neutrals += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.total_volume_usd += summary.summary_volume_usd as f64;
        self.cumulative_pnl_usd += summary.pnl_usd;
        self.recalculate();
    }

    pub fn record_skip(&mut self) {
        self.skips += 1;
    }

    fn recalculate(&mut self) {
        if self.completed > 0 {
            self.win_rate = self.wins as f64 / self.completed as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(outcome: Outcome, pct: i32, volume: u32) -> CompletionSummary {
        CompletionSummary {
            outcome,
            profit_pct: pct,
            summary_volume_usd: volume,
            pnl_usd: volume as f64 * pct as f64 / 100.0,
            closing_price: None,
        }
    }

    #[test]
    fn test_empty_tally() {
        let tally = OutcomeTally::new();
        assert_eq!(tally.completed, 0);
        assert_eq!(tally.win_rate, 0.0);
    }

    #[test]
    fn test_record_completions() {
        let mut tally = OutcomeTally::new();
        tally.record_completion(&summary(Outcome::Win, 10, 2_000));
        tally.record_completion(&summary(Outcome::Neutral, 0, 5_000));
        tally.record_completion(&summary(Outcome::Loss, -5, 4_000));
        tally.record_completion(&summary(Outcome::Win, 2, 10_000));
        tally.record_skip();

        assert_eq!(tally.completed, 4);
        assert_eq!(tally.wins, 2);
        assert_eq!(tally.neutrals, 1);
        assert_eq!(tally.losses, 1);
        assert_eq!(tally.skips, 1);
        assert_eq!(tally.total_volume_usd, 21_000.0);
        assert!((tally.cumulative_pnl_usd - 200.0).abs() < 1e-9);
        assert!((tally.win_rate - 0.5).abs() < 1e-9);
    }
}
