//! Named phases of one agent cycle

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the display track the progress bar is measured against
///
/// The track has one more slot than there are phases, so only Completed
/// fills the bar.
const TRACK_SLOTS: usize = 12;

/// One stage of the cosmetic agent cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Analyzing,
    Snapshot,
    Opportunity,
    Validating,
    Skipping,
    Entering,
    Viability,
    Outcome,
    Closing,
    Analysis,
    Completed,
}

impl Phase {
    /// Display order; Skipping sits between Validating and Entering but is
    /// only reached through the Validating branch
    pub const SEQUENCE: [Phase; 11] = [
        Phase::Analyzing,
        Phase::Snapshot,
        Phase::Opportunity,
        Phase::Validating,
        Phase::Skipping,
        Phase::Entering,
        Phase::Viability,
        Phase::Outcome,
        Phase::Closing,
        Phase::Analysis,
        Phase::Completed,
    ];

    pub fn index(self) -> usize {
        Self::SEQUENCE
            .iter()
            .position(|p| *p == self)
            .unwrap_or_default()
    }

    /// Next phase on the linear path
    ///
    /// Validating has no fixed successor (it branches) and Skipping loops back
    /// to the start; Completed is terminal.
    pub fn successor(self) -> Option<Phase> {
        match self {
            Phase::Analyzing => Some(Phase::Snapshot),
            Phase::Snapshot => Some(Phase::Opportunity),
            Phase::Opportunity => Some(Phase::Validating),
            Phase::Validating => None,
            Phase::Skipping => Some(Phase::Analyzing),
            Phase::Entering => Some(Phase::Viability),
            Phase::Viability => Some(Phase::Outcome),
            Phase::Outcome => Some(Phase::Closing),
            Phase::Closing => Some(Phase::Analysis),
            Phase::Analysis => Some(Phase::Completed),
            Phase::Completed => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Analyzing => "Analyzing Market",
            Phase::Snapshot => "Data Snapshot",
            Phase::Opportunity => "Identifying Opportunity",
            Phase::Validating => "Validating Opportunity",
            Phase::Skipping => "Skipping (not viable)",
            Phase::Entering => "Entering Market",
            Phase::Viability => "Viability",
            Phase::Outcome => "Expected Outcome",
            Phase::Closing => "Exiting Market",
            Phase::Analysis => "Profit analysis",
            Phase::Completed => "Mission completed",
        }
    }

    /// Short lowercase key for compact displays
    pub fn state_key(self) -> &'static str {
        match self {
            Phase::Analyzing => "analyzing",
            Phase::Snapshot => "snapshot",
            Phase::Opportunity => "opportunity",
            Phase::Validating => "validating",
            Phase::Skipping => "skipping",
            Phase::Entering => "entering",
            Phase::Viability => "viability",
            Phase::Outcome => "outcome",
            Phase::Closing => "closing",
            Phase::Analysis => "analysis",
            Phase::Completed => "completed",
        }
    }

    /// Progress bar fill, 0..=100
    pub fn progress_percent(self) -> u8 {
        if self == Phase::Completed {
            return 100;
        }
        let pct = (self.index() as f64 / (TRACK_SLOTS - 1) as f64 * 100.0).round();
        pct.min(100.0) as u8
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Completed
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
