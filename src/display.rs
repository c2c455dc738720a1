//! Display formatting for feed rows
//!
//! The PnL shown for a completed row is cosmetic: `volume × pct / 100`,
//! rendered in thousands of USD.

use crate::simulator::Outcome;

/// Compact USD volume, e.g. `$12K` or `$12.3K`
///
/// Whole thousands drop the decimal; otherwise one decimal, ties rounded up.
pub fn format_usd_k(volume_usd: u32) -> String {
    if volume_usd % 1000 == 0 {
        return format!("${}K", volume_usd / 1000);
    }
    let hundreds = (volume_usd as u64 + 50) / 100;
    format!("${}.{}K", hundreds / 10, hundreds % 10)
}

/// Signed percent label: `+10%`, `-4%`, `0%`
pub fn pct_label(pct: i32) -> String {
    match pct.signum() {
        1 => format!("+{}%", pct),
        -1 => format!("-{}%", pct.unsigned_abs()),
        _ => "0%".to_string(),
    }
}

/// Profit amount in USD for a summary volume and percent
pub fn pnl_usd(volume_usd: u32, pct: i32) -> f64 {
    volume_usd as f64 * pct as f64 / 100.0
}

/// PnL label in thousands, e.g. `+$0.20K`
///
/// Missing inputs render as `$0.00K`. Ties round away from zero.
pub fn pnl_label(volume_usd: Option<u32>, pct: Option<i32>) -> String {
    let (Some(volume), Some(pct)) = (volume_usd, pct) else {
        return "$0.00K".to_string();
    };
    // volume × pct is in cents; hundredths of a K are tens of dollars
    let cents = volume as i64 * pct as i64;
    let sign = match cents.signum() {
        1 => "+",
        -1 => "-",
        _ => "",
    };
    let hundredths = (cents.unsigned_abs() + 500) / 1000;
    format!("{}${}.{:02}K", sign, hundredths / 100, hundredths % 100)
}

/// Banner text shown on a completed row
pub fn outcome_banner(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Win => "PROFIT",
        Outcome::Neutral => "NEUTRAL",
        Outcome::Loss => "LOSS",
    }
}

/// Closing price as reported by the source, no padding
pub fn format_price(price_usd: f64) -> String {
    format!("${}", price_usd)
}
