//! Injectable random source
//!
//! Every random draw the feed makes (tiers, symbols, delays, branch decisions,
//! outcome bands) goes through [`RandomSource`], so a run can be reproduced
//! from a seed or individual branches can be forced with [`ScriptedRandom`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};

/// Source of uniform draws used by the simulator
pub trait RandomSource: Send {
    /// Uniform float in `[0, 1)`
    fn unit(&mut self) -> f64;

    /// Uniform integer in `[min, max]` (returns `min` when the range is empty)
    fn int_inclusive(&mut self, min: i64, max: i64) -> i64;

    /// Bernoulli trial with probability `p`
    ///
    /// Certain outcomes (`p <= 0` or `p >= 1`) do not consume a draw.
    fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.unit() < p
    }
}

/// `StdRng`-backed source, reproducible when built from a seed
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeded when `seed` is set, entropy otherwise
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn int_inclusive(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }
}

/// Source that replays queued draws before falling back to a seeded stream
///
/// Integer draws are queued per `(min, max)` range so a scripted value only
/// answers the draw it was meant for, regardless of how delay draws
/// interleave with it. Scripted integers are clamped into the requested range.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    units: VecDeque<f64>,
    ints: HashMap<(i64, i64), VecDeque<i64>>,
    fallback: SeededRandom,
}

impl ScriptedRandom {
    pub fn new(fallback_seed: u64) -> Self {
        Self {
            units: VecDeque::new(),
            ints: HashMap::new(),
            fallback: SeededRandom::from_seed(fallback_seed),
        }
    }

    /// Queue the next float draw
    pub fn push_unit(mut self, value: f64) -> Self {
        self.units.push_back(value);
        self
    }

    /// Queue the next integer draw for the range `[min, max]`
    pub fn push_int(mut self, min: i64, max: i64, value: i64) -> Self {
        self.ints.entry((min, max)).or_default().push_back(value);
        self
    }

    /// Draws still waiting in the queues
    pub fn pending(&self) -> usize {
        self.units.len() + self.ints.values().map(VecDeque::len).sum::<usize>()
    }
}

impl RandomSource for ScriptedRandom {
    fn unit(&mut self) -> f64 {
        match self.units.pop_front() {
            Some(value) => value,
            None => self.fallback.unit(),
        }
    }

    fn int_inclusive(&mut self, min: i64, max: i64) -> i64 {
        let scripted = self
            .ints
            .get_mut(&(min, max))
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(value) => value.clamp(min, max.max(min)),
            None => self.fallback.int_inclusive(min, max),
        }
    }
}
