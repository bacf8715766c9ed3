//! Clock domain crossing primitives.
//!
//! A value produced in one domain is held in a [`CrossingReg`] and only observed by another domain through a
//! [`Synchronizer`] clocked by the observing domain. Sampling a register that changed too close to the sampling
//! edge resolves each toggling bit independently (see [`Metastability`]). Multi-bit values must therefore be Gray
//! coded before they cross, so that the resolved value is always either the old or the new one.

use arrayvec::ArrayVec;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use static_assertions::const_assert;

use crate::*;

/// Minimum number of synchronizer flops.
pub const MIN_SYNC_STAGES: usize = 2;

/// Maximum number of synchronizer flops.
pub const MAX_SYNC_STAGES: usize = 4;

const_assert!(MIN_SYNC_STAGES >= 2);
const_assert!(MIN_SYNC_STAGES <= MAX_SYNC_STAGES);

/// Converts binary to Gray code.
pub const fn gray_encode(value: u64) -> u64 { value ^ (value >> 1) }

/// Converts Gray code to binary.
pub const fn gray_decode(gray: u64) -> u64 {
    let mut value = gray;
    let mut shift = 1;
    while shift < u64::BITS {
        value ^= value >> shift;
        shift <<= 1;
    }
    value
}

fn check_stages(stages: usize) -> Result<(), ConfigError> {
    if (MIN_SYNC_STAGES..=MAX_SYNC_STAGES).contains(&stages) {
        Ok(())
    } else {
        Err(ConfigError::SyncStages { stages, min: MIN_SYNC_STAGES, max: MAX_SYNC_STAGES })
    }
}

/// Sampling model of a flop whose input is driven from another clock domain.
///
/// If the input changed less than `window_ps` before the sampling edge, each bit that toggled resolves randomly to
/// its old or new value. A zero window models ideal sampling.
#[derive(Debug, Clone)]
pub struct Metastability {
    window_ps: u64,
    rng: StdRng,
}

impl Metastability {
    /// Creates a model with the given window, resolving bits from a seeded generator.
    pub fn new(window_ps: u64, seed: u64) -> Self { Self { window_ps, rng: StdRng::seed_from_u64(seed) } }

    /// Ideal sampling.
    pub fn ideal() -> Self { Self::new(0, 0) }

    /// Returns the window.
    pub fn window_ps(&self) -> u64 { self.window_ps }

    /// Checks that the window is shorter than the period of a sampling clock.
    pub fn validate(&self, period_ps: u64) -> Result<(), ConfigError> {
        if self.window_ps >= period_ps {
            return Err(ConfigError::MetastabilityWindow { window_ps: self.window_ps, period_ps });
        }
        Ok(())
    }

    /// Resolves a sample of a register that went from `previous` to `current` at `changed_ps`.
    pub fn resolve(&mut self, previous: u64, current: u64, changed_ps: Option<u64>, now_ps: u64) -> u64 {
        match changed_ps {
            Some(changed) if self.window_ps > 0 && now_ps >= changed && now_ps - changed < self.window_ps => {
                let toggled = previous ^ current;
                previous ^ (toggled & self.rng.gen::<u64>())
            }
            _ => current,
        }
    }
}

impl Default for Metastability {
    fn default() -> Self { Self::ideal() }
}

/// Register whose output crosses into another clock domain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrossingReg {
    value: u64,
    previous: u64,
    changed_ps: Option<u64>,
}

impl CrossingReg {
    /// Creates a register holding `value`.
    pub fn new(value: u64) -> Self { Self { value, previous: value, changed_ps: None } }

    /// Returns the value as seen by its own domain.
    pub fn value(&self) -> u64 { self.value }

    /// Drives a new value at `now_ps`.
    pub fn set(&mut self, value: u64, now_ps: u64) {
        if value != self.value {
            self.previous = self.value;
            self.value = value;
            self.changed_ps = Some(now_ps);
        }
    }

    /// Samples the register from another domain.
    pub fn sample(&self, now_ps: u64, meta: &mut Metastability) -> u64 {
        meta.resolve(self.previous, self.value, self.changed_ps, now_ps)
    }
}

/// Chain of flops retiming a [`CrossingReg`] into the sampling domain.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    stages: ArrayVec<u64, MAX_SYNC_STAGES>,
}

impl Synchronizer {
    /// Creates a synchronizer of `stages` flops, all cleared.
    pub fn new(stages: usize) -> Result<Self, ConfigError> {
        check_stages(stages)?;
        Ok(Self { stages: (0..stages).map(|_| 0).collect() })
    }

    /// Returns the number of flops.
    pub fn stages(&self) -> usize { self.stages.len() }

    /// Returns the retimed value.
    pub fn output(&self) -> u64 { self.stages.last().copied().unwrap_or_default() }

    /// Clocks the chain once, sampling `input` into the first flop.
    pub fn tick(&mut self, input: &CrossingReg, now_ps: u64, meta: &mut Metastability) {
        let sampled = input.sample(now_ps, meta);
        for i in (1..self.stages.len()).rev() {
            self.stages[i] = self.stages[i - 1];
        }
        if let Some(first) = self.stages.first_mut() {
            *first = sampled;
        }
    }

    /// Clears every flop.
    pub fn reset(&mut self) { self.stages.iter_mut().for_each(|stage| *stage = 0); }
}

/// Reset synchronizer: asserts asynchronously, releases after `stages` edges of its own clock.
#[derive(Debug, Clone)]
pub struct ResetSynchronizer {
    stages: ArrayVec<bool, MAX_SYNC_STAGES>,
}

impl ResetSynchronizer {
    /// Creates a released reset synchronizer.
    pub fn new(stages: usize) -> Result<Self, ConfigError> {
        check_stages(stages)?;
        Ok(Self { stages: (0..stages).map(|_| false).collect() })
    }

    /// Asserts reset immediately.
    pub fn assert(&mut self) { self.stages.iter_mut().for_each(|stage| *stage = true); }

    /// Returns whether the domain is held in reset.
    pub fn is_asserted(&self) -> bool { self.stages.last().copied().unwrap_or_default() }

    /// Clocks the chain once. A pending request keeps reset asserted.
    pub fn tick(&mut self, request: bool) {
        if request {
            self.assert();
            return;
        }
        for i in (1..self.stages.len()).rev() {
            self.stages[i] = self.stages[i - 1];
        }
        if let Some(first) = self.stages.first_mut() {
            *first = false;
        }
    }
}
