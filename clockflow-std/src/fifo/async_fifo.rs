//! Asynchronous FIFO.
//!
//! The write side lives in the producer clock domain and the read side in the consumer clock domain. Each side
//! owns its pointer and publishes it Gray coded in a [`CrossingReg`]. The peer samples it through a
//! [`Synchronizer`] and decodes it only after retiming, so each side works with a delayed view of the other:
//!
//! - the write side may believe the queue is fuller than it is, never emptier;
//! - the read side may believe the queue is emptier than it is, never fuller.
//!
//! Slots are written only by the write side and only while its view says they are free.

use clockflow::cdc::{gray_decode, CrossingReg, Metastability, Synchronizer, MIN_SYNC_STAGES};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::tracker::{level, GrayCounter};
use crate::*;

/// Asynchronous FIFO configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AsyncFifoConfig {
    /// Number of slots. A power of two, at least 2.
    pub depth: usize,
    /// Synchronizer flops per crossing.
    pub sync_stages: usize,
}

impl Default for AsyncFifoConfig {
    fn default() -> Self { Self { depth: 4, sync_stages: MIN_SYNC_STAGES } }
}

impl AsyncFifoConfig {
    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth < 2 || !is_pow2(self.depth) {
            return Err(ConfigError::DepthNotPowerOfTwo { depth: self.depth });
        }
        // Checks the stage count.
        let _ = Synchronizer::new(self.sync_stages)?;
        Ok(())
    }
}

/// Asynchronous FIFO crossing valid-ready channels between two clock domains.
#[derive(Debug, Clone)]
pub struct AsyncFifo<V: Signal> {
    depth: usize,
    mem: Vec<V>,

    // Write side.
    wptr: GrayCounter,
    wptr_gray: CrossingReg,
    rptr_sync: Synchronizer,

    // Read side.
    rptr: GrayCounter,
    rptr_gray: CrossingReg,
    wptr_sync: Synchronizer,
}

impl<V: Signal> AsyncFifo<V> {
    /// Creates an empty FIFO.
    pub fn new(config: AsyncFifoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(depth = config.depth, sync_stages = config.sync_stages, "created async fifo");
        Ok(Self {
            depth: config.depth,
            mem: vec![V::default(); config.depth],
            wptr: GrayCounter::new(config.depth),
            wptr_gray: CrossingReg::default(),
            rptr_sync: Synchronizer::new(config.sync_stages)?,
            rptr: GrayCounter::new(config.depth),
            rptr_gray: CrossingReg::default(),
            wptr_sync: Synchronizer::new(config.sync_stages)?,
        })
    }

    /// Returns the number of slots.
    pub fn depth(&self) -> usize { self.depth }

    /// Returns the number of synchronizer flops per crossing.
    pub fn sync_stages(&self) -> usize { self.rptr_sync.stages() }

    /// Returns the binary write pointer.
    pub fn wptr(&self) -> u64 { self.wptr.value() }

    /// Returns the binary read pointer.
    pub fn rptr(&self) -> u64 { self.rptr.value() }

    /// Occupancy as seen by the write side.
    pub fn write_level(&self) -> usize {
        level(self.wptr.value(), gray_decode(self.rptr_sync.output()), self.depth) as usize
    }

    /// Occupancy as seen by the read side.
    pub fn read_level(&self) -> usize {
        level(gray_decode(self.wptr_sync.output()), self.rptr.value(), self.depth) as usize
    }

    /// Returns whether the write side sees the queue full.
    pub fn is_full(&self) -> bool { self.write_level() >= self.depth }

    /// Returns whether the read side sees the queue empty.
    pub fn is_empty(&self) -> bool { self.read_level() == 0 }

    /// Backward signal of the write side.
    pub fn sink_ready(&self) -> Ready { Ready::new(!self.is_full()) }

    /// Forward signal of the read side.
    pub fn source_fwd(&self) -> Valid<V> {
        if self.is_empty() {
            Valid::invalid()
        } else {
            Valid::valid(self.mem[self.rptr.index()].clone())
        }
    }

    /// Clocks the write side. Returns whether `fwd` was accepted.
    pub fn write_tick(&mut self, fwd: &Valid<V>, now_ps: u64, meta: &mut Metastability) -> bool {
        let accept = fwd.valid && !self.is_full();
        self.rptr_sync.tick(&self.rptr_gray, now_ps, meta);
        if accept {
            self.mem[self.wptr.index()] = fwd.inner.clone();
            self.wptr.increment();
            self.wptr_gray.set(self.wptr.gray(), now_ps);
            trace!(wptr = self.wptr.value(), "async fifo write");
        }
        accept
    }

    /// Clocks the read side. Returns whether a value was popped.
    pub fn read_tick(&mut self, bwd: &Ready, now_ps: u64, meta: &mut Metastability) -> bool {
        let pop = bwd.ready && !self.is_empty();
        self.wptr_sync.tick(&self.wptr_gray, now_ps, meta);
        if pop {
            self.rptr.increment();
            self.rptr_gray.set(self.rptr.gray(), now_ps);
            trace!(rptr = self.rptr.value(), "async fifo read");
        }
        pop
    }

    /// Resets the write side.
    pub fn reset_write(&mut self, now_ps: u64) {
        self.wptr.reset();
        self.wptr_gray.set(0, now_ps);
        self.rptr_sync.reset();
    }

    /// Resets the read side.
    pub fn reset_read(&mut self, now_ps: u64) {
        self.rptr.reset();
        self.rptr_gray.set(0, now_ps);
        self.wptr_sync.reset();
    }
}
