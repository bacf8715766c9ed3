//! FIFO buffered in an external memory device.
//!
//! The FIFO owns a window of `depth` words starting at `base` in a [`MemoryDevice`]. The write port stores each
//! accepted word at the next write address; the read port issues a read command for the oldest stored word once
//! enough words are buffered. Both addresses wrap at `depth`.
//!
//! `level` counts words stored and not yet claimed by a read command. The write port accepts only while
//! `level < depth - write_threshold` and the read port issues only while `level > read_threshold`. A
//! `read_threshold` of at least the device write queue depth guarantees that a word is read only after its write
//! command reached the device, and a `write_threshold` of at least the device read queue depth guarantees that a
//! slot is overwritten only after its read command reached the device.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::memory::{DeviceTiming, MemoryDevice};
use crate::*;

/// Memory-buffered FIFO configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DramFifoConfig {
    /// First word address of the window.
    pub base: u64,
    /// Window size in words.
    pub depth: usize,
    /// Free words kept between the write port and a full window.
    pub write_threshold: usize,
    /// Words kept buffered before the read port issues reads.
    pub read_threshold: usize,
}

impl Default for DramFifoConfig {
    fn default() -> Self { Self { base: 0x0010_0000, depth: 0x0010_0000, write_threshold: 32, read_threshold: 32 } }
}

impl DramFifoConfig {
    /// Checks the configuration against the timing of the backing device.
    pub fn validate(&self, timing: &DeviceTiming) -> Result<(), ConfigError> {
        timing.validate()?;
        if self.depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.depth <= self.write_threshold.saturating_add(self.read_threshold) {
            return Err(ConfigError::NoUsableCapacity {
                depth: self.depth,
                write_threshold: self.write_threshold,
                read_threshold: self.read_threshold,
            });
        }
        if self.base.checked_add(self.depth as u64).is_none() {
            return Err(ConfigError::WindowOutOfRange { base: self.base, depth: self.depth });
        }

        let (min_write, min_read) = timing.min_thresholds();
        if self.write_threshold < min_write {
            return Err(ConfigError::ThresholdBelowDevice {
                which: "write",
                threshold: self.write_threshold,
                min: min_write,
            });
        }
        if self.read_threshold < min_read {
            return Err(ConfigError::ThresholdBelowDevice { which: "read", threshold: self.read_threshold, min: min_read });
        }
        Ok(())
    }

    /// Returns the number of words that can be in flight between the two thresholds.
    pub fn usable_capacity(&self) -> usize { self.depth - self.write_threshold - self.read_threshold }
}

/// FIFO buffered in an external memory device.
#[derive(Debug, Clone)]
pub struct DramFifo {
    config: DramFifoConfig,
    device: MemoryDevice,

    level: usize,
    write_address: usize,
    read_address: usize,

    /// Read commands issued and not yet taken by the read port.
    outstanding: usize,
    /// Data returned by the device.
    returned: VecDeque<u128>,
}

impl DramFifo {
    /// Creates an empty FIFO with its own memory device.
    pub fn new(config: DramFifoConfig, timing: DeviceTiming) -> Result<Self, ConfigError> {
        config.validate(&timing)?;
        debug!(
            base = config.base,
            depth = config.depth,
            write_threshold = config.write_threshold,
            read_threshold = config.read_threshold,
            "created dram fifo"
        );
        Ok(Self {
            config,
            device: MemoryDevice::new(timing, config.base, config.depth)?,
            level: 0,
            write_address: 0,
            read_address: 0,
            outstanding: 0,
            returned: VecDeque::with_capacity(timing.read_queue_depth),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DramFifoConfig { &self.config }

    /// Returns the backing device.
    pub fn device(&self) -> &MemoryDevice { &self.device }

    /// Words stored and not yet claimed by a read command.
    pub fn level(&self) -> usize { self.level }

    /// Window offset of the next write.
    pub fn write_address(&self) -> usize { self.write_address }

    /// Window offset of the next read command.
    pub fn read_address(&self) -> usize { self.read_address }

    /// Read commands issued whose data has not been taken yet.
    pub fn outstanding_reads(&self) -> usize { self.outstanding }

    /// Returns whether the write threshold permits a write.
    pub fn is_writable(&self) -> bool { self.level < self.config.depth - self.config.write_threshold }

    /// Returns whether the read threshold permits a read.
    pub fn is_readable(&self) -> bool { self.level > self.config.read_threshold }

    fn sink_ready(&self) -> bool { self.is_writable() && self.device.can_queue_write() }

    fn can_issue_read(&self) -> bool {
        self.is_readable() && self.outstanding < self.device.timing().read_queue_depth && self.device.can_queue_read()
    }
}

impl Module for DramFifo {
    type I = VrChannel<u128>;
    type O = VrChannel<u128>;

    fn name(&self) -> &str { "dram_fifo" }

    fn comb(&self, _i_fwd: &Valid<u128>, _o_bwd: &Ready) -> (Valid<u128>, Ready) {
        (Valid::from(self.returned.front().copied()), Ready::new(self.sink_ready()))
    }

    fn tick(&mut self, i_fwd: &Valid<u128>, o_bwd: &Ready) {
        let write = i_fwd.valid && self.sink_ready();
        let read = self.can_issue_read();

        if o_bwd.ready && self.returned.pop_front().is_some() {
            self.outstanding -= 1;
        }

        if write {
            self.device.queue_write(self.config.base + self.write_address as u64, i_fwd.inner);
            self.write_address = (self.write_address + 1) % self.config.depth;
            self.level += 1;
        }

        if read {
            self.device.queue_read(self.config.base + self.read_address as u64);
            self.read_address = (self.read_address + 1) % self.config.depth;
            self.level -= 1;
            self.outstanding += 1;
        }

        if let Some(data) = self.device.tick() {
            self.returned.push_back(data);
        }
        trace!(level = self.level, outstanding = self.outstanding, "dram fifo");
    }

    fn reset(&mut self) {
        self.device.reset();
        self.level = 0;
        self.write_address = 0;
        self.read_address = 0;
        self.outstanding = 0;
        self.returned.clear();
    }
}
