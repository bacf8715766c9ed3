//! External memory device.
//!
//! A cycle-level model of a bulk memory behind a controller with one write port and one read port. Commands wait
//! in a per-port queue; the controller accepts at most one command per cycle, alternating between ports when both
//! have work, and completes every accepted command exactly `latency` cycles later in acceptance order. Every
//! `refresh_interval` cycles the device stalls for `refresh_cycles` cycles.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::*;

/// Device timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceTiming {
    /// Write commands the write port can hold.
    pub write_queue_depth: usize,
    /// Read commands the read port can hold.
    pub read_queue_depth: usize,
    /// Cycles from acceptance to completion.
    pub latency: u64,
    /// Cycles between two refreshes.
    pub refresh_interval: u64,
    /// Cycles a refresh stalls the device.
    pub refresh_cycles: u64,
}

impl Default for DeviceTiming {
    fn default() -> Self {
        Self { write_queue_depth: 32, read_queue_depth: 32, latency: 8, refresh_interval: 632, refresh_cycles: 28 }
    }
}

impl DeviceTiming {
    /// Checks the timing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("write_queue_depth", self.write_queue_depth as u64),
            ("read_queue_depth", self.read_queue_depth as u64),
            ("latency", self.latency),
            ("refresh_interval", self.refresh_interval),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroTiming { field: *field });
        }
        // The device must accept commands between two refreshes.
        if self.refresh_cycles >= self.refresh_interval {
            return Err(ConfigError::RefreshTooLong {
                refresh_cycles: self.refresh_cycles,
                refresh_interval: self.refresh_interval,
            });
        }
        Ok(())
    }

    /// Returns the smallest `(write_threshold, read_threshold)` of a FIFO buffered in this device.
    ///
    /// A read is only issued for a word whose write command has left the write queue, and a write only targets a
    /// slot whose read command has left the read queue.
    pub fn min_thresholds(&self) -> (usize, usize) { (self.read_queue_depth, self.write_queue_depth) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Port {
    Write,
    Read,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Write { addr: u64, data: u128 },
    Read { addr: u64 },
}

/// External memory device backing the window `[base, base + words)`.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    timing: DeviceTiming,
    base: u64,
    mem: Vec<u128>,

    write_queue: VecDeque<(u64, u128)>,
    read_queue: VecDeque<u64>,
    in_flight: VecDeque<(u64, Command)>,

    cycle: u64,
    refresh_left: u64,
    last_port: Port,
}

impl MemoryDevice {
    /// Creates a device with zeroed contents.
    pub fn new(timing: DeviceTiming, base: u64, words: usize) -> Result<Self, ConfigError> {
        timing.validate()?;
        if base.checked_add(words as u64).is_none() {
            return Err(ConfigError::WindowOutOfRange { base, depth: words });
        }
        debug!(base, words, latency = timing.latency, "created memory device");
        Ok(Self {
            timing,
            base,
            mem: vec![0; words],
            write_queue: VecDeque::with_capacity(timing.write_queue_depth),
            read_queue: VecDeque::with_capacity(timing.read_queue_depth),
            in_flight: VecDeque::new(),
            cycle: 0,
            refresh_left: 0,
            last_port: Port::Read,
        })
    }

    /// Returns the timing.
    pub fn timing(&self) -> &DeviceTiming { &self.timing }

    /// Returns whether the write port has room for a command.
    pub fn can_queue_write(&self) -> bool { self.write_queue.len() < self.timing.write_queue_depth }

    /// Returns whether the read port has room for a command.
    pub fn can_queue_read(&self) -> bool { self.read_queue.len() < self.timing.read_queue_depth }

    /// Number of write commands waiting in the write port.
    pub fn queued_writes(&self) -> usize { self.write_queue.len() }

    /// Number of read commands waiting in the read port.
    pub fn queued_reads(&self) -> usize { self.read_queue.len() }

    /// Number of accepted commands not yet completed.
    pub fn in_flight(&self) -> usize { self.in_flight.len() }

    /// Returns whether the device is refreshing.
    pub fn is_refreshing(&self) -> bool { self.refresh_left > 0 }

    /// Queues a write command.
    ///
    /// # Panics
    ///
    /// Panics if the write port is full or `addr` is outside the window.
    pub fn queue_write(&mut self, addr: u64, data: u128) {
        assert!(self.can_queue_write(), "write port overflow");
        let _ = self.offset(addr);
        self.write_queue.push_back((addr, data));
    }

    /// Queues a read command.
    ///
    /// # Panics
    ///
    /// Panics if the read port is full or `addr` is outside the window.
    pub fn queue_read(&mut self, addr: u64) {
        assert!(self.can_queue_read(), "read port overflow");
        let _ = self.offset(addr);
        self.read_queue.push_back(addr);
    }

    /// Returns the stored word at `addr`, if inside the window.
    pub fn peek(&self, addr: u64) -> Option<u128> {
        let offset = usize::try_from(addr.checked_sub(self.base)?).ok()?;
        self.mem.get(offset).copied()
    }

    /// Advances the device by one cycle. Returns the data of a read completing in this cycle.
    pub fn tick(&mut self) -> Option<u128> {
        self.cycle += 1;

        // Completion.
        let mut data = None;
        while let Some((due, command)) = self.in_flight.front().copied() {
            if due > self.cycle {
                break;
            }
            self.in_flight.pop_front();
            match command {
                Command::Write { addr, data: word } => {
                    let offset = self.offset(addr);
                    self.mem[offset] = word;
                }
                Command::Read { addr } => {
                    data = Some(self.mem[self.offset(addr)]);
                }
            }
        }

        // Refresh.
        if self.timing.refresh_cycles > 0 && self.cycle % self.timing.refresh_interval == 0 {
            trace!(cycle = self.cycle, "memory refresh");
            self.refresh_left = self.timing.refresh_cycles;
        }
        if self.refresh_left > 0 {
            self.refresh_left -= 1;
            return data;
        }

        // Acceptance.
        let port = match (self.write_queue.is_empty(), self.read_queue.is_empty()) {
            (true, true) => return data,
            (false, true) => Port::Write,
            (true, false) => Port::Read,
            (false, false) if self.last_port == Port::Write => Port::Read,
            (false, false) => Port::Write,
        };
        let command = match port {
            Port::Write => {
                let (addr, word) = some_or!(self.write_queue.pop_front(), return data);
                Command::Write { addr, data: word }
            }
            Port::Read => Command::Read { addr: some_or!(self.read_queue.pop_front(), return data) },
        };
        self.last_port = port;
        self.in_flight.push_back((self.cycle + self.timing.latency, command));
        data
    }

    /// Drops every queued and in-flight command. Contents are kept.
    pub fn reset(&mut self) {
        self.write_queue.clear();
        self.read_queue.clear();
        self.in_flight.clear();
        self.cycle = 0;
        self.refresh_left = 0;
        self.last_port = Port::Read;
    }

    fn offset(&self, addr: u64) -> usize {
        let offset = addr.checked_sub(self.base).and_then(|offset| usize::try_from(offset).ok());
        match offset {
            Some(offset) if offset < self.mem.len() => offset,
            _ => panic!("address {addr:#x} outside of the window at {:#x}", self.base),
        }
    }
}
