//! Capture pipeline.
//!
//! ```text
//!  producer domain              |  consumer domain
//!                               |
//!  source -> capture -> [ async fifo ] -> up converter -> dram fifo -> skid buffer -> consumer
//! ```
//!
//! The pipeline owns no state of its own besides its components, the reset synchronizers of both domains and
//! statistics. Reset requested in either domain is asserted immediately in both and released in each domain after
//! its reset synchronizer has seen enough edges without a request.

use std::fmt;

use clockflow::cdc::{Metastability, ResetSynchronizer};
use clockflow::domain::{ClockDomain, Edge};
use clockflow::*;
use clockflow_std::*;
use tracing::{info, trace, warn};

use crate::capture::{capture, Backpressure, Capture, ConsumerMode, OverflowPolicy};
use crate::sample::Sample;
use crate::sink::Consumer;
use crate::source::Producer;

/// Consumer domain logic after the clock crossing.
pub type Egress = Chain<Chain<UpConverter<Sample>, DramFifo>, SkidBuffer<u128>>;

/// Clock domain side of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Domain of the video source.
    Producer,
    /// Domain of the memory and the consumer.
    Consumer,
}

impl Side {
    fn index(self) -> usize {
        match self {
            Side::Producer => 0,
            Side::Consumer => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Producer => write!(f, "producer"),
            Side::Consumer => write!(f, "consumer"),
        }
    }
}

/// Validated pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Producer clock.
    pub producer_clock: ClockDomain,
    /// Consumer clock.
    pub consumer_clock: ClockDomain,
    /// Clock crossing queue.
    pub dcq: AsyncFifoConfig,
    /// Width conversion.
    pub converter: ConverterConfig,
    /// Ring buffer window and thresholds.
    pub ring_buffer: DramFifoConfig,
    /// Memory device timing.
    pub memory: DeviceTiming,
    /// Ingress policy.
    pub backpressure: Backpressure,
    /// Overflow policy.
    pub overflow: OverflowPolicy,
    /// Egress policy.
    pub consumer_mode: ConsumerMode,
    /// Metastability window, zero for ideal sampling.
    pub metastability_window_ps: u64,
    /// Seed of the metastability model.
    pub seed: u64,
}

impl PipelineSettings {
    /// Creates settings with the reference component configuration and the given clocks.
    pub fn new(producer_clock: ClockDomain, consumer_clock: ClockDomain) -> Self {
        Self {
            producer_clock,
            consumer_clock,
            dcq: AsyncFifoConfig::default(),
            converter: ConverterConfig::default(),
            ring_buffer: DramFifoConfig::default(),
            memory: DeviceTiming::default(),
            backpressure: Backpressure::default(),
            overflow: OverflowPolicy::default(),
            consumer_mode: ConsumerMode::default(),
            metastability_window_ps: 0,
            seed: 0,
        }
    }

    /// Checks every component configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dcq.validate()?;
        self.converter.validate::<Sample>()?;
        self.ring_buffer.validate(&self.memory)?;
        let meta = Metastability::new(self.metastability_window_ps, self.seed);
        meta.validate(self.producer_clock.period_ps())?;
        meta.validate(self.consumer_clock.period_ps())?;
        Ok(())
    }
}

/// Snapshot of pointers, levels and flags.
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStatus {
    pub dcq_wptr: u64,
    pub dcq_rptr: u64,
    pub dcq_write_level: usize,
    pub dcq_read_level: usize,
    pub dcq_full: bool,
    pub dcq_empty: bool,
    pub pending_lanes: usize,
    pub ring_level: usize,
    pub ring_write_address: usize,
    pub ring_read_address: usize,
    pub outstanding_reads: usize,
    pub overflow: bool,
    pub halted: bool,
    pub producer_in_reset: bool,
    pub consumer_in_reset: bool,
}

/// Counters accumulated since the pipeline was created.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    /// Samples offered by the producer.
    pub samples_offered: u64,
    /// Samples written into the clock crossing queue.
    pub samples_accepted: u64,
    /// Samples lost to a full queue.
    pub samples_dropped: u64,
    /// Producer cycles spent holding a refused sample.
    pub producer_stalls: u64,
    /// Samples read out of the clock crossing queue.
    pub samples_transferred: u64,
    /// Words written into the ring buffer.
    pub words_written: u64,
    /// Read commands issued by the ring buffer.
    pub words_read: u64,
    /// Words taken by the consumer.
    pub words_delivered: u64,
    /// Words lost because the consumer was not ready.
    pub egress_dropped: u64,
    /// Cycles in which the producer-side queue view was full.
    pub full_cycles: u64,
    /// Reset assertions.
    pub resets: u64,
}

/// Capture pipeline.
#[derive(Debug)]
pub struct Pipeline {
    settings: PipelineSettings,
    capture: Capture,
    dcq: AsyncFifo<Sample>,
    egress: Egress,
    resets: [ResetSynchronizer; 2],
    requests: [bool; 2],
    meta: Metastability,
    stats: PipelineStats,
}

impl Pipeline {
    /// Creates a pipeline out of reset.
    pub fn new(settings: PipelineSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let egress = UpConverter::new(settings.converter)?
            .chain(DramFifo::new(settings.ring_buffer, settings.memory)?)
            .chain(skid_buffer());
        let reset = ResetSynchronizer::new(settings.dcq.sync_stages)?;
        info!(
            producer = %settings.producer_clock,
            consumer = %settings.consumer_clock,
            dcq_depth = settings.dcq.depth,
            word_bits = settings.converter.word_bits(),
            "created capture pipeline"
        );
        Ok(Self {
            capture: capture(settings.backpressure, settings.overflow),
            dcq: AsyncFifo::new(settings.dcq)?,
            egress,
            resets: [reset.clone(), reset],
            requests: [false; 2],
            meta: Metastability::new(settings.metastability_window_ps, settings.seed),
            stats: PipelineStats::default(),
            settings,
        })
    }

    /// Returns the settings.
    pub fn settings(&self) -> &PipelineSettings { &self.settings }

    /// Returns the counters.
    pub fn stats(&self) -> &PipelineStats { &self.stats }

    /// Returns the clock crossing queue.
    pub fn dcq(&self) -> &AsyncFifo<Sample> { &self.dcq }

    /// Returns the up converter.
    pub fn converter(&self) -> &UpConverter<Sample> { self.egress.first().first() }

    /// Returns the ring buffer.
    pub fn ring_buffer(&self) -> &DramFifo { self.egress.first().second() }

    /// Returns whether a side is held in reset.
    pub fn in_reset(&self, side: Side) -> bool { self.resets[side.index()].is_asserted() }

    /// Returns the sticky overflow flag.
    pub fn overflow(&self) -> bool { self.capture.state().overflow }

    /// Returns a snapshot of pointers, levels and flags.
    pub fn status(&self) -> PipelineStatus {
        let ring = self.ring_buffer();
        PipelineStatus {
            dcq_wptr: self.dcq.wptr(),
            dcq_rptr: self.dcq.rptr(),
            dcq_write_level: self.dcq.write_level(),
            dcq_read_level: self.dcq.read_level(),
            dcq_full: self.dcq.is_full(),
            dcq_empty: self.dcq.is_empty(),
            pending_lanes: self.converter().pending_lanes(),
            ring_level: ring.level(),
            ring_write_address: ring.write_address(),
            ring_read_address: ring.read_address(),
            outstanding_reads: ring.outstanding_reads(),
            overflow: self.capture.state().overflow,
            halted: self.capture.state().halted,
            producer_in_reset: self.in_reset(Side::Producer),
            consumer_in_reset: self.in_reset(Side::Consumer),
        }
    }

    /// Drives the reset request of a side at `now_ps`.
    ///
    /// Asserting clears every component of both sides immediately.
    pub fn set_reset(&mut self, side: Side, asserted: bool, now_ps: u64) {
        self.requests[side.index()] = asserted;
        if !asserted {
            return;
        }
        info!(side = %side, time_ps = now_ps, "reset asserted");
        self.stats.resets += 1;
        self.resets.iter_mut().for_each(ResetSynchronizer::assert);
        self.capture.reset();
        self.dcq.reset_write(now_ps);
        self.dcq.reset_read(now_ps);
        self.egress.reset();
    }

    /// Clocks the reset synchronizer of a side. Returns whether the side runs in this cycle.
    fn clock_reset(&mut self, side: Side, edge: &Edge) -> bool {
        let request = self.requests.iter().any(|request| *request);
        let reset = &mut self.resets[side.index()];
        let was_asserted = reset.is_asserted();
        reset.tick(request);
        if was_asserted && !reset.is_asserted() {
            info!(side = %side, time_ps = edge.time_ps, "reset released");
        }
        !was_asserted
    }

    /// Clocks the producer domain.
    pub fn producer_edge(&mut self, producer: &mut dyn Producer<Sample>, edge: &Edge) -> Result<(), SimError> {
        if !self.clock_reset(Side::Producer, edge) {
            return Ok(());
        }

        let front = producer.front(edge.cycle);
        let i_fwd = Valid::from(front);
        let dcq_ready = self.dcq.sink_ready();
        let (o_fwd, i_bwd) = self.capture.comb(&i_fwd, &dcq_ready);
        let was_halted = self.capture.state().halted;
        let was_overflow = self.capture.state().overflow;
        let dropped = self.capture.state().dropped;
        self.capture.tick(&i_fwd, &dcq_ready);
        let accepted = self.dcq.write_tick(&o_fwd, edge.time_ps, &mut self.meta);

        if i_fwd.valid {
            self.stats.samples_offered += 1;
        }
        if accepted {
            self.stats.samples_accepted += 1;
        }
        if !dcq_ready.ready {
            self.stats.full_cycles += 1;
        }
        self.stats.samples_dropped += self.capture.state().dropped - dropped;

        match self.settings.backpressure {
            Backpressure::Ignore if i_fwd.valid => producer.advance(),
            Backpressure::Honor if i_fwd.valid && i_bwd.ready => producer.advance(),
            Backpressure::Honor if i_fwd.valid => self.stats.producer_stalls += 1,
            _ => (),
        }

        if !was_overflow && self.capture.state().overflow {
            warn!(time_ps = edge.time_ps, cycle = edge.cycle, "clock crossing queue overflow");
        }
        if !was_halted && self.capture.state().halted {
            return Err(SimError::Overflow {
                domain: self.settings.producer_clock.name().to_string(),
                time_ps: edge.time_ps,
            });
        }
        Ok(())
    }

    /// Clocks the consumer domain.
    pub fn consumer_edge(&mut self, consumer: &mut dyn Consumer, edge: &Edge) {
        if !self.clock_reset(Side::Consumer, edge) {
            return;
        }

        let dcq_fwd = self.dcq.source_fwd();
        let consumer_ready = consumer.ready(edge.cycle);
        let o_bwd = Ready::new(match self.settings.consumer_mode {
            ConsumerMode::AlwaysReady => true,
            ConsumerMode::Honor => consumer_ready,
        });

        let (o_fwd, i_bwd) = self.egress.comb(&dcq_fwd, &o_bwd);
        let (write_address, read_address) = (self.ring_buffer().write_address(), self.ring_buffer().read_address());
        self.egress.tick(&dcq_fwd, &o_bwd);
        if self.dcq.read_tick(&i_bwd, edge.time_ps, &mut self.meta) {
            self.stats.samples_transferred += 1;
        }

        if self.ring_buffer().write_address() != write_address {
            self.stats.words_written += 1;
        }
        if self.ring_buffer().read_address() != read_address {
            self.stats.words_read += 1;
        }

        if transfer(&o_fwd, &o_bwd) {
            if consumer_ready {
                consumer.accept(o_fwd.inner);
                self.stats.words_delivered += 1;
            } else {
                trace!(cycle = edge.cycle, "consumer not ready, word lost");
                self.stats.egress_dropped += 1;
            }
        }
    }
}
