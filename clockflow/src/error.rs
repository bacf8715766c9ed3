//! Errors.

use thiserror::Error;

/// Invalid component or clock configuration.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("queue depth {depth} is not a power of two >= 2")]
    DepthNotPowerOfTwo { depth: usize },
    #[error("{stages} synchronizer stages requested, expected {min}..={max}")]
    SyncStages { stages: usize, min: usize, max: usize },
    #[error("clock domain `{name}` has a zero period")]
    ZeroPeriod { name: String },
    #[error("clock domain `{name}` has an invalid frequency ({hz} Hz)")]
    InvalidFrequency { name: String, hz: f64 },
    #[error("a {width}-bit sample does not fit in a {lane_bits}-bit lane")]
    LaneTooNarrow { width: usize, lane_bits: usize },
    #[error("a {bits}-bit wide word exceeds 128 bits")]
    WordTooWide { bits: usize },
    #[error("conversion ratio must be at least 1")]
    ZeroRatio,
    #[error("ring buffer depth must be non-zero")]
    ZeroDepth,
    #[error("thresholds {write_threshold}+{read_threshold} leave no usable capacity in {depth} words")]
    NoUsableCapacity { depth: usize, write_threshold: usize, read_threshold: usize },
    #[error("{which} threshold {threshold} is below the device minimum of {min}")]
    ThresholdBelowDevice { which: &'static str, threshold: usize, min: usize },
    #[error("window {base:#x}+{depth:#x} does not fit in the device address space")]
    WindowOutOfRange { base: u64, depth: usize },
    #[error("device timing field `{field}` must be non-zero")]
    ZeroTiming { field: &'static str },
    #[error("a {refresh_cycles}-cycle refresh does not fit in a {refresh_interval}-cycle refresh interval")]
    RefreshTooLong { refresh_cycles: u64, refresh_interval: u64 },
    #[error("metastability window of {window_ps} ps is not shorter than the {period_ps} ps clock period")]
    MetastabilityWindow { window_ps: u64, period_ps: u64 },
    #[error("`{field}` must be a probability, got {value}")]
    InvalidProbability { field: &'static str, value: f64 },
    #[error("video timing field `{field}` is out of range")]
    InvalidRaster { field: &'static str },
}

/// Errors raised while running a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A sample was offered to a full queue under the halting overflow policy.
    #[error("overflow in domain `{domain}` at {time_ps} ps")]
    Overflow {
        /// Name of the domain in which the overflow happened.
        domain: String,
        /// Simulated time of the offending edge.
        time_ps: u64,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
