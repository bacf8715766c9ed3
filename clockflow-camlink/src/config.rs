//! TOML configuration.
//!
//! Every field has a default, so an empty file describes the reference capture design: a 74.25 MHz camera link
//! clock, an 81 MHz memory clock, a 4-entry clock crossing queue and four 32-bit lanes per 128-bit memory word.
//!
//! ```toml
//! [producer]
//! frequency_hz = 74.25e6
//! backpressure = "ignore"
//! overflow = "halt"
//!
//! [consumer]
//! frequency_hz = 81e6
//! mode = "honor"
//! ready_probability = 0.75
//!
//! [ring_buffer]
//! base = 0x100000
//! depth = 0x100000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clockflow::domain::ClockDomain;
use clockflow::ConfigError;
use clockflow_std::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::{Backpressure, ConsumerMode, OverflowPolicy};
use crate::pipeline::PipelineSettings;
use crate::source::VideoTiming;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file could not be read.
    #[error("cannot read `{path}`: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the configuration layout.
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration describes an invalid pipeline.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// Producer domain section.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProducerConfig {
    pub frequency_hz: f64,
    pub phase_ps: u64,
    pub backpressure: Backpressure,
    pub overflow: OverflowPolicy,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 74.25e6,
            phase_ps: 0,
            backpressure: Backpressure::default(),
            overflow: OverflowPolicy::default(),
        }
    }
}

/// Consumer domain section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerConfig {
    /// Clock frequency.
    pub frequency_hz: f64,
    /// Offset of the first edge.
    pub phase_ps: u64,
    /// Egress policy.
    pub mode: ConsumerMode,
    /// Probability that the consumer is ready in a cycle.
    pub ready_probability: f64,
}

impl Default for ConsumerConfig {
    fn default() -> Self { Self { frequency_hz: 81e6, phase_ps: 0, mode: ConsumerMode::default(), ready_probability: 1.0 } }
}

/// Metastability section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetastabilityConfig {
    /// Window before an edge in which a changing input resolves randomly.
    pub window_ps: u64,
    /// Seed of the resolution.
    pub seed: u64,
}

/// Pipeline configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Producer domain.
    pub producer: ProducerConfig,
    /// Consumer domain.
    pub consumer: ConsumerConfig,
    /// Clock crossing queue.
    pub dcq: AsyncFifoConfig,
    /// Width conversion.
    pub converter: ConverterConfig,
    /// Ring buffer.
    pub ring_buffer: DramFifoConfig,
    /// Memory device.
    pub memory: DeviceTiming,
    /// Metastability model. Sampling is ideal if absent.
    pub metastability: Option<MetastabilityConfig>,
    /// Video raster offered by the producer.
    pub video: VideoTiming,
}

impl PipelineConfig {
    /// Loads a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigFileError::Io { path: path.to_path_buf(), source })?;
        text.parse()
    }

    /// Builds validated pipeline settings.
    pub fn to_settings(&self) -> Result<PipelineSettings, ConfigError> {
        let producer_clock =
            ClockDomain::from_frequency("producer", self.producer.frequency_hz)?.with_phase(self.producer.phase_ps);
        let consumer_clock =
            ClockDomain::from_frequency("consumer", self.consumer.frequency_hz)?.with_phase(self.consumer.phase_ps);
        let metastability = self.metastability.unwrap_or_default();

        let settings = PipelineSettings {
            dcq: self.dcq,
            converter: self.converter,
            ring_buffer: self.ring_buffer,
            memory: self.memory,
            backpressure: self.producer.backpressure,
            overflow: self.producer.overflow,
            consumer_mode: self.consumer.mode,
            metastability_window_ps: metastability.window_ps,
            seed: metastability.seed,
            ..PipelineSettings::new(producer_clock, consumer_clock)
        };
        settings.validate()?;
        self.video.validate()?;
        let probability = self.consumer.ready_probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::InvalidProbability { field: "ready_probability", value: probability });
        }
        Ok(settings)
    }
}

impl FromStr for PipelineConfig {
    type Err = ConfigFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.to_settings()?;
        Ok(config)
    }
}
