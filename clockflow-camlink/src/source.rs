//! Sample producers.

use std::fmt::Debug;

use clockflow::*;
use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// Source of samples clocked by the producer domain.
pub trait Producer<V: Signal>: Debug {
    /// Returns the sample offered in `cycle`, if any.
    fn front(&self, cycle: u64) -> Option<V>;

    /// Moves on to the next sample.
    fn advance(&mut self);
}

/// Video raster timing, in pixel clocks and lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoTiming {
    /// Active pixels per line.
    pub h_active: u32,
    /// Blanking pixels per line.
    pub h_blank: u32,
    /// Active lines per frame.
    pub v_active: u32,
    /// Blanking lines per frame.
    pub v_blank: u32,
    /// Pixels of horizontal sync at the start of horizontal blanking.
    pub hsync_len: u32,
    /// Lines of vertical sync at the start of vertical blanking.
    pub vsync_lines: u32,
}

impl Default for VideoTiming {
    fn default() -> Self { Self::hd720() }
}

impl VideoTiming {
    /// 1280x720 at 60 Hz with a 74.25 MHz pixel clock.
    pub fn hd720() -> Self {
        Self { h_active: 1280, h_blank: 370, v_active: 720, v_blank: 30, hsync_len: 40, vsync_lines: 5 }
    }

    /// Checks that the raster is non-empty, fits in `u32` and keeps the sync pulses inside blanking.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero_total = |active: u32, blank: u32| active.checked_add(blank).map_or(false, |total| total > 0);
        if !nonzero_total(self.h_active, self.h_blank) {
            return Err(ConfigError::InvalidRaster { field: "h_blank" });
        }
        if !nonzero_total(self.v_active, self.v_blank) {
            return Err(ConfigError::InvalidRaster { field: "v_blank" });
        }
        if self.hsync_len > self.h_blank {
            return Err(ConfigError::InvalidRaster { field: "hsync_len" });
        }
        if self.vsync_lines > self.v_blank {
            return Err(ConfigError::InvalidRaster { field: "vsync_lines" });
        }
        Ok(())
    }

    /// Pixels per line.
    pub fn h_total(&self) -> u32 { self.h_active + self.h_blank }

    /// Lines per frame.
    pub fn v_total(&self) -> u32 { self.v_active + self.v_blank }

    /// Samples per frame.
    pub fn frame_len(&self) -> u64 { u64::from(self.h_total()) * u64::from(self.v_total()) }
}

/// Free-running video raster.
///
/// Active pixels carry a 24-bit counter of the active pixels emitted so far, which lets a consumer detect lost
/// samples. The source offers a sample in every cycle.
#[derive(Debug, Clone)]
pub struct VideoPattern {
    timing: VideoTiming,
    x: u32,
    y: u32,
    counter: u32,
}

impl VideoPattern {
    /// Creates a raster positioned at the first active pixel.
    pub fn new(timing: VideoTiming) -> Self { Self { timing, x: 0, y: 0, counter: 0 } }

    /// Returns the number of active pixels emitted so far, modulo 2^24.
    pub fn counter(&self) -> u32 { self.counter }

    /// Returns the raster position.
    pub fn position(&self) -> (u32, u32) { (self.x, self.y) }

    fn is_active(&self) -> bool { self.x < self.timing.h_active && self.y < self.timing.v_active }
}

impl Producer<Sample> for VideoPattern {
    fn front(&self, _cycle: u64) -> Option<Sample> {
        if self.is_active() {
            return Some(Sample::with_payload(self.counter));
        }
        let hsync = (self.timing.h_active..self.timing.h_active + self.timing.hsync_len).contains(&self.x);
        let vsync = (self.timing.v_active..self.timing.v_active + self.timing.vsync_lines).contains(&self.y);
        Some(Sample::blank(hsync, vsync))
    }

    fn advance(&mut self) {
        if self.is_active() {
            self.counter = (self.counter + 1) & 0x00ff_ffff;
        }
        self.x += 1;
        if self.x == self.timing.h_total() {
            self.x = 0;
            self.y += 1;
            if self.y == self.timing.v_total() {
                self.y = 0;
            }
        }
    }
}

/// Finite list of samples, offered one per cycle.
#[derive(Debug, Clone)]
pub struct VecProducer<V: Signal> {
    samples: Vec<V>,
    position: usize,
}

impl<V: Signal> VecProducer<V> {
    /// Creates a producer of `samples`.
    pub fn new(samples: Vec<V>) -> Self { Self { samples, position: 0 } }

    /// Returns the number of samples consumed.
    pub fn position(&self) -> usize { self.position }

    /// Returns whether every sample has been consumed.
    pub fn is_exhausted(&self) -> bool { self.position >= self.samples.len() }
}

impl<V: Signal> Producer<V> for VecProducer<V> {
    fn front(&self, _cycle: u64) -> Option<V> { self.samples.get(self.position).cloned() }

    fn advance(&mut self) { self.position = (self.position + 1).min(self.samples.len()); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> VideoTiming {
        VideoTiming { h_active: 4, h_blank: 3, v_active: 2, v_blank: 2, hsync_len: 1, vsync_lines: 1 }
    }

    #[test]
    fn raster_order() {
        let mut pattern = VideoPattern::new(tiny());
        let mut frame = vec![];
        for _ in 0..tiny().frame_len() {
            frame.push(pattern.front(0).unwrap());
            pattern.advance();
        }
        assert_eq!(pattern.position(), (0, 0));
        assert_eq!(pattern.counter(), 8);

        assert_eq!(frame.iter().filter(|s| s.de).map(Sample::payload).collect::<Vec<_>>(), (0..8).collect::<Vec<_>>());
        // First blanking pixel of an active line carries hsync.
        assert_eq!(frame[4], Sample::blank(true, false));
        assert_eq!(frame[5], Sample::blank(false, false));
        // First blanking line carries vsync.
        assert_eq!(frame[14], Sample::blank(false, true));
        assert_eq!(frame[21], Sample::blank(false, false));
    }

    #[test]
    fn rejects_bad_rasters() {
        assert_eq!(tiny().validate(), Ok(()));
        assert_eq!(VideoTiming::hd720().validate(), Ok(()));
        let overflowing = VideoTiming { h_active: u32::MAX, ..tiny() };
        assert_eq!(overflowing.validate(), Err(ConfigError::InvalidRaster { field: "h_blank" }));
        let empty = VideoTiming { v_active: 0, v_blank: 0, vsync_lines: 0, ..tiny() };
        assert_eq!(empty.validate(), Err(ConfigError::InvalidRaster { field: "v_blank" }));
        let long_sync = VideoTiming { hsync_len: 4, ..tiny() };
        assert_eq!(long_sync.validate(), Err(ConfigError::InvalidRaster { field: "hsync_len" }));
    }

    #[test]
    fn vec_producer_stops_at_end() {
        let mut producer = VecProducer::new(vec![1u8, 2]);
        assert_eq!(producer.front(0), Some(1));
        producer.advance();
        producer.advance();
        producer.advance();
        assert_eq!(producer.front(0), None);
        assert!(producer.is_exhausted());
        assert_eq!(producer.position(), 2);
    }
}
