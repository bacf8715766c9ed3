//! Video sample.

use clockflow::*;
use static_assertions::const_assert;

/// One pixel clock worth of video: control flags and a 24-bit RGB payload.
///
/// Layout (bit 0 first): `de`, `hsync`, `vsync`, `r[7:0]`, `g[7:0]`, `b[7:0]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Signal)]
pub struct Sample {
    /// Data enable. Set during active video.
    pub de: bool,
    /// Horizontal sync.
    pub hsync: bool,
    /// Vertical sync.
    pub vsync: bool,
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

// A sample must fit a 32-bit lane.
const_assert!(<Sample as Signal>::WIDTH <= 32);

impl Sample {
    /// Creates an active pixel.
    pub fn pixel(r: u8, g: u8, b: u8) -> Self { Self { de: true, hsync: false, vsync: false, r, g, b } }

    /// Creates a blanking sample.
    pub fn blank(hsync: bool, vsync: bool) -> Self { Self { hsync, vsync, ..Self::default() } }

    /// Creates an active pixel carrying a 24-bit value, red in the low byte.
    pub fn with_payload(payload: u32) -> Self {
        let [r, g, b, _] = payload.to_le_bytes();
        Self::pixel(r, g, b)
    }

    /// Returns the 24-bit payload, red in the low byte.
    pub fn payload(&self) -> u32 { u32::from_le_bytes([self.r, self.g, self.b, 0]) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let sample = Sample { de: true, hsync: false, vsync: true, r: 0x12, g: 0x34, b: 0x56 };
        assert_eq!(sample.to_u128(), 0b101 | (0x12 << 3) | (0x34 << 11) | (0x56 << 19));
        assert_eq!(Sample::from_u128(sample.to_u128()), sample);
    }

    #[test]
    fn payload() {
        let sample = Sample::with_payload(0x0056_3412);
        assert_eq!((sample.r, sample.g, sample.b), (0x12, 0x34, 0x56));
        assert_eq!(sample.payload(), 0x0056_3412);
        assert!(sample.de);
        assert_eq!(Sample::blank(true, false).payload(), 0);
    }
}
