//! Width converters.
//!
//! [`UpConverter`] packs `ratio` narrow samples into one wide word; [`DownConverter`] splits a wide word back into
//! its samples. Each sample occupies one `lane_bits`-wide lane, zero-extended from its [`Signal`] bits. With
//! [`LaneOrder::LsbFirst`] the first sample of a word sits in bits `[0, lane_bits)`.
//!
//! An incomplete word is never emitted: its lanes stay in the converter until the remaining samples arrive.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::*;

/// Position of the first sample in a wide word.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneOrder {
    /// First sample in the least significant lane.
    #[default]
    LsbFirst,
    /// First sample in the most significant lane.
    MsbFirst,
}

/// Width converter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Width of one lane.
    pub lane_bits: usize,
    /// Lanes per wide word.
    pub ratio: usize,
    /// Lane of the first sample.
    pub lane_order: LaneOrder,
}

impl Default for ConverterConfig {
    fn default() -> Self { Self { lane_bits: 32, ratio: 4, lane_order: LaneOrder::LsbFirst } }
}

impl ConverterConfig {
    /// Returns the wide word width.
    pub fn word_bits(&self) -> usize { self.lane_bits * self.ratio }

    /// Checks that samples of type `V` fit the configured lanes.
    pub fn validate<V: Signal>(&self) -> Result<(), ConfigError> {
        if self.ratio == 0 {
            return Err(ConfigError::ZeroRatio);
        }
        if V::WIDTH > self.lane_bits || self.lane_bits == 0 {
            return Err(ConfigError::LaneTooNarrow { width: V::WIDTH, lane_bits: self.lane_bits });
        }
        if self.word_bits() > 128 {
            return Err(ConfigError::WordTooWide { bits: self.word_bits() });
        }
        Ok(())
    }

    fn shift(&self, index: usize) -> usize {
        match self.lane_order {
            LaneOrder::LsbFirst => index * self.lane_bits,
            LaneOrder::MsbFirst => (self.ratio - 1 - index) * self.lane_bits,
        }
    }
}

/// Packs lanes, first lane first, into a wide word.
pub fn pack(lanes: &[u128], config: &ConverterConfig) -> u128 {
    assert!(lanes.len() <= config.ratio);
    lanes.iter().enumerate().fold(0, |word, (i, lane)| word | ((lane & mask(config.lane_bits)) << config.shift(i)))
}

/// Splits a wide word into its lanes, first lane first.
pub fn unpack(word: u128, config: &ConverterConfig) -> Vec<u128> {
    (0..config.ratio).map(|i| (word >> config.shift(i)) & mask(config.lane_bits)).collect()
}

/// Up converter with a one-word output register.
#[derive(Debug, Clone)]
pub struct UpConverter<V: Signal> {
    config: ConverterConfig,
    acc: u128,
    count: usize,
    out: Option<u128>,
    _marker: std::marker::PhantomData<V>,
}

impl<V: Signal> UpConverter<V> {
    /// Creates an empty converter.
    pub fn new(config: ConverterConfig) -> Result<Self, ConfigError> {
        config.validate::<V>()?;
        debug!(lane_bits = config.lane_bits, ratio = config.ratio, "created up converter");
        Ok(Self { config, acc: 0, count: 0, out: None, _marker: std::marker::PhantomData })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ConverterConfig { &self.config }

    /// Returns the number of samples held in the incomplete word.
    pub fn pending_lanes(&self) -> usize { self.count }

    fn ready(&self, o_bwd: &Ready) -> bool { self.out.is_none() || o_bwd.ready }
}

impl<V: Signal> Module for UpConverter<V> {
    type I = VrChannel<V>;
    type O = VrChannel<u128>;

    fn name(&self) -> &str { "up_converter" }

    fn comb(&self, _i_fwd: &Valid<V>, o_bwd: &Ready) -> (Valid<u128>, Ready) {
        (Valid::from(self.out), Ready::new(self.ready(o_bwd)))
    }

    fn tick(&mut self, i_fwd: &Valid<V>, o_bwd: &Ready) {
        let ready = self.ready(o_bwd);
        if o_bwd.ready {
            self.out = None;
        }
        if i_fwd.valid && ready {
            self.acc |= i_fwd.inner.to_u128() << self.config.shift(self.count);
            self.count += 1;
            if self.count == self.config.ratio {
                trace!(word = self.acc, "up converter completed a word");
                self.out = Some(self.acc);
                self.acc = 0;
                self.count = 0;
            }
        }
    }

    fn reset(&mut self) {
        self.acc = 0;
        self.count = 0;
        self.out = None;
    }
}

/// Down converter emitting one lane per cycle.
#[derive(Debug, Clone)]
pub struct DownConverter<V: Signal> {
    config: ConverterConfig,
    word: Option<u128>,
    index: usize,
    _marker: std::marker::PhantomData<V>,
}

impl<V: Signal> DownConverter<V> {
    /// Creates an empty converter.
    pub fn new(config: ConverterConfig) -> Result<Self, ConfigError> {
        config.validate::<V>()?;
        Ok(Self { config, word: None, index: 0, _marker: std::marker::PhantomData })
    }

    fn last_lane(&self) -> bool { self.index + 1 == self.config.ratio }

    fn ready(&self, o_bwd: &Ready) -> bool { self.word.is_none() || (o_bwd.ready && self.last_lane()) }
}

impl<V: Signal> Module for DownConverter<V> {
    type I = VrChannel<u128>;
    type O = VrChannel<V>;

    fn name(&self) -> &str { "down_converter" }

    fn comb(&self, _i_fwd: &Valid<u128>, o_bwd: &Ready) -> (Valid<V>, Ready) {
        let o_fwd = match self.word {
            Some(word) => {
                let lane = (word >> self.config.shift(self.index)) & mask(self.config.lane_bits);
                Valid::valid(V::from_u128(lane))
            }
            None => Valid::invalid(),
        };
        (o_fwd, Ready::new(self.ready(o_bwd)))
    }

    fn tick(&mut self, i_fwd: &Valid<u128>, o_bwd: &Ready) {
        let ready = self.ready(o_bwd);
        if self.word.is_some() && o_bwd.ready {
            if self.last_lane() {
                self.word = None;
                self.index = 0;
            } else {
                self.index += 1;
            }
        }
        if i_fwd.valid && ready {
            self.word = Some(i_fwd.inner);
            self.index = 0;
        }
    }

    fn reset(&mut self) {
        self.word = None;
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn up(config: ConverterConfig) -> UpConverter<u16> { UpConverter::new(config).unwrap() }

    #[test]
    fn rejects_bad_configs() {
        let config = ConverterConfig { lane_bits: 8, ..Default::default() };
        assert!(matches!(config.validate::<u16>(), Err(ConfigError::LaneTooNarrow { width: 16, lane_bits: 8 })));
        let config = ConverterConfig { lane_bits: 64, ratio: 3, ..Default::default() };
        assert!(matches!(config.validate::<u16>(), Err(ConfigError::WordTooWide { bits: 192 })));
        let config = ConverterConfig { ratio: 0, ..Default::default() };
        assert!(matches!(config.validate::<u16>(), Err(ConfigError::ZeroRatio)));
        assert!(ConverterConfig::default().validate::<u32>().is_ok());
    }

    #[test]
    fn packs_complete_words_only() {
        let mut m = up(ConverterConfig::default());
        let ready = Ready::new(true);
        let mut words = vec![];
        for sample in 1..=10u16 {
            let (o_fwd, i_bwd) = m.comb(&Valid::valid(sample), &ready);
            assert!(i_bwd.ready);
            words.extend(o_fwd.into_option());
            m.tick(&Valid::valid(sample), &ready);
        }
        words.extend(m.comb(&Valid::invalid(), &ready).0.into_option());
        m.tick(&Valid::invalid(), &ready);

        assert_eq!(words, vec![pack(&[1, 2, 3, 4], m.config()), pack(&[5, 6, 7, 8], m.config())]);
        assert_eq!(words[0], 0x0000_0004_0000_0003_0000_0002_0000_0001);
        assert_eq!(m.pending_lanes(), 2);
        assert!(!m.comb(&Valid::invalid(), &ready).0.valid);

        // The remainder is emitted once completed.
        for sample in 11..=12u16 {
            m.tick(&Valid::valid(sample), &ready);
        }
        assert_eq!(unpack(m.comb(&Valid::invalid(), &ready).0.inner, m.config()), vec![9, 10, 11, 12]);
    }

    #[test]
    fn msb_first_puts_first_sample_high() {
        let config = ConverterConfig { lane_bits: 16, ratio: 2, lane_order: LaneOrder::MsbFirst };
        let mut m = up(config);
        m.tick(&Valid::valid(0xaaaa), &Ready::new(false));
        m.tick(&Valid::valid(0x5555), &Ready::new(false));
        assert_eq!(m.comb(&Valid::invalid(), &Ready::new(false)).0, Valid::valid(0xaaaa_5555));
        assert_eq!(unpack(0xaaaa_5555, &config), vec![0xaaaa, 0x5555]);
    }

    #[test]
    fn holds_word_under_backpressure() {
        let config = ConverterConfig { lane_bits: 16, ratio: 2, lane_order: LaneOrder::LsbFirst };
        let mut m = up(config);
        let stalled = Ready::new(false);
        m.tick(&Valid::valid(1), &stalled);
        m.tick(&Valid::valid(2), &stalled);

        // Output register full and stalled: the third sample is refused.
        let (o_fwd, i_bwd) = m.comb(&Valid::valid(3), &stalled);
        assert_eq!(o_fwd, Valid::valid(0x0002_0001));
        assert!(!i_bwd.ready);
        m.tick(&Valid::valid(3), &stalled);
        assert_eq!(m.pending_lanes(), 0);

        // Draining frees the register in the same cycle.
        assert!(m.comb(&Valid::valid(3), &Ready::new(true)).1.ready);
        m.tick(&Valid::valid(3), &Ready::new(true));
        m.tick(&Valid::valid(4), &stalled);
        assert_eq!(m.comb(&Valid::invalid(), &stalled).0, Valid::valid(0x0004_0003));
    }

    #[test]
    fn down_converter_inverts_up_converter() {
        for lane_order in [LaneOrder::LsbFirst, LaneOrder::MsbFirst] {
            let config = ConverterConfig { lane_bits: 16, ratio: 4, lane_order };
            let mut m = up(config).chain(DownConverter::<u16>::new(config).unwrap());

            let input = (0..64u16).map(|i| i.wrapping_mul(0x9e37)).collect::<Vec<_>>();
            let mut output = vec![];
            let mut next = 0;
            for cycle in 0..400 {
                let fwd = Valid::from(input.get(next).copied());
                let ready = Ready::new(cycle % 3 != 0);
                let (o_fwd, i_bwd) = m.comb(&fwd, &ready);
                if o_fwd.valid && ready.ready {
                    output.push(o_fwd.inner);
                }
                if fwd.valid && i_bwd.ready {
                    next += 1;
                }
                m.tick(&fwd, &ready);
            }
            assert_eq!(output, input);
        }
    }
}
