//! Wide word consumers.

use std::fmt::Debug;

use clockflow::*;
use clockflow_std::converter::{unpack, ConverterConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sample::Sample;

/// Sink of wide words clocked by the consumer domain.
pub trait Consumer: Debug {
    /// Returns whether the consumer takes a word in `cycle`.
    fn ready(&mut self, cycle: u64) -> bool;

    /// Takes a word.
    fn accept(&mut self, word: u128);
}

/// Always-ready consumer keeping every word.
#[derive(Debug, Default, Clone)]
pub struct CollectingConsumer {
    words: Vec<u128>,
}

impl CollectingConsumer {
    /// Creates an empty consumer.
    pub fn new() -> Self { Self::default() }

    /// Returns the words taken so far.
    pub fn words(&self) -> &[u128] { &self.words }
}

impl Consumer for CollectingConsumer {
    fn ready(&mut self, _cycle: u64) -> bool { true }

    fn accept(&mut self, word: u128) { self.words.push(word); }
}

/// Consumer that is ready in `on` out of every `period` cycles.
#[derive(Debug, Clone)]
pub struct ThrottledConsumer<C: Consumer> {
    inner: C,
    on: u64,
    period: u64,
}

impl<C: Consumer> ThrottledConsumer<C> {
    /// Wraps `inner`.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(inner: C, on: u64, period: u64) -> Self {
        assert!(period > 0, "throttle period must be non-zero");
        Self { inner, on, period }
    }

    /// Returns the wrapped consumer.
    pub fn inner(&self) -> &C { &self.inner }
}

impl<C: Consumer> Consumer for ThrottledConsumer<C> {
    fn ready(&mut self, cycle: u64) -> bool { cycle % self.period < self.on && self.inner.ready(cycle) }

    fn accept(&mut self, word: u128) { self.inner.accept(word) }
}

/// Consumer that is ready with a fixed probability in each cycle.
#[derive(Debug, Clone)]
pub struct RandomConsumer<C: Consumer> {
    inner: C,
    probability: f64,
    rng: StdRng,
}

impl<C: Consumer> RandomConsumer<C> {
    /// Wraps `inner`. `probability` is clamped to `[0, 1]`, and NaN counts as 0.
    pub fn new(inner: C, probability: f64, seed: u64) -> Self {
        Self { inner, probability: probability.max(0.0).min(1.0), rng: StdRng::seed_from_u64(seed) }
    }

    /// Returns the wrapped consumer.
    pub fn inner(&self) -> &C { &self.inner }
}

impl<C: Consumer> Consumer for RandomConsumer<C> {
    fn ready(&mut self, cycle: u64) -> bool { self.rng.gen_bool(self.probability) && self.inner.ready(cycle) }

    fn accept(&mut self, word: u128) { self.inner.accept(word) }
}

/// Consumer splitting words back into samples and checking the counter carried by active pixels.
#[derive(Debug, Clone)]
pub struct DecodingConsumer {
    config: ConverterConfig,
    samples: Vec<Sample>,
    keep: bool,
    words: u64,
    active: u64,
    gaps: u64,
    expected: Option<u32>,
}

impl DecodingConsumer {
    /// Creates a consumer for words packed with `config`. Decoded samples are kept if `keep` is set.
    pub fn new(config: ConverterConfig, keep: bool) -> Self {
        Self { config, samples: vec![], keep, words: 0, active: 0, gaps: 0, expected: None }
    }

    /// Returns the decoded samples, if kept.
    pub fn samples(&self) -> &[Sample] { &self.samples }

    /// Number of words taken.
    pub fn words(&self) -> u64 { self.words }

    /// Number of active pixels decoded.
    pub fn active(&self) -> u64 { self.active }

    /// Number of discontinuities in the active pixel counter.
    pub fn gaps(&self) -> u64 { self.gaps }
}

impl Consumer for DecodingConsumer {
    fn ready(&mut self, _cycle: u64) -> bool { true }

    fn accept(&mut self, word: u128) {
        self.words += 1;
        for lane in unpack(word, &self.config) {
            let sample = Sample::from_u128(lane);
            if sample.de {
                let payload = sample.payload();
                if self.expected.map_or(false, |expected| expected != payload) {
                    self.gaps += 1;
                }
                self.expected = Some((payload + 1) & 0x00ff_ffff);
                self.active += 1;
            }
            if self.keep {
                self.samples.push(sample);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clockflow_std::converter::pack;

    use super::*;

    fn word(payloads: &[u32]) -> u128 {
        let lanes = payloads.iter().map(|p| Sample::with_payload(*p).to_u128()).collect::<Vec<_>>();
        pack(&lanes, &ConverterConfig::default())
    }

    #[test]
    fn decoding_counts_gaps() {
        let mut consumer = DecodingConsumer::new(ConverterConfig::default(), true);
        consumer.accept(word(&[0, 1, 2, 3]));
        consumer.accept(word(&[4, 5, 6, 7]));
        assert_eq!(consumer.gaps(), 0);

        consumer.accept(word(&[12, 13, 14, 15]));
        assert_eq!(consumer.gaps(), 1);
        assert_eq!(consumer.active(), 12);
        assert_eq!(consumer.words(), 3);
        assert_eq!(consumer.samples()[4], Sample::with_payload(4));
    }

    #[test]
    fn throttle_pattern() {
        let mut consumer = ThrottledConsumer::new(CollectingConsumer::new(), 2, 3);
        let pattern = (0..6).map(|cycle| consumer.ready(cycle)).collect::<Vec<_>>();
        assert_eq!(pattern, vec![true, true, false, true, true, false]);
        consumer.accept(7);
        assert_eq!(consumer.inner().words(), &[7]);
    }

    #[test]
    fn random_consumer_extremes() {
        let mut never = RandomConsumer::new(CollectingConsumer::new(), 0.0, 1);
        let mut always = RandomConsumer::new(CollectingConsumer::new(), 2.0, 1);
        let mut nan = RandomConsumer::new(CollectingConsumer::new(), f64::NAN, 1);
        assert!((0..100).all(|cycle| !never.ready(cycle) && always.ready(cycle) && !nan.ready(cycle)));
    }
}
