//! End-to-end runs of the capture pipeline.

use clockflow::domain::ClockDomain;
use clockflow::SimError;
use clockflow_camlink::capture::{Backpressure, ConsumerMode, OverflowPolicy};
use clockflow_camlink::pipeline::{PipelineSettings, Side};
use clockflow_camlink::sample::Sample;
use clockflow_camlink::simulation::Simulation;
use clockflow_camlink::sink::{Consumer, DecodingConsumer, ThrottledConsumer};
use clockflow_camlink::source::VecProducer;
use clockflow_std::{DeviceTiming, DramFifoConfig};
use itertools::Itertools;

const READ_THRESHOLD: usize = 4;

fn settings(producer_ps: u64, consumer_ps: u64) -> PipelineSettings {
    PipelineSettings {
        memory: DeviceTiming {
            write_queue_depth: 4,
            read_queue_depth: 4,
            latency: 5,
            refresh_interval: 100,
            refresh_cycles: 6,
        },
        ring_buffer: DramFifoConfig { base: 0x1000, depth: 64, write_threshold: 4, read_threshold: READ_THRESHOLD },
        ..PipelineSettings::new(
            ClockDomain::new("producer", producer_ps).unwrap(),
            ClockDomain::new("consumer", consumer_ps).unwrap(),
        )
    }
}

fn producer(count: u32) -> VecProducer<Sample> { VecProducer::new((0..count).map(Sample::with_payload).collect()) }

fn decoder() -> DecodingConsumer { DecodingConsumer::new(Default::default(), true) }

fn payloads(consumer: &DecodingConsumer) -> Vec<u32> { consumer.samples().iter().map(Sample::payload).collect() }

/// Samples the consumer eventually sees when `accepted` samples entered the queue: complete words only, minus the
/// words kept below the read threshold.
fn delivered_samples(accepted: u64) -> usize { (accepted as usize / 4).saturating_sub(READ_THRESHOLD) * 4 }

fn run<C: Consumer>(simulation: &mut Simulation<VecProducer<Sample>, C>, producer_cycles: u64) {
    simulation.run_cycles(Side::Producer, producer_cycles).unwrap();
}

#[test]
fn fast_producer_with_backpressure_loses_nothing() {
    let mut settings = settings(8000, 12000);
    settings.backpressure = Backpressure::Honor;
    settings.overflow = OverflowPolicy::Halt;
    let mut simulation = Simulation::new(settings, producer(400), decoder()).unwrap();
    run(&mut simulation, 2000);

    let stats = simulation.pipeline().stats().clone();
    assert!(simulation.producer().is_exhausted());
    assert!(stats.full_cycles > 0);
    assert!(stats.producer_stalls > 0);
    assert_eq!(stats.samples_dropped, 0);
    assert!(!simulation.pipeline().overflow());

    assert_eq!(stats.samples_accepted, 400);
    assert_eq!(stats.words_written, 100);
    assert_eq!(payloads(simulation.consumer()), (0..384).collect_vec());
    assert_eq!(simulation.consumer().gaps(), 0);
    assert_eq!(simulation.pipeline().status().ring_level, READ_THRESHOLD);
}

#[test]
fn fast_producer_without_backpressure_drops_newest() {
    let mut simulation = Simulation::new(settings(8000, 12000), producer(400), decoder()).unwrap();
    run(&mut simulation, 2000);

    let stats = simulation.pipeline().stats().clone();
    assert!(simulation.pipeline().overflow());
    assert!(stats.samples_dropped > 0);
    assert_eq!(stats.samples_offered, 400);
    assert_eq!(stats.samples_accepted + stats.samples_dropped, 400);
    assert_eq!(stats.producer_stalls, 0);

    // What survives is an ordered subsequence of the input.
    let delivered = payloads(simulation.consumer());
    assert_eq!(delivered.len(), delivered_samples(stats.samples_accepted));
    assert!(delivered.iter().tuple_windows().all(|(a, b)| a < b));
    assert!(simulation.consumer().gaps() > 0);
}

#[test]
fn fast_producer_halts_on_overflow() {
    let mut settings = settings(8000, 12000);
    settings.overflow = OverflowPolicy::Halt;
    let mut simulation = Simulation::new(settings, producer(400), decoder()).unwrap();

    let err = simulation.run_cycles(Side::Producer, 2000).unwrap_err();
    assert!(matches!(err, SimError::Overflow { ref domain, .. } if domain == "producer"));
    let status = simulation.pipeline().status();
    assert!(status.halted && status.overflow);
    assert_eq!(simulation.pipeline().stats().samples_dropped, 1);

    // Nothing is captured after the alarm.
    let accepted = simulation.pipeline().stats().samples_accepted;
    run(&mut simulation, 100);
    assert_eq!(simulation.pipeline().stats().samples_accepted, accepted);
}

#[test]
fn slow_producer_never_fills_queue() {
    let mut settings = settings(12000, 8000);
    settings.dcq.depth = 8;
    let mut simulation = Simulation::new(settings, producer(400), decoder()).unwrap();
    run(&mut simulation, 1000);

    let stats = simulation.pipeline().stats();
    assert!(!simulation.pipeline().overflow());
    assert_eq!(stats.full_cycles, 0);
    assert_eq!(stats.samples_accepted, 400);
    assert_eq!(payloads(simulation.consumer()), (0..384).collect_vec());
}

#[test]
fn partial_word_is_held() {
    let mut settings = settings(10000, 10000);
    settings.backpressure = Backpressure::Honor;
    let mut simulation = Simulation::new(settings, producer(42), decoder()).unwrap();
    run(&mut simulation, 500);

    let status = simulation.pipeline().status();
    assert_eq!(status.pending_lanes, 2);
    assert_eq!(simulation.pipeline().stats().words_written, 10);
    assert_eq!(payloads(simulation.consumer()), (0..24).collect_vec());
}

fn throttled(mode: ConsumerMode) -> Simulation<VecProducer<Sample>, ThrottledConsumer<DecodingConsumer>> {
    let mut settings = settings(10000, 7000);
    settings.backpressure = Backpressure::Honor;
    settings.consumer_mode = mode;
    let mut simulation =
        Simulation::new(settings, producer(200), ThrottledConsumer::new(decoder(), 1, 4)).unwrap();
    run(&mut simulation, 1000);
    simulation
}

#[test]
fn consumer_backpressure_is_honored() {
    let simulation = throttled(ConsumerMode::Honor);
    let stats = simulation.pipeline().stats();
    assert_eq!(stats.egress_dropped, 0);
    assert_eq!(stats.words_delivered, 46);
    assert_eq!(payloads(simulation.consumer().inner()), (0..184).collect_vec());
}

#[test]
fn always_ready_egress_loses_words_to_slow_consumer() {
    let simulation = throttled(ConsumerMode::AlwaysReady);
    let stats = simulation.pipeline().stats();
    assert!(stats.egress_dropped > 0);
    assert_eq!(stats.words_delivered + stats.egress_dropped, 46);

    let delivered = payloads(simulation.consumer().inner());
    assert_eq!(delivered.len() as u64, stats.words_delivered * 4);
    assert!(delivered.iter().tuple_windows().all(|(a, b)| a < b));
}

fn reset_mid_stream(side: Side) {
    let mut settings = settings(9000, 11000);
    settings.backpressure = Backpressure::Honor;
    let mut simulation = Simulation::new(settings, producer(400), decoder()).unwrap();
    run(&mut simulation, 150);

    let before = payloads(simulation.consumer());
    let resume = simulation.producer().position() as u32;
    assert!(!before.is_empty());
    assert_eq!(before, (0..before.len() as u32).collect_vec());

    simulation.set_reset(side, true);
    let status = simulation.pipeline().status();
    assert_eq!((status.dcq_wptr, status.dcq_rptr), (0, 0));
    assert_eq!((status.dcq_write_level, status.dcq_read_level), (0, 0));
    assert_eq!(status.pending_lanes, 0);
    assert_eq!((status.ring_level, status.ring_write_address, status.ring_read_address), (0, 0, 0));
    assert_eq!(status.outstanding_reads, 0);
    assert!(status.producer_in_reset && status.consumer_in_reset);

    run(&mut simulation, 10);
    assert_eq!(simulation.consumer().samples().len(), before.len());
    simulation.set_reset(side, false);
    run(&mut simulation, 3000);
    assert!(!simulation.pipeline().in_reset(Side::Producer));
    assert!(!simulation.pipeline().in_reset(Side::Consumer));

    // After reset, delivery restarts with the first sample offered after release.
    let after = payloads(simulation.consumer())[before.len()..].to_vec();
    assert_eq!(after, (resume..resume + delivered_samples(u64::from(400 - resume)) as u32).collect_vec());
    assert_eq!(simulation.pipeline().stats().resets, 1);
}

#[test]
fn producer_reset_mid_stream() { reset_mid_stream(Side::Producer); }

#[test]
fn consumer_reset_mid_stream() { reset_mid_stream(Side::Consumer); }

#[test]
fn metastable_crossing_keeps_order() {
    for seed in 0..4 {
        let mut settings = settings(7919, 10007);
        settings.producer_clock = settings.producer_clock.clone().with_phase(1234 * seed);
        settings.backpressure = Backpressure::Honor;
        settings.metastability_window_ps = 2000;
        settings.seed = seed;
        let mut simulation = Simulation::new(settings, producer(1000), decoder()).unwrap();
        run(&mut simulation, 3000);

        assert!(simulation.producer().is_exhausted());
        assert_eq!(payloads(simulation.consumer()), (0..984).collect_vec());
    }
}
