//! Discrete-event driver.

use clockflow::domain::{DomainId, Edge, Scheduler};
use clockflow::{some_or, SimError};
use tracing::debug;

use crate::pipeline::{Pipeline, PipelineSettings, Side};
use crate::report::Report;
use crate::sample::Sample;
use crate::sink::Consumer;
use crate::source::Producer;

/// Pipeline clocked by a scheduler, with a producer and a consumer attached.
#[derive(Debug)]
pub struct Simulation<P: Producer<Sample>, C: Consumer> {
    scheduler: Scheduler,
    producer_domain: DomainId,
    consumer_domain: DomainId,
    pipeline: Pipeline,
    producer: P,
    consumer: C,
}

impl<P: Producer<Sample>, C: Consumer> Simulation<P, C> {
    /// Creates a simulation at time 0.
    pub fn new(settings: PipelineSettings, producer: P, consumer: C) -> Result<Self, SimError> {
        let mut scheduler = Scheduler::new();
        let producer_domain = scheduler.add(settings.producer_clock.clone());
        let consumer_domain = scheduler.add(settings.consumer_clock.clone());
        let pipeline = Pipeline::new(settings)?;
        Ok(Self { scheduler, producer_domain, consumer_domain, pipeline, producer, consumer })
    }

    /// Returns the pipeline.
    pub fn pipeline(&self) -> &Pipeline { &self.pipeline }

    /// Returns the producer.
    pub fn producer(&self) -> &P { &self.producer }

    /// Returns the consumer.
    pub fn consumer(&self) -> &C { &self.consumer }

    /// Returns the scheduler.
    pub fn scheduler(&self) -> &Scheduler { &self.scheduler }

    /// Returns the current time.
    pub fn now_ps(&self) -> u64 { self.scheduler.now_ps() }

    /// Returns the number of edges a side has seen.
    pub fn cycles(&self, side: Side) -> u64 { self.scheduler.cycles(self.domain(side)) }

    fn domain(&self, side: Side) -> DomainId {
        match side {
            Side::Producer => self.producer_domain,
            Side::Consumer => self.consumer_domain,
        }
    }

    /// Drives the reset request of a side.
    pub fn set_reset(&mut self, side: Side, asserted: bool) {
        let now = self.scheduler.now_ps();
        self.pipeline.set_reset(side, asserted, now);
    }

    /// Processes the next edge.
    pub fn step(&mut self) -> Result<Edge, SimError> {
        let edge = some_or!(self.scheduler.next_edge(), unreachable!("both clock domains are registered"));
        if edge.domain == self.producer_domain {
            self.pipeline.producer_edge(&mut self.producer, &edge)?;
        } else {
            self.pipeline.consumer_edge(&mut self.consumer, &edge);
        }
        Ok(edge)
    }

    /// Processes every edge up to and including `time_ps`.
    pub fn run_until(&mut self, time_ps: u64) -> Result<(), SimError> {
        while self.scheduler.peek().map_or(false, |edge| edge.time_ps <= time_ps) {
            self.step()?;
        }
        Ok(())
    }

    /// Processes edges until `side` has seen `cycles` more edges.
    pub fn run_cycles(&mut self, side: Side, cycles: u64) -> Result<(), SimError> {
        let target = self.cycles(side) + cycles;
        while self.cycles(side) < target {
            self.step()?;
        }
        debug!(side = %side, cycles, time_ps = self.now_ps(), "ran cycles");
        Ok(())
    }

    /// Builds a report of the run so far.
    pub fn report(&self) -> Report {
        let mut report = Report::new();
        report.insert("time", "elapsed_ps", self.now_ps());
        report.insert("time", "producer_cycles", self.cycles(Side::Producer));
        report.insert("time", "consumer_cycles", self.cycles(Side::Consumer));
        report.insert("clocks", "producer", self.scheduler.domain(self.producer_domain));
        report.insert("clocks", "consumer", self.scheduler.domain(self.consumer_domain));
        report.stats(self.pipeline.stats());
        report.status(&self.pipeline.status());
        report
    }
}

#[cfg(test)]
mod tests {
    use clockflow::domain::ClockDomain;
    use clockflow::ConfigError;

    use super::*;
    use crate::sink::CollectingConsumer;
    use crate::source::VecProducer;

    fn simulation() -> Simulation<VecProducer<Sample>, CollectingConsumer> {
        let settings = PipelineSettings::new(
            ClockDomain::new("producer", 3000).unwrap(),
            ClockDomain::new("consumer", 2000).unwrap(),
        );
        Simulation::new(settings, VecProducer::new(vec![Sample::pixel(1, 2, 3); 8]), CollectingConsumer::new())
            .unwrap()
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut settings = PipelineSettings::new(
            ClockDomain::new("producer", 3000).unwrap(),
            ClockDomain::new("consumer", 2000).unwrap(),
        );
        settings.dcq.depth = 3;
        let err = Simulation::new(settings, VecProducer::<Sample>::new(vec![]), CollectingConsumer::new()).unwrap_err();
        assert_eq!(err, SimError::Config(ConfigError::DepthNotPowerOfTwo { depth: 3 }));
    }

    #[test]
    fn edges_are_interleaved_in_time() {
        let mut sim = simulation();
        let times = (0..6).map(|_| sim.step().unwrap().time_ps).collect::<Vec<_>>();
        assert_eq!(times, vec![0, 0, 2000, 3000, 4000, 6000]);
        assert_eq!(sim.cycles(Side::Producer), 3);
        assert_eq!(sim.cycles(Side::Consumer), 3);
    }

    #[test]
    fn run_until_is_inclusive() {
        let mut sim = simulation();
        sim.run_until(12_000).unwrap();
        assert_eq!(sim.now_ps(), 12_000);
        assert_eq!(sim.cycles(Side::Producer), 5);
        assert_eq!(sim.cycles(Side::Consumer), 7);

        sim.run_cycles(Side::Consumer, 3).unwrap();
        assert_eq!(sim.cycles(Side::Consumer), 10);
        assert_eq!(sim.now_ps(), 18_000);
    }

    #[test]
    fn report_has_every_section() {
        let mut sim = simulation();
        sim.run_cycles(Side::Producer, 20).unwrap();
        let report = sim.report();
        assert_eq!(report.get("time", "producer_cycles"), Some("20"));
        assert_eq!(report.get("stats", "samples_offered"), Some("8"));
        assert_eq!(report.get("status", "overflow"), Some("false"));
        assert!(report.to_string().starts_with("[time]\n"));
    }
}
