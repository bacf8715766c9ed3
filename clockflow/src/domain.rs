//! Clock domains and the edge scheduler.
//!
//! Each domain is a free-running clock described by its period and the time of its first active edge. The
//! [`Scheduler`] merges the edges of all registered domains into one stream ordered by simulated time. Edges falling
//! on the same instant are yielded in domain registration order.

use std::fmt;

use itertools::Itertools;
use tracing::trace;

use crate::*;

/// Picoseconds per second.
const PS_PER_SECOND: f64 = 1e12;

/// Identifier of a domain registered in a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId(usize);

impl DomainId {
    /// Returns the registration index.
    pub fn index(self) -> usize { self.0 }
}

/// Free-running clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockDomain {
    name: String,
    period_ps: u64,
    phase_ps: u64,
}

impl ClockDomain {
    /// Creates a clock whose first active edge is at time 0.
    pub fn new(name: &str, period_ps: u64) -> Result<Self, ConfigError> {
        if period_ps == 0 {
            return Err(ConfigError::ZeroPeriod { name: name.to_string() });
        }
        Ok(Self { name: name.to_string(), period_ps, phase_ps: 0 })
    }

    /// Creates a clock from its frequency. The period is rounded to the nearest picosecond.
    pub fn from_frequency(name: &str, hz: f64) -> Result<Self, ConfigError> {
        let period = PS_PER_SECOND / hz;
        if !hz.is_finite() || hz <= 0.0 || period.round() < 1.0 {
            return Err(ConfigError::InvalidFrequency { name: name.to_string(), hz });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let period_ps = period.round() as u64;
        Self::new(name, period_ps)
    }

    /// Delays the first active edge by `phase_ps`, taken modulo the period.
    pub fn with_phase(mut self, phase_ps: u64) -> Self {
        self.phase_ps = phase_ps % self.period_ps;
        self
    }

    /// Returns the domain name.
    pub fn name(&self) -> &str { &self.name }

    /// Returns the clock period.
    pub fn period_ps(&self) -> u64 { self.period_ps }

    /// Returns the time of the first active edge.
    pub fn phase_ps(&self) -> u64 { self.phase_ps }

    /// Returns the clock frequency.
    #[allow(clippy::cast_precision_loss)]
    pub fn frequency_hz(&self) -> f64 { PS_PER_SECOND / self.period_ps as f64 }

    /// Returns the time of the `cycle`-th active edge.
    pub fn edge_time(&self, cycle: u64) -> u64 { self.phase_ps + cycle * self.period_ps }
}

impl fmt::Display for ClockDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} ps", self.name, self.period_ps)?;
        if self.phase_ps != 0 {
            write!(f, ", +{} ps", self.phase_ps)?;
        }
        write!(f, ")")
    }
}

/// One active clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Domain that ticks.
    pub domain: DomainId,
    /// Simulated time of the edge.
    pub time_ps: u64,
    /// Number of edges of the same domain before this one.
    pub cycle: u64,
}

/// Discrete-event scheduler interleaving the edges of several clock domains.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    domains: Vec<ClockDomain>,
    next_cycle: Vec<u64>,
    now_ps: u64,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self { Self::default() }

    /// Registers a domain. Its first edge is scheduled at its phase.
    pub fn add(&mut self, domain: ClockDomain) -> DomainId {
        let id = DomainId(self.domains.len());
        trace!(domain = %domain, "registered clock domain");
        self.domains.push(domain);
        self.next_cycle.push(0);
        id
    }

    /// Returns a registered domain.
    pub fn domain(&self, id: DomainId) -> &ClockDomain { &self.domains[id.0] }

    /// Returns the registered domains.
    pub fn domains(&self) -> &[ClockDomain] { &self.domains }

    /// Returns the time of the last yielded edge.
    pub fn now_ps(&self) -> u64 { self.now_ps }

    /// Returns the number of edges yielded so far by a domain.
    pub fn cycles(&self, id: DomainId) -> u64 { self.next_cycle[id.0] }

    /// Returns the next edge without consuming it.
    pub fn peek(&self) -> Option<Edge> {
        let index = (0..self.domains.len()).min_by_key(|&i| (self.domains[i].edge_time(self.next_cycle[i]), i))?;
        let cycle = self.next_cycle[index];
        Some(Edge { domain: DomainId(index), time_ps: self.domains[index].edge_time(cycle), cycle })
    }

    /// Consumes and returns the next edge.
    pub fn next_edge(&mut self) -> Option<Edge> {
        let edge = some_or!(self.peek(), return None);
        self.next_cycle[edge.domain.0] += 1;
        self.now_ps = edge.time_ps;
        Some(edge)
    }
}

impl Iterator for Scheduler {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> { self.next_edge() }
}

impl fmt::Display for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] @ {} ps", self.domains.iter().join(", "), self.now_ps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_clocks() {
        assert!(matches!(ClockDomain::new("a", 0), Err(ConfigError::ZeroPeriod { .. })));
        assert!(matches!(ClockDomain::from_frequency("a", 0.0), Err(ConfigError::InvalidFrequency { .. })));
        assert!(matches!(ClockDomain::from_frequency("a", f64::NAN), Err(ConfigError::InvalidFrequency { .. })));
        assert!(matches!(ClockDomain::from_frequency("a", 1e15), Err(ConfigError::InvalidFrequency { .. })));
    }

    #[test]
    fn frequency_rounds_to_picoseconds() {
        assert_eq!(ClockDomain::from_frequency("pix", 74.25e6).unwrap().period_ps(), 13468);
        assert_eq!(ClockDomain::from_frequency("sys", 81e6).unwrap().period_ps(), 12346);
        assert_eq!(ClockDomain::new("a", 10).unwrap().with_phase(23).phase_ps(), 3);
    }

    #[test]
    fn edges_are_time_ordered() {
        let mut scheduler = Scheduler::new();
        let fast = scheduler.add(ClockDomain::new("fast", 2).unwrap());
        let slow = scheduler.add(ClockDomain::new("slow", 3).unwrap().with_phase(1));

        let edges = scheduler.by_ref().take(6).map(|e| (e.domain, e.time_ps)).collect::<Vec<_>>();
        assert_eq!(edges, vec![(fast, 0), (slow, 1), (fast, 2), (fast, 4), (slow, 4), (fast, 6)]);
        assert_eq!(scheduler.cycles(fast), 4);
        assert_eq!(scheduler.cycles(slow), 2);
        assert_eq!(scheduler.now_ps(), 6);
    }

    #[test]
    fn simultaneous_edges_follow_registration_order() {
        let mut scheduler = Scheduler::new();
        let b = scheduler.add(ClockDomain::new("b", 5).unwrap());
        let a = scheduler.add(ClockDomain::new("a", 5).unwrap());

        let order = scheduler.take(4).map(|e| e.domain).collect::<Vec<_>>();
        assert_eq!(order, vec![b, a, b, a]);
    }

    #[test]
    fn empty_scheduler_has_no_edges() {
        assert_eq!(Scheduler::new().next(), None);
    }
}
