//! Run report.

use std::fmt;

use itertools::Itertools;
use linked_hash_map::LinkedHashMap;

use crate::pipeline::{PipelineStats, PipelineStatus};

/// Ordered list of named sections of `key: value` lines.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    sections: LinkedHashMap<String, LinkedHashMap<String, String>>,
}

impl Report {
    /// Creates an empty report.
    pub fn new() -> Self { Self::default() }

    /// Sets `key` in `section`, appending both if new.
    pub fn insert(&mut self, section: &str, key: &str, value: impl ToString) {
        let entries = self.sections.entry(section.to_string()).or_insert_with(LinkedHashMap::new);
        // `insert` would move an existing key to the back.
        match entries.get_mut(key) {
            Some(slot) => *slot = value.to_string(),
            None => {
                entries.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Returns the value of `key` in `section`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    /// Appends the pipeline counters.
    pub fn stats(&mut self, stats: &PipelineStats) {
        let section = "stats";
        self.insert(section, "samples_offered", stats.samples_offered);
        self.insert(section, "samples_accepted", stats.samples_accepted);
        self.insert(section, "samples_dropped", stats.samples_dropped);
        self.insert(section, "producer_stalls", stats.producer_stalls);
        self.insert(section, "samples_transferred", stats.samples_transferred);
        self.insert(section, "words_written", stats.words_written);
        self.insert(section, "words_read", stats.words_read);
        self.insert(section, "words_delivered", stats.words_delivered);
        self.insert(section, "egress_dropped", stats.egress_dropped);
        self.insert(section, "full_cycles", stats.full_cycles);
        self.insert(section, "resets", stats.resets);
    }

    /// Appends the pipeline status.
    pub fn status(&mut self, status: &PipelineStatus) {
        let section = "status";
        self.insert(section, "dcq_pointers", format!("w={} r={}", status.dcq_wptr, status.dcq_rptr));
        self.insert(section, "dcq_levels", format!("w={} r={}", status.dcq_write_level, status.dcq_read_level));
        self.insert(section, "pending_lanes", status.pending_lanes);
        self.insert(section, "ring_level", status.ring_level);
        self.insert(
            section,
            "ring_addresses",
            format!("w={:#x} r={:#x}", status.ring_write_address, status.ring_read_address),
        );
        self.insert(section, "outstanding_reads", status.outstanding_reads);
        self.insert(section, "overflow", status.overflow);
        self.insert(section, "halted", status.halted);
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.sections.values().flat_map(|entries| entries.keys()).map(String::len).max().unwrap_or(0);
        let text = self
            .sections
            .iter()
            .map(|(section, entries)| {
                let lines = entries.iter().map(|(key, value)| format!("  {key:width$}  {value}")).join("\n");
                format!("[{section}]\n{lines}")
            })
            .join("\n\n");
        write!(f, "{text}")
    }
}
