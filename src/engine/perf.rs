//! Named timing measurements.
//!
//! `start("simulation")` ... `end("simulation")` records one sample under the
//! label; repeated measurements of the same label aggregate into
//! average/count/total. Uses Tokio's clock so paused-time tests measure
//! virtual time.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Aggregate of all samples recorded under one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingStats {
    /// Mean sample.
    pub average: Duration,
    /// Number of samples.
    pub count: usize,
    /// Sum of samples.
    pub total: Duration,
}

/// Start/stop stopwatch keyed by label.
#[derive(Debug, Default)]
pub struct PerfMonitor {
    samples: HashMap<String, Vec<Duration>>,
    started: HashMap<String, Instant>,
}

impl PerfMonitor {
    /// Create an empty monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) timing `label`.
    pub fn start(&mut self, label: impl Into<String>) {
        self.started.insert(label.into(), Instant::now());
    }

    /// Stop timing `label` and record the sample.
    ///
    /// Returns `None` (and logs a warning) if `label` was never started.
    pub fn end(&mut self, label: &str) -> Option<Duration> {
        let Some(started) = self.started.remove(label) else {
            warn!(label, "no start time recorded for label");
            return None;
        };
        let elapsed = started.elapsed();
        self.samples
            .entry(label.to_string())
            .or_default()
            .push(elapsed);
        Some(elapsed)
    }

    /// Whether `label` is currently being timed.
    #[must_use]
    pub fn is_running(&self, label: &str) -> bool {
        self.started.contains_key(label)
    }

    /// Mean of all samples under `label`, zero if there are none.
    #[must_use]
    pub fn average(&self, label: &str) -> Duration {
        self.stats(label).map_or(Duration::ZERO, |s| s.average)
    }

    /// Aggregate for one label.
    #[must_use]
    pub fn stats(&self, label: &str) -> Option<TimingStats> {
        let samples = self.samples.get(label)?;
        if samples.is_empty() {
            return None;
        }
        let total: Duration = samples.iter().sum();
        #[allow(clippy::cast_possible_truncation)]
        let average = total / samples.len() as u32;
        Some(TimingStats {
            average,
            count: samples.len(),
            total,
        })
    }

    /// Aggregates for every label, sorted by label.
    #[must_use]
    pub fn report(&self) -> BTreeMap<String, TimingStats> {
        self.samples
            .keys()
            .filter_map(|label| self.stats(label).map(|s| (label.clone(), s)))
            .collect()
    }

    /// Drop all samples and running timers.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.started.clear();
    }
}
