use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// Apdex target threshold T in milliseconds.
pub const APDEX_THRESHOLD_MS: u64 = 300;

// ---------------------------------------------------------------------------
// Satisfaction
// ---------------------------------------------------------------------------

/// Apdex bucket a single response time falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Satisfaction {
    /// `elapsed <= T`
    Satisfied,
    /// `T < elapsed <= 2T`
    Tolerating,
    /// `elapsed > 2T`
    Frustrated,
}

impl Satisfaction {
    pub fn classify(elapsed_ms: u64) -> Self {
        if elapsed_ms <= APDEX_THRESHOLD_MS {
            Satisfaction::Satisfied
        } else if elapsed_ms <= 2 * APDEX_THRESHOLD_MS {
            Satisfaction::Tolerating
        } else {
            Satisfaction::Frustrated
        }
    }
}

/// Running Apdex counters for one label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApdexTally {
    pub satisfied: u64,
    pub tolerating: u64,
    pub frustrated: u64,
}

impl ApdexTally {
    pub fn record(&mut self, elapsed_ms: u64) {
        match Satisfaction::classify(elapsed_ms) {
            Satisfaction::Satisfied => self.satisfied += 1,
            Satisfaction::Tolerating => self.tolerating += 1,
            Satisfaction::Frustrated => self.frustrated += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.satisfied + self.tolerating + self.frustrated
    }

    /// `(satisfied + tolerating / 2) / total`, unrounded. `NaN` when empty.
    pub fn score(&self) -> f64 {
        (self.satisfied as f64 + self.tolerating as f64 / 2.0) / self.total() as f64
    }
}

// ---------------------------------------------------------------------------
// LabelStats
// ---------------------------------------------------------------------------

/// Running statistics for every sample sharing one label.
///
/// Extrema start at sentinels so the first recorded sample always replaces
/// them. Totals saturate instead of overflowing. Every elapsed value is
/// retained; exact percentiles need the whole distribution.
#[derive(Debug, Clone)]
pub struct LabelStats {
    label: String,
    pub(crate) samples: u64,
    pub(crate) errors: u64,
    pub(crate) elapsed_min: u64,
    pub(crate) elapsed_max: u64,
    pub(crate) elapsed_total: u64,
    pub(crate) bytes_min: u64,
    pub(crate) bytes_max: u64,
    pub(crate) bytes_total: u64,
    /// Samples that carried a response size.
    pub(crate) bytes_samples: u64,
    /// Earliest request start (epoch ms).
    pub(crate) time_start: i64,
    /// Latest request end, `timestamp + elapsed` (epoch ms).
    pub(crate) time_end: i64,
    pub(crate) elapsed: Vec<u64>,
    pub(crate) apdex: ApdexTally,
}

impl LabelStats {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            samples: 0,
            errors: 0,
            elapsed_min: u64::MAX,
            elapsed_max: 0,
            elapsed_total: 0,
            bytes_min: u64::MAX,
            bytes_max: 0,
            bytes_total: 0,
            bytes_samples: 0,
            time_start: i64::MAX,
            time_end: i64::MIN,
            elapsed: Vec::new(),
            apdex: ApdexTally::default(),
        }
    }

    /// Fold one sample into the running state.
    pub fn record(&mut self, sample: &Sample) {
        self.samples += 1;
        if !sample.status.is_success() {
            self.errors += 1;
        }

        let elapsed = sample.elapsed;
        self.elapsed_min = self.elapsed_min.min(elapsed);
        self.elapsed_max = self.elapsed_max.max(elapsed);
        self.elapsed_total = self.elapsed_total.saturating_add(elapsed);

        if let Some(bytes) = sample.bytes {
            self.bytes_min = self.bytes_min.min(bytes);
            self.bytes_max = self.bytes_max.max(bytes);
            self.bytes_total = self.bytes_total.saturating_add(bytes);
            self.bytes_samples += 1;
        }

        self.time_start = self.time_start.min(sample.timestamp);
        self.time_end = self.time_end.max(sample.end());

        self.elapsed.push(elapsed);
        self.apdex.record(elapsed);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn apdex(&self) -> ApdexTally {
        self.apdex
    }

    /// Elapsed values in arrival order.
    pub fn elapsed(&self) -> &[u64] {
        &self.elapsed
    }

    /// `(min, max)` elapsed, `None` before the first sample.
    pub fn elapsed_range(&self) -> Option<(u64, u64)> {
        (self.samples > 0).then_some((self.elapsed_min, self.elapsed_max))
    }

    /// `(min, max)` response size, `None` when no sample carried a size.
    pub fn bytes_range(&self) -> Option<(u64, u64)> {
        (self.bytes_samples > 0).then_some((self.bytes_min, self.bytes_max))
    }

    /// `(start, end)` of the observed window in epoch milliseconds.
    pub fn time_window(&self) -> Option<(i64, i64)> {
        (self.samples > 0).then_some((self.time_start, self.time_end))
    }
}
