use std::collections::HashMap;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::JtlError;
use crate::report::Report;
use crate::sample::{classify_line, LineKind, Sample};
use crate::schema::Schema;

pub mod percentile;
pub mod stats;

pub use stats::{ApdexTally, LabelStats, Satisfaction, APDEX_THRESHOLD_MS};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do with a record line whose fields cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedLinePolicy {
    /// Log the line, count it, and leave every accumulator untouched.
    #[default]
    Skip,
    /// Stop the run with [`JtlError::MalformedLine`].
    Abort,
}

/// Configuration for one aggregation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct EngineConfig {
    pub schema: Schema,
    pub malformed: MalformedLinePolicy,
}

impl EngineConfig {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    pub fn strict(mut self) -> Self {
        self.malformed = MalformedLinePolicy::Abort;
        self
    }
}

// ---------------------------------------------------------------------------
// Observed — outcome of feeding one line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
    /// The line was parsed and folded into its label's statistics.
    Recorded,
    Empty,
    Header,
    /// The line could not be parsed and was skipped.
    Malformed,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Per-label streaming aggregator for one results log.
///
/// Lines are fed one at a time with [`observe`](Self::observe), in arrival
/// order. [`finalize`](Self::finalize) consumes the aggregator, so the
/// derived metrics are computed exactly once.
pub struct Aggregator {
    config: EngineConfig,
    /// Labels in first-seen order.
    labels: Vec<LabelStats>,
    index: HashMap<String, usize>,
    lines_seen: u64,
    skipped_lines: u64,
}

impl Aggregator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            labels: Vec::new(),
            index: HashMap::new(),
            lines_seen: 0,
            skipped_lines: 0,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Feed one raw line from the log.
    ///
    /// Empty and header lines are ignored. A malformed record is either
    /// skipped or returned as an error depending on
    /// [`MalformedLinePolicy`].
    pub fn observe(&mut self, line: &str) -> Result<Observed, JtlError> {
        self.lines_seen += 1;
        match classify_line(line) {
            LineKind::Empty => return Ok(Observed::Empty),
            LineKind::Header => return Ok(Observed::Header),
            LineKind::Record => {}
        }

        match Sample::parse(line, self.config.schema) {
            Ok(sample) => {
                self.record(&sample);
                Ok(Observed::Recorded)
            }
            Err(source) => match self.config.malformed {
                MalformedLinePolicy::Skip => {
                    tracing::warn!(line = self.lines_seen, "Skipping malformed line: {source}");
                    self.skipped_lines += 1;
                    Ok(Observed::Malformed)
                }
                MalformedLinePolicy::Abort => Err(JtlError::MalformedLine {
                    line_number: self.lines_seen,
                    source,
                }),
            },
        }
    }

    /// Feed every line of an in-memory or iterator-backed source.
    pub fn observe_all<I, S>(&mut self, lines: I) -> Result<(), JtlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.observe(line.as_ref())?;
        }
        Ok(())
    }

    /// Feed every line of a blocking reader. Invalid UTF-8 is replaced with
    /// U+FFFD; read errors propagate unchanged.
    pub fn observe_reader<R: BufRead>(&mut self, mut reader: R) -> Result<(), JtlError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
            self.observe(&String::from_utf8_lossy(raw))?;
        }
    }

    /// Fold an already parsed sample into its label's statistics.
    pub fn record(&mut self, sample: &Sample) {
        let idx = match self.index.get(&sample.label) {
            Some(&idx) => idx,
            None => {
                tracing::debug!(label = %sample.label, "New label");
                self.labels.push(LabelStats::new(sample.label.clone()));
                self.index.insert(sample.label.clone(), self.labels.len() - 1);
                self.labels.len() - 1
            }
        };
        self.labels[idx].record(sample);
    }

    /// Running statistics for `label`, if it has been seen.
    pub fn stats(&self, label: &str) -> Option<&LabelStats> {
        self.index.get(label).map(|&idx| &self.labels[idx])
    }

    /// Labels in first-seen order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(LabelStats::label)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn sample_count(&self) -> u64 {
        self.labels.iter().map(LabelStats::samples).sum()
    }

    /// Lines passed to [`observe`](Self::observe), including skipped ones.
    pub fn lines_seen(&self) -> u64 {
        self.lines_seen
    }

    /// Malformed lines dropped under [`MalformedLinePolicy::Skip`].
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Compute every derived metric and produce the final report.
    pub fn finalize(self) -> Report {
        tracing::info!(
            labels = self.labels.len(),
            samples = self.sample_count(),
            skipped = self.skipped_lines,
            "Finalizing report"
        );
        Report::from_stats(self.config.schema, self.labels, self.skipped_lines)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "timeStamp,elapsed,label,responseCode,responseMessage,threadName,dataType,success,bytes";

    // -----------------------------------------------------------------------
    // observe
    // -----------------------------------------------------------------------

    #[test]
    fn observe_records_two_samples_for_one_label() {
        let mut agg = Aggregator::default();
        assert_eq!(agg.observe("1000,100,L1,200,,,,,512").unwrap(), Observed::Recorded);
        assert_eq!(agg.observe("1100,500,L1,200,,,,,1024").unwrap(), Observed::Recorded);

        let stats = agg.stats("L1").expect("L1 should exist");
        assert_eq!(stats.samples(), 2);
        assert_eq!(stats.errors(), 0);
        assert_eq!(stats.elapsed_range(), Some((100, 500)));
        assert_eq!(stats.bytes_range(), Some((512, 1024)));
        assert_eq!(stats.apdex().satisfied, 1);
        assert_eq!(stats.apdex().tolerating, 1);
        assert_eq!(stats.apdex().frustrated, 0);
    }

    #[test]
    fn observe_header_has_no_effect() {
        let mut agg = Aggregator::default();
        assert_eq!(agg.observe(HEADER).unwrap(), Observed::Header);
        assert_eq!(agg.label_count(), 0);
        assert_eq!(agg.sample_count(), 0);
        assert_eq!(agg.skipped_lines(), 0);
    }

    #[test]
    fn observe_empty_line_has_no_effect() {
        let mut agg = Aggregator::default();
        assert_eq!(agg.observe("").unwrap(), Observed::Empty);
        assert_eq!(agg.label_count(), 0);
        assert_eq!(agg.lines_seen(), 1);
    }

    #[test]
    fn observe_counts_non_200_as_errors() {
        let mut agg = Aggregator::new(EngineConfig::new(Schema::Reduced));
        agg.observe("1000,10,L1,200").unwrap();
        agg.observe("1001,10,L1,201").unwrap();
        agg.observe("1002,10,L1,500").unwrap();
        let stats = agg.stats("L1").unwrap();
        assert_eq!(stats.samples(), 3);
        assert_eq!(stats.errors(), 2);
    }

    #[test]
    fn labels_keep_first_seen_order() {
        let mut agg = Aggregator::new(EngineConfig::new(Schema::Reduced));
        agg.observe_all(["1,1,zeta,200", "2,1,alpha,200", "3,1,zeta,200", "4,1,mid,200"])
            .unwrap();
        let labels: Vec<&str> = agg.labels().collect();
        assert_eq!(labels, vec!["zeta", "alpha", "mid"]);
        assert_eq!(agg.sample_count(), 4);
    }

    #[test]
    fn satisfaction_buckets_sum_to_samples_for_every_label() {
        let mut agg = Aggregator::new(EngineConfig::new(Schema::Reduced));
        let mut lines = Vec::new();
        for i in 0..50u64 {
            let label = if i % 3 == 0 { "a" } else { "b" };
            lines.push(format!("{},{},{label},200", 1000 + i, i * 37));
        }
        agg.observe_all(&lines).unwrap();
        for label in ["a", "b"] {
            let stats = agg.stats(label).unwrap();
            assert_eq!(stats.apdex().total(), stats.samples());
        }
    }

    // -----------------------------------------------------------------------
    // malformed lines
    // -----------------------------------------------------------------------

    #[test]
    fn malformed_line_is_skipped_by_default() {
        let mut agg = Aggregator::new(EngineConfig::new(Schema::Reduced));
        agg.observe("1000,100,L1,200").unwrap();
        assert_eq!(agg.observe("1000,oops,L1,200").unwrap(), Observed::Malformed);
        assert_eq!(agg.observe("garbage").unwrap(), Observed::Malformed);
        assert_eq!(agg.skipped_lines(), 2);
        assert_eq!(agg.stats("L1").unwrap().samples(), 1);
    }

    #[test]
    fn malformed_line_aborts_in_strict_mode() {
        let mut agg = Aggregator::new(EngineConfig::new(Schema::Reduced).strict());
        agg.observe(HEADER).unwrap();
        agg.observe("1000,100,L1,200").unwrap();
        let err = agg.observe("1000,oops,L1,200").unwrap_err();
        assert!(matches!(err, JtlError::MalformedLine { line_number: 3, .. }));
        assert_eq!(agg.stats("L1").unwrap().samples(), 1);
    }

    #[test]
    fn missing_byte_count_still_counts_the_sample() {
        let mut agg = Aggregator::default();
        agg.observe("1000,100,L1,200,,,,,512").unwrap();
        assert_eq!(agg.observe("1100,500,L1,500,,,,,").unwrap(), Observed::Recorded);
        let stats = agg.stats("L1").unwrap();
        assert_eq!(stats.samples(), 2);
        assert_eq!(stats.errors(), 1);
        assert_eq!(stats.bytes_range(), Some((0, 512)));
        assert_eq!(agg.skipped_lines(), 0);
    }

    #[test]
    fn huge_elapsed_values_do_not_overflow() {
        let mut agg = Aggregator::new(EngineConfig::new(Schema::Reduced));
        agg.observe("0,18446744073709551615,L,200").unwrap();
        agg.observe("0,1,L,200").unwrap();
        assert_eq!(agg.stats("L").unwrap().samples(), 2);
    }

    #[test]
    fn short_line_is_malformed_for_byte_aware_schema() {
        let mut agg = Aggregator::default();
        assert_eq!(agg.observe("1000,100,L1,200").unwrap(), Observed::Malformed);
        assert_eq!(agg.label_count(), 0);
    }

    // -----------------------------------------------------------------------
    // observe_reader
    // -----------------------------------------------------------------------

    #[test]
    fn observe_reader_handles_crlf_input() {
        let input = format!("{HEADER}\r\n1000,100,L1,200,,,,,512\r\n\r\n1100,500,L2,404,,,,,64\r\n");
        let mut agg = Aggregator::default();
        agg.observe_reader(std::io::Cursor::new(input)).unwrap();
        assert_eq!(agg.label_count(), 2);
        assert_eq!(agg.stats("L2").unwrap().errors(), 1);
    }

    #[test]
    fn observe_reader_decodes_invalid_utf8_lossily() {
        let mut agg = Aggregator::new(EngineConfig::new(Schema::Reduced));
        let input: &[u8] = b"1000,100,Caf\xe9,200\n1100,100,L1,200";
        agg.observe_reader(input).unwrap();
        assert_eq!(agg.label_count(), 2);
        assert_eq!(agg.stats("Caf\u{FFFD}").unwrap().samples(), 1);
    }

    #[test]
    fn observe_reader_propagates_io_errors() {
        struct Broken;
        impl std::io::Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }
        }
        let mut agg = Aggregator::default();
        let err = agg
            .observe_reader(std::io::BufReader::new(Broken))
            .unwrap_err();
        assert!(matches!(err, JtlError::Io(_)));
    }

    // -----------------------------------------------------------------------
    // config
    // -----------------------------------------------------------------------

    #[test]
    fn default_config_skips_malformed_byte_aware() {
        let config = EngineConfig::default();
        assert_eq!(config.schema, Schema::ByteAware);
        assert_eq!(config.malformed, MalformedLinePolicy::Skip);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"schema":"reduced"}"#).expect("should parse");
        assert_eq!(config, EngineConfig::new(Schema::Reduced));
        let strict: EngineConfig =
            serde_json::from_str(r#"{"malformed":"abort"}"#).expect("should parse");
        assert_eq!(strict, EngineConfig::default().strict());
    }
}
