//! Record Extractor
//!
//! Walks a merged [`SectionBuffer`] line by line and turns every data line
//! into a typed sample keyed by its normalized `HH:MM:SS` timestamp. CPU rows
//! are keyed one level deeper by processor id.
//!
//! Skipped without complaint: blank lines, repeated header lines, restart
//! marker lines and `Average:` summary rows. A line that cannot be turned into
//! a record is handled according to [`MalformedLinePolicy`].

use crate::catalog::{SectionKind, SectionPattern};
use crate::classifier::SectionBuffer;
use crate::error::{FormatIssue, Result, SarError};
use crate::indexer::ColumnIndex;
use crate::models::{
    CpuSample, CpuSeries, IoSample, MemSample, SectionRecord, SectionSeries, Series, SwapSample,
    TaskSample,
};
use crate::timestamp_parser::{Meridiem, TimestampParser};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// First token of the per-section summary row.
pub const AVERAGE_MARKER: &str = "Average:";

/// What to do with a data line that cannot be parsed.
///
/// The choice applies to the whole parse. There is no per-section mode: a
/// report either carries every section or is not produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedLinePolicy {
    /// Count it, record an issue and keep going.
    #[default]
    Skip,
    /// Fail the whole parse, every section included, on the first malformed
    /// line. No partial report is produced.
    Abort,
}

impl fmt::Display for MalformedLinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedLinePolicy::Skip => f.write_str("skip"),
            MalformedLinePolicy::Abort => f.write_str("abort"),
        }
    }
}

impl FromStr for MalformedLinePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(MalformedLinePolicy::Skip),
            "abort" => Ok(MalformedLinePolicy::Abort),
            other => Err(format!("unknown malformed line policy '{}'", other)),
        }
    }
}

#[derive(Debug)]
pub struct Extraction {
    pub series: SectionSeries,
    pub skipped: usize,
    pub issues: Vec<SarError>,
}

/// Everything one section's extraction needs. Sections share nothing, so
/// several extractors can run at once.
pub struct Extractor<'a> {
    pub buffer: &'a SectionBuffer,
    pub section: &'a SectionPattern,
    pub index: &'a ColumnIndex,
    pub restart_marker: &'a Regex,
    pub policy: MalformedLinePolicy,
}

struct DataLine<'l> {
    timestamp: String,
    meridiem: Option<Meridiem>,
    tokens: &'l [&'l str],
}

impl<'a> Extractor<'a> {
    pub fn extract(&self) -> Result<Extraction> {
        let kind = self.section.kind;
        let (series, skipped, issues) = match kind {
            SectionKind::Cpu => {
                let mut series = CpuSeries::new();
                let (skipped, issues) = self.walk(|line| {
                    // The AM/PM token shifts the processor id one column right
                    let cpu_at = if line.meridiem.is_some() { 2 } else { 1 };
                    let cpu = line.tokens.get(cpu_at).ok_or("missing processor id")?;
                    let sample: CpuSample = self.record(line.tokens)?;
                    series
                        .entry(line.timestamp)
                        .or_default()
                        .insert(cpu.to_string(), sample);
                    Ok(())
                })?;
                (SectionSeries::Cpu(series), skipped, issues)
            }
            SectionKind::Mem => {
                let (series, skipped, issues) = self.collect::<MemSample>()?;
                (SectionSeries::Mem(series), skipped, issues)
            }
            SectionKind::Swp => {
                let (series, skipped, issues) = self.collect::<SwapSample>()?;
                (SectionSeries::Swp(series), skipped, issues)
            }
            SectionKind::Io => {
                let (series, skipped, issues) = self.collect::<IoSample>()?;
                (SectionSeries::Io(series), skipped, issues)
            }
            SectionKind::Task => {
                let (series, skipped, issues) = self.collect::<TaskSample>()?;
                (SectionSeries::Task(series), skipped, issues)
            }
        };

        debug!(
            section = %kind,
            chunks = self.buffer.chunks,
            samples = series.sample_count(),
            skipped,
            "Extracted section"
        );

        Ok(Extraction { series, skipped, issues })
    }

    fn collect<R: SectionRecord>(&self) -> Result<(Series<R>, usize, Vec<SarError>)> {
        let mut series = Series::new();
        let (skipped, issues) = self.walk(|line| {
            let sample: R = self.record(line.tokens)?;
            series.insert(line.timestamp, sample);
            Ok(())
        })?;
        Ok((series, skipped, issues))
    }

    fn record<R: SectionRecord>(&self, tokens: &[&str]) -> std::result::Result<R, String> {
        let mut record = R::default();
        for (field, position) in self.index.columns() {
            let Some(position) = position else {
                continue;
            };
            // Column 0 is always the timestamp
            let token = self
                .index
                .locate(position, tokens.len())
                .filter(|at| *at > 0)
                .and_then(|at| tokens.get(at))
                .ok_or_else(|| format!("{} tokens, too few for the {} column", tokens.len(), field))?;
            record.assign(field, token)?;
        }
        Ok(record)
    }

    fn walk<F>(&self, mut store: F) -> Result<(usize, Vec<SarError>)>
    where
        F: FnMut(DataLine<'_>) -> std::result::Result<(), String>,
    {
        let kind = self.section.kind;
        let mut skipped = 0;
        let mut issues = Vec::new();

        for (number, line) in self.buffer.text.lines().enumerate() {
            let number = number + 1;
            if line.trim().is_empty() {
                continue;
            }
            if self.section.header.is_match(line) {
                self.check_layout(line, number)?;
                continue;
            }
            if self.restart_marker.is_match(line) {
                continue;
            }

            let meridiem = TimestampParser::meridiem_of(line);
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.first() == Some(&AVERAGE_MARKER) {
                continue;
            }

            let stored = TimestampParser::normalize(tokens[0], meridiem)
                .map_err(|e| e.to_string())
                .and_then(|timestamp| {
                    store(DataLine {
                        timestamp,
                        meridiem,
                        tokens: &tokens,
                    })
                });

            if let Err(reason) = stored {
                let error = SarError::MalformedLine {
                    kind,
                    line: number,
                    reason,
                };
                match self.policy {
                    MalformedLinePolicy::Abort => return Err(error),
                    MalformedLinePolicy::Skip => {
                        warn!(section = %kind, line = number, error = %error, "Skipping malformed line");
                        skipped += 1;
                        issues.push(error);
                    }
                }
            }
        }

        Ok((skipped, issues))
    }

    /// Every header inside a merged buffer must line up with the first one.
    fn check_layout(&self, header: &str, number: usize) -> Result<()> {
        let repeated = ColumnIndex::build(header, &self.section.fields);
        if repeated.same_layout(self.index) {
            Ok(())
        } else {
            Err(FormatIssue::LayoutChanged {
                kind: self.section.kind,
                line: number,
            }
            .into())
        }
    }
}
