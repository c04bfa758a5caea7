//! SAR Parser
//!
//! [`SarParser`] owns the pipeline for one source:
//!
//! 1. **Chunker**: split the source into blank-line-delimited chunks
//! 2. **Classifier**: merge chunks per section kind and collect restart markers
//! 3. **Column Indexer**: resolve field columns from each section's first header
//! 4. **Record Extractor**: turn data lines into typed, timestamped samples
//!
//! A report is rebuilt from scratch on every [`SarParser::load`]. The last
//! successful one is cached and served by [`SarParser::report`].

use crate::catalog::{Catalog, SectionPattern};
use crate::chunker::{SarSource, DEFAULT_BUFFER_SIZE};
use crate::classifier::{classify, SectionBuffer};
use crate::error::{FormatIssue, Result, SarError};
use crate::extractor::{Extraction, Extractor, MalformedLinePolicy};
use crate::indexer::ColumnIndex;
use crate::models::SarReport;
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// 0-based token of the first line holding the report date.
const DATE_TOKEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Read buffer for file sources, in bytes.
    pub buffer_size: usize,
    pub malformed_lines: MalformedLinePolicy,
    /// Extract sections on the rayon pool (needs the `parallel` feature).
    pub parallel: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            malformed_lines: MalformedLinePolicy::Skip,
            parallel: true,
        }
    }
}

type Job<'a> = (&'a SectionBuffer, &'a SectionPattern, ColumnIndex);

pub struct SarParser {
    source: SarSource,
    catalog: Catalog,
    options: ParseOptions,
    report: Option<SarReport>,
    file_date: Option<String>,
}

impl SarParser {
    /// Parser with the standard catalog and default options.
    pub fn new(source: impl Into<SarSource>) -> Self {
        Self::with_catalog(source, Catalog::standard(), ParseOptions::default())
    }

    pub fn with_catalog(source: impl Into<SarSource>, catalog: Catalog, options: ParseOptions) -> Self {
        Self {
            source: source.into(),
            catalog,
            options,
            report: None,
            file_date: None,
        }
    }

    /// Parse the source again. On failure the previous report stays cached.
    pub fn load(&mut self) -> Result<&SarReport> {
        let report = self.build()?;
        Ok(self.report.insert(report))
    }

    /// The cached report, parsing first if nothing has been parsed yet.
    pub fn report(&mut self) -> Result<&SarReport> {
        let report = match self.report.take() {
            Some(report) => report,
            None => self.build()?,
        };
        Ok(self.report.insert(report))
    }

    pub fn cached_report(&self) -> Option<&SarReport> {
        self.report.as_ref()
    }

    /// Report date from the literal first line of the source. Read once, then
    /// cached independently of any report.
    pub fn file_date(&mut self) -> Result<&str> {
        let date = match self.file_date.take() {
            Some(date) => date,
            None => read_file_date(&self.source)?,
        };
        Ok(self.file_date.insert(date).as_str())
    }

    fn build(&self) -> Result<SarReport> {
        let span = info_span!("sar_parse", run_id = %Uuid::new_v4(), source = %self.source);
        let _enter = span.enter();

        let chunks = self.source.chunks(self.options.buffer_size)?;
        let classified = classify(chunks, &self.catalog).map_err(|e| SarError::unreadable(&self.source, e))?;

        if classified.chunks_seen == 0 {
            return Err(FormatIssue::NoChunks.into());
        }
        let missing = classified.missing_kinds(&self.catalog);
        if !missing.is_empty() {
            return Err(FormatIssue::MissingSections(missing).into());
        }

        let mut issues = Vec::new();
        let mut jobs: Vec<Job<'_>> = Vec::new();
        for section in self.catalog.sections() {
            let Some(buffer) = classified.buffers.get(&section.kind) else {
                continue;
            };
            let index = ColumnIndex::build(buffer.header_line(), &section.fields);
            for field in index.unresolved() {
                warn!(section = %section.kind, field, "Field has no header column");
                issues.push(SarError::FieldUnresolved {
                    kind: section.kind,
                    field: field.to_string(),
                });
            }
            jobs.push((buffer, section, index));
        }

        let extractions = self.extract_all(&jobs)?;

        let mut report = SarReport {
            file_date: read_file_date(&self.source).ok(),
            restarts: classified.restarts,
            issues,
            ..Default::default()
        };
        for extraction in extractions {
            let kind = extraction.series.kind();
            report.skipped_lines.insert(kind, extraction.skipped);
            report.issues.extend(extraction.issues);
            report.sections.insert(kind, extraction.series);
        }

        info!(
            sections = report.sections.len(),
            restarts = report.restarts.len(),
            skipped = report.total_skipped(),
            issues = report.issues.len(),
            "Parsed SAR report"
        );

        Ok(report)
    }

    fn extractor<'a>(&'a self, job: &'a Job<'a>) -> Extractor<'a> {
        let (buffer, section, index) = job;
        Extractor {
            buffer,
            section,
            index,
            restart_marker: self.catalog.restart_marker(),
            policy: self.options.malformed_lines,
        }
    }

    #[cfg(feature = "parallel")]
    fn extract_all(&self, jobs: &[Job<'_>]) -> Result<Vec<Extraction>> {
        use rayon::prelude::*;

        if self.options.parallel {
            jobs.par_iter().map(|job| self.extractor(job).extract()).collect()
        } else {
            jobs.iter().map(|job| self.extractor(job).extract()).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn extract_all(&self, jobs: &[Job<'_>]) -> Result<Vec<Extraction>> {
        jobs.iter().map(|job| self.extractor(job).extract()).collect()
    }
}

/// Read only the first line of `source` and return its date token.
pub fn read_file_date(source: &SarSource) -> Result<String> {
    date_from_line(&source.first_line()?)
}

fn date_from_line(line: &str) -> Result<String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens
        .get(DATE_TOKEN)
        .map(|token| token.to_string())
        .ok_or_else(|| FormatIssue::MissingDate { tokens: tokens.len() }.into())
}
