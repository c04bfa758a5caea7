//! Output Formatting and Display Management
//!
//! Renders parsed SAR reports either as colored terminal summaries or as JSON.
//!
//! The summary shows, per section, how many timestamps and samples were
//! extracted, the first and last sample time, and how many lines were
//! skipped. Restart times and non-fatal issues follow. With a section
//! selected, every sample of that section is listed one row per timestamp
//! (and per processor for CPU).

use crate::catalog::SectionKind;
use crate::models::{SarReport, SectionSeries};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// What one input file contributes to JSON output.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JsonOutput<'a> {
    Report(&'a SarReport),
    Section(Option<&'a SectionSeries>),
    Date(&'a str),
    Error { error: String },
}

impl<'a> JsonOutput<'a> {
    pub fn report(report: &'a SarReport, section: Option<SectionKind>) -> Self {
        match section {
            Some(kind) => JsonOutput::Section(report.section(kind)),
            None => JsonOutput::Report(report),
        }
    }
}

/// Serializes as an object keyed by file name, in input order.
struct ByFile<'a, 'b>(&'a [(String, JsonOutput<'b>)]);

impl Serialize for ByFile<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, output)| (name, output)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub kind: SectionKind,
    pub timestamps: usize,
    pub samples: usize,
    pub first: Option<String>,
    pub last: Option<String>,
    pub skipped: usize,
}

pub struct DisplayManager {
    json_pretty: bool,
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DisplayManager {
    pub fn new(json_pretty: bool) -> Self {
        Self { json_pretty }
    }

    pub fn summarize(&self, report: &SarReport) -> Vec<SectionSummary> {
        report
            .sections
            .iter()
            .map(|(kind, series)| {
                let timestamps = series.timestamps();
                SectionSummary {
                    kind: *kind,
                    timestamps: timestamps.len(),
                    samples: series.sample_count(),
                    first: timestamps.first().map(|t| t.to_string()),
                    last: timestamps.last().map(|t| t.to_string()),
                    skipped: report.skipped_lines.get(kind).copied().unwrap_or(0),
                }
            })
            .collect()
    }

    /// JSON for the whole report, or for one section when `section` is set.
    pub fn to_json(&self, report: &SarReport, section: Option<SectionKind>) -> Result<String> {
        self.render_json(&JsonOutput::report(report, section))
    }

    /// A single file renders as its own value; several are keyed by name.
    pub fn render_outputs(&self, outputs: &[(String, JsonOutput<'_>)]) -> Result<String> {
        match outputs {
            [(_, single)] => self.render_json(single),
            _ => self.render_json(&ByFile(outputs)),
        }
    }

    pub fn render_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let rendered = if self.json_pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.context("Failed to serialize report to JSON")
    }

    pub fn display_report(&self, name: &str, report: &SarReport, section: Option<SectionKind>) -> Result<()> {
        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{} {}", "SAR report".bright_white().bold(), name.bright_white());
        println!("{}", "=".repeat(80).bright_cyan());

        let date = match (report.date(), report.file_date.as_deref()) {
            (Some(date), _) => date.format("%Y-%m-%d").to_string(),
            (None, Some(raw)) => raw.to_string(),
            (None, None) => "unknown".to_string(),
        };
        println!("\n{} {}\n", "📅".bright_blue(), date.bright_white().bold());

        for summary in self.summarize(report) {
            let span = match (&summary.first, &summary.last) {
                (Some(first), Some(last)) => format!("{} → {}", first, last),
                _ => "no samples".to_string(),
            };
            let skipped = if summary.skipped > 0 {
                format!(" ({} skipped)", summary.skipped).bright_red().to_string()
            } else {
                String::new()
            };
            println!(
                "   {:<5} {} timestamps • {} samples • {}{}",
                summary.kind.to_string().bright_cyan(),
                summary.timestamps.to_string().bright_white().bold(),
                summary.samples.to_string().bright_white(),
                span.bright_yellow(),
                skipped
            );
        }

        if !report.restarts.is_empty() {
            let times: Vec<&str> = report
                .restarts
                .iter()
                .map(|event| event.normalized.as_deref().unwrap_or(&event.timestamp))
                .collect();
            println!("\n{} Restarts: {}", "🔄".bright_yellow(), times.join(", ").bright_white());
        }

        if !report.issues.is_empty() {
            println!("\n{} {} issue(s):", "⚠️".bright_red(), report.issues.len());
            for issue in &report.issues {
                println!("   {}", issue.to_string().red());
            }
        }

        if let Some(kind) = section {
            self.display_section(report, kind)?;
        }

        println!();
        Ok(())
    }

    fn display_section(&self, report: &SarReport, kind: SectionKind) -> Result<()> {
        println!("\n{} {}", "📊".bright_yellow(), kind.to_string().bright_white().bold());

        let Some(series) = report.section(kind) else {
            println!("   {}", "section not present".dimmed());
            return Ok(());
        };

        for row in section_rows(&serde_json::to_value(series)?, kind) {
            println!("   {}", row);
        }
        Ok(())
    }
}

/// Flatten a serialized series into `time [cpu] field=value ...` rows.
fn section_rows(series: &Value, kind: SectionKind) -> Vec<String> {
    let Some(timestamps) = series.as_object() else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for (time, entry) in timestamps {
        if kind == SectionKind::Cpu {
            for (cpu, sample) in entry.as_object().into_iter().flatten() {
                rows.push(format!("{} {:>4}  {}", time, cpu, fields(sample)));
            }
        } else {
            rows.push(format!("{}  {}", time, fields(entry)));
        }
    }
    rows
}

fn fields(sample: &Value) -> String {
    sample
        .as_object()
        .map(|object| {
            object
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
