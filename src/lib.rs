//! SAR Parser Library
//!
//! Parses ASCII reports produced by the sysstat `sar` tool into typed,
//! timestamp-keyed time series for CPU, memory, swap, I/O and task activity.
//!
//! ## Core Features
//!
//! - **Pattern-driven sections**: a [`Catalog`] of header and field patterns
//!   decides which section a chunk belongs to and which column holds each field
//! - **12/24-hour timestamps**: `AM`/`PM` rows are normalized to `HH:MM:SS`
//! - **Restart awareness**: `LINUX RESTART` markers are recorded and never
//!   mistaken for data
//! - **Bounded reads**: sources are streamed in blank-line-delimited chunks
//! - **Configurable tolerance**: malformed rows are skipped and counted, or abort
//!   the parse
//!
//! ## Architecture Overview
//!
//! - [`chunker`] - Split a source into blank-line-delimited chunks
//! - [`classifier`] - Assign chunks to section kinds and collect restart markers
//! - [`indexer`] - Resolve each field to a column from the section header
//! - [`extractor`] - Turn data rows into typed samples
//! - [`parser`] - Orchestrate the pipeline and cache the result
//! - [`timestamp_parser`] - 12-hour to 24-hour normalization
//! - [`catalog`] - Section kinds and their patterns
//! - [`models`] - Report and sample types
//! - [`config`] - Configuration with file and environment support
//! - [`logging`] - Structured logging with JSON and pretty-print formats
//! - [`display`] - Terminal summaries and JSON output
//!
//! ## Main Entry Point
//!
//! ```rust
//! use sar_parser::{SarParser, SarSource};
//!
//! # fn example() -> sar_parser::Result<()> {
//! let mut parser = SarParser::new(SarSource::file("/var/log/sa/sar01"));
//! let report = parser.load()?;
//! if let Some(cpu) = report.cpu() {
//!     for (time, cpus) in cpu {
//!         println!("{} idle={:?}", time, cpus.get("all").and_then(|s| s.idle));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod chunker;
pub mod classifier;
pub mod config;
pub mod display;
pub mod error;
pub mod extractor;
pub mod indexer;
pub mod logging;
pub mod models;
pub mod parser;
pub mod timestamp_parser;

pub use catalog::{Catalog, SectionKind, SectionOverride, SectionPattern};
pub use chunker::SarSource;
pub use error::{FormatIssue, Result, SarError};
pub use extractor::MalformedLinePolicy;
pub use models::*;
pub use parser::{read_file_date, ParseOptions, SarParser};
