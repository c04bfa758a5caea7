//! Error types for the parsing engine
//!
//! Fatal conditions abort the current operation and are returned to the caller.
//! Non-fatal ones ([`SarError::FieldUnresolved`], and [`SarError::MalformedLine`]
//! under the skip policy) are collected into [`crate::models::SarReport::issues`].

use crate::catalog::SectionKind;
use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SarError {
    /// The source could not be opened or read.
    #[error("Cannot read SAR source {source_name}: {source}")]
    SourceUnreadable {
        source_name: String,
        #[source]
        source: io::Error,
    },

    /// The input is not SAR text this catalog understands.
    #[error("Unrecognized SAR format: {0}")]
    UnrecognizedFormat(FormatIssue),

    /// A catalog field matched no column of the section header.
    #[error("{kind} field '{field}' has no matching header column")]
    FieldUnresolved { kind: SectionKind, field: String },

    /// A data line could not be turned into a record.
    #[error("{kind} line {line}: {reason}")]
    MalformedLine {
        kind: SectionKind,
        line: usize,
        reason: String,
    },

    /// A catalog override could not be applied.
    #[error("Invalid section catalog: {reason}")]
    InvalidCatalog { reason: String },
}

impl SarError {
    pub(crate) fn unreadable(source_name: impl fmt::Display, source: io::Error) -> Self {
        SarError::SourceUnreadable {
            source_name: source_name.to_string(),
            source,
        }
    }

    /// Whether the error stops a parse, as opposed to being recorded as an issue.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SarError::FieldUnresolved { .. } | SarError::MalformedLine { .. }
        )
    }
}

/// Why a source was rejected as SAR text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatIssue {
    /// Splitting produced no chunks at all.
    NoChunks,
    /// No chunk matched the header pattern of these kinds.
    MissingSections(Vec<SectionKind>),
    /// The first line has too few tokens to carry a report date.
    MissingDate { tokens: usize },
    /// A repeated header in a merged section does not line up with the first one.
    LayoutChanged { kind: SectionKind, line: usize },
}

impl fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatIssue::NoChunks => write!(f, "no text chunks found"),
            FormatIssue::MissingSections(kinds) => {
                let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
                write!(f, "missing sections: {}", names.join(", "))
            }
            FormatIssue::MissingDate { tokens } => {
                write!(f, "first line has {} tokens, report date expected at token 4", tokens)
            }
            FormatIssue::LayoutChanged { kind, line } => {
                write!(f, "{} column layout changes at line {}", kind, line)
            }
        }
    }
}

impl From<FormatIssue> for SarError {
    fn from(issue: FormatIssue) -> Self {
        SarError::UnrecognizedFormat(issue)
    }
}

pub type Result<T, E = SarError> = std::result::Result<T, E>;
