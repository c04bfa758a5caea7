//! Section Catalog
//!
//! Static description of the SAR sections this crate understands. Each
//! [`SectionPattern`] pairs a header fingerprint with the ordered field
//! patterns used to find columns in that header.
//!
//! A [`Catalog`] is an immutable value: build it once with
//! [`Catalog::standard`], optionally adjust it with [`Catalog::with_overrides`]
//! or [`Catalog::with_restart_marker`], and hand it to the parser. Nothing in
//! the engine looks patterns up globally, so tests can run against substitute
//! pattern sets side by side.

use crate::error::{Result, SarError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const PATTERN_RESTART: &str = r".*LINUX RESTART.*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SectionKind {
    /// CPU utilization (`sar -u`, `sar -P ALL`)
    Cpu,
    /// Memory utilization (`sar -r`)
    Mem,
    /// Swap space utilization (`sar -S`)
    Swp,
    /// I/O and transfer rates (`sar -b`)
    Io,
    /// Task creation and context switches (`sar -w`)
    Task,
}

impl SectionKind {
    /// Catalog order, which is also the classification order.
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Cpu,
        SectionKind::Mem,
        SectionKind::Swp,
        SectionKind::Io,
        SectionKind::Task,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Cpu => "CPU",
            SectionKind::Mem => "MEM",
            SectionKind::Swp => "SWP",
            SectionKind::Io => "IO",
            SectionKind::Task => "TASK",
        }
    }

    /// Output field names of this kind, in column order.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            SectionKind::Cpu => &["usr", "nice", "sys", "iowait", "idle"],
            SectionKind::Mem => &["memfree", "memused", "memusedpercent", "membuffer", "memcache"],
            SectionKind::Swp => &["swapfree", "swapused", "swapusedpercent"],
            SectionKind::Io => &["tps", "rtps", "wtps", "bread", "bwrite"],
            SectionKind::Task => &["proc", "cswch"],
        }
    }

    fn builtin_header(&self) -> &'static str {
        match self {
            SectionKind::Cpu => r".*CPU.*(usr|user).*nice.*sys.*",
            SectionKind::Mem => r".*kbmemfree.*kbmemused.*memused.*kbbuffers.*kbcached.*",
            SectionKind::Swp => r".*kbswpfree.*kbswpused.*swpused.*",
            SectionKind::Io => r".*tps.*rtps.*wtps.*bread/s.*bwrtn/s.*",
            SectionKind::Task => r".*proc/s.*cswch/s.*",
        }
    }

    /// Header-token patterns, parallel to [`SectionKind::field_names`].
    fn builtin_fields(&self) -> &'static [&'static str] {
        match self {
            SectionKind::Cpu => &["%(usr|user)", "%nice", "%sys", "%iowait", "%idle"],
            SectionKind::Mem => &["kbmemfree", "kbmemused", "%memused", "kbbuffers", "kbcached"],
            SectionKind::Swp => &["kbswpfree", "kbswpused", "%swpused"],
            SectionKind::Io => &["^tps", "^rtps", "^wtps", "bread/s", "bwrtn/s"],
            SectionKind::Task => &["proc", "cswch"],
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SarError::InvalidCatalog {
                reason: format!("unknown section kind '{}'", s),
            })
    }
}

/// One output field and the regex that finds its column in a header line.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub name: &'static str,
    pub pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct SectionPattern {
    pub kind: SectionKind,
    /// Fingerprint of the header line; also used to drop repeated headers.
    pub header: Regex,
    /// Tried in order against each header token.
    pub fields: Vec<FieldPattern>,
}

impl SectionPattern {
    pub fn new(kind: SectionKind, header: &str, fields: &[(&str, &str)]) -> Result<Self> {
        let header = compile(kind, "header", header)?;
        let fields = fields
            .iter()
            .map(|(name, pattern)| {
                let name = known_field(kind, name)?;
                Ok(FieldPattern {
                    name,
                    pattern: compile(kind, name, pattern)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { kind, header, fields })
    }

    fn builtin(kind: SectionKind) -> Self {
        let fields = kind
            .field_names()
            .iter()
            .zip(kind.builtin_fields())
            .map(|(&name, pattern)| FieldPattern {
                name,
                pattern: builtin_regex(pattern),
            })
            .collect();

        Self {
            kind,
            header: builtin_regex(kind.builtin_header()),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldPattern> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Replacement patterns for one section, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    sections: Vec<SectionPattern>,
    restart: Regex,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// The sysstat CPU, MEM, SWP, IO and TASK sections.
    pub fn standard() -> Self {
        Self {
            sections: SectionKind::ALL.into_iter().map(SectionPattern::builtin).collect(),
            restart: builtin_regex(PATTERN_RESTART),
        }
    }

    /// A catalog holding exactly the given sections, in the given order.
    pub fn from_sections(sections: Vec<SectionPattern>, restart: Regex) -> Self {
        Self { sections, restart }
    }

    pub fn sections(&self) -> &[SectionPattern] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&SectionPattern> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = SectionKind> + '_ {
        self.sections.iter().map(|section| section.kind)
    }

    pub fn restart_marker(&self) -> &Regex {
        &self.restart
    }

    pub fn with_restart_marker(mut self, pattern: &str) -> Result<Self> {
        self.restart = Regex::new(pattern).map_err(|e| SarError::InvalidCatalog {
            reason: format!("restart marker '{}': {}", pattern, e),
        })?;
        Ok(self)
    }

    /// Swap in header and field patterns. Kinds absent from this catalog and
    /// unknown field names are rejected rather than ignored.
    pub fn with_overrides(mut self, overrides: &BTreeMap<SectionKind, SectionOverride>) -> Result<Self> {
        for (kind, replacement) in overrides {
            let section = self
                .sections
                .iter_mut()
                .find(|section| section.kind == *kind)
                .ok_or_else(|| SarError::InvalidCatalog {
                    reason: format!("section {} is not in the catalog", kind),
                })?;

            if let Some(header) = &replacement.header {
                section.header = compile(*kind, "header", header)?;
            }

            for (name, pattern) in &replacement.fields {
                let name = known_field(*kind, name)?;
                let regex = compile(*kind, name, pattern)?;
                match section.fields.iter_mut().find(|field| field.name == name) {
                    Some(field) => field.pattern = regex,
                    None => section.fields.push(FieldPattern { name, pattern: regex }),
                }
            }
        }

        Ok(self)
    }
}

fn known_field(kind: SectionKind, name: &str) -> Result<&'static str> {
    kind.field_names()
        .iter()
        .copied()
        .find(|known| *known == name)
        .ok_or_else(|| SarError::InvalidCatalog {
            reason: format!("{} has no field named '{}'", kind, name),
        })
}

fn compile(kind: SectionKind, what: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SarError::InvalidCatalog {
        reason: format!("{} {} pattern '{}': {}", kind, what, pattern, e),
    })
}

fn builtin_regex(pattern: &str) -> Regex {
    // Built-in patterns are constants covered by tests.
    Regex::new(pattern).expect("built-in SAR pattern must compile")
}
