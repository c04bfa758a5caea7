//! Core Data Models
//!
//! Typed output of a parse. Each section kind has its own sample struct, so
//! which fields exist and whether they are integers or floats is fixed at
//! compile time:
//!
//! - Capacity counters (free/used memory, buffers, cache, free/used swap) are
//!   kilobyte counts and stored as `u64`.
//! - Everything else (percentages, rates) is `f64`.
//!
//! A field the header did not resolve stays `None` and is skipped when
//! serializing. [`SarReport`] serializes to the nested shape consumers expect:
//! `{"CPU": {"HH:MM:SS": {"all": {...}}}, "MEM": {"HH:MM:SS": {...}}, ...}`.

use crate::catalog::SectionKind;
use crate::error::SarError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Timestamp (`HH:MM:SS`) to sample. Lexical order is chronological.
pub type Series<T> = BTreeMap<String, T>;

/// Timestamp to processor id (`all`, `0`, `1`, ...) to sample.
pub type CpuSeries = BTreeMap<String, BTreeMap<String, CpuSample>>;

/// One row's worth of fields for a section kind.
pub trait SectionRecord: Default {
    /// Coerce `token` and store it as `field`. Names outside the record are ignored.
    fn assign(&mut self, field: &str, token: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuSample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sys: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iowait: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle: Option<f64>,
}

impl SectionRecord for CpuSample {
    fn assign(&mut self, field: &str, token: &str) -> Result<(), String> {
        let slot = match field {
            "usr" => &mut self.usr,
            "nice" => &mut self.nice,
            "sys" => &mut self.sys,
            "iowait" => &mut self.iowait,
            "idle" => &mut self.idle,
            _ => return Ok(()),
        };
        *slot = Some(float(field, token)?);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemSample {
    /// kB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memfree: Option<u64>,
    /// kB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memused: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memusedpercent: Option<f64>,
    /// kB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membuffer: Option<u64>,
    /// kB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memcache: Option<u64>,
}

impl SectionRecord for MemSample {
    fn assign(&mut self, field: &str, token: &str) -> Result<(), String> {
        match field {
            "memfree" => self.memfree = Some(integer(field, token)?),
            "memused" => self.memused = Some(integer(field, token)?),
            "memusedpercent" => self.memusedpercent = Some(float(field, token)?),
            "membuffer" => self.membuffer = Some(integer(field, token)?),
            "memcache" => self.memcache = Some(integer(field, token)?),
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwapSample {
    /// kB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swapfree: Option<u64>,
    /// kB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swapused: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swapusedpercent: Option<f64>,
}

impl SectionRecord for SwapSample {
    fn assign(&mut self, field: &str, token: &str) -> Result<(), String> {
        match field {
            "swapfree" => self.swapfree = Some(integer(field, token)?),
            "swapused" => self.swapused = Some(integer(field, token)?),
            "swapusedpercent" => self.swapusedpercent = Some(float(field, token)?),
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IoSample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wtps: Option<f64>,
    /// Blocks read per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bread: Option<f64>,
    /// Blocks written per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bwrite: Option<f64>,
}

impl SectionRecord for IoSample {
    fn assign(&mut self, field: &str, token: &str) -> Result<(), String> {
        let slot = match field {
            "tps" => &mut self.tps,
            "rtps" => &mut self.rtps,
            "wtps" => &mut self.wtps,
            "bread" => &mut self.bread,
            "bwrite" => &mut self.bwrite,
            _ => return Ok(()),
        };
        *slot = Some(float(field, token)?);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskSample {
    /// Tasks created per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proc: Option<f64>,
    /// Context switches per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cswch: Option<f64>,
}

impl SectionRecord for TaskSample {
    fn assign(&mut self, field: &str, token: &str) -> Result<(), String> {
        match field {
            "proc" => self.proc = Some(float(field, token)?),
            "cswch" => self.cswch = Some(float(field, token)?),
            _ => {}
        }
        Ok(())
    }
}

fn integer(field: &str, token: &str) -> Result<u64, String> {
    token
        .parse()
        .map_err(|_| format!("{} value '{}' is not an integer", field, token))
}

fn float(field: &str, token: &str) -> Result<f64, String> {
    token
        .parse()
        .map_err(|_| format!("{} value '{}' is not a number", field, token))
}

/// The time series of one section, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionSeries {
    Cpu(CpuSeries),
    Mem(Series<MemSample>),
    Swp(Series<SwapSample>),
    Io(Series<IoSample>),
    Task(Series<TaskSample>),
}

impl SectionSeries {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionSeries::Cpu(_) => SectionKind::Cpu,
            SectionSeries::Mem(_) => SectionKind::Mem,
            SectionSeries::Swp(_) => SectionKind::Swp,
            SectionSeries::Io(_) => SectionKind::Io,
            SectionSeries::Task(_) => SectionKind::Task,
        }
    }

    pub fn timestamps(&self) -> Vec<&str> {
        match self {
            SectionSeries::Cpu(series) => series.keys().map(String::as_str).collect(),
            SectionSeries::Mem(series) => series.keys().map(String::as_str).collect(),
            SectionSeries::Swp(series) => series.keys().map(String::as_str).collect(),
            SectionSeries::Io(series) => series.keys().map(String::as_str).collect(),
            SectionSeries::Task(series) => series.keys().map(String::as_str).collect(),
        }
    }

    /// Stored samples; for CPU every (timestamp, processor) pair counts.
    pub fn sample_count(&self) -> usize {
        match self {
            SectionSeries::Cpu(series) => series.values().map(BTreeMap::len).sum(),
            SectionSeries::Mem(series) => series.len(),
            SectionSeries::Swp(series) => series.len(),
            SectionSeries::Io(series) => series.len(),
            SectionSeries::Task(series) => series.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartEvent {
    /// First token of the marker line, as written.
    pub timestamp: String,
    /// 24-hour form, when the marker line was 12-hour formatted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SarReport {
    pub file_date: Option<String>,
    #[serde(flatten)]
    pub sections: BTreeMap<SectionKind, SectionSeries>,
    pub restarts: Vec<RestartEvent>,
    pub skipped_lines: BTreeMap<SectionKind, usize>,
    /// Non-fatal problems met while parsing.
    #[serde(skip)]
    pub issues: Vec<SarError>,
}

impl SarReport {
    pub fn section(&self, kind: SectionKind) -> Option<&SectionSeries> {
        self.sections.get(&kind)
    }

    pub fn cpu(&self) -> Option<&CpuSeries> {
        match self.sections.get(&SectionKind::Cpu) {
            Some(SectionSeries::Cpu(series)) => Some(series),
            _ => None,
        }
    }

    pub fn mem(&self) -> Option<&Series<MemSample>> {
        match self.sections.get(&SectionKind::Mem) {
            Some(SectionSeries::Mem(series)) => Some(series),
            _ => None,
        }
    }

    pub fn swap(&self) -> Option<&Series<SwapSample>> {
        match self.sections.get(&SectionKind::Swp) {
            Some(SectionSeries::Swp(series)) => Some(series),
            _ => None,
        }
    }

    pub fn io(&self) -> Option<&Series<IoSample>> {
        match self.sections.get(&SectionKind::Io) {
            Some(SectionSeries::Io(series)) => Some(series),
            _ => None,
        }
    }

    pub fn task(&self) -> Option<&Series<TaskSample>> {
        match self.sections.get(&SectionKind::Task) {
            Some(SectionSeries::Task(series)) => Some(series),
            _ => None,
        }
    }

    /// The report date as a calendar date, for the common sysstat formats.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.file_date.as_deref()?;
        ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
    }

    pub fn restart_times(&self) -> impl Iterator<Item = &str> {
        self.restarts.iter().map(|event| event.timestamp.as_str())
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_lines.values().sum()
    }
}
