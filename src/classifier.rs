//! Section Classifier
//!
//! Assigns every chunk to the first catalog section whose header pattern it
//! matches and concatenates chunks of the same kind in file order. A section
//! that reappears after a `LINUX RESTART` is therefore merged into one
//! continuous buffer. Restart markers are collected independently of the
//! section a chunk belongs to.

use crate::catalog::{Catalog, SectionKind};
use crate::chunker::LogChunk;
use crate::models::RestartEvent;
use crate::timestamp_parser::TimestampParser;
use std::collections::BTreeMap;
use std::io;
use tracing::{debug, trace};

/// All chunks of one kind, joined by line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBuffer {
    pub kind: SectionKind,
    pub text: String,
    /// Number of chunks merged into `text`.
    pub chunks: usize,
}

impl SectionBuffer {
    fn new(kind: SectionKind, chunk: &LogChunk) -> Self {
        Self {
            kind,
            text: chunk.text.clone(),
            chunks: 1,
        }
    }

    fn append(&mut self, chunk: &LogChunk) {
        self.text.push('\n');
        self.text.push_str(&chunk.text);
        self.chunks += 1;
    }

    /// Header line of the first chunk; the column layout is taken from it.
    pub fn header_line(&self) -> &str {
        self.text.lines().next().unwrap_or("")
    }
}

#[derive(Debug, Default)]
pub struct Classified {
    pub buffers: BTreeMap<SectionKind, SectionBuffer>,
    pub restarts: Vec<RestartEvent>,
    /// Every chunk read, matched or not.
    pub chunks_seen: usize,
}

impl Classified {
    pub fn missing_kinds(&self, catalog: &Catalog) -> Vec<SectionKind> {
        catalog
            .kinds()
            .filter(|kind| !self.buffers.contains_key(kind))
            .collect()
    }
}

pub fn classify<I>(chunks: I, catalog: &Catalog) -> io::Result<Classified>
where
    I: IntoIterator<Item = io::Result<LogChunk>>,
{
    let mut classified = Classified::default();

    for chunk in chunks {
        let chunk = chunk?;
        classified.chunks_seen += 1;

        let kind = catalog
            .sections()
            .iter()
            .find(|section| section.header.is_match(&chunk.text))
            .map(|section| section.kind);

        if let Some(kind) = kind {
            trace!(chunk = chunk.index, section = %kind, "Chunk classified");
            classified
                .buffers
                .entry(kind)
                .and_modify(|buffer| buffer.append(&chunk))
                .or_insert_with(|| SectionBuffer::new(kind, &chunk));
        }

        // sar repeats a reboot's marker in every section listing
        for event in restart_events(&chunk, catalog) {
            if !classified.restarts.iter().any(|seen| seen.timestamp == event.timestamp) {
                classified.restarts.push(event);
            }
        }
    }

    debug!(
        chunks = classified.chunks_seen,
        sections = classified.buffers.len(),
        restarts = classified.restarts.len(),
        "Classified SAR chunks"
    );

    Ok(classified)
}

fn restart_events<'a>(chunk: &'a LogChunk, catalog: &'a Catalog) -> impl Iterator<Item = RestartEvent> + 'a {
    chunk
        .text
        .lines()
        .filter(|line| catalog.restart_marker().is_match(line))
        .filter_map(|line| {
            let timestamp = line.split_whitespace().next()?;
            let normalized = TimestampParser::meridiem_of(line)
                .and_then(|meridiem| TimestampParser::normalize(timestamp, Some(meridiem)).ok());
            Some(RestartEvent {
                timestamp: timestamp.to_string(),
                normalized,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::SarSource;

    fn classify_text(text: &str) -> Classified {
        let source = SarSource::memory(text);
        classify(source.chunks(1024).unwrap(), &Catalog::standard()).unwrap()
    }

    #[test]
    fn test_repeated_section_is_merged_in_file_order() {
        let classified = classify_text(
            "Linux 5.4.0 (host) 2023-01-01 _x86_64_\n\n\
             00:00:01 CPU %usr %nice %sys %iowait %idle\n\
             00:10:01 all 1.00 0.00 0.50 0.10 98.40\n\n\
             08:29:42 LINUX RESTART\n\n\
             08:30:01 CPU %usr %nice %sys %iowait %idle\n\
             08:40:01 all 2.00 0.00 0.50 0.10 97.40\n",
        );

        let cpu = &classified.buffers[&SectionKind::Cpu];
        assert_eq!(cpu.chunks, 2);
        assert_eq!(cpu.header_line(), "00:00:01 CPU %usr %nice %sys %iowait %idle");
        let lines: Vec<&str> = cpu.text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[3].starts_with("08:40:01"));

        assert_eq!(classified.restarts.len(), 1);
        assert_eq!(classified.restarts[0].timestamp, "08:29:42");
        assert_eq!(classified.chunks_seen, 4);
    }

    #[test]
    fn test_restart_inside_section_chunk() {
        let classified = classify_text(
            "12:00:01 AM CPU %user %nice %system %iowait %idle\n\
             01:10:01 PM all 1.00 0.00 0.50 0.10 98.40\n\
             01:15:42 PM LINUX RESTART (2 CPU)\n",
        );

        assert!(classified.buffers.contains_key(&SectionKind::Cpu));
        assert_eq!(
            classified.restarts,
            vec![RestartEvent {
                timestamp: "01:15:42".to_string(),
                normalized: Some("13:15:42".to_string()),
            }]
        );
    }

    #[test]
    fn test_one_event_per_reboot() {
        let classified = classify_text(
            "00:00:01 CPU %usr %nice %sys %iowait %idle\n\
             08:20:01 all 1.00 0.00 0.50 0.10 98.40\n\
             08:29:42 LINUX RESTART (2 CPU)\n\n\
             00:00:01 proc/s cswch/s\n\
             08:20:01 1.00 200.00\n\
             08:29:42 LINUX RESTART (2 CPU)\n\n\
             00:00:01 tps rtps wtps bread/s bwrtn/s\n\
             08:20:01 5.00 1.00 4.00 8.00 64.00\n\
             08:29:42 LINUX RESTART (2 CPU)\n\
             16:02:10 LINUX RESTART (2 CPU)\n",
        );

        let times: Vec<&str> = classified.restarts.iter().map(|e| e.timestamp.as_str()).collect();
        assert_eq!(times, vec!["08:29:42", "16:02:10"]);
    }

    #[test]
    fn test_missing_kinds() {
        let classified = classify_text("00:00:01 proc/s cswch/s\n00:10:01 1.00 200.00\n");
        assert_eq!(
            classified.missing_kinds(&Catalog::standard()),
            vec![SectionKind::Cpu, SectionKind::Mem, SectionKind::Swp, SectionKind::Io]
        );
    }

    #[test]
    fn test_unmatched_chunks_are_ignored() {
        let classified = classify_text("some banner\n\nIFACE rxpck/s txpck/s\n");
        assert!(classified.buffers.is_empty());
        assert!(classified.restarts.is_empty());
        assert_eq!(classified.chunks_seen, 2);
    }
}
