//! Chunker
//!
//! Splits raw SAR text into blank-line-delimited [`LogChunk`]s. Files are read
//! through a bounded [`BufReader`] one line at a time, so memory use is
//! proportional to the largest chunk rather than the whole file. In-memory
//! sources go through the same reader over a [`Cursor`].

use crate::error::{Result, SarError};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default read buffer for file sources.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Where SAR text comes from. Cloning is cheap; every call to
/// [`SarSource::chunks`] starts a fresh pass from the beginning.
#[derive(Debug, Clone)]
pub enum SarSource {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

impl SarSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SarSource::File(path.into())
    }

    pub fn memory(data: impl Into<Vec<u8>>) -> Self {
        SarSource::Memory(Arc::from(data.into()))
    }

    pub fn open(&self, buffer_size: usize) -> Result<Box<dyn BufRead + Send>> {
        match self {
            SarSource::File(path) => {
                let file = File::open(path).map_err(|e| SarError::unreadable(path.display(), e))?;
                Ok(Box::new(BufReader::with_capacity(buffer_size.max(1), file)))
            }
            SarSource::Memory(data) => Ok(Box::new(Cursor::new(Arc::clone(data)))),
        }
    }

    pub fn chunks(&self, buffer_size: usize) -> Result<ChunkReader<Box<dyn BufRead + Send>>> {
        Ok(ChunkReader::new(self.open(buffer_size)?))
    }

    /// The first line of the source, without its line break.
    pub fn first_line(&self) -> Result<String> {
        let mut reader = self.open(DEFAULT_BUFFER_SIZE)?;
        let mut line = Vec::new();
        reader
            .read_until(b'\n', &mut line)
            .map_err(|e| SarError::unreadable(self, e))?;
        Ok(String::from_utf8_lossy(strip_line_break(&line)).into_owned())
    }
}

impl fmt::Display for SarSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SarSource::File(path) => write!(f, "{}", path.display()),
            SarSource::Memory(data) => write!(f, "<memory: {} bytes>", data.len()),
        }
    }
}

impl From<PathBuf> for SarSource {
    fn from(path: PathBuf) -> Self {
        SarSource::File(path)
    }
}

impl From<&Path> for SarSource {
    fn from(path: &Path) -> Self {
        SarSource::File(path.to_path_buf())
    }
}

/// A trimmed, non-empty run of text between blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogChunk {
    /// Position of the chunk in the source, counting from 0.
    pub index: usize,
    pub text: String,
}

/// Lazily yields chunks from a buffered reader.
pub struct ChunkReader<R> {
    reader: R,
    line: Vec<u8>,
    next_index: usize,
    done: bool,
}

impl<R: BufRead> ChunkReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(256),
            next_index: 0,
            done: false,
        }
    }

    /// Read up to the next blank line. Returns `None` at end of input.
    pub fn next_chunk(&mut self) -> io::Result<Option<LogChunk>> {
        let mut raw: Vec<u8> = Vec::new();

        while !self.done {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                self.done = true;
                break;
            }

            if strip_line_break(&self.line).is_empty() {
                if let Some(chunk) = self.emit(&raw) {
                    return Ok(Some(chunk));
                }
                raw.clear();
                continue;
            }

            raw.extend_from_slice(&self.line);
        }

        Ok(self.emit(&raw))
    }

    fn emit(&mut self, raw: &[u8]) -> Option<LogChunk> {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let chunk = LogChunk {
            index: self.next_index,
            text: text.to_string(),
        };
        self.next_index += 1;
        Some(chunk)
    }
}

impl<R: BufRead> Iterator for ChunkReader<R> {
    type Item = io::Result<LogChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(chunk) => chunk.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn strip_line_break(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
