use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use std::ops::Range;

/// Byte range of the AM/PM marker in a 12-hour SAR line (`"HH:MM:SS AM ..."`).
pub const MERIDIEM_RANGE: Range<usize> = 9..11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

/// Handles the sample timestamps found at the start of SAR data lines
pub struct TimestampParser;

impl TimestampParser {
    /// The AM/PM marker of a raw line, if the line is 12-hour formatted.
    pub fn meridiem_of(line: &str) -> Option<Meridiem> {
        match line.get(MERIDIEM_RANGE) {
            Some("AM") => Some(Meridiem::Am),
            Some("PM") => Some(Meridiem::Pm),
            _ => None,
        }
    }

    /// Normalize a time token to 24-hour `HH:MM:SS`.
    ///
    /// `12:MM:SS AM` becomes `00:MM:SS`, `12:MM:SS PM` stays, other PM hours
    /// gain 12 and other AM hours pass through. Without a meridiem the token
    /// is already 24-hour and only validated, so normalizing twice is a no-op.
    pub fn normalize(time: &str, meridiem: Option<Meridiem>) -> Result<String> {
        let parsed = NaiveTime::parse_from_str(time, "%H:%M:%S")
            .with_context(|| format!("invalid timestamp '{}'", time))?;

        let hour = match (meridiem, parsed.hour()) {
            (None, hour) => hour,
            (Some(_), hour) if hour == 0 || hour > 12 => {
                anyhow::bail!("hour {} is out of range for a 12-hour timestamp '{}'", hour, time)
            }
            (Some(Meridiem::Am), 12) => 0,
            (Some(Meridiem::Am), hour) => hour,
            (Some(Meridiem::Pm), 12) => 12,
            (Some(Meridiem::Pm), hour) => hour + 12,
        };

        let normalized = NaiveTime::from_hms_opt(hour, parsed.minute(), parsed.second())
            .with_context(|| format!("invalid timestamp '{}'", time))?;
        Ok(normalized.format("%H:%M:%S").to_string())
    }
}
