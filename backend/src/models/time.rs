use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of minutes in one day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock time of day, stored as minutes since midnight.
///
/// Parsed from and rendered as 24-hour `"HH:MM"` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

/// Error returned when a `"HH:MM"` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time '{input}': expected 24-hour HH:MM")]
pub struct TimeParseError {
    pub input: String,
}

impl TimeOfDay {
    /// Create a time of day from hours and minutes.
    pub fn from_hm(hours: u8, minutes: u8) -> Option<Self> {
        if hours < 24 && minutes < 60 {
            Some(Self(u16::from(hours) * 60 + u16::from(minutes)))
        } else {
            None
        }
    }

    /// Minutes elapsed since midnight.
    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hours(&self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.0 % 60) as u8
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TimeParseError {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let (h, m) = trimmed.split_once(':').ok_or_else(err)?;
        // Single-digit hours ("9:05") are accepted, minutes must be two digits.
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(err());
        }
        if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let hours: u8 = h.parse().map_err(|_| err())?;
        let minutes: u8 = m.parse().map_err(|_| err())?;
        Self::from_hm(hours, minutes).ok_or_else(err)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Half-open interval `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Duration in minutes (zero when `end <= start`).
    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }

    /// Half-open overlap test. Touching ranges do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}
