//! Export clock.
//!
//! Filename templates reference the wall-clock time of the export
//! (`{YYYY}`, `{MM}`, `{DD}`, `{hh}`, `{mm}`). The clock is sampled once
//! per submission so every file in a batch shares the same timestamp.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Source of the export wall-clock time.
pub trait ExportClock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// The system's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ExportClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock frozen at a fixed instant (for tests and reproducible plans).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl ExportClock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Zero-padded timestamp components used by filename tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParts {
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
    pub minute: String,
}

impl TimestampParts {
    pub fn from_datetime(dt: &NaiveDateTime) -> Self {
        Self {
            year: format!("{:04}", dt.year()),
            month: format!("{:02}", dt.month()),
            day: format!("{:02}", dt.day()),
            hour: format!("{:02}", dt.hour()),
            minute: format!("{:02}", dt.minute()),
        }
    }
}
