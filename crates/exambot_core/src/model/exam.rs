//! Exam domain model.
//!
//! # Invariants
//! - `name` is the primary key; two records never share it.
//! - `date` is the first instant of the exam day in the reference zone
//!   that was active when the record was written.

use crate::time::codec::format_date;
use chrono::{DateTime, FixedOffset};

/// One tracked exam deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamRecord {
    /// Lowercase token as received from the command line.
    pub name: String,
    /// Exam day start, offset preserved from the time of writing.
    pub date: DateTime<FixedOffset>,
}

impl ExamRecord {
    pub fn new(name: impl Into<String>, date: DateTime<FixedOffset>) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }

    /// User-facing `dd.mm.yyyy` rendering of the exam day.
    pub fn display_date(&self) -> String {
        format_date(&self.date)
    }
}
