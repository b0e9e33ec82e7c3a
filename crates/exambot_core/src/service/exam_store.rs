//! Exam store use-cases.
//!
//! # Responsibility
//! - Validate user-supplied dates before anything touches storage.
//! - Map repository outcomes onto the tagged `ExamError` kinds.
//!
//! # Invariants
//! - A date is rejected only when strictly before "now"; equal is accepted.
//! - Validation order is parse, then past check, then existence.
//! - The store is the only writer of exam records.

use crate::model::exam::ExamRecord;
use crate::repo::exam_repo::{ExamRepository, RepoError};
use crate::time::clock::Clock;
use crate::time::codec::{format_date, parse_date};
use crate::time::zone::{ReferenceZone, ZoneResolver};
use chrono::{DateTime, FixedOffset};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error kinds surfaced by exam store operations.
#[derive(Debug)]
pub enum ExamError {
    /// Date text is not a valid `dd.mm.yyyy` date.
    InvalidFormat(String),
    /// Date resolves to an instant before now.
    PastDate(String),
    /// Add with a name that is already taken.
    AlreadyExists(String),
    /// Operation on a name with no record.
    NotFound(String),
    /// Persistence failure unrelated to validation.
    StoreUnavailable(RepoError),
}

impl Display for ExamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(value) => write!(f, "invalid date format: `{value}`"),
            Self::PastDate(value) => write!(f, "date is in the past: `{value}`"),
            Self::AlreadyExists(name) => write!(f, "exam already exists: {name}"),
            Self::NotFound(name) => write!(f, "exam not found: {name}"),
            Self::StoreUnavailable(err) => write!(f, "exam store unavailable: {err}"),
        }
    }
}

impl Error for ExamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ExamError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(name) => Self::NotFound(name),
            RepoError::AlreadyExists(name) => Self::AlreadyExists(name),
            other => Self::StoreUnavailable(other),
        }
    }
}

pub type ExamResult<T> = Result<T, ExamError>;

/// Exam store over a repository, a clock and the reference zone.
pub struct ExamStore<R: ExamRepository, C: Clock> {
    repo: R,
    clock: C,
    zones: ZoneResolver,
}

impl<R: ExamRepository, C: Clock> ExamStore<R, C> {
    pub fn new(repo: R, clock: C, zones: ZoneResolver) -> Self {
        Self { repo, clock, zones }
    }

    /// Current instant and zone, as every comparison in the store sees them.
    pub fn now(&self) -> (DateTime<FixedOffset>, ReferenceZone) {
        self.zones.resolve(&self.clock)
    }

    /// Creates a new exam.
    ///
    /// # Errors
    /// - `InvalidFormat`, `PastDate`, `AlreadyExists`, `StoreUnavailable`.
    pub fn add(&self, name: &str, date_text: &str) -> ExamResult<ExamRecord> {
        let exam = ExamRecord::new(name, self.validated_date("add", date_text)?);

        if let Err(err) = self.repo.insert_if_absent(&exam) {
            return Err(self.log_repo_failure("add", name, err));
        }

        info!(
            "event=exam_add module=store status=ok name={} date={}",
            name,
            format_date(&exam.date)
        );
        Ok(exam)
    }

    /// Fetches one exam by name.
    pub fn get(&self, name: &str) -> ExamResult<ExamRecord> {
        match self.repo.get(name) {
            Ok(Some(exam)) => Ok(exam),
            Ok(None) => {
                warn!("event=exam_get module=store status=not_found name={name}");
                Err(ExamError::NotFound(name.to_string()))
            }
            Err(err) => Err(self.log_repo_failure("get", name, err)),
        }
    }

    /// Moves an existing exam to a new date.
    ///
    /// # Errors
    /// - `InvalidFormat`, `PastDate`, `NotFound`, `StoreUnavailable`.
    pub fn update(&self, name: &str, date_text: &str) -> ExamResult<ExamRecord> {
        let exam = ExamRecord::new(name, self.validated_date("update", date_text)?);

        if let Err(err) = self.repo.update_date(&exam) {
            return Err(self.log_repo_failure("update", name, err));
        }

        info!(
            "event=exam_update module=store status=ok name={} date={}",
            name,
            format_date(&exam.date)
        );
        Ok(exam)
    }

    /// Removes an exam.
    pub fn delete(&self, name: &str) -> ExamResult<()> {
        if let Err(err) = self.repo.delete(name) {
            return Err(self.log_repo_failure("delete", name, err));
        }

        info!("event=exam_delete module=store status=ok name={name}");
        Ok(())
    }

    /// Lists all exams ordered by date, then name.
    pub fn list(&self) -> ExamResult<Vec<ExamRecord>> {
        match self.repo.list() {
            Ok(exams) => {
                info!(
                    "event=exam_list module=store status=ok count={}",
                    exams.len()
                );
                Ok(exams)
            }
            Err(err) => Err(self.log_repo_failure("list", "*", err)),
        }
    }

    fn validated_date(&self, op: &str, date_text: &str) -> ExamResult<DateTime<FixedOffset>> {
        let invalid = || {
            warn!(
                "event=exam_{op} module=store status=rejected reason=invalid_format date={date_text}"
            );
            ExamError::InvalidFormat(date_text.to_string())
        };

        let day = parse_date(date_text).map_err(|_| invalid())?;
        let (now, zone) = self.now();
        let date = zone.midnight(day).ok_or_else(invalid)?;

        if date < now {
            warn!(
                "event=exam_{op} module=store status=rejected reason=past_date date={date_text} now={}",
                now.to_rfc3339()
            );
            return Err(ExamError::PastDate(date_text.to_string()));
        }

        Ok(date)
    }

    fn log_repo_failure(&self, op: &str, name: &str, err: RepoError) -> ExamError {
        let err = ExamError::from(err);
        match &err {
            ExamError::NotFound(_) => {
                warn!("event=exam_{op} module=store status=not_found name={name}");
            }
            ExamError::AlreadyExists(_) => {
                warn!("event=exam_{op} module=store status=rejected reason=already_exists name={name}");
            }
            other => {
                error!("event=exam_{op} module=store status=error name={name} error={other}");
            }
        }
        err
    }
}
