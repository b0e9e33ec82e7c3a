//! Repository layer for exam persistence.
//!
//! # Responsibility
//! - Define the data access contract used by the exam store.
//! - Keep SQLite query details out of the service layer.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`)
//!   in addition to DB transport errors.
//! - Read paths reject malformed persisted dates instead of masking them.

pub mod exam_repo;
