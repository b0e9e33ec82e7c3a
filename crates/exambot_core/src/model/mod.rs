//! Domain model for tracked exams.
//!
//! # Invariants
//! - Every exam is identified by its unique name.

pub mod exam;
