//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the exam store operations.
//! - Compute countdowns independent of storage.

pub mod countdown;
pub mod exam_store;
