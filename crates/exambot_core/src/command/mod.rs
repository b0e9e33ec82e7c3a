//! Chat command parsing and dispatch.
//!
//! # Responsibility
//! - Turn one inbound text line into a command word plus ordered arguments.
//! - Dispatch commands to the exam store and render the reply text.
//!
//! # Invariants
//! - Nothing in this module depends on a concrete chat transport.

pub mod router;
pub mod tokenizer;
