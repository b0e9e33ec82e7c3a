//! Time handling for exam deadlines.
//!
//! # Responsibility
//! - Provide an injectable source of "now" (`clock`).
//! - Resolve the reference timezone all comparisons happen in (`zone`).
//! - Parse and format user-facing and persisted dates (`codec`).

pub mod clock;
pub mod codec;
pub mod zone;
