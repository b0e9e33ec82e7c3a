//! Core domain logic for the exam countdown bot.
//! This crate owns exam records and every rule about dates and countdowns.

pub mod command;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod time;
pub mod transport;

pub use command::router::CommandRouter;
pub use command::tokenizer::{tokenize, Command, CommandLine};
pub use config::{Config, ConfigError};
pub use logging::{default_log_level, init_logging};
pub use model::exam::ExamRecord;
pub use repo::exam_repo::{ExamRepository, RepoError, RepoResult, SqliteExamRepository};
pub use service::countdown::{time_left, Countdown};
pub use service::exam_store::{ExamError, ExamResult, ExamStore};
pub use time::clock::{Clock, FixedClock, SystemClock};
pub use time::zone::{ReferenceZone, ZoneResolver};
pub use transport::{serve, InboundMessage, LineTransport, ServeStats, Transport, TransportError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
