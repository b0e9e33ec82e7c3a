//! Command router.
//!
//! # Responsibility
//! - Enforce argument arity before the store is touched.
//! - Translate store and countdown outcomes into one fixed reply each.
//!
//! # Invariants
//! - Every store error is recovered here; `handle` never panics on input.
//! - Unknown commands produce no reply.

use crate::command::tokenizer::{tokenize, Command};
use crate::model::exam::ExamRecord;
use crate::repo::exam_repo::ExamRepository;
use crate::service::countdown::{time_left, Countdown};
use crate::service::exam_store::{ExamError, ExamStore};
use crate::time::clock::Clock;
use log::{info, warn};

pub const MSG_INVALID_FORMAT: &str = "Invalid date format. Use dd.mm.yyyy";
pub const MSG_ALREADY_EXISTS: &str = "Exam with this name already exists";
pub const MSG_NOT_FOUND: &str = "Exam not found";
pub const MSG_NO_EXAMS: &str = "No exams scheduled";
pub const LIST_HEADER: &str = "Scheduled exams:";

/// Routes tokenized command lines to an owned exam store.
pub struct CommandRouter<R: ExamRepository, C: Clock> {
    store: ExamStore<R, C>,
}

impl<R: ExamRepository, C: Clock> CommandRouter<R, C> {
    pub fn new(store: ExamStore<R, C>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ExamStore<R, C> {
        &self.store
    }

    /// Handles one inbound line and returns the reply, if any.
    pub fn handle(&self, line: &str) -> Option<String> {
        let parsed = tokenize(line)?;
        let Some(command) = Command::from_word(&parsed.word) else {
            warn!(
                "event=command_dispatch module=router status=unknown command={}",
                parsed.word
            );
            return None;
        };

        info!(
            "event=command_dispatch module=router status=start command={} args={}",
            command.word(),
            parsed.args.len()
        );

        if parsed.args.len() < command.arity() {
            warn!(
                "event=command_dispatch module=router status=usage command={} args={}",
                command.word(),
                parsed.args.len()
            );
            return command.usage().map(str::to_string);
        }

        let args = &parsed.args;
        let reply = match command {
            Command::AddExam => self.add_exam(&args[0], &args[1]),
            Command::TimeLeft => self.time_left(&args[0]),
            Command::DeleteExam => self.delete_exam(&args[0]),
            Command::UpdateExam => self.update_exam(&args[0], &args[1]),
            Command::ListExams => self.list_exams(),
        };
        Some(reply)
    }

    fn add_exam(&self, name: &str, date_text: &str) -> String {
        match self.store.add(name, date_text) {
            Ok(exam) => format!("Exam {} added for {}", exam.name, exam.display_date()),
            Err(err) => reply_for_error(Command::AddExam, &err, date_text),
        }
    }

    fn time_left(&self, name: &str) -> String {
        let exam = match self.store.get(name) {
            Ok(exam) => exam,
            Err(err) => return reply_for_error(Command::TimeLeft, &err, name),
        };

        let (now, _) = self.store.now();
        match time_left(&exam.date, &now) {
            Countdown::Passed => {
                info!("event=time_left module=router status=passed name={name}");
                format!("Exam {name} has already passed")
            }
            Countdown::Remaining {
                days,
                hours,
                minutes,
            } => {
                info!(
                    "event=time_left module=router status=ok name={name} days={days} hours={hours} minutes={minutes}"
                );
                format!("Time until {name}: {days} days, {hours} hours, {minutes} minutes")
            }
        }
    }

    fn delete_exam(&self, name: &str) -> String {
        match self.store.delete(name) {
            Ok(()) => format!("Exam {name} deleted"),
            Err(err) => reply_for_error(Command::DeleteExam, &err, name),
        }
    }

    fn update_exam(&self, name: &str, date_text: &str) -> String {
        match self.store.update(name, date_text) {
            Ok(exam) => format!("Exam {} updated to {}", exam.name, exam.display_date()),
            Err(err) => reply_for_error(Command::UpdateExam, &err, date_text),
        }
    }

    fn list_exams(&self) -> String {
        match self.store.list() {
            Ok(exams) if exams.is_empty() => MSG_NO_EXAMS.to_string(),
            Ok(exams) => render_list(&exams),
            Err(err) => reply_for_error(Command::ListExams, &err, ""),
        }
    }
}

fn render_list(exams: &[ExamRecord]) -> String {
    let mut reply = String::from(LIST_HEADER);
    for exam in exams {
        reply.push_str(&format!("\n- {}: {}", exam.name, exam.display_date()));
    }
    reply
}

fn reply_for_error(command: Command, err: &ExamError, input: &str) -> String {
    warn!(
        "event=command_reply module=router status=error command={} input={} error={}",
        command.word(),
        input,
        err
    );

    match err {
        ExamError::InvalidFormat(_) => MSG_INVALID_FORMAT.to_string(),
        ExamError::PastDate(_) => match command {
            Command::UpdateExam => "Cannot update exam to a past date".to_string(),
            _ => "Cannot add exam in the past".to_string(),
        },
        ExamError::AlreadyExists(_) => MSG_ALREADY_EXISTS.to_string(),
        ExamError::NotFound(_) => MSG_NOT_FOUND.to_string(),
        ExamError::StoreUnavailable(_) => store_failure_message(command).to_string(),
    }
}

fn store_failure_message(command: Command) -> &'static str {
    match command {
        Command::AddExam => "Error adding exam",
        Command::TimeLeft => "Error retrieving exam",
        Command::DeleteExam => "Error deleting exam",
        Command::UpdateExam => "Error updating exam",
        Command::ListExams => "Error listing exams",
    }
}
