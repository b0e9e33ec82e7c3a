//! Command line tokenizer.

/// Prefix marking a line as a bot command.
pub const COMMAND_PREFIX: char = '!';

/// Tokenized command: lowercase word without prefix plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub word: String,
    pub args: Vec<String>,
}

/// Tokenizes an inbound line.
///
/// The whole line is lowercased before splitting on whitespace, so exam
/// names are stored lowercase. Returns `None` for empty lines and lines not
/// starting with `!`. Only one prefix is stripped, so `!!word` keeps a `!`
/// in its word and matches no command.
pub fn tokenize(line: &str) -> Option<CommandLine> {
    let lowered = line.to_lowercase();
    if !lowered.starts_with(COMMAND_PREFIX) {
        return None;
    }

    let mut tokens = lowered.split_whitespace();
    let word = tokens.next()?.strip_prefix(COMMAND_PREFIX)?.to_string();
    Some(CommandLine {
        word,
        args: tokens.map(str::to_string).collect(),
    })
}

/// Recognized bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AddExam,
    TimeLeft,
    DeleteExam,
    UpdateExam,
    ListExams,
}

impl Command {
    /// Maps a command word, accepting both `addexam` and `add-exam` spellings.
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "addexam" | "add-exam" => Some(Self::AddExam),
            "timeleft" | "time-left" => Some(Self::TimeLeft),
            "deleteexam" | "delete-exam" => Some(Self::DeleteExam),
            "updateexam" | "update-exam" => Some(Self::UpdateExam),
            "listexams" | "list-exams" => Some(Self::ListExams),
            _ => None,
        }
    }

    /// Canonical command word used in logs and usage text.
    pub fn word(self) -> &'static str {
        match self {
            Self::AddExam => "addexam",
            Self::TimeLeft => "timeleft",
            Self::DeleteExam => "deleteexam",
            Self::UpdateExam => "updateexam",
            Self::ListExams => "listexams",
        }
    }

    /// Minimum number of arguments after the command word.
    pub fn arity(self) -> usize {
        match self {
            Self::AddExam | Self::UpdateExam => 2,
            Self::TimeLeft | Self::DeleteExam => 1,
            Self::ListExams => 0,
        }
    }

    /// Reply for a call with fewer than `arity` arguments; `None` when the
    /// command takes none.
    pub fn usage(self) -> Option<&'static str> {
        match self {
            Self::AddExam => Some("Usage: !addexam <exam_name> <dd.mm.yyyy>"),
            Self::TimeLeft => Some("Usage: !timeleft <exam_name>"),
            Self::DeleteExam => Some("Usage: !deleteexam <exam_name>"),
            Self::UpdateExam => Some("Usage: !updateexam <exam_name> <dd.mm.yyyy>"),
            Self::ListExams => None,
        }
    }
}
