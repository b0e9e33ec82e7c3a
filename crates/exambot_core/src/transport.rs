//! Chat transport seam and serve loop.
//!
//! # Responsibility
//! - Define the fixed interface a chat client must offer the bot.
//! - Pump inbound messages through the command router and send replies.
//! - Provide a line-oriented transport over any reader/writer pair.
//!
//! # Invariants
//! - Messages authored by the bot itself are never routed.
//! - A failed send is logged and skipped; it never stops the loop.

use crate::command::router::CommandRouter;
use crate::repo::exam_repo::ExamRepository;
use crate::time::clock::Clock;
use log::{error, info, warn};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};

/// One message received from a chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub author: String,
    pub channel: String,
    pub content: String,
}

#[derive(Debug)]
pub enum TransportError {
    Io(std::io::Error),
    Rejected(String),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Rejected(reason) => write!(f, "message rejected: {reason}"),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Rejected(_) => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Interface of the chat client the bot runs on.
pub trait Transport {
    /// Author id the bot itself posts under.
    fn self_id(&self) -> &str;
    /// Blocks for the next message; `Ok(None)` once the channel is closed.
    fn receive(&mut self) -> Result<Option<InboundMessage>, TransportError>;
    fn send(&mut self, channel: &str, text: &str) -> Result<(), TransportError>;
}

/// Counters reported when the serve loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub received: u64,
    pub replied: u64,
    pub send_failures: u64,
}

/// Runs the bot until the transport closes.
///
/// # Errors
/// - Returns the receive error that ended the loop early.
pub fn serve<T, R, C>(
    transport: &mut T,
    router: &CommandRouter<R, C>,
) -> Result<ServeStats, TransportError>
where
    T: Transport + ?Sized,
    R: ExamRepository,
    C: Clock,
{
    let mut stats = ServeStats::default();
    info!("event=serve module=transport status=start self_id={}", transport.self_id());

    loop {
        let message = match transport.receive() {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(err) => {
                error!("event=serve module=transport status=error stage=receive error={err}");
                return Err(err);
            }
        };
        stats.received += 1;

        if message.author == transport.self_id() {
            continue;
        }

        let Some(reply) = router.handle(&message.content) else {
            continue;
        };

        match transport.send(&message.channel, &reply) {
            Ok(()) => stats.replied += 1,
            Err(err) => {
                stats.send_failures += 1;
                error!(
                    "event=reply_send module=transport status=error channel={} author={} error={}",
                    message.channel, message.author, err
                );
            }
        }
    }

    info!(
        "event=serve module=transport status=stopped received={} replied={} send_failures={}",
        stats.received, stats.replied, stats.send_failures
    );
    Ok(stats)
}

/// Transport that reads one message per line and writes replies as lines.
///
/// Every line is attributed to `author` on `channel`; used by the CLI over
/// stdin/stdout. Invalid UTF-8 is decoded lossily.
pub struct LineTransport<I: BufRead, O: Write> {
    input: I,
    output: O,
    author: String,
    channel: String,
    self_id: String,
}

impl<I: BufRead, O: Write> LineTransport<I, O> {
    pub fn new(input: I, output: O, author: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            input,
            output,
            author: author.into(),
            channel: channel.into(),
            self_id: "exambot".to_string(),
        }
    }

    pub fn into_output(self) -> O {
        self.output
    }
}

impl<I: BufRead, O: Write> Transport for LineTransport<I, O> {
    fn self_id(&self) -> &str {
        &self.self_id
    }

    fn receive(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        let mut raw = Vec::new();
        if self.input.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }

        // Bytes that are not UTF-8 are replaced, not fatal to the loop.
        let line = String::from_utf8_lossy(&raw);
        if matches!(line, Cow::Owned(_)) {
            warn!(
                "event=line_receive module=transport status=lossy channel={} bytes={}",
                self.channel,
                raw.len()
            );
        }

        Ok(Some(InboundMessage {
            author: self.author.clone(),
            channel: self.channel.clone(),
            content: line.trim_end_matches(['\r', '\n']).to_string(),
        }))
    }

    fn send(&mut self, channel: &str, text: &str) -> Result<(), TransportError> {
        if channel != self.channel {
            return Err(TransportError::Rejected(format!("unknown channel `{channel}`")));
        }
        writeln!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }
}
