//! Input handling: turning a byte stream into [`Command`]s.
//!
//! Reading is line based. A [`LineSource`] hands out one newline-terminated line
//! at a time and [`CommandParser`] runs the RESP request state machine over
//! those lines, so a command may arrive in any number of fragments.

use std::future::Future;

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::trace;

use crate::command::Command;

/// Malformed framing. Recoverable: the connection answers with an error and
/// keeps reading.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ParseError {
    #[error("invalid multibulk length '{0}'")]
    InvalidMultibulkLength(String),
    #[error("expected '$', got '{0}'")]
    ExpectedBulkLength(String),
    #[error("invalid bulk length '{0}'")]
    InvalidBulkLength(String),
}

/// Errors that can occur while reading a command from a connection.
#[derive(Error, Debug, PartialEq)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Protocol error: {0}")]
    Parse(#[from] ParseError),
}

impl CommandReadError {
    /// Transport errors end the connection; parse errors do not.
    pub fn is_transport(&self) -> bool {
        !matches!(self, CommandReadError::Parse(_))
    }
}

/// Something that yields successive lines with their terminator removed.
///
/// `Ok(None)` means the peer closed the stream.
pub trait LineSource {
    fn next_line(&mut self) -> impl Future<Output = std::io::Result<Option<Bytes>>> + Send;
}

/// A [`LineSource`] over any buffered async reader that counts every byte it
/// consumes, terminators included.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    bytes_read: u64,
}

impl<R> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}

impl<R> LineSource for LineReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> std::io::Result<Option<Bytes>> {
        let mut line = Vec::new();
        let number_of_bytes = self.reader.read_until(b'\n', &mut line).await?;
        self.bytes_read += number_of_bytes as u64;

        // A trailing fragment without a newline only happens when the peer
        // hung up mid-line.
        if number_of_bytes == 0 || line.last() != Some(&b'\n') {
            return Ok(None);
        }

        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Ok(Some(Bytes::from(line)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingArrayHeader,
    AwaitingArgLength,
    AwaitingArgValue,
}

/// Incremental RESP request decoder.
///
/// Accepts both the multibulk form (`*<n>` then `$<len>`/value line pairs) and
/// the inline form (one line of whitespace separated tokens).
#[derive(Debug)]
pub struct CommandParser {
    state: ParserState,
    args_expected: usize,
    args_seen: usize,
    pending_arg_length: usize,
    name: Option<String>,
    args: Vec<Bytes>,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::AwaitingArrayHeader,
            args_expected: 0,
            args_seen: 0,
            pending_arg_length: 0,
            name: None,
            args: Vec::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feeds one line into the state machine.
    ///
    /// Returns `Ok(Some(command))` once a full command has been seen. On error
    /// the parser is reset so the next line starts a fresh command.
    pub fn feed(&mut self, line: Bytes) -> Result<Option<Command>, ParseError> {
        let result = self.advance(line);
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn advance(&mut self, line: Bytes) -> Result<Option<Command>, ParseError> {
        match self.state {
            ParserState::AwaitingArrayHeader => {
                if line.first() != Some(&b'*') {
                    return Ok(self.parse_inline(line));
                }

                let count = parse_decimal(&line[1..])
                    .filter(|count| *count > 0)
                    .ok_or_else(|| ParseError::InvalidMultibulkLength(lossy(&line[1..])))?;

                self.args_expected = count as usize;
                self.args.reserve(self.args_expected.saturating_sub(1));
                self.state = ParserState::AwaitingArgLength;
                Ok(None)
            }
            ParserState::AwaitingArgLength => {
                if line.first() != Some(&b'$') {
                    return Err(ParseError::ExpectedBulkLength(lossy(&line)));
                }

                let length = parse_decimal(&line[1..])
                    .filter(|length| *length >= 0)
                    .ok_or_else(|| ParseError::InvalidBulkLength(lossy(&line[1..])))?;

                self.pending_arg_length = length as usize;
                self.state = ParserState::AwaitingArgValue;
                Ok(None)
            }
            ParserState::AwaitingArgValue => {
                if line.len() != self.pending_arg_length {
                    trace!(
                        declared = self.pending_arg_length,
                        actual = line.len(),
                        "bulk length does not match line length"
                    );
                }

                self.args_seen += 1;
                if self.name.is_none() {
                    self.name = Some(lossy(&line).to_ascii_uppercase());
                } else {
                    self.args.push(line);
                }

                if self.args_seen == self.args_expected {
                    let name = self.name.take().unwrap_or_default();
                    let args = std::mem::take(&mut self.args);
                    self.reset();
                    return Ok(Some(Command { name, args }));
                }

                self.state = ParserState::AwaitingArgLength;
                Ok(None)
            }
        }
    }

    fn parse_inline(&mut self, line: Bytes) -> Option<Command> {
        let mut tokens = line
            .split(|byte| byte.is_ascii_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| line.slice_ref(token));

        // Blank lines carry no command and are skipped.
        let name = tokens.next()?;

        Some(Command {
            name: lossy(&name).to_ascii_uppercase(),
            args: tokens.collect(),
        })
    }

    /// Pulls lines from `source` until a full command has been decoded.
    pub async fn read_command<S>(&mut self, source: &mut S) -> Result<Command, CommandReadError>
    where
        S: LineSource,
    {
        loop {
            let line = match source.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Err(CommandReadError::ConnectionClosed),
                Err(e) => return Err(CommandReadError::Io(e.to_string())),
            };

            if let Some(command) = self.feed(line)? {
                return Ok(command);
            }
        }
    }
}

fn parse_decimal(digits: &[u8]) -> Option<i64> {
    std::str::from_utf8(digits).ok()?.parse::<i64>().ok()
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
