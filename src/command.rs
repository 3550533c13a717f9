//! Parsed client commands and the table that resolves them to handlers.

use std::fmt;

use bytes::Bytes;

use crate::resp::RespValue;

/// A decoded request: an uppercased command name plus its raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<Bytes>,
}

impl Command {
    /// Builds a command, normalising the name the same way the decoder does.
    pub fn new(name: &str, args: Vec<Bytes>) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            args,
        }
    }

    /// Convenience constructor for string arguments.
    pub fn from_parts(name: &str, args: &[&str]) -> Self {
        Self::new(
            name,
            args.iter()
                .map(|arg| Bytes::copy_from_slice(arg.as_bytes()))
                .collect(),
        )
    }

    /// The command as a RESP request array, name first.
    pub fn to_resp(&self) -> RespValue {
        let mut elements = Vec::with_capacity(self.args.len() + 1);
        elements.push(RespValue::bulk(Bytes::copy_from_slice(self.name.as_bytes())));
        elements.extend(self.args.iter().cloned().map(RespValue::bulk));

        RespValue::Array(elements)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}

/// The closed set of commands this server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Get,
    Set,
    HSet,
    HGet,
    HGetAll,
    Ping,
    Auth,
    Multi,
    Exec,
}

const COMMAND_TABLE: &[(&str, CommandKind)] = &[
    ("GET", CommandKind::Get),
    ("SET", CommandKind::Set),
    ("HSET", CommandKind::HSet),
    ("HGET", CommandKind::HGet),
    ("HGETALL", CommandKind::HGetAll),
    ("PING", CommandKind::Ping),
    ("AUTH", CommandKind::Auth),
    ("MULTI", CommandKind::Multi),
    ("EXEC", CommandKind::Exec),
];

impl CommandKind {
    /// Looks up an (already uppercased) command name.
    pub fn resolve(name: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, kind)| *kind)
    }

    pub fn name(&self) -> &'static str {
        COMMAND_TABLE
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("UNKNOWN")
    }
}
