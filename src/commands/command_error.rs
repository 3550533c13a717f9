use thiserror::Error;

use crate::resp::RespValue;

/// Everything a command can fail with. None of these close the connection;
/// each one is rendered as a single error reply.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum CommandError {
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(&'static str),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("Authentication required.")]
    AuthenticationRequired,
    #[error("invalid password")]
    InvalidPassword,
    #[error("Client sent AUTH, but no password is set")]
    NoPasswordSet,
    #[error("MULTI calls can not be nested")]
    NestedMulti,
    #[error("EXEC without MULTI")]
    ExecWithoutMulti,
}

impl CommandError {
    /// The error prefix Redis clients key off.
    fn prefix(&self) -> &'static str {
        match self {
            CommandError::AuthenticationRequired => "NOAUTH",
            _ => "ERR",
        }
    }

    pub fn as_string(&self) -> String {
        format!("{} {}", self.prefix(), self)
    }

    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(self.as_string())
    }
}
