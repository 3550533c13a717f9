use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue};

pub struct AuthArguments {
    password: Bytes,
}

impl AuthArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let [password]: [Bytes; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::WrongNumberOfArguments("auth"))?;

        Ok(Self { password })
    }
}

/// Handles the Redis AUTH command against the configured password.
///
/// With no password configured the command always fails with
/// [`CommandError::NoPasswordSet`], whatever the arguments.
pub fn auth(password: Option<&str>, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let Some(password) = password else {
        return Err(CommandError::NoPasswordSet);
    };

    let auth_arguments = AuthArguments::parse(arguments)?;

    if auth_arguments.password.as_ref() != password.as_bytes() {
        return Err(CommandError::InvalidPassword);
    }

    Ok(RespValue::ok())
}
