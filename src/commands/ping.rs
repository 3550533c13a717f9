use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue};

/// Replies `+PONG`. Any arguments are accepted and ignored.
pub fn ping(_arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    Ok(RespValue::SimpleString("PONG".to_string()))
}
