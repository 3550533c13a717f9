use bytes::Bytes;

use crate::{
    commands::{CommandError, Processor},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ExecArguments;

impl ExecArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("exec"));
        }

        Ok(Self)
    }
}

/// Replays every queued command, oldest first, and collects one reply per
/// command. A failing command contributes an error element and the rest of
/// the batch still runs.
pub fn exec<S: KeyValueStore + ?Sized>(
    processor: &mut Processor<S>,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    ExecArguments::parse(arguments)?;

    let queue = processor.transaction_mut().finish()?;
    let mut responses = Vec::with_capacity(queue.len());

    for (kind, command) in queue {
        match processor.invoke(kind, command) {
            Ok(response) => responses.push(response),
            Err(e) => responses.push(e.as_resp()),
        }
    }

    Ok(RespValue::Array(responses))
}
