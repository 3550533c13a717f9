use bytes::Bytes;

use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

/// Represents the parsed arguments for SET command
pub struct SetArguments {
    /// The key name to store the value under
    key: Bytes,
    /// The value to be stored under the given key
    value: Bytes,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// # Arguments
    ///
    /// * `arguments` - Exactly `[key, value]`. Options such as `PX` or `NX`
    ///   are not understood and count as extra arguments.
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed key and value
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the number of
    ///   arguments is not exactly 2
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let [key, value]: [Bytes; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::WrongNumberOfArguments("set"))?;

        Ok(Self { key, value })
    }
}

/// Handles the Redis SET command, replying `+OK`.
pub fn set<S: KeyValueStore + ?Sized>(
    store: &S,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;
    store.set(set_arguments.key, set_arguments.value);

    Ok(RespValue::ok())
}
