use bytes::Bytes;

use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

/// Represents the parsed arguments for GET command
pub struct GetArguments {
    /// The key name to retrieve from the store
    key: Bytes,
}

impl GetArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let [key]: [Bytes; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::WrongNumberOfArguments("get"))?;

        Ok(Self { key })
    }
}

/// Handles the Redis GET command.
///
/// Looks the key up in the string namespace of the store.
///
/// # Returns
///
/// * `Ok(RespValue)` - Bulk string with the value, or the null bulk string if
///   the key was never set
/// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments
///   is not exactly 1
///
/// # Examples
///
/// ```ignore
/// // GET mykey
/// let result = get(&store, vec![Bytes::from("mykey")]);
/// // Returns: BulkString(Some("hello")) or BulkString(None)
/// ```
pub fn get<S: KeyValueStore + ?Sized>(
    store: &S,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    Ok(RespValue::BulkString(store.get(&get_arguments.key)))
}
