use bytes::Bytes;

use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

pub struct HgetArguments {
    key: Bytes,
    field: Bytes,
}

impl HgetArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let [key, field]: [Bytes; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::WrongNumberOfArguments("hget"))?;

        Ok(Self { key, field })
    }
}

/// Handles the Redis HGET command: the field's value, or the null bulk string
/// when either the hash or the field is missing.
pub fn hget<S: KeyValueStore + ?Sized>(
    store: &S,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    let hget_arguments = HgetArguments::parse(arguments)?;

    Ok(RespValue::BulkString(
        store.hget(&hget_arguments.key, &hget_arguments.field),
    ))
}
