use bytes::Bytes;

use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

pub struct HgetallArguments {
    key: Bytes,
}

impl HgetallArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let [key]: [Bytes; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::WrongNumberOfArguments("hgetall"))?;

        Ok(Self { key })
    }
}

/// Handles the Redis HGETALL command.
///
/// Replies with a flat array of alternating field and value bulk strings. The
/// order of pairs is whatever the store iterates in; a missing hash is an
/// empty array.
pub fn hgetall<S: KeyValueStore + ?Sized>(
    store: &S,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    let hgetall_arguments = HgetallArguments::parse(arguments)?;

    let elements = store
        .hgetall(&hgetall_arguments.key)
        .into_iter()
        .flat_map(|(field, value)| [RespValue::bulk(field), RespValue::bulk(value)])
        .collect();

    Ok(RespValue::Array(elements))
}
