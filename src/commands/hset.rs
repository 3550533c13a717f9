use bytes::Bytes;

use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

/// Represents the parsed arguments for HSET command
pub struct HsetArguments {
    key: Bytes,
    /// Field/value pairs in the order they were sent
    pairs: Vec<(Bytes, Bytes)>,
}

impl HsetArguments {
    /// Parses `key field value [field value ...]`.
    ///
    /// There must be at least one pair and no dangling field.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() < 3 || arguments.len() % 2 == 0 {
            return Err(CommandError::WrongNumberOfArguments("hset"));
        }

        let mut arguments = arguments.into_iter();
        let key = arguments
            .next()
            .ok_or(CommandError::WrongNumberOfArguments("hset"))?;

        let mut pairs = Vec::with_capacity(arguments.len() / 2);
        while let (Some(field), Some(value)) = (arguments.next(), arguments.next()) {
            pairs.push((field, value));
        }

        Ok(Self { key, pairs })
    }
}

/// Handles the Redis HSET command.
///
/// Replies with the number of field/value pairs written by this call. When a
/// field appears more than once, the last value wins.
pub fn hset<S: KeyValueStore + ?Sized>(
    store: &S,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    let hset_arguments = HsetArguments::parse(arguments)?;
    let written = store.hset(hset_arguments.key, hset_arguments.pairs);

    Ok(RespValue::Integer(written as i64))
}
