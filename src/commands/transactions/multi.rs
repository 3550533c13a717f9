use bytes::Bytes;

use crate::{
    commands::{CommandError, transactions::TransactionState},
    resp::RespValue,
};

pub struct MultiArguments;

impl MultiArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("multi"));
        }

        Ok(Self)
    }
}

pub fn multi(
    transaction: &mut TransactionState,
    arguments: Vec<Bytes>,
) -> Result<RespValue, CommandError> {
    MultiArguments::parse(arguments)?;
    transaction.start()?;

    Ok(RespValue::ok())
}
