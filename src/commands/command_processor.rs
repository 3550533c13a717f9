use std::sync::Arc;

use crate::{
    command::{Command, CommandKind},
    commands::{
        auth::auth,
        command_error::CommandError,
        get::get,
        hget::hget,
        hgetall::hgetall,
        hset::hset,
        ping::ping,
        set::set,
        transactions::{TransactionState, exec, multi},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Executes resolved commands for one connection.
///
/// Wraps the shared store with the state that belongs to a single client: the
/// configured password and the open transaction, if any.
#[derive(Debug)]
pub struct Processor<S: ?Sized> {
    store: Arc<S>,
    password: Option<String>,
    transaction: TransactionState,
}

impl<S: KeyValueStore + ?Sized> Processor<S> {
    pub fn new(store: Arc<S>, password: Option<String>) -> Self {
        Self {
            store,
            password,
            transaction: TransactionState::Idle,
        }
    }

    pub fn is_queuing(&self) -> bool {
        self.transaction.is_queuing()
    }

    pub fn transaction_mut(&mut self) -> &mut TransactionState {
        &mut self.transaction
    }

    /// Runs `command` through the handler for `kind`.
    ///
    /// This never queues; deciding between queuing and running is the
    /// session's job.
    pub fn invoke(&mut self, kind: CommandKind, command: Command) -> Result<RespValue, CommandError> {
        let arguments = command.args;
        let store = self.store.as_ref();

        match kind {
            CommandKind::Get => get(store, arguments),
            CommandKind::Set => set(store, arguments),
            CommandKind::HSet => hset(store, arguments),
            CommandKind::HGet => hget(store, arguments),
            CommandKind::HGetAll => hgetall(store, arguments),
            CommandKind::Ping => ping(arguments),
            CommandKind::Auth => auth(self.password.as_deref(), arguments),
            CommandKind::Multi => multi(&mut self.transaction, arguments),
            CommandKind::Exec => exec(self, arguments),
        }
    }
}
