use std::sync::Arc;

use tracing::debug;

use crate::{
    command::{Command, CommandKind},
    commands::{CommandError, Processor},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Whether the connection still has to authenticate before running commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthState {
    pub required: bool,
    pub satisfied: bool,
}

impl AuthState {
    fn allows(&self, kind: Option<CommandKind>) -> bool {
        !self.required || self.satisfied || kind == Some(CommandKind::Auth)
    }
}

/// One client's view of the server: a processor plus its authentication
/// state. Every inbound command goes through [`Session::dispatch`], which
/// produces exactly one reply.
#[derive(Debug)]
pub struct Session<S: ?Sized> {
    processor: Processor<S>,
    auth: AuthState,
}

impl<S: KeyValueStore + ?Sized> Session<S> {
    /// A client session. Authentication is required when a password is set.
    pub fn new(store: Arc<S>, password: Option<String>) -> Self {
        let auth = AuthState {
            required: password.is_some(),
            satisfied: false,
        };

        Self {
            processor: Processor::new(store, password),
            auth,
        }
    }

    /// A session that never asks for AUTH, used to apply the replication
    /// stream and snapshot contents.
    pub fn trusted(store: Arc<S>) -> Self {
        Self::new(store, None)
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth
    }

    pub fn is_queuing(&self) -> bool {
        self.processor.is_queuing()
    }

    pub fn dispatch(&mut self, command: Command) -> RespValue {
        debug!(command = %command, "dispatching");

        match self.try_dispatch(command) {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "command failed");
                e.as_resp()
            }
        }
    }

    fn try_dispatch(&mut self, mut command: Command) -> Result<RespValue, CommandError> {
        let kind = CommandKind::resolve(&command.name);

        if !self.auth.allows(kind) {
            return Err(CommandError::AuthenticationRequired);
        }

        let Some(kind) = kind else {
            return Err(CommandError::UnknownCommand(command.name));
        };

        if !matches!(kind, CommandKind::Exec | CommandKind::Multi) {
            match self.processor.transaction_mut().enqueue(kind, command) {
                Ok(queued) => {
                    debug!(command = kind.name(), queued, "queued for EXEC");
                    return Ok(RespValue::SimpleString("QUEUED".to_string()));
                }
                Err(idle) => command = idle,
            }
        }

        let response = self.processor.invoke(kind, command)?;

        if kind == CommandKind::Auth {
            self.auth.satisfied = true;
        }

        Ok(response)
    }
}
