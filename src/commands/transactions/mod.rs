mod exec;
mod multi;

pub use exec::{ExecArguments, exec};
pub use multi::{MultiArguments, multi};

use crate::{
    command::{Command, CommandKind},
    commands::CommandError,
};

/// Per-connection MULTI/EXEC state.
///
/// Queued commands are already resolved so EXEC can replay them without
/// looking names up again.
#[derive(Debug, Default)]
pub enum TransactionState {
    #[default]
    Idle,
    Queuing(Vec<(CommandKind, Command)>),
}

impl TransactionState {
    pub fn is_queuing(&self) -> bool {
        matches!(self, TransactionState::Queuing(_))
    }

    pub fn start(&mut self) -> Result<(), CommandError> {
        if self.is_queuing() {
            return Err(CommandError::NestedMulti);
        }

        *self = TransactionState::Queuing(Vec::new());
        Ok(())
    }

    /// Appends a command to the open transaction and returns the queue
    /// length. With no transaction open the command is handed back.
    pub fn enqueue(&mut self, kind: CommandKind, command: Command) -> Result<usize, Command> {
        match self {
            TransactionState::Queuing(queue) => {
                queue.push((kind, command));
                Ok(queue.len())
            }
            TransactionState::Idle => Err(command),
        }
    }

    /// Closes the transaction and hands back everything queued, in order.
    pub fn finish(&mut self) -> Result<Vec<(CommandKind, Command)>, CommandError> {
        match std::mem::take(self) {
            TransactionState::Queuing(queue) => Ok(queue),
            TransactionState::Idle => Err(CommandError::ExecWithoutMulti),
        }
    }
}
