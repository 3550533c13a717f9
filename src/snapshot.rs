//! Loading a master's snapshot into the local store.
//!
//! A [`SnapshotDecoder`] turns the raw snapshot into a stream of
//! [`SnapshotEvent`]s; [`SnapshotLoader`] applies each event as the command a
//! client would have sent to produce it.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    command::Command, commands::Session, key_value_store::KeyValueStore, rdb::RdbError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEvent {
    Set { key: Bytes, value: Bytes },
    HashField { key: Bytes, field: Bytes, value: Bytes },
}

impl SnapshotEvent {
    /// The write command equivalent to this event.
    pub fn into_command(self) -> Command {
        match self {
            SnapshotEvent::Set { key, value } => Command::new("SET", vec![key, value]),
            SnapshotEvent::HashField { key, field, value } => {
                Command::new("HSET", vec![key, field, value])
            }
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("malformed RDB snapshot: {0}")]
    Rdb(#[from] RdbError),
}

/// Receives decoded events in snapshot order.
pub trait SnapshotSink {
    fn apply(&mut self, event: SnapshotEvent);
}

impl SnapshotSink for Vec<SnapshotEvent> {
    fn apply(&mut self, event: SnapshotEvent) {
        self.push(event);
    }
}

pub trait SnapshotDecoder: Send + Sync {
    /// Decodes `bytes`, feeding every event to `sink`. Returns the number of
    /// events produced.
    fn decode(&self, bytes: &[u8], sink: &mut dyn SnapshotSink) -> Result<usize, SnapshotError>;
}

/// Applies snapshot events through a trusted session.
///
/// A failing event is counted and logged; it does not stop the load.
pub struct SnapshotLoader<S: ?Sized> {
    session: Session<S>,
    applied: usize,
    failed: usize,
}

impl<S: KeyValueStore + ?Sized> SnapshotLoader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            session: Session::trusted(store),
            applied: 0,
            failed: 0,
        }
    }

    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl<S: KeyValueStore + ?Sized> SnapshotSink for SnapshotLoader<S> {
    fn apply(&mut self, event: SnapshotEvent) {
        let command = event.into_command();
        debug!(command = %command, "loading snapshot entry");

        let reply = self.session.dispatch(command);
        if reply.is_error() {
            warn!(reply = ?reply, "snapshot entry rejected");
            self.failed += 1;
        } else {
            self.applied += 1;
        }
    }
}
