//! The replica side of master/replica replication.
//!
//! One long lived task cycles through three states per connection:
//! handshaking (PSYNC), full syncing (snapshot transfer and load) and
//! streaming (applying the master's write commands as they arrive).

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    io::BufReader,
    net::TcpStream,
    sync::watch,
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    commands::Session,
    config::ReplicationConfig,
    connection::Connection,
    handshake::{HandshakeError, PsyncReply, receive_snapshot, send_psync},
    input::LineReader,
    key_value_store::KeyValueStore,
    snapshot::{SnapshotDecoder, SnapshotError, SnapshotEvent, SnapshotLoader, SnapshotSink},
};

#[derive(Error, Debug)]
pub enum ReplicationError {
    #[error("master at {address} is unreachable: {reason}")]
    UpstreamUnreachable { address: String, reason: String },
}

/// Why a single replication session ended.
#[derive(Error, Debug)]
enum SessionError {
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),
    #[error("snapshot could not be loaded: {0}")]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationState {
    Connecting,
    Handshaking,
    FullSyncing,
    Streaming,
}

/// How far this replica has followed the master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationProgress {
    pub state: ReplicationState,
    pub run_id: Option<String>,
    pub offset: i64,
}

impl Default for ReplicationProgress {
    fn default() -> Self {
        Self {
            state: ReplicationState::Connecting,
            run_id: None,
            offset: -1,
        }
    }
}

pub struct ReplicationClient<S: ?Sized, D> {
    config: ReplicationConfig,
    store: Arc<S>,
    decoder: D,
    progress: watch::Sender<ReplicationProgress>,
}

impl<S, D> ReplicationClient<S, D>
where
    S: KeyValueStore + ?Sized,
    D: SnapshotDecoder,
{
    pub fn new(config: ReplicationConfig, store: Arc<S>, decoder: D) -> Self {
        let (progress, _) = watch::channel(ReplicationProgress::default());

        Self {
            config,
            store,
            decoder,
            progress,
        }
    }

    /// Follow the state, run id and offset as they change.
    pub fn subscribe(&self) -> watch::Receiver<ReplicationProgress> {
        self.progress.subscribe()
    }

    fn set_state(&self, state: ReplicationState) {
        self.progress.send_modify(|progress| progress.state = state);
    }

    /// Replicates until `cancel` fires.
    ///
    /// Failing to reach the master on the very first attempt is fatal. After
    /// that every failure, and every clean disconnect, is followed by a
    /// reconnect after the configured delay.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ReplicationError> {
        let address = self.config.master_address();
        let mut first_attempt = true;

        loop {
            self.set_state(ReplicationState::Connecting);

            let connected = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                connected = timeout(self.config.connect_timeout, TcpStream::connect(&address)) => connected,
            };

            let reason = match connected {
                Ok(Ok(stream)) => {
                    info!(master = %address, "connected to master");
                    first_attempt = false;

                    match self.sync(stream, &cancel).await {
                        Ok(()) => info!(master = %address, "replication stream ended"),
                        Err(e) => warn!(master = %address, error = %e, "replication failed"),
                    }
                    None
                }
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some(format!(
                    "connect timed out after {:?}",
                    self.config.connect_timeout
                )),
            };

            if let Some(reason) = reason {
                if first_attempt {
                    error!(master = %address, reason = %reason, "cannot reach master");
                    return Err(ReplicationError::UpstreamUnreachable { address, reason });
                }
                warn!(master = %address, reason = %reason, "cannot reach master, retrying");
            }

            if cancel.is_cancelled() {
                return Ok(());
            }

            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = sleep(self.config.retry_delay) => {}
            }
        }
    }

    /// One connection's worth of replication: handshake, optional full sync,
    /// then streaming until the master goes away.
    async fn sync(&self, stream: TcpStream, cancel: &CancellationToken) -> Result<(), SessionError> {
        let peer = self.config.master_address();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = LineReader::new(BufReader::new(read_half));

        self.set_state(ReplicationState::Handshaking);
        let (run_id, offset) = {
            let progress = self.progress.borrow();
            (progress.run_id.clone(), progress.offset)
        };

        let reply = send_psync(&mut reader, &mut write_half, run_id.as_deref(), offset).await?;
        debug!(reply = ?reply, "PSYNC reply");

        match reply {
            PsyncReply::FullResync { run_id, offset } => {
                self.set_state(ReplicationState::FullSyncing);

                let snapshot = receive_snapshot(&mut reader).await?;
                self.load_snapshot(&snapshot)?;

                // Only a loaded snapshot makes the master's position ours.
                self.progress.send_modify(|progress| {
                    progress.run_id = Some(run_id);
                    progress.offset = offset;
                });
            }
            PsyncReply::Continue { run_id } => {
                if let Some(run_id) = run_id {
                    self.progress
                        .send_modify(|progress| progress.run_id = Some(run_id));
                }
            }
        }

        self.set_state(ReplicationState::Streaming);
        info!(master = %peer, "streaming from master");

        let consumed = Connection::new(
            peer,
            &mut reader,
            tokio::io::sink(),
            Session::trusted(Arc::clone(&self.store)),
        )
        .read_only()
        .run(cancel)
        .await;

        self.progress
            .send_modify(|progress| progress.offset += consumed as i64);

        Ok(())
    }

    /// A full resync replaces everything held locally. The snapshot is
    /// decoded completely before the store is touched, so a malformed one
    /// leaves the current contents in place.
    fn load_snapshot(&self, snapshot: &[u8]) -> Result<(), SnapshotError> {
        let mut events: Vec<SnapshotEvent> = Vec::new();
        self.decoder.decode(snapshot, &mut events)?;

        self.store.clear();

        let mut loader = SnapshotLoader::new(Arc::clone(&self.store));
        let count = events.len();
        for event in events {
            loader.apply(event);
        }

        info!(
            bytes = snapshot.len(),
            events = count,
            applied = loader.applied(),
            failed = loader.failed(),
            "snapshot loaded"
        );
        Ok(())
    }
}
