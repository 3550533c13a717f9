use std::{net::SocketAddr, sync::Arc};

use thiserror::Error;
use tokio::{
    io::BufReader,
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    commands::Session,
    config::ServerConfig,
    connection::Connection,
    input::LineReader,
    key_value_store::{KeyValueStore, MemoryStore},
    rdb::RdbDecoder,
    replication::{ReplicationClient, ReplicationError},
};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Replication(#[from] ReplicationError),
}

/// A bound server, ready to accept connections.
pub struct RedisServer<S: ?Sized = MemoryStore> {
    config: ServerConfig,
    listener: TcpListener,
    store: Arc<S>,
}

impl RedisServer<MemoryStore> {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        Self::bind_with_store(config, Arc::new(MemoryStore::new())).await
    }
}

impl<S: KeyValueStore + ?Sized> RedisServer<S> {
    pub async fn bind_with_store(config: ServerConfig, store: Arc<S>) -> Result<Self, ServerError> {
        let address = config.listen_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;

        Ok(Self {
            config,
            listener,
            store,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `cancel` fires.
    ///
    /// If replication is configured it runs alongside the accept loop. When
    /// replication gives up the server is cancelled and the error returned.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        if let Ok(address) = self.local_addr() {
            info!(%address, "listening");
        }

        let replication = self.spawn_replication(&cancel);

        loop {
            let accepted = tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    info!(%peer, "new connection");
                    self.spawn_connection(stream, peer, cancel.clone());
                }
                Err(e) => error!(error = %e, "accept failed"),
            }
        }

        info!("server shutting down");

        if let Some(replication) = replication {
            match replication.await {
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok(())) => {}
                Err(e) => warn!(error = %e, "replication task panicked"),
            }
        }

        Ok(())
    }

    fn spawn_replication(
        &self,
        cancel: &CancellationToken,
    ) -> Option<JoinHandle<Result<(), ReplicationError>>> {
        let config = self.config.replication.clone()?;
        info!(master = %config.master_address(), "replicating");

        let client = ReplicationClient::new(config, Arc::clone(&self.store), RdbDecoder::new());
        let cancel = cancel.clone();

        Some(tokio::spawn(async move {
            let result = client.run(cancel.clone()).await;
            if result.is_err() {
                cancel.cancel();
            }
            result
        }))
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, cancel: CancellationToken) {
        let session = Session::new(Arc::clone(&self.store), self.config.password.clone());

        tokio::spawn(async move {
            let (read_half, write_half) = stream.into_split();
            let mut reader = LineReader::new(BufReader::new(read_half));

            let consumed = Connection::new(peer.to_string(), &mut reader, write_half, session)
                .run(&cancel)
                .await;

            debug!(%peer, bytes = consumed, "connection finished");
        });
    }
}
