use bytes::BytesMut;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    commands::Session,
    input::{CommandParser, CommandReadError, LineReader},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Drives one peer: read a command, dispatch it, write the reply, repeat.
///
/// Client connections answer every command. The replication stream runs the
/// same loop in read-only mode, where commands are applied but nothing is
/// written back to the master.
pub struct Connection<'a, R, W, S: ?Sized> {
    peer: String,
    reader: &'a mut LineReader<R>,
    writer: W,
    parser: CommandParser,
    session: Session<S>,
    read_only: bool,
    write_buffer: BytesMut,
}

impl<'a, R, W, S> Connection<'a, R, W, S>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    S: KeyValueStore + ?Sized,
{
    pub fn new(
        peer: impl Into<String>,
        reader: &'a mut LineReader<R>,
        writer: W,
        session: Session<S>,
    ) -> Self {
        Self {
            peer: peer.into(),
            reader,
            writer,
            parser: CommandParser::new(),
            session,
            read_only: false,
            write_buffer: BytesMut::with_capacity(1024),
        }
    }

    /// Apply commands without ever writing replies.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Serves the peer until it disconnects, a transport error occurs or
    /// `cancel` fires. Returns how many bytes were consumed from the reader.
    pub async fn run(mut self, cancel: &CancellationToken) -> u64 {
        let start = self.reader.bytes_read();

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(peer = %self.peer, "connection cancelled");
                    break;
                }
                result = self.parser.read_command(&mut *self.reader) => result,
            };

            let reply = match result {
                Ok(command) => self.session.dispatch(command),
                Err(CommandReadError::Parse(e)) => {
                    RespValue::Error(format!("ERR {}", CommandReadError::Parse(e)))
                }
                Err(CommandReadError::ConnectionClosed) => {
                    debug!(
                        peer = %self.peer,
                        authenticated = self.session.auth_state().satisfied,
                        open_transaction = self.session.is_queuing(),
                        "connection closed"
                    );
                    break;
                }
                Err(e) => {
                    warn!(peer = %self.peer, error = %e, "error reading from connection");
                    break;
                }
            };

            if self.read_only {
                if let RespValue::Error(message) = &reply {
                    warn!(peer = %self.peer, error = %message, "replicated command failed");
                }
                continue;
            }

            if let Err(e) = self.write_reply(&reply).await {
                warn!(peer = %self.peer, error = %e, "error writing to connection");
                break;
            }
        }

        self.reader.bytes_read() - start
    }

    async fn write_reply(&mut self, reply: &RespValue) -> tokio::io::Result<()> {
        self.write_buffer.clear();
        reply.encode_into(&mut self.write_buffer);

        self.writer.write_all(&self.write_buffer).await?;
        self.writer.flush().await
    }
}
