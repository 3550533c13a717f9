//! The replica side of the PSYNC exchange with a master.

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::{
    command::Command,
    input::{LineReader, LineSource},
};

const SNAPSHOT_CHUNK_SIZE: usize = 4096;
/// Upper bound on what is reserved up front; the header length is untrusted.
const SNAPSHOT_INITIAL_CAPACITY: usize = SNAPSHOT_CHUNK_SIZE * 16;

#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed by master")]
    ConnectionClosed,
    #[error("unexpected reply to PSYNC: '{0}'")]
    UnexpectedReply(String),
    #[error("invalid snapshot header: '{0}'")]
    InvalidSnapshotHeader(String),
}

/// What the master decided to do with our PSYNC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsyncReply {
    /// A snapshot follows; the stream afterwards starts at `offset`.
    FullResync { run_id: String, offset: i64 },
    /// The master continues from where we left off. It may announce a new
    /// run id.
    Continue { run_id: Option<String> },
}

/// `PSYNC <run_id> <offset>`, or `PSYNC ? -1` when nothing has been synced yet.
pub fn psync_command(run_id: Option<&str>, offset: i64) -> Command {
    match run_id {
        Some(run_id) => Command::from_parts("PSYNC", &[run_id, &offset.to_string()]),
        None => Command::from_parts("PSYNC", &["?", "-1"]),
    }
}

pub fn parse_psync_reply(line: &[u8]) -> Result<PsyncReply, HandshakeError> {
    let text = String::from_utf8_lossy(line);
    let unexpected = || HandshakeError::UnexpectedReply(text.to_string());

    let Some(status) = text.strip_prefix('+') else {
        return Err(unexpected());
    };

    let mut parts = status.split_whitespace();
    match parts.next() {
        Some("FULLRESYNC") => {
            let run_id = parts.next().ok_or_else(unexpected)?;
            let offset = parts
                .next()
                .and_then(|offset| offset.parse::<i64>().ok())
                .ok_or_else(unexpected)?;

            Ok(PsyncReply::FullResync {
                run_id: run_id.to_string(),
                offset,
            })
        }
        Some("CONTINUE") => Ok(PsyncReply::Continue {
            run_id: parts.next().map(str::to_string),
        }),
        _ => Err(unexpected()),
    }
}

/// Masters send bare newlines as keep-alives while they prepare a reply.
async fn next_non_blank_line<R>(reader: &mut LineReader<R>) -> Result<Bytes, HandshakeError>
where
    R: AsyncBufRead + Unpin + Send,
{
    loop {
        match reader.next_line().await? {
            Some(line) if line.is_empty() => trace!("skipping keep-alive"),
            Some(line) => return Ok(line),
            None => return Err(HandshakeError::ConnectionClosed),
        }
    }
}

/// Sends PSYNC and waits for the master's decision.
pub async fn send_psync<R, W>(
    reader: &mut LineReader<R>,
    writer: &mut W,
    run_id: Option<&str>,
    offset: i64,
) -> Result<PsyncReply, HandshakeError>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin,
{
    let command = psync_command(run_id, offset);
    debug!(command = %command, "sending PSYNC");

    writer.write_all(&command.to_resp().encode()).await?;
    writer.flush().await?;

    let line = next_non_blank_line(reader).await?;
    parse_psync_reply(&line)
}

/// Reads the `$<n>` header and then exactly `n` snapshot bytes.
///
/// The payload is not line oriented, so it is copied straight from the
/// buffered reader in fixed size chunks.
pub async fn receive_snapshot<R>(reader: &mut LineReader<R>) -> Result<Vec<u8>, HandshakeError>
where
    R: AsyncBufRead + Unpin + Send,
{
    let header = next_non_blank_line(reader).await?;
    let invalid_header = || {
        HandshakeError::InvalidSnapshotHeader(String::from_utf8_lossy(&header).into_owned())
    };

    let length = header
        .strip_prefix(b"$")
        .and_then(|digits| std::str::from_utf8(digits).ok())
        .and_then(|digits| digits.parse::<usize>().ok())
        .ok_or_else(invalid_header)?;

    debug!(length, "receiving snapshot");

    let mut snapshot = Vec::with_capacity(length.min(SNAPSHOT_INITIAL_CAPACITY));
    let mut buffer = [0u8; SNAPSHOT_CHUNK_SIZE];

    while snapshot.len() < length {
        let chunk_size = std::cmp::min(buffer.len(), length - snapshot.len());

        reader
            .get_mut()
            .read_exact(&mut buffer[..chunk_size])
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => HandshakeError::ConnectionClosed,
                _ => HandshakeError::Io(e),
            })?;

        snapshot.extend_from_slice(&buffer[..chunk_size]);
    }

    Ok(snapshot)
}
