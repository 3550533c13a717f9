use tracing::{debug, trace};

use crate::{
    rdb::{
        RdbError,
        opcode::{Entry, OpCodeResponse, parse_magic_string, parse_opcode},
    },
    snapshot::{SnapshotDecoder, SnapshotError, SnapshotEvent, SnapshotSink},
};

/// Decodes a complete RDB file into snapshot events.
///
/// Strings become [`SnapshotEvent::Set`], each hash field becomes a
/// [`SnapshotEvent::HashField`]. Expiry times are read and dropped. The
/// trailing checksum is not verified since masters may write it as zeros.
#[derive(Debug, Default, Clone, Copy)]
pub struct RdbDecoder;

impl RdbDecoder {
    pub fn new() -> Self {
        Self
    }
}

fn emit(entry: Entry, sink: &mut dyn SnapshotSink) -> usize {
    match entry {
        Entry::String { key, value } => {
            sink.apply(SnapshotEvent::Set { key, value });
            1
        }
        Entry::Hash { key, fields } => {
            let count = fields.len();
            for (field, value) in fields {
                sink.apply(SnapshotEvent::HashField {
                    key: key.clone(),
                    field,
                    value,
                });
            }
            count
        }
    }
}

impl SnapshotDecoder for RdbDecoder {
    fn decode(&self, bytes: &[u8], sink: &mut dyn SnapshotSink) -> Result<usize, SnapshotError> {
        let magic_string_response = parse_magic_string(bytes)?;
        debug!(version = magic_string_response.redis_version, "decoding RDB snapshot");

        let mut cursor = magic_string_response.number_of_read_bytes;
        let mut events = 0;

        loop {
            if cursor >= bytes.len() {
                return Err(RdbError::MissingEndOfFile.into());
            }

            let (response, bytes_read) = parse_opcode(bytes, cursor)?;
            cursor += bytes_read;

            match response {
                OpCodeResponse::Metadata { key, value } => {
                    trace!(
                        key = %String::from_utf8_lossy(&key),
                        value = %String::from_utf8_lossy(&value),
                        "RDB metadata"
                    );
                }
                OpCodeResponse::ResizeDb {
                    db_hash_table_size,
                    expiry_hash_table_size,
                } => {
                    trace!(db_hash_table_size, expiry_hash_table_size, "RDB resize hint");
                }
                OpCodeResponse::Database { database_number } => {
                    trace!(database_number, "RDB select database");
                }
                OpCodeResponse::ExpiringEntry {
                    entry,
                    expires_at_ms,
                } => {
                    trace!(expires_at_ms, "ignoring expiry time");
                    events += emit(entry, sink);
                }
                OpCodeResponse::Entry(entry) => {
                    events += emit(entry, sink);
                }
                OpCodeResponse::EvictionHint => {}
                OpCodeResponse::EndOfFile { .. } => break,
            }
        }

        debug!(events, "RDB snapshot decoded");
        Ok(events)
    }
}
