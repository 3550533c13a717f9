use bytes::Bytes;

use crate::rdb::{
    RdbError,
    encoding::{parse_length, parse_value},
    get_slice::{get_array, get_buffer_slice},
    listpack::parse_listpack,
};

const IDLE_OPCODE: u8 = 0xF8;
const FREQ_OPCODE: u8 = 0xF9;
const METADATA_OPCODE: u8 = 0xFA;
const RESIZE_DB_OPCODE: u8 = 0xFB;
const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
const DATABASE_OPCODE: u8 = 0xFE;
const END_OF_FILE_OPCODE: u8 = 0xFF;

const STRING_VALUE_TYPE: u8 = 0x00;
const HASH_VALUE_TYPE: u8 = 0x04;
const HASH_LISTPACK_VALUE_TYPE: u8 = 0x10;

/// A key and its decoded value.
#[derive(Debug, PartialEq, Eq)]
pub enum Entry {
    String { key: Bytes, value: Bytes },
    Hash { key: Bytes, fields: Vec<(Bytes, Bytes)> },
}

#[derive(Debug, PartialEq, Eq)]
pub enum OpCodeResponse {
    Metadata {
        key: Bytes,
        value: Bytes,
    },
    ResizeDb {
        db_hash_table_size: usize,
        expiry_hash_table_size: usize,
    },
    Database {
        database_number: usize,
    },
    /// An entry preceded by an expiry time. Expiry is not supported, so the
    /// timestamp is kept only for logging.
    ExpiringEntry {
        entry: Entry,
        expires_at_ms: i64,
    },
    Entry(Entry),
    /// LRU/LFU hints carry nothing worth keeping.
    EvictionHint,
    EndOfFile {
        crc64_checksum: [u8; 8],
    },
}

pub fn parse_opcode(bytes: &[u8], cursor: usize) -> Result<(OpCodeResponse, usize), RdbError> {
    let mut temp_cursor = cursor;
    let [opcode] = get_array::<1>(bytes, temp_cursor)?;
    temp_cursor += 1;

    let response = match opcode {
        METADATA_OPCODE => {
            let (key, key_cursor) = parse_value(bytes, temp_cursor)?;
            temp_cursor += key_cursor;
            let (value, value_cursor) = parse_value(bytes, temp_cursor)?;
            temp_cursor += value_cursor;

            OpCodeResponse::Metadata { key, value }
        }
        RESIZE_DB_OPCODE => {
            let (db_hash_table_size, db_hash_table_size_cursor) =
                parse_length(bytes, temp_cursor)?;
            temp_cursor += db_hash_table_size_cursor;

            let (expiry_hash_table_size, expiry_hash_table_size_cursor) =
                parse_length(bytes, temp_cursor)?;
            temp_cursor += expiry_hash_table_size_cursor;

            OpCodeResponse::ResizeDb {
                db_hash_table_size,
                expiry_hash_table_size,
            }
        }
        DATABASE_OPCODE => {
            let (database_number, database_number_cursor) = parse_length(bytes, temp_cursor)?;
            temp_cursor += database_number_cursor;

            OpCodeResponse::Database { database_number }
        }
        EXPIRATION_SECONDS_OPCODE => {
            let seconds = u32::from_le_bytes(get_array::<4>(bytes, temp_cursor)?);
            temp_cursor += 4;

            let (entry, entry_cursor) = parse_expiring_entry(bytes, temp_cursor)?;
            temp_cursor += entry_cursor;

            OpCodeResponse::ExpiringEntry {
                entry,
                expires_at_ms: seconds as i64 * 1000,
            }
        }
        EXPIRATION_MILLISECONDS_OPCODE => {
            let milliseconds = u64::from_le_bytes(get_array::<8>(bytes, temp_cursor)?);
            temp_cursor += 8;

            let (entry, entry_cursor) = parse_expiring_entry(bytes, temp_cursor)?;
            temp_cursor += entry_cursor;

            OpCodeResponse::ExpiringEntry {
                entry,
                expires_at_ms: milliseconds as i64,
            }
        }
        IDLE_OPCODE => {
            let (_, idle_cursor) = parse_length(bytes, temp_cursor)?;
            temp_cursor += idle_cursor;

            OpCodeResponse::EvictionHint
        }
        FREQ_OPCODE => {
            get_buffer_slice(bytes, temp_cursor, 1)?;
            temp_cursor += 1;

            OpCodeResponse::EvictionHint
        }
        END_OF_FILE_OPCODE => {
            let crc64_checksum = get_array::<8>(bytes, temp_cursor)?;
            temp_cursor += 8;

            OpCodeResponse::EndOfFile { crc64_checksum }
        }
        value_type => {
            let (entry, entry_cursor) = parse_entry(value_type, bytes, temp_cursor)?;
            temp_cursor += entry_cursor;

            OpCodeResponse::Entry(entry)
        }
    };

    Ok((response, temp_cursor - cursor))
}

fn parse_expiring_entry(bytes: &[u8], cursor: usize) -> Result<(Entry, usize), RdbError> {
    match parse_opcode(bytes, cursor)? {
        (OpCodeResponse::Entry(entry), bytes_read) => Ok((entry, bytes_read)),
        _ => Err(RdbError::MissingEntryAfterExpiry),
    }
}

/// Parses the key and value that follow a value type byte.
fn parse_entry(value_type: u8, bytes: &[u8], cursor: usize) -> Result<(Entry, usize), RdbError> {
    let mut temp_cursor = cursor;

    if !matches!(
        value_type,
        STRING_VALUE_TYPE | HASH_VALUE_TYPE | HASH_LISTPACK_VALUE_TYPE
    ) {
        return Err(RdbError::UnsupportedValueType(value_type));
    }

    let (key, key_cursor) = parse_value(bytes, temp_cursor)?;
    temp_cursor += key_cursor;

    let entry = match value_type {
        STRING_VALUE_TYPE => {
            let (value, value_cursor) = parse_value(bytes, temp_cursor)?;
            temp_cursor += value_cursor;

            Entry::String { key, value }
        }
        HASH_VALUE_TYPE => {
            let (number_of_fields, number_of_fields_cursor) = parse_length(bytes, temp_cursor)?;
            temp_cursor += number_of_fields_cursor;

            let mut fields = Vec::new();
            for _ in 0..number_of_fields {
                let (field, field_cursor) = parse_value(bytes, temp_cursor)?;
                temp_cursor += field_cursor;
                let (value, value_cursor) = parse_value(bytes, temp_cursor)?;
                temp_cursor += value_cursor;

                fields.push((field, value));
            }

            Entry::Hash { key, fields }
        }
        _ => {
            let (blob, blob_cursor) = parse_value(bytes, temp_cursor)?;
            temp_cursor += blob_cursor;

            let entries = parse_listpack(&blob)?;
            if entries.len() % 2 != 0 {
                return Err(RdbError::CorruptListpack("hash with a dangling field"));
            }

            let mut entries = entries.into_iter();
            let mut fields = Vec::with_capacity(entries.len() / 2);
            while let (Some(field), Some(value)) = (entries.next(), entries.next()) {
                fields.push((field, value));
            }

            Entry::Hash { key, fields }
        }
    };

    Ok((entry, temp_cursor - cursor))
}

pub struct MagicStringResponse {
    pub number_of_read_bytes: usize,
    pub redis_version: u32,
}

pub fn parse_magic_string(bytes: &[u8]) -> Result<MagicStringResponse, RdbError> {
    let magic_string = get_buffer_slice(bytes, 0, 5)?;
    if magic_string != b"REDIS" {
        return Err(RdbError::InvalidMagicString);
    }

    let version = get_buffer_slice(bytes, 5, 4)?;
    let version_text = String::from_utf8_lossy(version).into_owned();

    let redis_version = version_text
        .parse::<u32>()
        .ok()
        .filter(|version| (1..=12).contains(version))
        .ok_or(RdbError::InvalidVersion(version_text))?;

    Ok(MagicStringResponse {
        number_of_read_bytes: 9,
        redis_version,
    })
}
