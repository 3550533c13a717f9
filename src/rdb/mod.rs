//! Decoding of RDB snapshots, the format a master sends during a full resync.

mod encoding;
mod get_slice;
mod listpack;
mod lzf;
mod opcode;
mod rdb_parser;

use thiserror::Error;

pub use rdb_parser::RdbDecoder;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum RdbError {
    #[error("unexpected end of snapshot at byte {0}")]
    UnexpectedEof(usize),
    #[error("invalid magic string")]
    InvalidMagicString,
    #[error("unsupported RDB version '{0}'")]
    InvalidVersion(String),
    #[error("invalid length encoding 0x{0:02X}")]
    InvalidLengthEncoding(u8),
    #[error("expected a length, found a special string encoding")]
    ExpectedLength,
    #[error("unsupported value type 0x{0:02X}")]
    UnsupportedValueType(u8),
    #[error("expiry time is not followed by a key")]
    MissingEntryAfterExpiry,
    #[error("corrupt LZF data: {0}")]
    CorruptLzf(&'static str),
    #[error("corrupt listpack: {0}")]
    CorruptListpack(&'static str),
    #[error("missing end of file marker")]
    MissingEndOfFile,
}
