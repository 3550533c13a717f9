//! Typed replies for the Redis Serialization Protocol (RESP).
//!
//! Every command produces exactly one [`RespValue`], which is encoded back into
//! the same line framing the client used to send the request.

use bytes::{BufMut, Bytes, BytesMut};

const CRLF: &[u8] = b"\r\n";

/// A single RESP reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RespValue {
    /// Status reply, `+OK\r\n`
    SimpleString(String),
    /// Error reply, `-ERR message\r\n`
    Error(String),
    /// Integer reply, `:42\r\n`
    Integer(i64),
    /// Bulk string reply. `None` is the null bulk string (`$-1\r\n`), which is
    /// not the same thing as an empty bulk string (`$0\r\n\r\n`).
    BulkString(Option<Bytes>),
    /// Array reply. Elements may themselves be arrays (EXEC replies).
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn null() -> Self {
        RespValue::BulkString(None)
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    /// Encodes the value into a freshly allocated buffer.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Appends the wire encoding of the value to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.put(s.as_bytes());
                buf.put(CRLF);
            }
            RespValue::Error(s) => {
                buf.put_u8(b'-');
                buf.put(s.as_bytes());
                buf.put(CRLF);
            }
            RespValue::Integer(n) => {
                buf.put_u8(b':');
                buf.put(n.to_string().as_bytes());
                buf.put(CRLF);
            }
            RespValue::BulkString(Some(data)) => {
                buf.put_u8(b'$');
                buf.put(data.len().to_string().as_bytes());
                buf.put(CRLF);
                buf.put(data.as_ref());
                buf.put(CRLF);
            }
            RespValue::BulkString(None) => {
                buf.put(&b"$-1\r\n"[..]);
            }
            RespValue::Array(elements) => {
                buf.put_u8(b'*');
                buf.put(elements.len().to_string().as_bytes());
                buf.put(CRLF);
                for element in elements {
                    element.encode_into(buf);
                }
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }
}
