use bytes::Bytes;

use crate::rdb::{
    RdbError,
    get_slice::{get_array, get_buffer_slice},
    lzf,
};

/// What the first byte of a length-encoded field announces.
#[derive(Debug, PartialEq, Eq)]
enum ValueEncoding {
    Length(usize),
    Int8,
    Int16,
    Int32,
    LzfCompressedString,
}

fn parse_length_encoding(bytes: &[u8], cursor: usize) -> Result<(ValueEncoding, usize), RdbError> {
    let mut temp_cursor = cursor;
    let [byte] = get_array::<1>(bytes, temp_cursor)?;
    temp_cursor += 1;

    // The two most significant bits select the format.
    let value_encoding = match byte >> 6 {
        0b00 => ValueEncoding::Length((byte & 0b0011_1111) as usize),
        0b01 => {
            let [lower_8_bits] = get_array::<1>(bytes, temp_cursor)?;
            temp_cursor += 1;

            let high_6_bits = (byte & 0b0011_1111) as usize;
            ValueEncoding::Length((high_6_bits << 8) | lower_8_bits as usize)
        }
        0b10 => match byte {
            0x80 => {
                let length = u32::from_be_bytes(get_array::<4>(bytes, temp_cursor)?);
                temp_cursor += 4;
                ValueEncoding::Length(length as usize)
            }
            0x81 => {
                let length = u64::from_be_bytes(get_array::<8>(bytes, temp_cursor)?);
                temp_cursor += 8;
                ValueEncoding::Length(length as usize)
            }
            _ => return Err(RdbError::InvalidLengthEncoding(byte)),
        },
        _ => match byte & 0b0011_1111 {
            0 => ValueEncoding::Int8,
            1 => ValueEncoding::Int16,
            2 => ValueEncoding::Int32,
            3 => ValueEncoding::LzfCompressedString,
            _ => return Err(RdbError::InvalidLengthEncoding(byte)),
        },
    };

    Ok((value_encoding, temp_cursor - cursor))
}

/// Parses a plain length (element counts, database numbers, sizes).
pub fn parse_length(bytes: &[u8], cursor: usize) -> Result<(usize, usize), RdbError> {
    match parse_length_encoding(bytes, cursor)? {
        (ValueEncoding::Length(length), bytes_read) => Ok((length, bytes_read)),
        _ => Err(RdbError::ExpectedLength),
    }
}

/// Parses a string-encoded value.
///
/// Integer encodings are little-endian and signed, and come back as their
/// decimal representation, the same bytes a client would have written.
pub fn parse_value(bytes: &[u8], cursor: usize) -> Result<(Bytes, usize), RdbError> {
    let mut temp_cursor = cursor;
    let (value_encoding, length_cursor) = parse_length_encoding(bytes, temp_cursor)?;
    temp_cursor += length_cursor;

    let value = match value_encoding {
        ValueEncoding::Length(length) => {
            let byte_slice = get_buffer_slice(bytes, temp_cursor, length)?;
            temp_cursor += length;
            Bytes::copy_from_slice(byte_slice)
        }
        ValueEncoding::Int8 => {
            let value = i8::from_le_bytes(get_array::<1>(bytes, temp_cursor)?);
            temp_cursor += 1;
            Bytes::from(value.to_string())
        }
        ValueEncoding::Int16 => {
            let value = i16::from_le_bytes(get_array::<2>(bytes, temp_cursor)?);
            temp_cursor += 2;
            Bytes::from(value.to_string())
        }
        ValueEncoding::Int32 => {
            let value = i32::from_le_bytes(get_array::<4>(bytes, temp_cursor)?);
            temp_cursor += 4;
            Bytes::from(value.to_string())
        }
        ValueEncoding::LzfCompressedString => {
            let (compressed_len, compressed_len_cursor) = parse_length(bytes, temp_cursor)?;
            temp_cursor += compressed_len_cursor;
            let (uncompressed_len, uncompressed_len_cursor) = parse_length(bytes, temp_cursor)?;
            temp_cursor += uncompressed_len_cursor;

            let compressed = get_buffer_slice(bytes, temp_cursor, compressed_len)?;
            temp_cursor += compressed_len;

            Bytes::from(lzf::decompress(compressed, uncompressed_len)?)
        }
    };

    Ok((value, temp_cursor - cursor))
}
