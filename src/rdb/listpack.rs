use bytes::Bytes;

use crate::rdb::{
    RdbError,
    get_slice::{get_array, get_buffer_slice},
};

const HEADER_SIZE: usize = 6;
const END_OF_LISTPACK: u8 = 0xFF;

/// Splits a listpack blob into its entries, integers rendered as decimal.
///
/// Layout: `<total-bytes u32><num-elements u16> <entry>* 0xFF`, each entry
/// being `<encoding-type><data><backlen>`.
pub fn parse_listpack(blob: &[u8]) -> Result<Vec<Bytes>, RdbError> {
    if blob.len() < HEADER_SIZE + 1 {
        return Err(RdbError::CorruptListpack("blob shorter than header"));
    }

    let total_bytes = u32::from_le_bytes(get_array::<4>(blob, 0)?) as usize;
    if total_bytes != blob.len() {
        return Err(RdbError::CorruptListpack("total bytes does not match blob"));
    }

    let declared_entries = u16::from_le_bytes(get_array::<2>(blob, 4)?);
    let mut entries = Vec::with_capacity(declared_entries as usize);
    let mut cursor = HEADER_SIZE;

    loop {
        let [encoding] = get_array::<1>(blob, cursor)
            .map_err(|_| RdbError::CorruptListpack("missing end marker"))?;

        if encoding == END_OF_LISTPACK {
            break;
        }

        let (entry, entry_len) = parse_entry(blob, cursor)?;
        entries.push(entry);
        cursor += entry_len + backlen_size(entry_len);
    }

    // u16::MAX means the count did not fit and has to be found by walking.
    if declared_entries != u16::MAX && declared_entries as usize != entries.len() {
        return Err(RdbError::CorruptListpack("element count mismatch"));
    }

    Ok(entries)
}

/// Decodes one entry, returning it and the size of encoding plus data.
fn parse_entry(blob: &[u8], cursor: usize) -> Result<(Bytes, usize), RdbError> {
    let [encoding] = get_array::<1>(blob, cursor)?;

    let integer = |value: i64, len: usize| -> Result<(Bytes, usize), RdbError> {
        Ok((Bytes::from(value.to_string()), len))
    };
    let string = |header_len: usize, data_len: usize| -> Result<(Bytes, usize), RdbError> {
        let data = get_buffer_slice(blob, cursor + header_len, data_len)?;
        Ok((Bytes::copy_from_slice(data), header_len + data_len))
    };

    match encoding {
        // 0xxxxxxx: 7 bit unsigned integer
        0x00..=0x7F => integer((encoding & 0x7F) as i64, 1),
        // 10xxxxxx: string up to 63 bytes
        0x80..=0xBF => string(1, (encoding & 0x3F) as usize),
        // 110xxxxx yyyyyyyy: 13 bit signed integer
        0xC0..=0xDF => {
            let [low] = get_array::<1>(blob, cursor + 1)?;
            let raw = (((encoding & 0x1F) as u16) << 8) | low as u16;
            let value = ((raw << 3) as i16) >> 3;
            integer(value as i64, 2)
        }
        // 1110xxxx yyyyyyyy: string up to 4095 bytes
        0xE0..=0xEF => {
            let [low] = get_array::<1>(blob, cursor + 1)?;
            let len = (((encoding & 0x0F) as usize) << 8) | low as usize;
            string(2, len)
        }
        0xF0 => {
            let len = u32::from_le_bytes(get_array::<4>(blob, cursor + 1)?) as usize;
            string(5, len)
        }
        0xF1 => integer(i16::from_le_bytes(get_array::<2>(blob, cursor + 1)?) as i64, 3),
        0xF2 => {
            let [b0, b1, b2] = get_array::<3>(blob, cursor + 1)?;
            // Place the 24 bits high and shift back to sign-extend.
            let value = i32::from_le_bytes([0, b0, b1, b2]) >> 8;
            integer(value as i64, 4)
        }
        0xF3 => integer(i32::from_le_bytes(get_array::<4>(blob, cursor + 1)?) as i64, 5),
        0xF4 => integer(i64::from_le_bytes(get_array::<8>(blob, cursor + 1)?), 9),
        _ => Err(RdbError::CorruptListpack("unknown entry encoding")),
    }
}

/// Number of bytes the back-length of an entry of `entry_len` bytes takes.
fn backlen_size(entry_len: usize) -> usize {
    match entry_len {
        0..=127 => 1,
        128..=16_382 => 2,
        16_383..=2_097_150 => 3,
        2_097_151..=268_435_454 => 4,
        _ => 5,
    }
}
