use crate::rdb::RdbError;

pub fn get_buffer_slice(buffer: &[u8], cursor: usize, len: usize) -> Result<&[u8], RdbError> {
    let end = cursor
        .checked_add(len)
        .filter(|end| *end <= buffer.len())
        .ok_or(RdbError::UnexpectedEof(cursor))?;

    Ok(&buffer[cursor..end])
}

/// Reads a fixed size little-endian field.
pub fn get_array<const N: usize>(buffer: &[u8], cursor: usize) -> Result<[u8; N], RdbError> {
    let slice = get_buffer_slice(buffer, cursor, N)?;
    let mut array = [0u8; N];
    array.copy_from_slice(slice);

    Ok(array)
}
