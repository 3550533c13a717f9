use crate::rdb::RdbError;

/// Cap on the up-front reservation; `expected_len` comes from the snapshot.
const MAX_INITIAL_CAPACITY: usize = 64 * 1024;

/// Decompresses an LZF block into exactly `expected_len` bytes.
///
/// Each control byte either starts a literal run (`000LLLLL`, run of L + 1
/// bytes) or a back reference (`LLLooooo oooooooo`, with L == 7 meaning an
/// extra length byte follows).
pub fn decompress(input: &[u8], expected_len: usize) -> Result<Vec<u8>, RdbError> {
    let mut output: Vec<u8> = Vec::with_capacity(expected_len.min(MAX_INITIAL_CAPACITY));
    let mut cursor = 0;

    while cursor < input.len() {
        let control = input[cursor] as usize;
        cursor += 1;

        if control < 32 {
            let run = control + 1;
            let literal = input
                .get(cursor..cursor + run)
                .ok_or(RdbError::CorruptLzf("literal run past end of input"))?;
            output.extend_from_slice(literal);
            cursor += run;

            if output.len() > expected_len {
                return Err(RdbError::CorruptLzf("output longer than declared length"));
            }
            continue;
        }

        let mut length = control >> 5;
        if length == 7 {
            length += *input
                .get(cursor)
                .ok_or(RdbError::CorruptLzf("missing extended length"))? as usize;
            cursor += 1;
        }
        length += 2;

        let low_offset = *input
            .get(cursor)
            .ok_or(RdbError::CorruptLzf("missing back reference offset"))? as usize;
        cursor += 1;

        let distance = ((control & 0x1f) << 8) + low_offset + 1;
        if distance > output.len() {
            return Err(RdbError::CorruptLzf("back reference before start of output"));
        }

        // Byte by byte: the reference may overlap what it is producing.
        if output.len() + length > expected_len {
            return Err(RdbError::CorruptLzf("output longer than declared length"));
        }

        let start = output.len() - distance;
        for index in start..start + length {
            let byte = output[index];
            output.push(byte);
        }
    }

    if output.len() != expected_len {
        return Err(RdbError::CorruptLzf("decompressed length mismatch"));
    }

    Ok(output)
}
