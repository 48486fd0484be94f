//! Alephium signed compact integers.
//!
//! The two high bits of the first byte select the width: `00` one byte, `01` two bytes,
//! `10` four bytes, each holding a two's complement value in the remaining bits. `11` is
//! followed by `(low six bits + 4)` big-endian bytes.

use crate::CodecError;

const SINGLE_BYTE: u8 = 0x00;
const TWO_BYTE: u8 = 0x40;
const FOUR_BYTE: u8 = 0x80;
const MULTI_BYTE: u8 = 0xc0;
const MODE_MASK: u8 = 0xc0;

/// Appends the compact encoding of `n` to `out`.
pub fn encode_compact_int(n: i32, out: &mut Vec<u8>) {
    if (-0x20..0x20).contains(&n) {
        out.push((n & 0x3f) as u8 | SINGLE_BYTE);
    } else if (-0x2000..0x2000).contains(&n) {
        out.extend_from_slice(&[((n >> 8) & 0x3f) as u8 | TWO_BYTE, n as u8]);
    } else if (-0x2000_0000..0x2000_0000).contains(&n) {
        out.extend_from_slice(&[
            ((n >> 24) & 0x3f) as u8 | FOUR_BYTE,
            (n >> 16) as u8,
            (n >> 8) as u8,
            n as u8,
        ]);
    } else {
        out.push(MULTI_BYTE);
        out.extend_from_slice(&n.to_be_bytes());
    }
}

/// Decodes a compact integer from the front of `bytes`, returning the value and the number
/// of bytes consumed.
///
/// # Errors
///
/// When `bytes` is truncated or the value does not fit in an `i32`.
pub fn decode_compact_int(bytes: &[u8]) -> Result<(i32, usize), CodecError> {
    let truncated = || CodecError::CompactInt("truncated input".into());
    let first = *bytes.first().ok_or_else(truncated)?;

    let (width, payload_bits) = match first & MODE_MASK {
        SINGLE_BYTE => (1, 6),
        TWO_BYTE => (2, 14),
        FOUR_BYTE => (4, 30),
        _ => {
            let extra = usize::from(first & 0x3f) + 4;
            if extra != 4 {
                return Err(CodecError::CompactInt("value exceeds 32 bits".into()));
            }
            let value = bytes.get(1..5).ok_or_else(truncated)?;
            let value = i32::from_be_bytes([value[0], value[1], value[2], value[3]]);
            return Ok((value, 5));
        }
    };

    let raw = bytes.get(..width).ok_or_else(truncated)?;
    let unsigned = raw
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, b)| (acc << 8) | u32::from(if i == 0 { b & 0x3f } else { *b }));

    // sign-extend from the payload width
    let shift = 32 - payload_bits;
    let value = ((unsigned << shift) as i32) >> shift;

    Ok((value, width))
}
