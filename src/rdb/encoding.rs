//! Variable-length integers and strings of the snapshot format.
//!
//! The top two bits of the first byte select the layout:
//!
//! | bits | length                                        |
//! |------|-----------------------------------------------|
//! | `00` | remaining 6 bits                              |
//! | `01` | remaining 6 bits, then one more byte (14 bits) |
//! | `10` | `0x80`: next 4 bytes big-endian, `0x81`: next 8 |
//! | `11` | not a length: a specially encoded string      |

use bytes::Buf;

use crate::rdb::rdb_error::RdbError;

const INT8_STRING: u8 = 0xC0;
const INT16_STRING: u8 = 0xC1;
const INT32_STRING: u8 = 0xC2;

enum LengthEncoding {
    Length(usize),
    Special(u8),
}

pub(crate) fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), RdbError> {
    if buf.remaining() < needed {
        return Err(RdbError::UnexpectedEof);
    }

    Ok(())
}

fn read_length_encoding(buf: &mut impl Buf) -> Result<LengthEncoding, RdbError> {
    ensure_remaining(buf, 1)?;
    let first = buf.get_u8();

    let length = match first >> 6 {
        0b00 => usize::from(first & 0b0011_1111),
        0b01 => {
            ensure_remaining(buf, 1)?;
            let high_bits = usize::from(first & 0b0011_1111);
            (high_bits << 8) | usize::from(buf.get_u8())
        }
        0b10 => match first {
            0x80 => {
                ensure_remaining(buf, 4)?;
                usize::try_from(buf.get_u32()).map_err(|_| RdbError::UnsupportedEncoding(first))?
            }
            0x81 => {
                ensure_remaining(buf, 8)?;
                usize::try_from(buf.get_u64()).map_err(|_| RdbError::UnsupportedEncoding(first))?
            }
            _ => return Err(RdbError::UnsupportedEncoding(first)),
        },
        _ => return Ok(LengthEncoding::Special(first)),
    };

    Ok(LengthEncoding::Length(length))
}

/// Reads a length. A special-string marker in length position is an
/// [`RdbError::UnsupportedEncoding`].
pub fn read_length(buf: &mut impl Buf) -> Result<usize, RdbError> {
    match read_length_encoding(buf)? {
        LengthEncoding::Length(length) => Ok(length),
        LengthEncoding::Special(marker) => Err(RdbError::UnsupportedEncoding(marker)),
    }
}

/// Reads a length-prefixed string, or an integer stored in string position
/// rendered back to its decimal text.
pub fn read_string(buf: &mut impl Buf) -> Result<String, RdbError> {
    match read_length_encoding(buf)? {
        LengthEncoding::Length(length) => {
            ensure_remaining(buf, length)?;
            let bytes = buf.copy_to_bytes(length);
            Ok(String::from_utf8(bytes.to_vec())?)
        }
        LengthEncoding::Special(INT8_STRING) => {
            ensure_remaining(buf, 1)?;
            Ok(buf.get_i8().to_string())
        }
        LengthEncoding::Special(INT16_STRING) => {
            ensure_remaining(buf, 2)?;
            Ok(buf.get_i16_le().to_string())
        }
        LengthEncoding::Special(INT32_STRING) => {
            ensure_remaining(buf, 4)?;
            Ok(buf.get_i32_le().to_string())
        }
        // LZF-compressed strings are not supported
        LengthEncoding::Special(marker) => Err(RdbError::UnsupportedEncoding(marker)),
    }
}
