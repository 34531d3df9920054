//! Low-level byte reading helpers.

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};

use super::error::{MdictError, Result};

/// Read a 4 or 8 byte big-endian number.
///
/// v1.x files use 4-byte fields, v2.x files use 8-byte fields.
pub fn read_number(reader: &mut impl Read, number_width: usize) -> Result<u64> {
    match number_width {
        8 => Ok(reader.read_u64::<BigEndian>()?),
        4 => Ok(reader.read_u32::<BigEndian>()? as u64),
        _ => Err(MdictError::InvalidFormat(format!("Invalid number width: {}", number_width))),
    }
}

/// Read a 1 or 2 byte big-endian number (text length prefixes).
pub fn read_small_number(reader: &mut impl Read, number_width: usize) -> Result<u64> {
    match number_width {
        2 => Ok(reader.read_u16::<BigEndian>()? as u64),
        1 => Ok(reader.read_u8()? as u64),
        _ => Err(MdictError::InvalidFormat(format!(
            "Invalid small number width: {}",
            number_width
        ))),
    }
}

/// Bytes per text unit: 2 for UTF-16, 1 otherwise.
pub fn unit_width(encoding: &'static Encoding) -> usize {
    if encoding == UTF_16LE || encoding == UTF_16BE { 2 } else { 1 }
}
