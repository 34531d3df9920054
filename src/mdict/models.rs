//! Data structures describing the parts of an MDict file.

use encoding_rs::Encoding;

use super::error::{MdictError, Result};

/// Encryption flags parsed from the header's `Encrypted` attribute.
///
/// - Bit 0x01: record blocks (and the key block info) are encrypted
/// - Bit 0x02: the key index is encrypted
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionFlags {
    pub encrypt_record_blocks: bool,
    pub encrypt_key_index: bool,
}

impl From<u8> for EncryptionFlags {
    fn from(flag_val: u8) -> Self {
        Self {
            encrypt_record_blocks: (flag_val & 0x01) != 0,
            encrypt_key_index: (flag_val & 0x02) != 0,
        }
    }
}

/// Parsed file header.
#[derive(Debug)]
pub struct MdictHeader {
    pub version: MdictVersion,
    pub engine_version: String,
    pub encryption_flags: EncryptionFlags,
    /// Text encoding of keys. Resource files always store keys as UTF-16LE.
    pub encoding: &'static Encoding,
    pub title: String,
    pub description: Option<String>,
}

/// A key as stored in a key block, with its offset into the record stream.
#[derive(Debug)]
pub struct KeyEntry {
    pub id: u64,
    pub text: String,
}

/// Location and sizes of one compressed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMeta {
    /// Size of the block as stored in the file, header included.
    pub compressed_size: u64,
    pub decompressed_size: u64,
    /// Absolute file offset of the block.
    pub file_offset: u64,
    /// Offset of this block in the concatenated decompressed stream.
    pub decompressed_offset: u64,
}

impl BlockMeta {
    /// End of this block in the concatenated decompressed stream.
    pub fn decompressed_end(&self) -> u64 {
        self.decompressed_offset + self.decompressed_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdictVersion {
    V1,
    V2,
}

impl MdictVersion {
    /// Width in bytes of count and size fields.
    pub fn number_width(&self) -> usize {
        match self {
            MdictVersion::V1 => 4,
            MdictVersion::V2 => 8,
        }
    }

    /// Width in bytes of text length prefixes in the key index.
    pub fn small_number_width(&self) -> usize {
        match self {
            MdictVersion::V1 => 1,
            MdictVersion::V2 => 2,
        }
    }
}

impl TryFrom<f32> for MdictVersion {
    type Error = MdictError;
    fn try_from(v: f32) -> Result<Self> {
        if v < 2.0 {
            Ok(Self::V1)
        } else if v < 3.0 {
            Ok(Self::V2)
        } else {
            Err(MdictError::UnsupportedVersion(v))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Lzo,
    Zlib,
}

impl TryFrom<u8> for CompressionType {
    type Error = MdictError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Lzo),
            2 => Ok(Self::Zlib),
            _ => Err(MdictError::InvalidFormat(format!("Unknown compression type: {}", value))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionType {
    None,
    Fast,
    Salsa20,
}

impl TryFrom<u8> for EncryptionType {
    type Error = MdictError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Fast),
            2 => Ok(Self::Salsa20),
            _ => Err(MdictError::InvalidFormat(format!("Unknown encryption type: {}", value))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Key,
    Record,
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BlockType::Key => write!(f, "key"),
            BlockType::Record => write!(f, "record"),
        }
    }
}
