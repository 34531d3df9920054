//! Decoding of on-disk blocks (key index, key blocks, record blocks).
//!
//! Every compressed block starts with an 8-byte header:
//!
//! ```text
//! [4 bytes LE] info: compression (bits 0-3), encryption (bits 4-7),
//!              encrypted prefix length (bits 8-15)
//! [4 bytes BE] Adler-32 of the decompressed data
//! [N bytes]    payload
//! ```

use std::cmp::min;

use adler2::adler32_slice;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::trace;

use super::codec;
use super::error::{MdictError, Result};
use super::models::{CompressionType, EncryptionType};

pub const BLOCK_HEADER_LEN: usize = 8;

/// Decrypts, decompresses and verifies one raw block.
pub fn decode_block(raw_block: &mut [u8], expected_decompressed_size: u64) -> Result<Vec<u8>> {
    if raw_block.len() < BLOCK_HEADER_LEN {
        return Err(MdictError::InvalidFormat(
            "Block too short (minimum 8 bytes required)".to_string(),
        ));
    }

    let info = LittleEndian::read_u32(&raw_block[0..4]);
    let compression_type = CompressionType::try_from((info & 0xF) as u8)?;
    let encryption_type = EncryptionType::try_from(((info >> 4) & 0xF) as u8)?;
    let encryption_size = ((info >> 8) & 0xFF) as usize;
    let checksum_expected = BigEndian::read_u32(&raw_block[4..8]);

    trace!(
        "Decoding block: compression={:?}, encryption={:?}, expected_size={} bytes",
        compression_type, encryption_type, expected_decompressed_size
    );

    match encryption_type {
        EncryptionType::None => {}
        EncryptionType::Fast => {
            let key = codec::derive_key_for_block(raw_block);
            let payload = &mut raw_block[BLOCK_HEADER_LEN..];
            let decrypt_len = min(encryption_size, payload.len());
            codec::fast_decrypt(&mut payload[..decrypt_len], &key);
        }
        EncryptionType::Salsa20 => return Err(MdictError::PasscodeRequired),
    }

    let decompressed = codec::decompress(
        &raw_block[BLOCK_HEADER_LEN..],
        compression_type,
        expected_decompressed_size,
    )?;
    verify_checksum(&decompressed, checksum_expected)?;
    Ok(decompressed)
}

/// Decodes the v2 key index, whose payload is fast-encrypted in full when the
/// header says so.
pub fn decode_key_index(
    raw_block: &[u8],
    expected_decompressed_size: u64,
    encrypted: bool,
) -> Result<Vec<u8>> {
    if raw_block.len() < BLOCK_HEADER_LEN {
        return Err(MdictError::InvalidFormat("Key index too short".to_string()));
    }

    let mut payload = raw_block[BLOCK_HEADER_LEN..].to_vec();
    if encrypted {
        trace!("Decrypting key index (fast decrypt with checksum-derived key)");
        let key = codec::derive_key_for_index(raw_block);
        codec::fast_decrypt(&mut payload, &key);
    }

    let info = LittleEndian::read_u32(&raw_block[0..4]);
    let compression_type = CompressionType::try_from(info as u8)?;
    let decompressed = codec::decompress(&payload, compression_type, expected_decompressed_size)?;
    verify_checksum(&decompressed, BigEndian::read_u32(&raw_block[4..8]))?;
    Ok(decompressed)
}

fn verify_checksum(data: &[u8], expected: u32) -> Result<()> {
    let actual = adler32_slice(data);
    trace!("Block checksum: expected={:#010x}, actual={:#010x}", expected, actual);
    if actual != expected {
        return Err(MdictError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_block(data: &[u8]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.extend_from_slice(&adler32_slice(data).to_be_bytes());
        raw.extend_from_slice(data);
        raw
    }

    #[test]
    fn decodes_stored_block() {
        let mut raw = stored_block(b"hello");
        assert_eq!(decode_block(&mut raw, 5).unwrap(), b"hello");
    }

    #[test]
    fn rejects_corrupted_payload() {
        let mut raw = stored_block(b"hello");
        raw[9] ^= 0xFF;
        assert!(matches!(
            decode_block(&mut raw, 5),
            Err(MdictError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn salsa_blocks_need_a_passcode() {
        let mut raw = stored_block(b"hello");
        raw[0] = 0x20;
        assert!(matches!(decode_block(&mut raw, 5), Err(MdictError::PasscodeRequired)));
    }

    #[test]
    fn short_block_is_invalid() {
        let mut raw = vec![0u8; 4];
        assert!(matches!(decode_block(&mut raw, 0), Err(MdictError::InvalidFormat(_))));
    }
}
