//! Decryption and decompression primitives for MDict blocks.

use std::io::Read;

use flate2::read::ZlibDecoder;
use log::trace;
use ripemd::{Digest, Ripemd128};

use super::error::{MdictError, Result};
use super::models::CompressionType;

/// Magic constant mixed into the key index decryption key.
const KEY_INDEX_MAGIC: u32 = 0x3695;

/// Fast XOR-based decryption used in MDict files.
///
/// Each byte is rotated left by 4 bits, then XORed with the previous
/// ciphertext byte, its index and a key byte.
pub fn fast_decrypt(data: &mut [u8], key: &[u8]) {
    trace!("Decrypting {} bytes with fast XOR method", data.len());

    let mut prev = 0x36u8;
    for (i, byte) in data.iter_mut().enumerate() {
        let current = *byte;
        *byte = current.rotate_left(4) ^ prev ^ (i as u8) ^ key[i % key.len()];
        prev = current;
    }
}

/// Key for the v2 key index: RIPEMD-128(checksum bytes ++ magic).
pub fn derive_key_for_index(block: &[u8]) -> [u8; 16] {
    let mut hasher = Ripemd128::new();
    hasher.update(&block[4..8]);
    hasher.update(KEY_INDEX_MAGIC.to_le_bytes());
    hasher.finalize().into()
}

/// Key for a fast-encrypted data block: RIPEMD-128(checksum bytes).
pub fn derive_key_for_block(block: &[u8]) -> [u8; 16] {
    let mut hasher = Ripemd128::new();
    hasher.update(&block[4..8]);
    hasher.finalize().into()
}

/// Decompresses `payload` and checks the result is exactly `expected_size` bytes.
pub fn decompress(
    payload: &[u8],
    compression_type: CompressionType,
    expected_size: u64,
) -> Result<Vec<u8>> {
    let output = match compression_type {
        CompressionType::None => {
            trace!("No compression, copying {} bytes", payload.len());
            payload.to_vec()
        }
        CompressionType::Lzo => decompress_lzo(payload, expected_size)?,
        CompressionType::Zlib => {
            trace!(
                "Decompressing with Zlib: {} bytes -> {} bytes (expected)",
                payload.len(),
                expected_size
            );
            let mut output = Vec::with_capacity(expected_size as usize);
            ZlibDecoder::new(payload)
                .read_to_end(&mut output)
                .map_err(|e| {
                    MdictError::DecompressionError(format!("Zlib decompression failed: {}", e))
                })?;
            output
        }
    };

    if output.len() as u64 != expected_size {
        return Err(MdictError::SizeMismatch {
            context: "decompressed block",
            expected: expected_size,
            found: output.len() as u64,
        });
    }
    Ok(output)
}

#[cfg(feature = "lzo")]
fn decompress_lzo(payload: &[u8], expected_size: u64) -> Result<Vec<u8>> {
    trace!(
        "Decompressing with LZO: {} bytes -> {} bytes (expected)",
        payload.len(),
        expected_size
    );
    let mut output = vec![0u8; expected_size as usize];
    let written = lzokay::decompress::decompress(payload, &mut output)
        .map_err(|e| MdictError::DecompressionError(format!("LZO decompression failed: {:?}", e)))?;
    output.truncate(written);
    Ok(output)
}

#[cfg(not(feature = "lzo"))]
fn decompress_lzo(_payload: &[u8], _expected_size: u64) -> Result<Vec<u8>> {
    Err(MdictError::DecompressionError(
        "block is LZO-compressed but LZO support was not compiled in".to_string(),
    ))
}
