//! Key and record block index parsing for v1.x and v2.x files.

use std::io::{Read, Seek, SeekFrom};

use adler2::adler32_slice;
use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, info};

use super::block;
use super::error::{MdictError, Result};
use super::models::{BlockMeta, BlockType, MdictHeader, MdictVersion};
use super::utils;

/// Block layout of a file, as recorded by its two indexes.
#[derive(Debug)]
pub struct Layout {
    pub key_blocks: Vec<BlockMeta>,
    pub record_blocks: Vec<BlockMeta>,
    pub num_entries: u64,
}

/// Reads both indexes. `file` must be positioned right after the header.
pub fn parse<R: Read + Seek>(file: &mut R, header: &MdictHeader) -> Result<Layout> {
    let (key_blocks, num_entries) = parse_block_info(file, header, BlockType::Key)?;

    let total_key_blocks_size: u64 = key_blocks.iter().map(|b| b.compressed_size).sum();
    file.seek(SeekFrom::Current(total_key_blocks_size as i64))?;

    let (record_blocks, num_records) = parse_block_info(file, header, BlockType::Record)?;
    if num_records != num_entries {
        debug!(
            "Record section declares {} entries, key section {}",
            num_records, num_entries
        );
    }

    info!(
        "MDict layout: {} entries, {} key blocks, {} record blocks",
        num_entries,
        key_blocks.len(),
        record_blocks.len()
    );
    Ok(Layout {
        key_blocks,
        record_blocks,
        num_entries,
    })
}

fn parse_block_info<R: Read + Seek>(
    file: &mut R,
    header: &MdictHeader,
    block_type: BlockType,
) -> Result<(Vec<BlockMeta>, u64)> {
    info!("Parsing {} block info section", block_type);

    let (index_data, num_blocks, num_entries) = match block_type {
        BlockType::Key => read_key_block_index(file, header)?,
        BlockType::Record => read_record_block_index(file, header)?,
    };

    let (blocks, total_entries) =
        extract_block_metas(&index_data, header, block_type, file.stream_position()?)?;

    if blocks.len() as u64 != num_blocks {
        return Err(MdictError::CountMismatch {
            item_type: format!("{} blocks in index", block_type),
            expected: num_blocks,
            found: blocks.len() as u64,
        });
    }
    if block_type == BlockType::Key && total_entries != num_entries {
        return Err(MdictError::CountMismatch {
            item_type: "key entries in index".to_string(),
            expected: num_entries,
            found: total_entries,
        });
    }

    debug!("{} index: {} blocks defined", block_type, blocks.len());
    Ok((blocks, num_entries))
}

fn extract_block_metas(
    index_data: &[u8],
    header: &MdictHeader,
    block_type: BlockType,
    initial_file_offset: u64,
) -> Result<(Vec<BlockMeta>, u64)> {
    let width = header.version.number_width();
    let mut blocks = Vec::new();
    let mut reader = index_data;
    let mut total_entries = 0u64;
    let mut file_offset = initial_file_offset;
    let mut decompressed_offset = 0u64;

    while !reader.is_empty() {
        if block_type == BlockType::Key {
            total_entries += utils::read_number(&mut reader, width)?;
            // First and last key of the block.
            skip_text(&mut reader, header)?;
            skip_text(&mut reader, header)?;
        }

        let compressed_size = utils::read_number(&mut reader, width)?;
        let decompressed_size = utils::read_number(&mut reader, width)?;

        blocks.push(BlockMeta {
            compressed_size,
            decompressed_size,
            file_offset,
            decompressed_offset,
        });
        file_offset += compressed_size;
        decompressed_offset += decompressed_size;
    }

    Ok((blocks, total_entries))
}

/// Key block info, then the key index itself.
///
/// ```text
/// v2: num_blocks, num_entries, index_decomp_len, index_comp_len, blocks_len (u64 BE)
///     + Adler-32 (u32 BE) of those 40 bytes
/// v1: num_blocks, num_entries, index_len, blocks_len (u32 BE), no checksum
/// ```
fn read_key_block_index<R: Read>(
    file: &mut R,
    header: &MdictHeader,
) -> Result<(Vec<u8>, u64, u64)> {
    // Salsa20 over the info section needs the registration passcode.
    if header.encryption_flags.encrypt_record_blocks {
        return Err(MdictError::PasscodeRequired);
    }

    let info_size = match header.version {
        MdictVersion::V1 => 16,
        MdictVersion::V2 => 40,
    };
    let mut info_bytes = vec![0u8; info_size];
    file.read_exact(&mut info_bytes)?;

    if header.version == MdictVersion::V2 {
        let checksum_expected = file.read_u32::<BigEndian>()?;
        let checksum_actual = adler32_slice(&info_bytes);
        if checksum_actual != checksum_expected {
            return Err(MdictError::ChecksumMismatch {
                expected: checksum_expected,
                actual: checksum_actual,
            });
        }
    }

    let width = header.version.number_width();
    let mut reader = info_bytes.as_slice();
    let num_blocks = utils::read_number(&mut reader, width)?;
    let num_entries = utils::read_number(&mut reader, width)?;
    let index_decomp_len = match header.version {
        MdictVersion::V1 => None,
        MdictVersion::V2 => Some(utils::read_number(&mut reader, width)?),
    };
    let index_comp_len = utils::read_number(&mut reader, width)?;
    let _key_blocks_len = utils::read_number(&mut reader, width)?;

    info!(
        "Key block info: blocks={}, entries={}, index_compressed={} bytes",
        num_blocks, num_entries, index_comp_len
    );

    let mut raw_index = vec![0u8; index_comp_len as usize];
    file.read_exact(&mut raw_index)?;

    let index_data = match index_decomp_len {
        Some(decomp_len) => {
            let encrypted = header.encryption_flags.encrypt_key_index;
            block::decode_key_index(&raw_index, decomp_len, encrypted)?
        }
        None => raw_index,
    };
    Ok((index_data, num_blocks, num_entries))
}

fn read_record_block_index<R: Read>(
    file: &mut R,
    header: &MdictHeader,
) -> Result<(Vec<u8>, u64, u64)> {
    let width = header.version.number_width();
    let num_blocks = utils::read_number(file, width)?;
    let num_entries = utils::read_number(file, width)?;
    let record_index_len = utils::read_number(file, width)?;
    let _record_blocks_len = utils::read_number(file, width)?;

    info!(
        "Record block info: blocks={}, entries={}, index={} bytes",
        num_blocks, num_entries, record_index_len
    );

    let mut index_data = vec![0u8; record_index_len as usize];
    file.read_exact(&mut index_data)?;
    Ok((index_data, num_blocks, num_entries))
}

/// Skips a length-prefixed key text. v2 adds one terminator unit.
fn skip_text(reader: &mut &[u8], header: &MdictHeader) -> Result<()> {
    let text_len_units = utils::read_small_number(reader, header.version.small_number_width())?;
    let terminator_units = match header.version {
        MdictVersion::V1 => 0,
        MdictVersion::V2 => 1,
    };
    let units = (text_len_units + terminator_units) as usize;
    let total_bytes = units * utils::unit_width(header.encoding);

    if reader.len() < total_bytes {
        return Err(MdictError::InvalidFormat("Incomplete key text in index".to_string()));
    }
    *reader = &reader[total_bytes..];
    Ok(())
}
