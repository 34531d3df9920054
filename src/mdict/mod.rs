//! MDict resource (`.mdd`) reader.
//!
//! Walks v1.x/v2.x files block by block: the key index tells where each key
//! block lives, key blocks map resource names to offsets in the concatenated
//! record stream, and record blocks hold the resource bytes.

pub mod error;
pub mod models;
mod block;
mod codec;
mod header;
mod index;
mod utils;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::iter::{FusedIterator, Peekable};
use std::path::Path;
use std::sync::Mutex;
use std::vec::IntoIter;

use log::{info, trace};

pub use error::{MdictError, Result};
use models::{BlockMeta, KeyEntry, MdictHeader};

/// An opened MDict resource file.
#[derive(Debug)]
pub struct MdictReader {
    file: Mutex<File>,
    pub header: MdictHeader,
    key_blocks: Vec<BlockMeta>,
    record_blocks: Vec<BlockMeta>,
    num_entries: u64,
}

impl MdictReader {
    /// Opens the file at `path` and parses its header and block indexes.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, is structurally
    /// invalid, fails a checksum, or uses an unsupported version or
    /// record encryption.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening MDict file: {}", path.display());
        let mut file = File::open(path)?;

        let header = header::parse(&mut file)?;
        let layout = index::parse(&mut file, &header)?;

        Ok(Self {
            file: Mutex::new(file),
            header,
            key_blocks: layout.key_blocks,
            record_blocks: layout.record_blocks,
            num_entries: layout.num_entries,
        })
    }

    /// Number of entries declared by the key section.
    pub fn num_entries(&self) -> u64 {
        self.num_entries
    }

    pub fn num_key_blocks(&self) -> usize {
        self.key_blocks.len()
    }

    pub fn num_record_blocks(&self) -> usize {
        self.record_blocks.len()
    }

    /// Iterates `(resource name, bytes)` pairs in archive order.
    ///
    /// Decodes one key block at a time and keeps the current record block
    /// cached while consecutive entries fall inside it.
    pub fn iter_entries(&self) -> Entries<'_> {
        Entries {
            reader: self,
            keys: Keys {
                reader: self,
                key_block_idx: 0,
                current: Vec::new().into_iter(),
            }
            .peekable(),
            record_block_idx: 0,
            cached_block: None,
            done: false,
        }
    }

    fn read_block(&self, meta: &BlockMeta) -> Result<Vec<u8>> {
        let mut raw = vec![0u8; meta.compressed_size as usize];
        {
            let mut file = self.file.lock().map_err(|_| MdictError::LockPoisoned)?;
            file.seek(SeekFrom::Start(meta.file_offset))?;
            file.read_exact(&mut raw)?;
        }
        block::decode_block(&mut raw, meta.decompressed_size)
    }

    fn read_key_entries(&self, block_index: usize) -> Result<Vec<KeyEntry>> {
        let meta = &self.key_blocks[block_index];
        let data = self.read_block(meta)?;
        parse_key_entries(&data, &self.header)
    }
}

/// Keys of all key blocks, in order.
struct Keys<'a> {
    reader: &'a MdictReader,
    key_block_idx: usize,
    current: IntoIter<KeyEntry>,
}

impl Iterator for Keys<'_> {
    type Item = Result<KeyEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(Ok(entry));
            }
            if self.key_block_idx >= self.reader.key_blocks.len() {
                return None;
            }
            match self.reader.read_key_entries(self.key_block_idx) {
                Ok(entries) => {
                    trace!("Key block {}: {} entries", self.key_block_idx, entries.len());
                    self.current = entries.into_iter();
                    self.key_block_idx += 1;
                }
                Err(e) => {
                    // Stop after reporting a broken key block.
                    self.key_block_idx = self.reader.key_blocks.len();
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Iterator over `(resource name, bytes)` pairs.
///
/// Created by [`MdictReader::iter_entries`]. Ends after the first error.
pub struct Entries<'a> {
    reader: &'a MdictReader,
    keys: Peekable<Keys<'a>>,
    record_block_idx: usize,
    cached_block: Option<(usize, Vec<u8>)>,
    done: bool,
}

impl Entries<'_> {
    fn resolve(&mut self, entry: KeyEntry) -> Result<(String, Vec<u8>)> {
        let reader = self.reader;
        let record_blocks = &reader.record_blocks;
        while self.record_block_idx < record_blocks.len()
            && entry.id >= record_blocks[self.record_block_idx].decompressed_end()
        {
            self.record_block_idx += 1;
        }
        let block = record_blocks.get(self.record_block_idx).copied().ok_or_else(|| {
            MdictError::InvalidFormat(format!("Record ID {} not found in any block", entry.id))
        })?;
        if entry.id < block.decompressed_offset {
            return Err(MdictError::InvalidFormat(format!(
                "Record ID {} precedes current block at {}",
                entry.id, block.decompressed_offset
            )));
        }

        let next_id = match self.keys.peek() {
            Some(Ok(next)) => next.id.min(block.decompressed_end()),
            _ => block.decompressed_end(),
        };
        if next_id < entry.id {
            return Err(MdictError::InvalidFormat(format!(
                "Record IDs out of order: {} before {}",
                entry.id, next_id
            )));
        }

        if self.cached_block.as_ref().map(|(idx, _)| *idx) != Some(self.record_block_idx) {
            let bytes = reader.read_block(&block)?;
            self.cached_block = Some((self.record_block_idx, bytes));
        }
        let bytes = match &self.cached_block {
            Some((_, bytes)) => bytes,
            None => {
                return Err(MdictError::InvalidFormat(
                    "Record block cache is empty".to_string(),
                ));
            }
        };

        let start = (entry.id - block.decompressed_offset) as usize;
        let end = (next_id - block.decompressed_offset) as usize;
        if end > bytes.len() {
            return Err(MdictError::InvalidFormat(format!(
                "Record location [{}..{}] is out of bounds for block of size {}",
                start,
                end,
                bytes.len()
            )));
        }
        Ok((entry.text, bytes[start..end].to_vec()))
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<(String, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.keys.next()? {
            Ok(entry) => self.resolve(entry),
            Err(e) => Err(e),
        };
        self.done = result.is_err();
        Some(result)
    }
}

impl FusedIterator for Entries<'_> {}

/// Parses `(record offset, NUL-terminated key)` pairs from a decoded key block.
fn parse_key_entries(data: &[u8], header: &MdictHeader) -> Result<Vec<KeyEntry>> {
    let width = utils::unit_width(header.encoding);
    let mut entries = Vec::new();
    let mut reader = data;

    while !reader.is_empty() {
        let id = utils::read_number(&mut reader, header.version.number_width())?;
        let end_pos = if width == 2 {
            reader
                .chunks_exact(2)
                .position(|chunk| chunk == [0, 0])
                .map(|chunk_index| chunk_index * 2)
        } else {
            reader.iter().position(|&byte| byte == 0)
        }
        .ok_or_else(|| MdictError::InvalidFormat("Missing null terminator in key".to_string()))?;

        let (text, _, _) = header.encoding.decode(&reader[..end_pos]);
        entries.push(KeyEntry {
            id,
            text: text.into_owned(),
        });
        reader = &reader[end_pos + width..];
    }

    Ok(entries)
}
