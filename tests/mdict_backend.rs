#![cfg(feature = "mdict")]

use std::io::Write;
use std::path::Path;

use adler2::adler32_slice;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use ripemd::{Digest, Ripemd128};

use mdd_inspect::{
    Archive, ArchiveOpener, CategoryCounts, Entry, InspectError, ListingLimits, MddOpener, app,
};

const STORED: u32 = 0;
const ZLIB: u32 = 2;
const FAST: u32 = 1;

fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn fast_encrypt(data: &mut [u8], key: &[u8]) {
    let mut prev = 0x36u8;
    for (i, byte) in data.iter_mut().enumerate() {
        let cipher = (*byte ^ prev ^ (i as u8) ^ key[i % key.len()]).rotate_right(4);
        *byte = cipher;
        prev = cipher;
    }
}

/// `[info LE][adler32 of plain BE][payload]`, with the first
/// `encrypted_prefix` payload bytes fast-encrypted when non-zero.
fn block(plain: &[u8], compression: u32, encrypted_prefix: u8) -> Vec<u8> {
    let mut payload = match compression {
        ZLIB => zlib(plain),
        _ => plain.to_vec(),
    };
    let checksum = adler32_slice(plain).to_be_bytes();
    let mut info = compression;
    if encrypted_prefix > 0 {
        info |= FAST << 4 | (encrypted_prefix as u32) << 8;
        let key: [u8; 16] = Ripemd128::digest(checksum).into();
        let len = payload.len().min(encrypted_prefix as usize);
        fast_encrypt(&mut payload[..len], &key);
    }
    let mut raw = Vec::new();
    raw.write_u32::<LittleEndian>(info).unwrap();
    raw.extend_from_slice(&checksum);
    raw.extend_from_slice(&payload);
    raw
}

/// The v2 key index: stored, payload fully fast-encrypted.
fn encrypted_key_index(plain: &[u8]) -> Vec<u8> {
    let checksum = adler32_slice(plain).to_be_bytes();
    let mut hasher = Ripemd128::new();
    hasher.update(checksum);
    hasher.update(0x3695u32.to_le_bytes());
    let key: [u8; 16] = hasher.finalize().into();

    let mut payload = plain.to_vec();
    fast_encrypt(&mut payload, &key);
    let mut raw = Vec::new();
    raw.write_u32::<LittleEndian>(STORED).unwrap();
    raw.extend_from_slice(&checksum);
    raw.extend_from_slice(&payload);
    raw
}

fn header(xml: &str) -> Vec<u8> {
    let mut body = utf16(xml);
    body.extend_from_slice(&[0, 0]);
    let mut out = Vec::new();
    out.write_u32::<BigEndian>(body.len() as u32).unwrap();
    out.extend_from_slice(&body);
    out.write_u32::<LittleEndian>(adler32_slice(&body)).unwrap();
    out
}

struct KeyBlock<'a> {
    keys: &'a [(&'a str, u64)],
    compression: u32,
}

/// Builds a v2 resource file, one record block per `record_blocks` item;
/// key ids are offsets into their concatenation.
fn build_mdd(key_blocks: &[KeyBlock<'_>], record_blocks: &[(Vec<u8>, u32, u8)]) -> Vec<u8> {
    let mut out = header(concat!(
        r#"<Library_Data GeneratedByEngineVersion="2.0" RequiredEngineVersion="2.0" "#,
        r#"Encrypted="2" Encoding="" Format="" Title="Synthetic"/>"#,
    ));

    let mut index = Vec::new();
    let mut raw_key_blocks = Vec::new();
    let mut num_entries = 0u64;
    for kb in key_blocks {
        let mut plain = Vec::new();
        for (key, id) in kb.keys {
            plain.write_u64::<BigEndian>(*id).unwrap();
            plain.extend_from_slice(&utf16(key));
            plain.extend_from_slice(&[0, 0]);
        }
        let raw = block(&plain, kb.compression, 0);

        index.write_u64::<BigEndian>(kb.keys.len() as u64).unwrap();
        for (key, _) in [kb.keys[0], kb.keys[kb.keys.len() - 1]] {
            index.write_u16::<BigEndian>(key.encode_utf16().count() as u16).unwrap();
            index.extend_from_slice(&utf16(key));
            index.extend_from_slice(&[0, 0]);
        }
        index.write_u64::<BigEndian>(raw.len() as u64).unwrap();
        index.write_u64::<BigEndian>(plain.len() as u64).unwrap();

        num_entries += kb.keys.len() as u64;
        raw_key_blocks.extend_from_slice(&raw);
    }
    let raw_index = encrypted_key_index(&index);

    let mut info = Vec::new();
    info.write_u64::<BigEndian>(key_blocks.len() as u64).unwrap();
    info.write_u64::<BigEndian>(num_entries).unwrap();
    info.write_u64::<BigEndian>(index.len() as u64).unwrap();
    info.write_u64::<BigEndian>(raw_index.len() as u64).unwrap();
    info.write_u64::<BigEndian>(raw_key_blocks.len() as u64).unwrap();
    out.extend_from_slice(&info);
    out.write_u32::<BigEndian>(adler32_slice(&info)).unwrap();
    out.extend_from_slice(&raw_index);
    out.extend_from_slice(&raw_key_blocks);

    let mut record_index = Vec::new();
    let mut raw_records = Vec::new();
    for (plain, compression, encrypted_prefix) in record_blocks {
        let raw = block(plain, *compression, *encrypted_prefix);
        record_index.write_u64::<BigEndian>(raw.len() as u64).unwrap();
        record_index.write_u64::<BigEndian>(plain.len() as u64).unwrap();
        raw_records.extend_from_slice(&raw);
    }
    out.write_u64::<BigEndian>(record_blocks.len() as u64).unwrap();
    out.write_u64::<BigEndian>(num_entries).unwrap();
    out.write_u64::<BigEndian>(record_index.len() as u64).unwrap();
    out.write_u64::<BigEndian>(raw_records.len() as u64).unwrap();
    out.extend_from_slice(&record_index);
    out.extend_from_slice(&raw_records);
    out
}

const HELLO: &[u8] = b"ID3\x03\x00hello-audio";
const LOGO: &[u8] = b"\x89PNG\r\n\x1a\nlogo";
const STYLE: &[u8] = b".word { font-weight: bold; color: #333 }";

fn sample_mdd() -> Vec<u8> {
    let hello_end = HELLO.len() as u64;
    let logo_end = hello_end + LOGO.len() as u64;
    build_mdd(
        &[
            KeyBlock {
                keys: &[("\\sound\\hello.mp3", 0), ("\\img\\logo.png", hello_end)],
                compression: STORED,
            },
            KeyBlock {
                keys: &[("\\style.css", logo_end)],
                compression: ZLIB,
            },
        ],
        &[
            ([HELLO, LOGO].concat(), STORED, 0),
            (STYLE.to_vec(), ZLIB, 16),
        ],
    )
}

fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".mdd").tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn reads_entries_across_blocks_in_order() {
    let file = write_temp(&sample_mdd());
    let archive = MddOpener.open(file.path()).unwrap();

    assert_eq!(archive.reader().num_entries(), 3);
    assert_eq!(archive.reader().num_key_blocks(), 2);
    assert_eq!(archive.reader().num_record_blocks(), 2);
    assert_eq!(archive.reader().header.title, "Synthetic");

    let entries: Vec<Entry> = archive.entries().collect::<Result<_, _>>().unwrap();
    assert_eq!(
        entries,
        [
            Entry::new("\\sound\\hello.mp3", HELLO),
            Entry::new("\\img\\logo.png", LOGO),
            Entry::new("\\style.css", STYLE),
        ]
    );
}

#[test]
fn inspection_over_a_real_file() {
    let file = write_temp(&sample_mdd());
    let mut out = Vec::new();
    let counts = app::inspect(&MddOpener, file.path(), ListingLimits::default(), &mut out).unwrap();

    assert_eq!(
        counts,
        CategoryCounts {
            image: 1,
            css: 1,
            javascript: 0,
            audio: 1,
            other: 0,
        }
    );
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Successfully loaded MDD file with 3 items"));
    assert!(out.contains("\\sound\\hello.mp3 (16 bytes)"));
}

#[test]
fn corrupt_record_block_is_a_decode_error() {
    let mut bytes = sample_mdd();
    let stored_at = bytes.windows(HELLO.len()).position(|w| w == HELLO).unwrap();
    bytes[stored_at + 4] ^= 0xFF;
    let file = write_temp(&bytes);

    let archive = MddOpener.open(file.path()).unwrap();
    let result: Result<Vec<Entry>, _> = archive.entries().collect();
    assert!(matches!(result, Err(InspectError::Decode { .. })));
}

#[test]
fn out_of_order_record_ids_end_the_iteration() {
    let bytes = build_mdd(
        &[KeyBlock {
            keys: &[("b.mp3", 20), ("a.mp3", 5)],
            compression: STORED,
        }],
        &[(vec![1u8; 10], STORED, 0), (vec![2u8; 30], STORED, 0)],
    );
    let file = write_temp(&bytes);
    let archive = MddOpener.open(file.path()).unwrap();

    let results: Vec<bool> = archive.entries().map(|r| r.is_ok()).collect();
    assert_eq!(results, [false]);

    let mut entries = archive.reader().iter_entries();
    assert!(entries.next().unwrap().is_err());
    assert!(entries.next().is_none());
    assert!(entries.next().is_none());
}

#[test]
fn corrupt_header_is_rejected_on_open() {
    let mut bytes = sample_mdd();
    bytes[10] ^= 0x01;
    let file = write_temp(&bytes);

    let err = MddOpener.open(file.path()).unwrap_err();
    match err {
        InspectError::Decode { message } => assert!(message.contains("Checksum"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_not_found() {
    let err = MddOpener.open(Path::new("/nonexistent/dir/sounds.mdd")).unwrap_err();
    assert!(matches!(err, InspectError::FileNotFound(_)));
}
