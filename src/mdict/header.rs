//! File header parsing.
//!
//! ```text
//! [4 bytes BE] header length
//! [N bytes]    UTF-16LE XML, a single element carrying all metadata as attributes
//! [4 bytes LE] Adler-32 of the XML bytes
//! ```

use std::collections::HashMap;
use std::io::Read;

use adler2::adler32_slice;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use encoding_rs::UTF_16LE;
use log::{debug, info, trace};
use quick_xml::{Reader, events::Event};

use super::error::{MdictError, Result};
use super::models::{EncryptionFlags, MdictHeader, MdictVersion};

/// Parses the header of a resource file from the start of `file`.
pub fn parse<R: Read>(file: &mut R) -> Result<MdictHeader> {
    info!("Parsing MDict header");

    let header_len = file.read_u32::<BigEndian>()?;
    trace!("Header length: {} bytes", header_len);

    let mut header_bytes = vec![0u8; header_len as usize];
    file.read_exact(&mut header_bytes)?;

    let checksum_expected = file.read_u32::<LittleEndian>()?;
    let checksum_actual = adler32_slice(&header_bytes);
    if checksum_actual != checksum_expected {
        return Err(MdictError::ChecksumMismatch {
            expected: checksum_expected,
            actual: checksum_actual,
        });
    }

    let text_bytes = header_bytes.strip_suffix(&[0, 0]).unwrap_or(&header_bytes[..]);
    let (decoded, _, _) = UTF_16LE.decode(text_bytes);
    let sanitized: String = decoded
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    let attrs = parse_xml_attributes(&sanitized)?;
    let header = build_header(&attrs)?;

    info!(
        "Header parsed: version={}, title='{}', encrypted=(blocks={}, index={})",
        header.engine_version,
        header.title,
        header.encryption_flags.encrypt_record_blocks,
        header.encryption_flags.encrypt_key_index
    );
    if let Some(description) = &header.description {
        debug!("Header description: {}", description);
    }
    Ok(header)
}

fn parse_xml_attributes(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return e
                    .attributes()
                    .map(|attr_result| {
                        let attr = attr_result.map_err(|e| {
                            MdictError::InvalidFormat(format!(
                                "Failed to parse XML attribute: {}",
                                e
                            ))
                        })?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                        let value = attr
                            .unescape_value()
                            .map_err(|e| {
                                MdictError::InvalidFormat(format!(
                                    "Failed to decode XML value: {}",
                                    e
                                ))
                            })?
                            .into_owned();
                        Ok((key, value))
                    })
                    .collect();
            }
            Ok(Event::Eof) => {
                return Err(MdictError::InvalidFormat(
                    "No root element found in header XML".to_string(),
                ));
            }
            Err(e) => {
                return Err(MdictError::InvalidFormat(format!(
                    "Failed to read header XML: {}",
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }
}

fn build_header(attrs: &HashMap<String, String>) -> Result<MdictHeader> {
    let version_str = attrs
        .get("GeneratedByEngineVersion")
        .map(String::as_str)
        .unwrap_or("1.0");
    let version_f32: f32 = version_str.trim().parse().map_err(|e| {
        MdictError::InvalidFormat(format!("Could not parse 'GeneratedByEngineVersion': {}", e))
    })?;
    let version = MdictVersion::try_from(version_f32)?;
    debug!("MDict version: {} (parsed as {:?})", version_str, version);

    // Older writers emit "Yes"/"No" instead of a bitmask.
    let encryption_flags = match attrs.get("Encrypted").map(|s| s.trim()) {
        Some("Yes") | Some("yes") => EncryptionFlags::from(0x01),
        Some(s) => s.parse::<u8>().map(EncryptionFlags::from).unwrap_or_default(),
        None => EncryptionFlags::default(),
    };

    Ok(MdictHeader {
        version,
        engine_version: version_str.to_string(),
        encryption_flags,
        encoding: UTF_16LE,
        title: attrs
            .get("Title")
            .cloned()
            .unwrap_or_else(|| "Untitled Dictionary".to_string()),
        description: attrs.get("Description").cloned(),
    })
}
