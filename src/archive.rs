//! The archive seam: entries, the reader traits and the default backend.

use std::path::Path;

use log::debug;

use crate::error::{InspectError, Result};

/// One `(key, content)` pair stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub content: Vec<u8>,
}

impl Entry {
    pub fn new(key: impl Into<Vec<u8>>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
        }
    }

    /// The key as text, invalid UTF-8 replaced. Only used for matching and display.
    pub fn decoded_key(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}

/// An opened archive.
pub trait Archive {
    /// Entries in archive order.
    fn entries(&self) -> Box<dyn Iterator<Item = Result<Entry>> + '_>;
}

/// Opens archives from paths.
pub trait ArchiveOpener {
    type Archive: Archive;

    fn open(&self, path: &Path) -> Result<Self::Archive>;
}

/// Whether the archive backend can be used in this build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Available,
    Unavailable(String),
}

impl Capability {
    /// Converts `Unavailable` into [`InspectError::ArchiveUnavailable`].
    pub fn require(self) -> Result<()> {
        match self {
            Capability::Available => Ok(()),
            Capability::Unavailable(reason) => Err(InspectError::ArchiveUnavailable(reason)),
        }
    }
}

/// Reports whether the built-in MDict backend was compiled in.
pub fn probe() -> Capability {
    if cfg!(feature = "mdict") {
        debug!("MDict backend available");
        Capability::Available
    } else {
        Capability::Unavailable("built without the `mdict` feature".to_string())
    }
}

/// Opens `.mdd` files with the built-in MDict backend.
#[cfg(feature = "mdict")]
#[derive(Debug, Default, Clone, Copy)]
pub struct MddOpener;

#[cfg(feature = "mdict")]
impl ArchiveOpener for MddOpener {
    type Archive = MddArchive;

    fn open(&self, path: &Path) -> Result<MddArchive> {
        if !path.is_file() {
            return Err(InspectError::FileNotFound(path.to_path_buf()));
        }
        let reader = crate::mdict::MdictReader::open(path).map_err(|e| from_mdict(e, path))?;
        log::info!(
            "Opened {} ({} entries, {} record blocks)",
            path.display(),
            reader.num_entries(),
            reader.num_record_blocks()
        );
        Ok(MddArchive { reader })
    }
}

/// An `.mdd` file opened by [`MddOpener`].
#[cfg(feature = "mdict")]
#[derive(Debug)]
pub struct MddArchive {
    reader: crate::mdict::MdictReader,
}

#[cfg(feature = "mdict")]
impl MddArchive {
    pub fn reader(&self) -> &crate::mdict::MdictReader {
        &self.reader
    }
}

#[cfg(feature = "mdict")]
impl Archive for MddArchive {
    fn entries(&self) -> Box<dyn Iterator<Item = Result<Entry>> + '_> {
        Box::new(self.reader.iter_entries().map(|result| {
            result
                .map(|(key, content)| Entry::new(key, content))
                .map_err(|e| InspectError::Decode { message: e.to_string() })
        }))
    }
}

#[cfg(feature = "mdict")]
fn from_mdict(err: crate::mdict::MdictError, path: &Path) -> InspectError {
    match err {
        crate::mdict::MdictError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
            InspectError::FileNotFound(path.to_path_buf())
        }
        other => InspectError::Decode { message: other.to_string() },
    }
}

/// An in-memory archive, mostly useful for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryArchive {
    entries: Vec<Entry>,
}

impl MemoryArchive {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }
}

impl Archive for MemoryArchive {
    fn entries(&self) -> Box<dyn Iterator<Item = Result<Entry>> + '_> {
        Box::new(self.entries.iter().cloned().map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_key_replaces_invalid_utf8() {
        let entry = Entry::new(vec![b'a', 0xFF, b'.', b'p', b'n', b'g'], Vec::new());
        assert_eq!(entry.decoded_key(), "a\u{FFFD}.png");
    }

    #[test]
    fn unavailable_capability_maps_to_error() {
        let err = Capability::Unavailable("no backend".into()).require().unwrap_err();
        assert!(matches!(err, InspectError::ArchiveUnavailable(_)));
        assert!(err.remediation().is_some());
    }

    #[cfg(feature = "mdict")]
    #[test]
    fn probe_reports_backend() {
        assert_eq!(probe(), Capability::Available);
    }

    #[cfg(feature = "mdict")]
    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = MddOpener.open(&dir.path().join("missing.mdd")).unwrap_err();
        assert!(matches!(err, InspectError::FileNotFound(_)));
    }

    #[test]
    fn memory_archive_keeps_order() {
        let archive = MemoryArchive::new(vec![Entry::new("b", "1"), Entry::new("a", "2")]);
        let keys: Vec<String> = archive.entries().map(|e| e.unwrap().decoded_key()).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
