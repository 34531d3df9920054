//! Error types for the MDict archive backend.

use thiserror::Error;

/// Everything that can go wrong while opening or walking an MDict file.
#[derive(Debug, Error)]
pub enum MdictError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The MDict file version is unsupported (3.0 and later).
    #[error("Unsupported MDict version: {0}. Only v1.x and v2.x resource files are supported.")]
    UnsupportedVersion(f32),

    /// A checksum validation failed, indicating data corruption.
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// A block uses an encryption scheme this backend cannot undo.
    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    /// Decompression failed or the required algorithm is not compiled in.
    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    /// A declared count of items does not match the actual number of items found.
    #[error("Count mismatch for {item_type}: expected {expected}, but found {found}")]
    CountMismatch {
        item_type: String,
        expected: u64,
        found: u64,
    },

    /// A buffer or data block has an unexpected size after an operation.
    #[error("Size mismatch for {context}: expected {expected} bytes, but found {found} bytes")]
    SizeMismatch {
        context: &'static str,
        expected: u64,
        found: u64,
    },

    /// The file is structurally invalid.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Record blocks are protected by a registration passcode.
    #[error("Encrypted file requires a passcode, which this reader does not accept.")]
    PasscodeRequired,

    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

/// A convenience `Result` type alias using [`MdictError`].
pub type Result<T> = std::result::Result<T, MdictError>;
