//! Error types for inspection and playback.

use std::path::PathBuf;

use thiserror::Error;

/// Archive-level failures. Any of these aborts the whole run.
#[derive(Debug, Error)]
pub enum InspectError {
    /// No archive backend is usable in this build.
    #[error("archive reader is unavailable: {0}")]
    ArchiveUnavailable(String),

    /// The archive path does not resolve to a file.
    #[error("MDD file not found at {}", .0.display())]
    FileNotFound(PathBuf),

    /// The archive was found but its payload could not be decoded.
    #[error("failed to read archive: {message}")]
    Decode { message: String },

    /// Writing the report itself failed.
    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl InspectError {
    /// Remediation text for a decode failure caused by missing LZO support.
    pub fn lzo_hint(&self) -> Option<&'static str> {
        match self {
            InspectError::Decode { message } if message.to_lowercase().contains("lzo") => Some(
                "This error is likely related to missing LZO compression support. \
                 Rebuild with the `lzo` cargo feature enabled.",
            ),
            _ => None,
        }
    }

    /// Remediation text for an unavailable archive backend.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            InspectError::ArchiveUnavailable(_) => Some(
                "Rebuild with the `mdict` cargo feature enabled \
                 (it is part of the default features).",
            ),
            InspectError::FileNotFound(_) => Some("Please check if the file path is correct."),
            InspectError::Decode { .. } => self.lzo_hint(),
            InspectError::Report(_) => None,
        }
    }
}

/// Per-entry playback failures. The run continues with the next entry.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// One candidate player was absent or exited with a failure status.
    #[error("player `{player}` failed: {reason}")]
    PlayerInvocationFailed { player: String, reason: String },

    /// Every candidate player was tried and none succeeded.
    #[error(
        "no suitable audio player found (tried: {}); please install one of them",
        .tried.join(", ")
    )]
    NoPlayerAvailable { tried: Vec<String> },

    /// The host platform has no known playback strategy.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Staging the audio bytes on disk failed.
    #[error("failed to stage temporary audio file: {0}")]
    TempFile(#[from] std::io::Error),
}

/// A convenience `Result` alias for archive-level operations.
pub type Result<T> = std::result::Result<T, InspectError>;
