//! # mdd-inspect
//!
//! Inspects the resources bundled in MDict `.mdd` files and plays their audio
//! entries through whatever player the host provides.
//!
//! The core works against the [`archive::Archive`] traits. The built-in
//! reader for `.mdd` files lives in [`mdict`] behind the `mdict` feature.
pub mod app;
pub mod archive;
pub mod classify;
pub mod error;
#[cfg(feature = "mdict")]
pub mod mdict;
pub mod platform;
pub mod playback;
pub mod preview;
pub mod process;
pub mod report;

pub use archive::{Archive, ArchiveOpener, Capability, Entry, MemoryArchive};
#[cfg(feature = "mdict")]
pub use archive::{MddArchive, MddOpener};
pub use classify::{Category, CategoryCounts, Partition, classify, partition};
pub use error::{InspectError, PlaybackError, Result};
pub use platform::Platform;
pub use playback::{Orchestrator, PlaybackConfig, PlaybackOutcome, PlaybackSummary};
pub use preview::{PreviewKind, PreviewResult, preview};
pub use process::{ProcessRunner, SystemRunner};
pub use report::ListingLimits;
