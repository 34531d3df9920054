//! End-to-end flows behind the command-line tool.

use std::io::Write;
use std::path::Path;

use log::{info, warn};

use crate::archive::{Archive, ArchiveOpener, Entry};
use crate::classify::{self, Category, CategoryCounts};
use crate::error::Result;
use crate::playback::{Orchestrator, PlaybackSummary};
use crate::process::ProcessRunner;
use crate::report::{ListingLimits, Printer};

/// Opens, classifies and reports on every entry of the archive at `path`.
///
/// Nothing is written when the archive cannot be opened.
pub fn inspect<O, W>(
    opener: &O,
    path: &Path,
    limits: ListingLimits,
    out: W,
) -> Result<CategoryCounts>
where
    O: ArchiveOpener,
    W: Write,
{
    let archive = opener.open(path)?;
    let mut printer = Printer::new(out, limits);
    printer.loading(path)?;
    let entries: Vec<Entry> = archive.entries().collect::<Result<_>>()?;
    info!("Read {} entries from {}", entries.len(), path.display());

    let partition = classify::partition(&entries);
    printer.loaded(partition.total())?;
    printer.summary(&partition)?;
    printer.listings(&partition)?;
    printer.analysis_complete()?;
    Ok(partition.counts())
}

/// Plays the audio entries of the archive at `path` in archive order, up to
/// the orchestrator's play limit.
pub fn play<O, R, W>(
    opener: &O,
    path: &Path,
    orchestrator: &Orchestrator<R>,
    out: W,
) -> Result<PlaybackSummary>
where
    O: ArchiveOpener,
    R: ProcessRunner,
    W: Write,
{
    let archive = opener.open(path)?;
    let mut printer = Printer::new(out, ListingLimits::default());
    printer.loading(path)?;
    let limit = orchestrator.config().limit;
    let mut audio = Vec::new();
    let mut found = 0usize;
    for entry in archive.entries() {
        let entry = entry?;
        if classify::classify(&entry) != Category::Audio {
            continue;
        }
        found += 1;
        if limit.is_none_or(|max| audio.len() < max) {
            audio.push(entry);
        }
    }

    printer.audio_found(found, audio.len())?;
    if audio.is_empty() {
        return Ok(PlaybackSummary::default());
    }

    let mut write_failure = None;
    let summary = orchestrator.play_all(&audio, |event| {
        if write_failure.is_none() {
            write_failure = printer.playback_event(&event).err();
        }
    });
    if let Some(e) = write_failure {
        warn!("Progress output failed: {}", e);
    }
    printer.playback_summary(&summary)?;
    Ok(summary)
}
