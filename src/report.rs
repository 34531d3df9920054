//! Plain-text rendering of inspection and playback results.

use std::io::{self, Write};
use std::path::Path;

use crate::archive::Entry;
use crate::classify::{Category, Partition};
use crate::error::InspectError;
use crate::playback::{PlaybackEvent, PlaybackSummary};
use crate::preview::{self, DEFAULT_PREVIEW_CHARS, PreviewResult};

const SEPARATOR_WIDTH: usize = 70;

/// How much of each category the inspection report lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLimits {
    pub image: Option<usize>,
    pub css: Option<usize>,
    pub javascript: Option<usize>,
    pub audio: Option<usize>,
    pub other: Option<usize>,
    pub preview_chars: usize,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            image: Some(10),
            css: None,
            javascript: None,
            audio: Some(5),
            other: Some(10),
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl ListingLimits {
    pub fn for_category(&self, category: Category) -> Option<usize> {
        match category {
            Category::Image => self.image,
            Category::Css => self.css,
            Category::JavaScript => self.javascript,
            Category::Audio => self.audio,
            Category::Other => self.other,
        }
    }
}

/// Writes report sections to `out`.
pub struct Printer<W> {
    out: W,
    limits: ListingLimits,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, limits: ListingLimits) -> Self {
        Self { out, limits }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn loading(&mut self, path: &Path) -> io::Result<()> {
        writeln!(self.out, "Loading MDD file: {}", path.display())
    }

    pub fn loaded(&mut self, total: usize) -> io::Result<()> {
        writeln!(self.out, "Successfully loaded MDD file with {} items", total)?;
        writeln!(self.out, "{}", "=".repeat(SEPARATOR_WIDTH))
    }

    pub fn summary(&mut self, partition: &Partition<'_>) -> io::Result<()> {
        writeln!(self.out, "File type summary:")?;
        for category in Category::ALL {
            writeln!(self.out, "  {}: {}", category, partition.count(category))?;
        }
        writeln!(self.out)
    }

    /// Bounded per-category listings, with previews where the category carries text.
    pub fn listings(&mut self, partition: &Partition<'_>) -> io::Result<()> {
        for category in Category::ALL {
            let entries = partition.entries(category);
            if entries.is_empty() {
                continue;
            }
            let limit = self.limits.for_category(category);
            writeln!(self.out, "{}", listing_heading(category, limit))?;
            let shown = limit.unwrap_or(entries.len()).min(entries.len());
            for (i, entry) in entries[..shown].iter().enumerate() {
                self.listing_line(i + 1, category, entry)?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn listing_line(&mut self, number: usize, category: Category, entry: &Entry) -> io::Result<()> {
        let name = entry.decoded_key();
        let result = match category {
            Category::Image | Category::Audio => {
                return writeln!(self.out, "  {}. {} ({} bytes)", number, name, entry.content.len());
            }
            Category::Css | Category::JavaScript => {
                preview::preview_text(&entry.content, self.limits.preview_chars)
            }
            Category::Other => preview::preview(&entry.content, self.limits.preview_chars),
        };
        self.preview_lines(number, &name, category == Category::Other, &result)
    }

    fn preview_lines(
        &mut self,
        number: usize,
        name: &str,
        tag_text: bool,
        result: &PreviewResult,
    ) -> io::Result<()> {
        match (&result.text_preview, result.char_length) {
            (Some(text), Some(chars)) => {
                let tag = if tag_text { "text, " } else { "" };
                writeln!(self.out, "  {}. {} ({}{} characters)", number, name, tag, chars)?;
                writeln!(self.out, "     Preview: {}", text)
            }
            _ => writeln!(
                self.out,
                "  {}. {} ({} bytes) [Binary]",
                number, name, result.byte_length
            ),
        }
    }

    pub fn analysis_complete(&mut self) -> io::Result<()> {
        writeln!(self.out, "\nMDD file analysis complete.")
    }

    pub fn audio_found(&mut self, found: usize, to_play: usize) -> io::Result<()> {
        writeln!(self.out, "Found {} audio files", found)?;
        if found == 0 {
            return writeln!(self.out, "No audio files found in the MDD file.");
        }
        writeln!(self.out, "\nPlaying {} audio files sequentially...", to_play)
    }

    pub fn playback_event(&mut self, event: &PlaybackEvent<'_>) -> io::Result<()> {
        match event {
            PlaybackEvent::Started { index, total, entry } => writeln!(
                self.out,
                "\n[{}/{}] {} ({} bytes)",
                index + 1,
                total,
                entry.decoded_key(),
                entry.content.len()
            ),
            PlaybackEvent::Finished { outcome, .. } => {
                let key = &outcome.entry_key;
                match (&outcome.player_used, &outcome.error) {
                    (Some(player), _) => writeln!(self.out, "Played {} with {}", key, player),
                    (None, Some(err)) => writeln!(self.out, "Failed to play {}: {}", key, err),
                    (None, None) => writeln!(self.out, "Failed to play {}", key),
                }
            }
        }
    }

    pub fn playback_summary(&mut self, summary: &PlaybackSummary) -> io::Result<()> {
        writeln!(self.out, "\nFinished playing all audio files.")?;
        writeln!(
            self.out,
            "{} played, {} failed ({} attempted)",
            summary.succeeded, summary.failed, summary.attempted
        )
    }

    /// Diagnostic for an archive-level failure, with remediation text if known.
    pub fn error(&mut self, err: &InspectError) -> io::Result<()> {
        writeln!(self.out, "Error: {}", err)?;
        if let Some(hint) = err.remediation() {
            writeln!(self.out, "{}", hint)?;
        }
        Ok(())
    }
}

fn listing_heading(category: Category, limit: Option<usize>) -> String {
    let noun = match category {
        Category::Image => "image files",
        Category::Css => "CSS files",
        Category::JavaScript => "JavaScript files",
        Category::Audio => "audio files",
        Category::Other => "other files",
    };
    match limit {
        Some(n) => format!("First {} {}:", n, noun),
        None => format!("{}:", noun),
    }
}
