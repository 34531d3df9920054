//! Content-type classification of archive entries by key suffix.

use std::fmt;

use crate::archive::Entry;

/// Classification bucket of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Image,
    Css,
    JavaScript,
    Audio,
    Other,
}

impl Category {
    /// All categories, in matching priority order.
    pub const ALL: [Category; 5] = [
        Category::Image,
        Category::Css,
        Category::JavaScript,
        Category::Audio,
        Category::Other,
    ];

    /// Lower-case suffixes (dot included) that select this category.
    pub fn suffixes(self) -> &'static [&'static str] {
        match self {
            Category::Image => &[".jpg", ".jpeg", ".png", ".gif", ".bmp"],
            Category::Css => &[".css"],
            Category::JavaScript => &[".js"],
            Category::Audio => &[".mp3", ".wav", ".ogg", ".m4a"],
            Category::Other => &[],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Image => "Images",
            Category::Css => "CSS files",
            Category::JavaScript => "JavaScript files",
            Category::Audio => "Audio files",
            Category::Other => "Other files",
        };
        f.write_str(name)
    }
}

/// Classifies raw key bytes. Total: undecodable keys go through lossy decoding.
pub fn classify_key(key: &[u8]) -> Category {
    let lowered = String::from_utf8_lossy(key).to_lowercase();
    Category::ALL
        .into_iter()
        .find(|category| category.suffixes().iter().any(|suffix| lowered.ends_with(suffix)))
        .unwrap_or(Category::Other)
}

pub fn classify(entry: &Entry) -> Category {
    classify_key(&entry.key)
}

/// Entries grouped by category, archive order kept inside each group.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    buckets: [Vec<&'a Entry>; 5],
}

impl<'a> Partition<'a> {
    pub fn entries(&self, category: Category) -> &[&'a Entry] {
        &self.buckets[category.index()]
    }

    pub fn count(&self, category: Category) -> usize {
        self.buckets[category.index()].len()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Per-category counts in [`Category::ALL`] order.
    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts {
            image: self.count(Category::Image),
            css: self.count(Category::Css),
            javascript: self.count(Category::JavaScript),
            audio: self.count(Category::Audio),
            other: self.count(Category::Other),
        }
    }
}

/// Number of entries per category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCounts {
    pub image: usize,
    pub css: usize,
    pub javascript: usize,
    pub audio: usize,
    pub other: usize,
}

/// Groups `entries` by [`classify`].
pub fn partition<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Partition<'a> {
    let mut partition = Partition::default();
    for entry in entries {
        partition.buckets[classify(entry).index()].push(entry);
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_match_ignores_case() {
        assert_eq!(classify_key(b"\\img\\Logo.PNG"), Category::Image);
        assert_eq!(classify_key(b"style.Css"), Category::Css);
        assert_eq!(classify_key(b"app.JS"), Category::JavaScript);
        assert_eq!(classify_key(b"\\sound\\word.M4A"), Category::Audio);
    }

    #[test]
    fn unmatched_and_undecodable_keys_are_other() {
        assert_eq!(classify_key(b"readme"), Category::Other);
        assert_eq!(classify_key(b"font.ttf"), Category::Other);
        assert_eq!(classify_key(&[0xFF, 0xFE, 0x00]), Category::Other);
        assert_eq!(classify_key(b""), Category::Other);
    }

    #[test]
    fn only_the_final_suffix_counts() {
        assert_eq!(classify_key(b"clip.mp3.bak"), Category::Other);
        assert_eq!(classify_key(b"page.css.js"), Category::JavaScript);
        assert_eq!(classify_key(b"jpeg"), Category::Other);
    }

    #[test]
    fn invalid_bytes_before_suffix_still_classify() {
        assert_eq!(classify_key(&[0xC3, b'.', b'o', b'g', b'g']), Category::Audio);
    }

    #[test]
    fn suffix_sets_are_disjoint() {
        for a in Category::ALL {
            for b in Category::ALL {
                if a == b {
                    continue;
                }
                for suffix in a.suffixes() {
                    assert!(!b.suffixes().contains(suffix), "{} shared by {} and {}", suffix, a, b);
                }
            }
        }
    }

    #[test]
    fn partition_is_total_and_ordered() {
        let entries = vec![
            Entry::new("x.mp3", "1"),
            Entry::new("a.gif", "2"),
            Entry::new("y.wav", "3"),
            Entry::new("misc", "4"),
        ];
        let partition = partition(&entries);
        assert_eq!(partition.total(), entries.len());
        let audio: Vec<String> = partition
            .entries(Category::Audio)
            .iter()
            .map(|e| e.decoded_key())
            .collect();
        assert_eq!(audio, ["x.mp3", "y.wav"]);
        assert_eq!(
            partition.counts(),
            CategoryCounts { image: 1, css: 0, javascript: 0, audio: 2, other: 1 }
        );
    }
}
