//! Bounded text previews of binary content.

/// Default preview width, in characters.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Appended to a preview when the text was cut.
pub const TRUNCATION_MARKER: &str = "...";

/// How many leading characters must be 7-bit ASCII for content to count as text.
const ASCII_PROBE_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Text,
    Binary,
}

/// Outcome of previewing one entry's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResult {
    pub kind: PreviewKind,
    pub byte_length: usize,
    /// Length of the decoded text in characters; `None` for binary content.
    pub char_length: Option<usize>,
    pub text_preview: Option<String>,
}

impl PreviewResult {
    fn binary(byte_length: usize) -> Self {
        Self {
            kind: PreviewKind::Binary,
            byte_length,
            char_length: None,
            text_preview: None,
        }
    }

    fn text(byte_length: usize, text: &str, max_chars: usize) -> Self {
        Self {
            kind: PreviewKind::Text,
            byte_length,
            char_length: Some(text.chars().count()),
            text_preview: Some(truncate(text, max_chars)),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == PreviewKind::Text
    }
}

/// Previews content of unknown type.
///
/// Text only when the lossily decoded content is non-blank and its first 100
/// characters are all ASCII. Replacement characters from invalid UTF-8 are
/// not ASCII, so undecodable prefixes come out as [`PreviewKind::Binary`].
pub fn preview(content: &[u8], max_chars: usize) -> PreviewResult {
    let decoded = String::from_utf8_lossy(content);
    if decoded.trim().is_empty() || !decoded.chars().take(ASCII_PROBE_CHARS).all(|c| c.is_ascii()) {
        return PreviewResult::binary(content.len());
    }
    PreviewResult::text(content.len(), &decoded, max_chars)
}

/// Previews content that is text by construction (stylesheets, scripts).
///
/// Always [`PreviewKind::Text`]: no ASCII guard, and blank content yields an
/// empty or whitespace-only preview.
pub fn preview_text(content: &[u8], max_chars: usize) -> PreviewResult {
    let decoded = String::from_utf8_lossy(content);
    PreviewResult::text(content.len(), &decoded, max_chars)
}

/// First `max_chars` characters of `text`, plus [`TRUNCATION_MARKER`] if anything was cut.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_returned_whole() {
        let result = preview(b"body { color: red }", DEFAULT_PREVIEW_CHARS);
        assert_eq!(result.kind, PreviewKind::Text);
        assert_eq!(result.text_preview.as_deref(), Some("body { color: red }"));
        assert_eq!(result.char_length, Some(19));
    }

    #[test]
    fn text_at_exact_limit_has_no_marker() {
        let text = "a".repeat(200);
        let result = preview(text.as_bytes(), 200);
        assert_eq!(result.text_preview.as_deref(), Some(text.as_str()));
    }

    #[test]
    fn long_text_is_cut_with_marker() {
        let text = "b".repeat(201);
        let result = preview(text.as_bytes(), 200);
        let shown = result.text_preview.unwrap();
        assert_eq!(shown, format!("{}{}", "b".repeat(200), TRUNCATION_MARKER));
        assert_eq!(result.char_length, Some(201));
    }

    #[test]
    fn non_ascii_prefix_is_binary() {
        let result = preview("café au lait".as_bytes(), 200);
        assert_eq!(result.kind, PreviewKind::Binary);
        assert_eq!(result.byte_length, 13);
        assert_eq!(result.text_preview, None);
    }

    #[test]
    fn non_ascii_after_probe_window_is_text() {
        let mut text = "x".repeat(100);
        text.push('é');
        assert!(preview(text.as_bytes(), 200).is_text());
    }

    #[test]
    fn invalid_utf8_is_binary() {
        let result = preview(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A], 200);
        assert_eq!(result.kind, PreviewKind::Binary);
        assert_eq!(result.byte_length, 6);
    }

    #[test]
    fn blank_content_is_binary() {
        assert!(!preview(b"  \n\t ", 200).is_text());
        assert!(!preview(b"", 200).is_text());
    }

    #[test]
    fn blank_stylesheet_is_still_text() {
        let result = preview_text(b" \n ", 200);
        assert!(result.is_text());
        assert_eq!(result.char_length, Some(3));
        assert_eq!(result.text_preview.as_deref(), Some(" \n "));

        let empty = preview_text(b"", 200);
        assert_eq!(empty.char_length, Some(0));
        assert_eq!(empty.text_preview.as_deref(), Some(""));
    }

    #[test]
    fn text_preview_accepts_non_ascii() {
        let result = preview_text("/* 中文 */ a{}".as_bytes(), 5);
        assert!(result.is_text());
        assert_eq!(result.text_preview.as_deref(), Some("/* 中文..."));
    }

    #[test]
    fn zero_width_preview_is_just_the_marker() {
        let result = preview(b"abc", 0);
        assert_eq!(result.text_preview.as_deref(), Some(TRUNCATION_MARKER));
    }
}
