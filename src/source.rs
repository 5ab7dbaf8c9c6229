//! Source text buffer with raw and match-normalized views.
//!
//! A [`SourceText`] is loaded once per session from the linked source note.
//! The raw view keeps the original punctuation and is what samples, previews,
//! and final quotes are cut from. The normalized view folds curly quotes to
//! straight ones and exists only so literal queries typed with a plain
//! keyboard still match typeset text.
//!
//! The fold maps one character to one character, so both views have the same
//! character count and an offset found in one view names the same character
//! in the other. Byte widths differ in UTF-8 (`’` is three bytes, `'` is
//! one), so offsets are translated by character rank, never copied verbatim.

use crate::models::Sample;

#[derive(Debug, Clone)]
pub struct SourceText {
    raw: String,
    normalized: String,
}

impl SourceText {
    pub fn new(raw: String) -> Self {
        let normalized = raw.chars().map(fold_quote).collect();
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Translate a byte offset in the normalized view to the byte offset of
    /// the same character rank in the raw view.
    pub fn map_offset(&self, norm_offset: usize) -> usize {
        let rank = self.normalized[..norm_offset].chars().count();
        self.raw
            .char_indices()
            .nth(rank)
            .map(|(i, _)| i)
            .unwrap_or(self.raw.len())
    }

    /// Cut a working window of up to `max_chars` characters of raw text
    /// starting at `offset`, or to end-of-buffer if shorter.
    pub fn sample_at(&self, offset: usize, max_chars: usize) -> Sample {
        Sample {
            offset,
            text: char_window(&self.raw, offset, max_chars).to_string(),
        }
    }
}

/// Curly-to-straight quote fold used for the normalized view.
fn fold_quote(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{201C}' | '\u{201D}' => '"',
        other => other,
    }
}

/// Slice up to `max_chars` characters of `s` starting at byte `start`.
pub fn char_window(s: &str, start: usize, max_chars: usize) -> &str {
    let tail = &s[start..];
    match tail.char_indices().nth(max_chars) {
        Some((end, _)) => &tail[..end],
        None => tail,
    }
}
