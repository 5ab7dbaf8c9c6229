//! Core data types shared across the quote engine.
//!
//! These types represent the matches, samples, and positions that flow
//! from passage search through selection to insertion.

use serde::{Deserialize, Serialize};

/// One literal occurrence of the user's query in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Byte offset into the raw view of the source text. Always a valid
    /// character boundary by construction.
    pub offset: usize,
    /// Bounded preview of the raw text starting at `offset`, with a `...`
    /// continuation marker when the window was cut short.
    pub preview: String,
}

/// Bounded working window of raw source text anchored at a match offset.
///
/// Sentence segmentation runs over samples, never over the whole source,
/// so adjustment steps stay cheap on large books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Byte offset of the window start in the raw source.
    pub offset: usize,
    pub text: String,
}

/// Line-based insertion point captured when a session opens and handed
/// unchanged to the insertion collaborator at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    /// Zero-based line index into the target note.
    pub line: usize,
}

/// Output style for rendered quotes.
///
/// Read from config at formatting time; not stored on a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Admonition-style block with a leading header line.
    #[default]
    Callout,
    /// Markdown blockquote, no header.
    #[serde(alias = "quote")]
    Blockquote,
    /// Unprefixed text. `none` is accepted as a legacy spelling.
    #[serde(alias = "none")]
    Plain,
}

impl std::str::FromStr for QuoteStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "callout" => Ok(QuoteStyle::Callout),
            "blockquote" | "quote" => Ok(QuoteStyle::Blockquote),
            "plain" | "none" => Ok(QuoteStyle::Plain),
            other => Err(format!(
                "unknown quote style '{}'. Use callout, blockquote, or plain.",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_from_str_accepts_aliases() {
        assert_eq!("callout".parse::<QuoteStyle>(), Ok(QuoteStyle::Callout));
        assert_eq!("quote".parse::<QuoteStyle>(), Ok(QuoteStyle::Blockquote));
        assert_eq!("none".parse::<QuoteStyle>(), Ok(QuoteStyle::Plain));
        assert!("fancy".parse::<QuoteStyle>().is_err());
    }
}
