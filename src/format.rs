//! Quote rendering.
//!
//! Turns selected text into one of the output styles. The joined selection
//! is split on newlines, each content line gets its style prefix, and a
//! single trailing empty line is appended so the quote stays visually
//! separated from whatever follows it in the note.

use crate::models::QuoteStyle;
use crate::selection::Selection;

/// Render `text` (already joined and trimmed) in the given style.
pub fn render_quote(text: &str, style: QuoteStyle, callout_header: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    if style == QuoteStyle::Callout {
        lines.push(callout_header.to_string());
    }
    if !text.is_empty() {
        for line in text.split('\n') {
            match style {
                QuoteStyle::Callout | QuoteStyle::Blockquote => lines.push(format!("> {}", line)),
                QuoteStyle::Plain => lines.push(line.to_string()),
            }
        }
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Render the current selection.
pub fn render_selection(selection: &Selection, style: QuoteStyle, callout_header: &str) -> String {
    render_quote(&selection.text(), style, callout_header)
}
