//! Sentence segmentation for quote selection.
//!
//! Splits sampled text into an ordered run of sentences with a single
//! tolerant heuristic: a terminal mark (`.`, `?`, `!`, or a newline),
//! optionally one closing quote, a whitespace run, and a peek at the next
//! visible character — an optional opening curly quote followed by an
//! uppercase letter. The whitespace after a boundary belongs to the
//! preceding sentence, so concatenating the output reproduces the consumed
//! input byte for byte.
//!
//! Implemented as an explicit forward scanner rather than a regex so the
//! behavior does not hinge on one engine's lookahead and dotall semantics.

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '?' | '!' | '\n')
}

fn is_closing_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '\u{2019}' | '\u{201D}')
}

fn is_opening_quote(c: char) -> bool {
    matches!(c, '\u{2018}' | '\u{201C}')
}

/// Split `text` into sentences.
///
/// A sentence ends after a terminal mark, an optional closing quote, and a
/// whitespace run, provided the next visible character starts a new sentence
/// (optional opening quote, then an uppercase letter). A terminal mark that
/// runs into the end of the input also closes the final sentence. Trailing
/// text with no terminal mark before end of input is dropped, mirroring the
/// behavior this tool inherited: an unterminated fragment is not worth
/// quoting.
pub fn segment(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let n = chars.len();
    let mut sentences = Vec::new();
    let mut sent_start = 0usize;
    let mut i = 0usize;

    while i < n {
        if !is_terminal(chars[i].1) {
            i += 1;
            continue;
        }

        // Candidate boundary: terminal mark at i, then an optional closing
        // quote, then whitespace.
        let mut j = i + 1;
        if j < n && is_closing_quote(chars[j].1) {
            j += 1;
        }
        let ws_start = j;
        while j < n && chars[j].1.is_whitespace() {
            j += 1;
        }

        if j == n {
            // End-of-buffer boundary: the terminal mark closes the final
            // sentence even without the whitespace-and-capital sequel.
            sentences.push(text[sent_start..].to_string());
            return sentences;
        }

        if j == ws_start {
            // No whitespace after the terminal mark; not a boundary.
            i += 1;
            continue;
        }

        // Lookahead only: optional opening quote, then an uppercase letter.
        let mut k = j;
        if is_opening_quote(chars[k].1) {
            k += 1;
        }
        if k < n && chars[k].1.is_ascii_uppercase() {
            let end = chars[j].0;
            sentences.push(text[sent_start..end].to_string());
            sent_start = end;
            i = j;
        } else {
            i += 1;
        }
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_sentences() {
        let got = segment("He said yes. She said no. They left.");
        assert_eq!(got, vec!["He said yes. ", "She said no. ", "They left."]);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_concatenation_reproduces_consumed_prefix() {
        let texts = [
            "He said yes. She said no. They left quickly.",
            "One. Two! Three? Four.\nFive. tail without capital",
            "“Quoted start.” Then more. And an unterminated tail",
            "No boundary here at all",
        ];
        for text in texts {
            let sentences = segment(text);
            let joined: String = sentences.concat();
            assert!(
                text.starts_with(&joined),
                "joined output is not a prefix of {:?}: {:?}",
                text,
                joined
            );
        }
    }

    #[test]
    fn test_whitespace_belongs_to_preceding_sentence() {
        let got = segment("First.  Second.");
        assert_eq!(got, vec!["First.  ", "Second."]);
    }

    #[test]
    fn test_newline_is_a_terminal_mark() {
        let got = segment("a line\n\nAnother line.");
        assert_eq!(got, vec!["a line\n\n", "Another line."]);
    }

    #[test]
    fn test_boundary_spans_newline_whitespace() {
        let got = segment("End of paragraph.\nNext one starts.");
        assert_eq!(got, vec!["End of paragraph.\n", "Next one starts."]);
    }

    #[test]
    fn test_closing_quote_before_whitespace() {
        let got = segment("\u{201C}Stop.\u{201D} He ran.");
        assert_eq!(got, vec!["\u{201C}Stop.\u{201D} ", "He ran."]);
    }

    #[test]
    fn test_opening_quote_in_lookahead() {
        let got = segment("She agreed. \u{201C}Fine.\u{201D}");
        assert_eq!(got, vec!["She agreed. ", "\u{201C}Fine.\u{201D}"]);
    }

    #[test]
    fn test_lowercase_continuation_is_not_a_boundary() {
        // "Mr. smith" style abbreviation followed by lowercase must not split.
        let got = segment("He met mr. smith at noon. Then he left.");
        assert_eq!(got, vec!["He met mr. smith at noon. ", "Then he left."]);
    }

    #[test]
    fn test_ellipsis_splits_after_last_dot() {
        let got = segment("Well... Maybe so.");
        assert_eq!(got, vec!["Well... ", "Maybe so."]);
    }

    #[test]
    fn test_unterminated_tail_is_dropped() {
        assert_eq!(segment("nothing ends this"), Vec::<String>::new());
        // A failed boundary candidate (lowercase continuation) with no later
        // terminal mark drops the whole remainder.
        assert_eq!(segment("no capital follows. ever"), Vec::<String>::new());
        // An interior boundary still holds; only the unterminated remainder
        // after it is dropped.
        let got = segment("Kept sentence. Dropped fragment without end");
        assert_eq!(got, vec!["Kept sentence. "]);
    }

    #[test]
    fn test_terminal_at_end_with_trailing_whitespace() {
        let got = segment("A sentence. ");
        assert_eq!(got, vec!["A sentence. "]);
    }
}
