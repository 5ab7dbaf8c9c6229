//! Passage matching over a loaded source text.
//!
//! The query is escaped and compiled as a literal, case-insensitive pattern
//! and scanned over the normalized view, so typing straight quotes finds
//! typeset text and no user input is ever interpreted as a pattern. Offsets
//! are translated back to the raw view before previews are cut.

use anyhow::{Context, Result};
use regex::RegexBuilder;
use std::path::Path;

use crate::config::{Config, QuoteConfig};
use crate::models::Match;
use crate::notice::NoticeSink;
use crate::source::{char_window, SourceText};
use crate::vault::{NoteSource, SourceProvider, Vault};

/// Find up to `max_matches` literal occurrences of `query` in the source.
///
/// Queries of `min_query_chars` characters or fewer return an empty result
/// before any pattern is compiled; so does the empty query.
pub fn find_matches(source: &SourceText, query: &str, cfg: &QuoteConfig) -> Result<Vec<Match>> {
    if query.chars().count() <= cfg.min_query_chars {
        return Ok(Vec::new());
    }

    let re = RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .context("Failed to compile search pattern")?;

    let mut matches = Vec::new();
    for found in re.find_iter(source.normalized()).take(cfg.max_matches) {
        let offset = source.map_offset(found.start());
        let window = char_window(source.raw(), offset, cfg.preview_chars);
        let truncated = offset + window.len() < source.raw().len();
        let preview = if truncated {
            format!("{}...", window)
        } else {
            window.to_string()
        };
        matches.push(Match { offset, preview });
    }

    Ok(matches)
}

/// CLI entry point — resolves the note's source link and prints matches.
pub async fn run_search(
    config: &Config,
    note: &Path,
    query: &str,
    json: bool,
    notices: &dyn NoticeSink,
) -> Result<()> {
    let vault = Vault::open(config)?;
    let note = vault.resolve_note_arg(note)?;
    let lookup = vault
        .locate_source(&note, &config.quote.source_field)
        .await?;
    let path = match lookup.into_path() {
        Ok(path) => path,
        Err(notice) => {
            notices.warn(&notice);
            println!("No matches.");
            return Ok(());
        }
    };

    let text = NoteSource::new(&vault, path).read_source().await?;
    let source = SourceText::new(text);
    let matches = find_matches(&source, query, &config.quote)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    println!("{} match(es) for \"{}\"", matches.len(), query);
    for (i, m) in matches.iter().enumerate() {
        println!("[{}] offset {}", i + 1, m.offset);
        println!("    {}", m.preview.replace('\n', " "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> QuoteConfig {
        QuoteConfig::default()
    }

    #[test]
    fn test_single_match_offset_and_full_preview() {
        let source = SourceText::new("He said yes. She said no. They left quickly.".to_string());
        let matches = find_matches(&source, "said yes", &cfg()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 3);
        // Buffer shorter than the preview window: no continuation marker.
        assert_eq!(
            matches[0].preview,
            "said yes. She said no. They left quickly."
        );
    }

    #[test]
    fn test_preview_truncated_with_marker() {
        let long = format!("needle text {}", "x".repeat(400));
        let source = SourceText::new(long);
        let matches = find_matches(&source, "needle text", &cfg()).unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].preview.ends_with("..."));
        // 200 chars of content plus the marker.
        assert_eq!(matches[0].preview.chars().count(), 203);
    }

    #[test]
    fn test_short_and_empty_queries_match_nothing() {
        let source = SourceText::new("abcde abcde abcde".to_string());
        assert!(find_matches(&source, "abcde", &cfg()).unwrap().is_empty());
        assert!(find_matches(&source, "", &cfg()).unwrap().is_empty());
    }

    #[test]
    fn test_result_set_capped() {
        let source = SourceText::new("the needle ".repeat(20));
        let matches = find_matches(&source, "needle", &cfg()).unwrap();
        assert_eq!(matches.len(), 5);
        // Left-to-right discovery order.
        for pair in matches.windows(2) {
            assert!(pair[0].offset < pair[1].offset);
        }
    }

    #[test]
    fn test_case_insensitive() {
        let source = SourceText::new("Whales are large. WHALES ARE LOUD.".to_string());
        let matches = find_matches(&source, "whales are", &cfg()).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_query_metacharacters_are_literal() {
        let source = SourceText::new("cost is $4.99 (per unit) today".to_string());
        let matches = find_matches(&source, "$4.99 (per unit)", &cfg()).unwrap();
        assert_eq!(matches.len(), 1);
        // The dot must not match an arbitrary character.
        let source2 = SourceText::new("cost is $4X99 (per unit) today".to_string());
        assert!(find_matches(&source2, "$4.99 (per unit)", &cfg())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_straight_quotes_match_curly_source() {
        let source =
            SourceText::new("\u{201C}Don\u{2019}t go,\u{201D} she said. He stayed.".to_string());
        let matches = find_matches(&source, "\"don't go", &cfg()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 0);
        // Preview comes from the raw view with its original punctuation.
        assert!(matches[0].preview.starts_with('\u{201C}'));
    }

    #[test]
    fn test_offsets_valid_in_raw_view_after_curly_fold() {
        let source = SourceText::new("\u{2018}x\u{2019} then the needle appears".to_string());
        let matches = find_matches(&source, "needle", &cfg()).unwrap();
        assert_eq!(matches.len(), 1);
        assert!(source.raw()[matches[0].offset..].starts_with("needle"));
    }
}
