//! XHTML-to-markdown conversion for imported book chapters.
//!
//! A small event walker over `quick_xml`, not a general HTML engine: EPUB
//! chapters are XHTML, so well-formedness is close enough that a streaming
//! pass handles real books. Headings, paragraphs, emphasis, lists, block
//! quotes, and line breaks are kept; everything else passes through as
//! text. Unknown or sloppy markup degrades to plain text instead of
//! failing the import.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Convert one chapter of XHTML to markdown-flavored text. The result ends
/// with a blank line so concatenated chapters stay separated.
pub fn html_to_markdown(html: &str) -> String {
    let mut reader = Reader::from_str(html);
    reader.config_mut().check_end_names = false;

    let mut out = String::new();
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if is_skipped(name.as_ref()) {
                    skip_depth += 1;
                    continue;
                }
                if skip_depth == 0 {
                    open_tag(name.as_ref(), &mut out);
                }
            }
            Ok(Event::Empty(e)) => {
                if skip_depth == 0 && e.local_name().as_ref() == b"br" {
                    out.push('\n');
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if is_skipped(name.as_ref()) {
                    skip_depth = skip_depth.saturating_sub(1);
                    continue;
                }
                if skip_depth == 0 {
                    close_tag(name.as_ref(), &mut out);
                }
            }
            Ok(Event::Text(t)) => {
                if skip_depth == 0 {
                    let text = t.unescape().unwrap_or_default();
                    push_text(&text, &mut out);
                }
            }
            Ok(Event::Eof) => break,
            // Tolerate sloppy chapter markup: keep what converted so far.
            Err(_) => break,
            _ => {}
        }
    }

    tidy(&out)
}

fn is_skipped(name: &[u8]) -> bool {
    matches!(name, b"head" | b"style" | b"script")
}

fn open_tag(name: &[u8], out: &mut String) {
    match name {
        b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6" => {
            para_break(out);
            let level = (name[1] - b'0') as usize;
            out.push_str(&"#".repeat(level));
            out.push(' ');
        }
        b"p" | b"div" | b"section" | b"article" | b"ul" | b"ol" => para_break(out),
        b"blockquote" => {
            para_break(out);
            out.push_str("> ");
        }
        b"li" => {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("- ");
        }
        b"em" | b"i" => out.push('*'),
        b"strong" | b"b" => out.push_str("**"),
        _ => {}
    }
}

fn close_tag(name: &[u8], out: &mut String) {
    match name {
        b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6" | b"p" | b"div" | b"section"
        | b"article" | b"blockquote" | b"ul" | b"ol" => para_break(out),
        b"li" => out.push('\n'),
        b"em" | b"i" => out.push('*'),
        b"strong" | b"b" => out.push_str("**"),
        _ => {}
    }
}

/// Append a text node with interior whitespace collapsed, keeping a single
/// boundary space where the source had one.
fn push_text(text: &str, out: &mut String) {
    if text.is_empty() {
        return;
    }
    let leading_ws = text.starts_with(|c: char| c.is_whitespace());
    let trailing_ws = text.ends_with(|c: char| c.is_whitespace());
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() {
        // Pure whitespace only matters between inline content.
        if !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        return;
    }

    if leading_ws && !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&words.join(" "));
    if trailing_ws {
        out.push(' ');
    }
}

/// Close the current block: trailing spaces dropped, exactly one blank line.
fn para_break(out: &mut String) {
    while out.ends_with(' ') || out.ends_with('\t') {
        out.pop();
    }
    if out.is_empty() || out.ends_with("\n\n") {
        return;
    }
    if out.ends_with('\n') {
        out.push('\n');
    } else {
        out.push_str("\n\n");
    }
}

fn tidy(raw: &str) -> String {
    let mut cleaned: Vec<&str> = Vec::new();
    let mut blank = false;
    for line in raw.lines().map(str::trim_end) {
        if line.is_empty() {
            if blank {
                continue;
            }
            blank = true;
        } else {
            blank = false;
        }
        cleaned.push(line);
    }

    let body = cleaned.join("\n");
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!("{}\n\n", body)
    }
}
