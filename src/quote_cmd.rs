//! The `aq quote` command.
//!
//! Drives the session state machine either as a two-phase terminal REPL
//! (type a passage, pick a match, widen or narrow by sentences, confirm)
//! or fully scripted from flags (`--query`, `--pick`, `--sentences`) for
//! non-interactive use. Both paths feed the same events through the same
//! machine; only the wiring differs.

use anyhow::{bail, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::models::{CursorPos, Match, QuoteStyle};
use crate::notice::NoticeSink;
use crate::session::{Effect, Session, SessionEvent, SessionState};
use crate::source::SourceText;
use crate::vault::{NoteSink, NoteSource, QuoteSink, SourceProvider, Vault};

/// Options for one `aq quote` invocation.
#[derive(Debug, Clone, Default)]
pub struct QuoteOptions {
    pub note: PathBuf,
    /// Scripted mode: run this query instead of prompting.
    pub query: Option<String>,
    /// Scripted mode: choose this match, 1-based. Defaults to the first.
    pub pick: Option<usize>,
    /// Scripted mode: final sentence count.
    pub sentences: Option<usize>,
    pub style: Option<QuoteStyle>,
    /// 1-based insertion line; end of the note when absent.
    pub at: Option<usize>,
    /// Print the rendered quote to stdout instead of writing the note.
    pub dry_run: bool,
}

pub async fn run_quote(
    config: &Config,
    opts: QuoteOptions,
    notices: &dyn NoticeSink,
) -> Result<()> {
    let vault = Vault::open(config)?;
    let note = vault.resolve_note_arg(&opts.note)?;

    // Capture the insertion point before anything else happens; it is handed
    // unchanged to the sink at commit.
    let note_text = vault.read_note(&note).await?;
    let end_line = note_text.split('\n').count();
    let insert_at = CursorPos {
        line: opts
            .at
            .map(|l| l.saturating_sub(1))
            .unwrap_or(end_line)
            .min(end_line),
    };

    let mut quote_cfg = config.quote.clone();
    if let Some(style) = opts.style {
        quote_cfg.style = style;
    }
    let mut session = Session::open(quote_cfg, insert_at);

    // The one awaited source read for this session.
    let lookup = vault
        .locate_source(&note, &config.quote.source_field)
        .await?;
    let path = match lookup.into_path() {
        Ok(path) => path,
        Err(notice) => {
            notices.warn(&notice);
            return Ok(());
        }
    };
    let text = NoteSource::new(&vault, path).read_source().await?;
    session.handle(SessionEvent::SourceLoaded(SourceText::new(text)))?;

    let sink = NoteSink::new(&vault, note.clone());

    if let Some(query) = opts.query.clone() {
        run_scripted(&mut session, &opts, query, &sink, notices).await
    } else {
        if !atty::is(atty::Stream::Stdin) {
            bail!("Interactive quote selection needs a terminal. Pass --query for scripted use.");
        }
        run_repl(&mut session, &opts, &sink, notices).await
    }
}

async fn run_scripted(
    session: &mut Session,
    opts: &QuoteOptions,
    query: String,
    sink: &dyn QuoteSink,
    notices: &dyn NoticeSink,
) -> Result<()> {
    let effects = session.handle(SessionEvent::QueryChanged(query))?;
    let matches = shown_matches(&effects);
    if matches.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    let pick = opts.pick.unwrap_or(1);
    if pick < 1 || pick > matches.len() {
        bail!("--pick {} is out of range (1-{})", pick, matches.len());
    }
    session.handle(SessionEvent::MatchChosen(pick - 1))?;

    if let Some(want) = opts.sentences {
        if want < 1 {
            bail!("--sentences must be >= 1");
        }
        if let Some(current) = session.selection_count() {
            let delta = want as isize - current as isize;
            if delta != 0 {
                session.handle(SessionEvent::Step(delta))?;
            }
        }
    }

    let effects = session.handle(SessionEvent::Confirm)?;
    commit_effects(&effects, opts.dry_run, sink, notices).await
}

async fn run_repl(
    session: &mut Session,
    opts: &QuoteOptions,
    sink: &dyn QuoteSink,
    notices: &dyn NoticeSink,
) -> Result<()> {
    let stdin = std::io::stdin();
    let mut match_count = 0usize;

    eprintln!("Type a passage from the source text (q cancels):");
    loop {
        match session.state() {
            SessionState::Loading | SessionState::Searching => {
                prompt("query> ");
                let line = match read_line(&stdin)? {
                    Some(line) => line.trim().to_string(),
                    None => {
                        session.handle(SessionEvent::Dismiss)?;
                        return Ok(());
                    }
                };
                if line == "q" {
                    session.handle(SessionEvent::Dismiss)?;
                    return Ok(());
                }
                if line.is_empty() {
                    continue;
                }

                // A number picks from the last shown match list.
                if match_count > 0 {
                    if let Ok(n) = line.parse::<usize>() {
                        if n < 1 || n > match_count {
                            eprintln!("Pick 1-{}.", match_count);
                            continue;
                        }
                        let effects = session.handle(SessionEvent::MatchChosen(n - 1))?;
                        show_effects(&effects, session);
                        continue;
                    }
                }

                let effects = session.handle(SessionEvent::QueryChanged(line))?;
                let matches = shown_matches(&effects);
                match_count = matches.len();
                if matches.is_empty() {
                    println!("No matches.");
                } else {
                    for (i, m) in matches.iter().enumerate() {
                        println!("[{}] {}", i + 1, m.preview.replace('\n', " "));
                    }
                    eprintln!("Enter a match number to select it, or keep typing.");
                }
            }

            SessionState::Previewing => {
                prompt("[h] -1  [l] +1  [k] -5  [j] +5  [enter] insert  [q] cancel > ");
                let line = match read_line(&stdin)? {
                    Some(line) => line.trim().to_string(),
                    None => {
                        session.handle(SessionEvent::Dismiss)?;
                        return Ok(());
                    }
                };
                let effects = match line.as_str() {
                    "" => session.handle(SessionEvent::Confirm)?,
                    "q" => session.handle(SessionEvent::Dismiss)?,
                    "h" | "-1" => session.handle(SessionEvent::Step(-1))?,
                    "l" | "+1" => session.handle(SessionEvent::Step(1))?,
                    "k" | "-5" => session.handle(SessionEvent::Step(-5))?,
                    "j" | "+5" => session.handle(SessionEvent::Step(5))?,
                    other => {
                        eprintln!("Unknown command: {}", other);
                        continue;
                    }
                };
                show_effects(&effects, session);
                commit_effects(&effects, opts.dry_run, sink, notices).await?;
            }

            SessionState::Closed => return Ok(()),
        }
    }
}

/// Perform the insert effect, if any.
async fn commit_effects(
    effects: &[Effect],
    dry_run: bool,
    sink: &dyn QuoteSink,
    notices: &dyn NoticeSink,
) -> Result<()> {
    for effect in effects {
        if let Effect::Insert { at, text } = effect {
            if dry_run {
                print!("{}", text);
            } else {
                let lines = text.split('\n').count();
                let cursor = sink.insert_quote(*at, text).await?;
                notices.info(&format!(
                    "Inserted {} line(s); cursor now at line {}",
                    lines,
                    cursor.line + 1
                ));
            }
        }
    }
    Ok(())
}

/// Print the live quote preview from a ShowQuote effect.
fn show_effects(effects: &[Effect], session: &Session) {
    for effect in effects {
        if let Effect::ShowQuote(text) = effect {
            println!("{}", text);
            if let (Some(count), Some(total)) =
                (session.selection_count(), session.selection_total())
            {
                eprintln!("{} of {} sentences", count, total);
            }
        }
    }
}

fn shown_matches(effects: &[Effect]) -> Vec<Match> {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::ShowMatches(matches) => Some(matches.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn prompt(text: &str) {
    eprint!("{}", text);
    let _ = std::io::stderr().flush();
}

fn read_line(stdin: &std::io::Stdin) -> Result<Option<String>> {
    let mut buf = String::new();
    let n = stdin.lock().read_line(&mut buf)?;
    if n == 0 {
        Ok(None)
    } else {
        Ok(Some(buf))
    }
}
