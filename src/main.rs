//! # Air Quotes CLI (`aq`)
//!
//! The `aq` binary is the interface for quote selection and book import
//! over a plain-text note vault.
//!
//! ## Usage
//!
//! ```bash
//! aq --config ./config/aq.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `aq init` | Write a default configuration file |
//! | `aq search <note> "<query>"` | Print passage matches from the note's linked source text |
//! | `aq quote <note>` | Open a quote-selection session (interactive or scripted) |
//! | `aq import <file.epub>` | Import an EPUB into a converted note |
//! | `aq convert <file>` | Convert a book with pandoc into a note |
//!
//! ## Examples
//!
//! ```bash
//! # Scaffold a config in the current directory
//! aq init
//!
//! # Find a passage
//! aq search "reading/moby-dick.md" "a damp, drizzly November"
//!
//! # Interactive selection, then insert into the note
//! aq quote "reading/moby-dick.md"
//!
//! # Scripted: first match, three sentences, blockquote style
//! aq quote "reading/moby-dick.md" --query "a damp, drizzly November" \
//!     --sentences 3 --style blockquote
//!
//! # Import a book next to your notes
//! aq import ~/books/moby-dick.epub --into "reading/moby-dick.md"
//! ```

mod config;
mod convert;
mod format;
mod html;
mod import;
mod models;
mod notice;
mod quote_cmd;
mod search;
mod segment;
mod selection;
mod session;
mod source;
mod vault;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::QuoteStyle;
use crate::notice::NoticeMode;
use crate::quote_cmd::QuoteOptions;

/// Air Quotes — sentence-level quote selection and e-book import for
/// plain-text note vaults.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Run `aq init` to scaffold one.
#[derive(Parser)]
#[command(
    name = "aq",
    about = "Air Quotes — sentence-level quote selection and e-book import for note vaults",
    version,
    long_about = "Air Quotes searches a note's linked source text for a passage, lets you widen \
    or narrow the selection by whole sentences with a live preview, and inserts the final quote \
    into the note as a callout, blockquote, or plain text. EPUB books can be imported into plain \
    notes to serve as source texts."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/aq.toml")]
    config: PathBuf,

    /// Notice output on stderr: `human`, `json`, or `off`.
    #[arg(long, global = true, default_value = "human")]
    notices: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file.
    ///
    /// Creates the file named by `--config` with commented defaults.
    /// Refuses to overwrite an existing file unless `--force` is given.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },

    /// Search a note's linked source text for a passage.
    ///
    /// Resolves the note's source link, scans the source for literal,
    /// case-insensitive occurrences of the query, and prints up to the
    /// configured number of matches with previews.
    Search {
        /// Vault-relative note path (the `.md` extension is optional).
        note: PathBuf,

        /// The passage to look for. Queries of five characters or fewer
        /// match nothing.
        query: String,

        /// Print matches as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// Open a quote-selection session for a note.
    ///
    /// Interactive on a terminal: type a passage, pick a match, widen or
    /// narrow the selection by sentences, confirm to insert. With `--query`
    /// the whole session is driven from flags instead.
    Quote {
        /// Vault-relative note path (the `.md` extension is optional).
        note: PathBuf,

        /// Scripted mode: search for this passage and skip the prompt.
        #[arg(long)]
        query: Option<String>,

        /// Scripted mode: which match to take (1-based). Defaults to 1.
        #[arg(long)]
        pick: Option<usize>,

        /// Scripted mode: number of sentences to quote.
        #[arg(long)]
        sentences: Option<usize>,

        /// Output style override: callout, blockquote, or plain.
        #[arg(long)]
        style: Option<String>,

        /// Insert at this 1-based line of the note instead of the end.
        #[arg(long)]
        at: Option<usize>,

        /// Print the rendered quote instead of writing the note.
        #[arg(long)]
        dry_run: bool,
    },

    /// Import an EPUB into a converted note.
    ///
    /// Parses the archive's manifest, converts the chapter files to
    /// markdown, and writes a `<Title - Author>.md` note under the
    /// configured import location. Re-importing an unchanged book is a
    /// no-op.
    Import {
        /// Path to the `.epub` file.
        file: PathBuf,

        /// Append a wikilink to this note after importing.
        #[arg(long)]
        into: Option<PathBuf>,
    },

    /// Convert a book with pandoc into a note.
    ///
    /// Fallback for formats the built-in importer does not parse. Requires
    /// pandoc on the PATH (or `convert.pandoc_path` in config). The
    /// conversion runs under `convert.timeout_secs`.
    Convert {
        /// Path to the book file.
        file: PathBuf,

        /// Append a wikilink to this note after converting.
        #[arg(long)]
        into: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mode = NoticeMode::parse(&cli.notices).map_err(anyhow::Error::msg)?;
    let notices = mode.reporter();

    // init runs before any config exists
    if let Commands::Init { force } = &cli.command {
        config::scaffold_config(&cli.config, *force)?;
        println!("Wrote {}", cli.config.display());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),
        Commands::Search { note, query, json } => {
            search::run_search(&cfg, &note, &query, json, notices.as_ref()).await?;
        }
        Commands::Quote {
            note,
            query,
            pick,
            sentences,
            style,
            at,
            dry_run,
        } => {
            let style = style
                .map(|s| s.parse::<QuoteStyle>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let opts = QuoteOptions {
                note,
                query,
                pick,
                sentences,
                style,
                at,
                dry_run,
            };
            quote_cmd::run_quote(&cfg, opts, notices.as_ref()).await?;
        }
        Commands::Import { file, into } => {
            import::run_import(&cfg, &file, into.as_deref(), notices.as_ref()).await?;
        }
        Commands::Convert { file, into } => {
            convert::run_convert(&cfg, &file, into.as_deref(), notices.as_ref()).await?;
        }
    }

    Ok(())
}
