//! # Air Quotes
//!
//! Sentence-level quote selection and e-book import for plain-text note
//! vaults.
//!
//! A note links to its source text through a frontmatter field. Air Quotes
//! searches that source for a passage, segments the text after the match
//! into sentences, lets the selection be widened or narrowed a sentence at
//! a time with a live preview, and splices the final quote into the note in
//! one of several markdown styles. A companion importer converts EPUB books
//! into plain notes so they can serve as source texts.
//!
//! ## Data flow
//!
//! ```text
//! source note ──▶ SourceText (raw + normalized views)
//!                     │ query
//!                     ▼
//!                 find_matches ──▶ Match (offset + preview)
//!                     │ choose
//!                     ▼
//!                 Sample ──▶ segment ──▶ Selection (count cursor)
//!                     │ grow / shrink
//!                     ▼
//!                 render_quote ──▶ note insertion
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core value types |
//! | [`source`] | Source text views and offset mapping |
//! | [`segment`] | Sentence boundary scanner |
//! | [`search`] | Literal passage matching |
//! | [`selection`] | Sentence-count selection state |
//! | [`format`] | Quote rendering styles |
//! | [`session`] | Interactive session state machine |
//! | [`quote_cmd`] | Quote command driver (REPL and scripted) |
//! | [`vault`] | Note discovery, link resolution, editing |
//! | [`import`] | EPUB import |
//! | [`html`] | XHTML chapter conversion |
//! | [`convert`] | External pandoc conversion |
//! | [`notice`] | User-facing stderr notices |

pub mod config;
pub mod convert;
pub mod format;
pub mod html;
pub mod import;
pub mod models;
pub mod notice;
pub mod quote_cmd;
pub mod search;
pub mod segment;
pub mod selection;
pub mod session;
pub mod source;
pub mod vault;
