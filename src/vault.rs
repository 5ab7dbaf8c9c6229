//! Vault access: note discovery, wikilink resolution, and note editing.
//!
//! A vault is a directory tree of markdown notes. This module is the
//! boundary between the pure quote engine and the filesystem: scanning
//! notes, resolving `[[wikilinks]]`, reading source texts, and splicing
//! rendered quotes back into notes. Failures here become user notices,
//! never engine faults.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::models::CursorPos;

pub struct Vault {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl Vault {
    pub fn open(config: &Config) -> Result<Self> {
        let root = config.vault.root.clone();
        if !root.exists() {
            bail!("Vault root does not exist: {}", root.display());
        }

        let include = build_globset(&config.vault.include_globs)?;

        let mut default_excludes = vec![
            "**/.git/**".to_string(),
            "**/.obsidian/**".to_string(),
            "**/.trash/**".to_string(),
        ];
        default_excludes.extend(config.vault.exclude_globs.clone());
        let exclude = build_globset(&default_excludes)?;

        Ok(Self {
            root,
            include,
            exclude,
            follow_symlinks: config.vault.follow_symlinks,
        })
    }

    pub fn abs_path(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// All notes in the vault, vault-relative, deterministically ordered.
    pub fn scan_notes(&self) -> Result<Vec<PathBuf>> {
        let mut notes = Vec::new();

        let walker = WalkDir::new(&self.root).follow_links(self.follow_symlinks);
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();

            if self.exclude.is_match(&rel_str) {
                continue;
            }
            if !self.include.is_match(&rel_str) {
                continue;
            }

            notes.push(relative.to_path_buf());
        }

        notes.sort();
        Ok(notes)
    }

    /// Resolve wikilink text to a vault-relative note path.
    ///
    /// An alias after `|` is ignored. The link is tried as a vault-relative
    /// path first (with `.md` appended when missing), then as a basename
    /// anywhere in the vault, first hit in scan order winning.
    pub fn resolve_link(&self, link: &str) -> Result<Option<PathBuf>> {
        let target = link.split('|').next().unwrap_or(link).trim();
        if target.is_empty() {
            return Ok(None);
        }

        let with_ext = if target.ends_with(".md") {
            target.to_string()
        } else {
            format!("{}.md", target)
        };

        let direct = self.root.join(&with_ext);
        if direct.is_file() {
            return Ok(Some(PathBuf::from(with_ext)));
        }

        let needle = Path::new(&with_ext).file_name().map(|n| n.to_owned());
        for note in self.scan_notes()? {
            if note.file_name().map(|n| n.to_owned()) == needle {
                return Ok(Some(note));
            }
        }

        Ok(None)
    }

    /// Accept a note argument with or without the `.md` extension.
    pub fn resolve_note_arg(&self, note: &Path) -> Result<PathBuf> {
        if self.abs_path(note).is_file() {
            return Ok(note.to_path_buf());
        }
        let with_ext = note.with_extension("md");
        if self.abs_path(&with_ext).is_file() {
            return Ok(with_ext);
        }
        bail!("Note not found in vault: {}", note.display());
    }

    pub async fn read_note(&self, rel: &Path) -> Result<String> {
        let path = self.abs_path(rel);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read note: {}", path.display()))
    }

    pub async fn write_note(&self, rel: &Path, contents: &str) -> Result<()> {
        let path = self.abs_path(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write note: {}", path.display()))
    }

    /// Locate the source text linked from `note`'s frontmatter field.
    pub async fn locate_source(&self, note: &Path, field: &str) -> Result<SourceLookup> {
        let contents = self.read_note(note).await?;
        let link = match extract_source_link(&contents, field) {
            Some(link) => link,
            None => {
                return Ok(SourceLookup::NoLink {
                    field: field.to_string(),
                })
            }
        };
        match self.resolve_link(&link)? {
            Some(path) => Ok(SourceLookup::Found { path }),
            None => Ok(SourceLookup::Unresolved { link }),
        }
    }

    /// Splice `text` into the note at `at`, returning the advanced cursor.
    pub async fn insert_at(&self, rel: &Path, at: CursorPos, text: &str) -> Result<CursorPos> {
        let contents = self.read_note(rel).await?;
        let mut lines: Vec<&str> = contents.split('\n').collect();
        let at_line = at.line.min(lines.len());
        let inserted: Vec<&str> = text.split('\n').collect();
        let advance = inserted.len();
        lines.splice(at_line..at_line, inserted);
        self.write_note(rel, &lines.join("\n")).await?;
        Ok(CursorPos {
            line: at_line + advance,
        })
    }

    /// Append a wikilink line to a note.
    pub async fn append_link(&self, rel: &Path, target: &str) -> Result<()> {
        let mut contents = self.read_note(rel).await?;
        if !contents.is_empty() && !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push_str(&format!("[[{}]]\n", target));
        self.write_note(rel, &contents).await
    }
}

/// Outcome of resolving a note's source link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLookup {
    Found { path: PathBuf },
    NoLink { field: String },
    Unresolved { link: String },
}

impl SourceLookup {
    /// The source path, or a user-facing notice explaining the failure.
    pub fn into_path(self) -> Result<PathBuf, String> {
        match self {
            SourceLookup::Found { path } => Ok(path),
            SourceLookup::NoLink { field } => Err(format!(
                "No source link found under '{}' in the note frontmatter. \
                 Link your source text first.",
                field
            )),
            SourceLookup::Unresolved { link } => {
                Err(format!("Unable to resolve source link: {}", link))
            }
        }
    }
}

/// Extract the source link from a note's frontmatter-style field.
///
/// Recognizes `field: [[Target]]` and the inline `field:: [[Target]]` form
/// on a line of its own, anywhere in the note.
pub fn extract_source_link(contents: &str, field: &str) -> Option<String> {
    let pattern = format!(r"(?m)^{}::?\s+\[\[(.+?)\]\]\s*$", regex::escape(field));
    let re = Regex::new(&pattern).ok()?;
    re.captures(contents).map(|caps| caps[1].to_string())
}

/// Boundary contract for loading a session's source text. Read at most once
/// per session.
#[async_trait]
pub trait SourceProvider {
    async fn read_source(&self) -> Result<String>;
}

/// Boundary contract for committing a rendered quote into the active note.
#[async_trait]
pub trait QuoteSink {
    async fn insert_quote(&self, at: CursorPos, text: &str) -> Result<CursorPos>;
}

/// Vault-backed source provider.
pub struct NoteSource<'a> {
    vault: &'a Vault,
    path: PathBuf,
}

impl<'a> NoteSource<'a> {
    pub fn new(vault: &'a Vault, path: PathBuf) -> Self {
        Self { vault, path }
    }
}

#[async_trait]
impl SourceProvider for NoteSource<'_> {
    async fn read_source(&self) -> Result<String> {
        self.vault.read_note(&self.path).await
    }
}

/// Vault-backed insertion collaborator.
pub struct NoteSink<'a> {
    vault: &'a Vault,
    note: PathBuf,
}

impl<'a> NoteSink<'a> {
    pub fn new(vault: &'a Vault, note: PathBuf) -> Self {
        Self { vault, note }
    }
}

#[async_trait]
impl QuoteSink for NoteSink<'_> {
    async fn insert_quote(&self, at: CursorPos, text: &str) -> Result<CursorPos> {
        self.vault.insert_at(&self.note, at, text).await
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().context("Failed to build glob set")
}
