//! EPUB import.
//!
//! An EPUB is a zip bundle: `META-INF/container.xml` names the OPF package
//! document, whose manifest lists the chapter files and whose metadata
//! carries Dublin Core title/creator. Chapters are converted to markdown
//! and written as a single `<Title - Author>.md` note under the configured
//! import location. Re-importing an unchanged book is a no-op.

use sha2::{Digest, Sha256};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::config::Config;
use crate::html::html_to_markdown;
use crate::notice::NoticeSink;
use crate::vault::Vault;

/// Maximum decompressed bytes read from a single zip entry (zip-bomb guard).
const MAX_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("not a readable zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error reading archive: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed XML in {entry}: {message}")]
    Xml { entry: String, message: String },
    #[error("META-INF/container.xml not found")]
    MissingContainer,
    #[error("package document not found: {0}")]
    MissingRootfile(String),
    #[error("zip entry {0} exceeds the size limit")]
    EntryTooLarge(String),
}

/// A parsed and converted book, ready to be written as a note.
#[derive(Debug, Clone)]
pub struct EpubBook {
    pub title: String,
    pub creator: String,
    /// Converted chapter texts in manifest order.
    pub chapters: Vec<String>,
}

/// Parse an EPUB archive and convert its chapters to markdown.
pub fn read_epub(bytes: &[u8]) -> Result<EpubBook, ImportError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    // Entry lookup is case-insensitive for the container, by suffix for
    // chapters, matching how real-world books reference their files.
    let names: Vec<String> = archive.file_names().map(String::from).collect();

    let container_name = names
        .iter()
        .find(|n| n.eq_ignore_ascii_case("META-INF/container.xml"))
        .cloned()
        .ok_or(ImportError::MissingContainer)?;
    let container_xml = read_entry_bounded(&mut archive, &container_name)?;
    let rootfile = container_rootfile(&container_xml)?;

    if !names.iter().any(|n| n == &rootfile) {
        return Err(ImportError::MissingRootfile(rootfile));
    }
    let package_xml = read_entry_bounded(&mut archive, &rootfile)?;
    let package = parse_package(&package_xml, &rootfile)?;

    let mut chapters = Vec::new();
    for href in &package.chapter_hrefs {
        let href = href.trim_start_matches("./");
        let Some(entry_name) = names.iter().find(|n| n.ends_with(href)) else {
            // Manifest entries missing from the archive are skipped, not fatal.
            continue;
        };
        let entry_name = entry_name.clone();
        let chapter_bytes = read_entry_bounded(&mut archive, &entry_name)?;
        let chapter_html = String::from_utf8_lossy(&chapter_bytes);
        chapters.push(html_to_markdown(&chapter_html));
    }

    Ok(EpubBook {
        title: package.title,
        creator: package.creator,
        chapters,
    })
}

impl EpubBook {
    /// Note title in the `<Title - Author>` format, falling back to `default`
    /// when the package carries no metadata.
    pub fn note_title(&self, default: &str) -> String {
        let mut parts = Vec::new();
        if !self.title.is_empty() {
            parts.push(self.title.as_str());
        }
        if !self.creator.is_empty() {
            parts.push(self.creator.as_str());
        }
        if parts.is_empty() {
            return default.to_string();
        }
        sanitize_title(&parts.join(" - "))
    }
}

/// CLI entry point — import an EPUB file into the vault.
pub async fn run_import(
    config: &Config,
    file: &Path,
    into: Option<&Path>,
    notices: &dyn NoticeSink,
) -> Result<()> {
    let vault = Vault::open(config)?;

    notices.info("Importing book...");
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let book =
        read_epub(&bytes).with_context(|| format!("Failed to import {}", file.display()))?;

    let contents = book.chapters.concat();
    let fallback = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Imported book".to_string());
    let title = book.note_title(&fallback);
    let rel = dest_note(&config.import.location, &title);

    let unchanged = match vault.read_note(&rel).await {
        Ok(existing) => content_hash(&existing) == content_hash(&contents),
        Err(_) => false,
    };

    if unchanged {
        notices.info(&format!("{} is already up to date", title));
    } else {
        vault.write_note(&rel, &contents).await?;
        notices.info(&format!("Successfully imported {}", title));
    }
    println!("{}", rel.display());

    if let Some(note) = into {
        if config.import.add_link {
            let note = vault.resolve_note_arg(note)?;
            let target = rel.with_extension("");
            vault
                .append_link(&note, &target.to_string_lossy())
                .await?;
        }
    }

    Ok(())
}

/// Vault-relative path for an imported note.
pub fn dest_note(location: &str, title: &str) -> PathBuf {
    let filename = format!("{}.md", title);
    if location.is_empty() {
        PathBuf::from(filename)
    } else {
        Path::new(location).join(filename)
    }
}

fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            other => other,
        })
        .collect()
}

fn read_entry_bounded(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>, ImportError> {
    let entry = archive.by_name(name)?;
    let mut out = Vec::new();
    entry.take(MAX_ENTRY_BYTES).read_to_end(&mut out)?;
    if out.len() as u64 >= MAX_ENTRY_BYTES {
        return Err(ImportError::EntryTooLarge(name.to_string()));
    }
    Ok(out)
}

/// Pull `rootfile@full-path` out of `META-INF/container.xml`.
fn container_rootfile(xml: &[u8]) -> Result<String, ImportError> {
    let text = String::from_utf8_lossy(xml);
    let mut reader = Reader::from_str(&text);
    reader.config_mut().check_end_names = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"rootfile" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"full-path" {
                            return Ok(attr.unescape_value().unwrap_or_default().to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ImportError::Xml {
                    entry: "META-INF/container.xml".to_string(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
    }

    Err(ImportError::Xml {
        entry: "META-INF/container.xml".to_string(),
        message: "no rootfile element with a full-path attribute".to_string(),
    })
}

struct PackageInfo {
    title: String,
    creator: String,
    chapter_hrefs: Vec<String>,
}

/// Parse the OPF package document: Dublin Core metadata plus the manifest's
/// chapter entries (`.html`/`.xhtml` hrefs, manifest order).
fn parse_package(xml: &[u8], entry: &str) -> Result<PackageInfo, ImportError> {
    let text = String::from_utf8_lossy(xml);
    let mut reader = Reader::from_str(&text);
    reader.config_mut().check_end_names = false;

    let mut title = String::new();
    let mut creator = String::new();
    let mut chapter_hrefs = Vec::new();
    let mut in_metadata = false;
    let mut capture: Option<MetaField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = true,
                b"title" if in_metadata && title.is_empty() => capture = Some(MetaField::Title),
                b"creator" if in_metadata && creator.is_empty() => {
                    capture = Some(MetaField::Creator)
                }
                b"item" => push_chapter_href(&e, &mut chapter_hrefs),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"item" {
                    push_chapter_href(&e, &mut chapter_hrefs);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(field) = capture.take() {
                    let value = t.unescape().unwrap_or_default().trim().to_string();
                    match field {
                        MetaField::Title => title = value,
                        MetaField::Creator => creator = value,
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = false,
                b"title" | b"creator" => capture = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ImportError::Xml {
                    entry: entry.to_string(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
    }

    Ok(PackageInfo {
        title,
        creator,
        chapter_hrefs,
    })
}

enum MetaField {
    Title,
    Creator,
}

fn push_chapter_href(e: &quick_xml::events::BytesStart<'_>, hrefs: &mut Vec<String>) {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"href" {
            let href = attr.unescape_value().unwrap_or_default().to_string();
            if href.ends_with(".html") || href.ends_with(".xhtml") {
                hrefs.push(href);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const PACKAGE_XML: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Test Book</dc:title>
    <dc:creator>Jane Author</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="c1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="style.css" media-type="text/css"/>
  </manifest>
</package>"#;

    fn build_epub() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default();
            writer
                .start_file("META-INF/container.xml", options)
                .unwrap();
            writer.write_all(CONTAINER_XML.as_bytes()).unwrap();
            writer.start_file("OEBPS/content.opf", options).unwrap();
            writer.write_all(PACKAGE_XML.as_bytes()).unwrap();
            writer.start_file("OEBPS/ch1.xhtml", options).unwrap();
            writer
                .write_all(b"<html><body><h1>One</h1><p>First chapter text.</p></body></html>")
                .unwrap();
            writer.start_file("OEBPS/ch2.xhtml", options).unwrap();
            writer
                .write_all(b"<html><body><p>Second chapter text.</p></body></html>")
                .unwrap();
            writer.start_file("OEBPS/style.css", options).unwrap();
            writer.write_all(b"p { margin: 0 }").unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_read_epub_metadata_and_chapters() {
        let book = read_epub(&build_epub()).unwrap();
        assert_eq!(book.title, "Test Book");
        assert_eq!(book.creator, "Jane Author");
        assert_eq!(book.chapters.len(), 2);
        assert_eq!(book.chapters[0], "# One\n\nFirst chapter text.\n\n");
        assert_eq!(book.chapters[1], "Second chapter text.\n\n");
    }

    #[test]
    fn test_note_title_format() {
        let book = read_epub(&build_epub()).unwrap();
        assert_eq!(book.note_title("fallback"), "Test Book - Jane Author");
    }

    #[test]
    fn test_note_title_falls_back_without_metadata() {
        let book = EpubBook {
            title: String::new(),
            creator: String::new(),
            chapters: Vec::new(),
        };
        assert_eq!(book.note_title("my-file"), "my-file");
    }

    #[test]
    fn test_missing_container_rejected() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("mimetype", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"application/epub+zip").unwrap();
            writer.finish().unwrap();
        }
        let err = read_epub(&buf.into_inner()).unwrap_err();
        assert!(matches!(err, ImportError::MissingContainer));
    }

    #[test]
    fn test_not_a_zip_rejected() {
        let err = read_epub(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ImportError::Zip(_)));
    }

    #[test]
    fn test_dest_note_paths() {
        assert_eq!(dest_note("", "Book"), PathBuf::from("Book.md"));
        assert_eq!(
            dest_note("Imports", "Book"),
            PathBuf::from("Imports/Book.md")
        );
    }

    #[test]
    fn test_title_sanitized() {
        let book = EpubBook {
            title: "A/B: C".to_string(),
            creator: String::new(),
            chapters: Vec::new(),
        };
        assert_eq!(book.note_title("x"), "A-B- C");
    }
}
