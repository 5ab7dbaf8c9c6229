//! External pandoc conversion.
//!
//! Fallback for book formats the built-in importer does not parse: hand the
//! file to pandoc and write the converted markdown into the vault. The
//! child process runs under an explicit timeout and is killed when the
//! deadline passes, so a wedged converter can never hang the command.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use crate::config::Config;
use crate::import::dest_note;
use crate::notice::NoticeSink;
use crate::vault::Vault;

/// Pandoc output format: strict markdown with the HTML passthroughs and
/// span/div wrappers disabled, unwrapped lines.
const PANDOC_FORMAT: &str =
    "markdown_strict-raw_html-native_divs-native_spans-fenced_divs-bracketed_spans";

/// CLI entry point — convert a book file into a vault note via pandoc.
pub async fn run_convert(
    config: &Config,
    file: &Path,
    into: Option<&Path>,
    notices: &dyn NoticeSink,
) -> Result<()> {
    let vault = Vault::open(config)?;

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Converted book".to_string());
    let rel = dest_note(&config.import.location, &stem);
    let output = vault.abs_path(&rel);
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut command = tokio::process::Command::new(&config.convert.pandoc_path);
    command
        .arg("-s")
        .arg(file)
        .arg("-t")
        .arg(PANDOC_FORMAT)
        .arg("--wrap=none")
        .arg("-o")
        .arg(&output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        // Dropping the timed-out future must take the child with it.
        .kill_on_drop(true);

    let child = command.spawn().with_context(|| {
        format!(
            "Failed to spawn {} — is pandoc installed?",
            config.convert.pandoc_path
        )
    })?;

    let deadline = Duration::from_secs(config.convert.timeout_secs);
    let result = match tokio::time::timeout(deadline, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => bail!(
            "pandoc timed out after {}s converting {}",
            config.convert.timeout_secs,
            file.display()
        ),
    };

    if !result.status.success() {
        bail!(
            "pandoc failed ({}):\n{}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        );
    }

    notices.info(&format!("Successfully converted file to \"{}\"", rel.display()));
    println!("{}", rel.display());

    if let Some(note) = into {
        if config.import.add_link {
            let note = vault.resolve_note_arg(note)?;
            let target = rel.with_extension("");
            vault.append_link(&note, &target.to_string_lossy()).await?;
        }
    }

    Ok(())
}
