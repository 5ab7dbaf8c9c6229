//! User-facing notices.
//!
//! Notices (precondition failures, import status) are emitted on **stderr**
//! so stdout stays parseable for scripts. Human or JSON-lines output, or
//! fully off.

use std::io::Write;

/// Severity of a notice. `Warn` covers surfaced precondition failures that
/// do not fail the command (no source link, unresolvable link).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeLevel {
    Info,
    Warn,
}

/// Reports user-facing notices. Implementations write to stderr.
pub trait NoticeSink {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.notify(NoticeLevel::Warn, message);
    }
}

/// Human-friendly notices on stderr.
pub struct StderrNotices;

impl NoticeSink for StderrNotices {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let line = match level {
            NoticeLevel::Info => format!("{}\n", message),
            NoticeLevel::Warn => format!("warning: {}\n", message),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable notices: one JSON object per line on stderr.
pub struct JsonNotices;

impl NoticeSink for JsonNotices {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let obj = serde_json::json!({
            "event": "notice",
            "level": match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warn => "warn",
            },
            "message": message,
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op sink when notices are disabled.
pub struct NoNotices;

impl NoticeSink for NoNotices {
    fn notify(&self, _level: NoticeLevel, _message: &str) {}
}

/// Notice mode for the CLI.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeMode {
    Off,
    Human,
    Json,
}

impl NoticeMode {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "off" => Ok(NoticeMode::Off),
            "human" => Ok(NoticeMode::Human),
            "json" => Ok(NoticeMode::Json),
            other => Err(format!(
                "unknown notice mode '{}'. Use off, human, or json.",
                other
            )),
        }
    }

    pub fn reporter(&self) -> Box<dyn NoticeSink> {
        match self {
            NoticeMode::Off => Box::new(NoNotices),
            NoticeMode::Human => Box::new(StderrNotices),
            NoticeMode::Json => Box::new(JsonNotices),
        }
    }
}
