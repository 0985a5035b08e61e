use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};

use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Notice,
    Error,
}

impl Severity {
    fn default_prefix(self) -> &'static str {
        match self {
            Severity::Info => "",
            Severity::Notice => "Notice",
            Severity::Error => "Error",
        }
    }
}

/// Where in the scanned sources a diagnostic originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(file: &Path, line: usize) -> Self {
        Location {
            file: file.to_path_buf(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on line {}", self.file.display(), self.line)
    }
}

/// Console logger for user-facing diagnostics.
///
/// Every message is written to stderr as soon as it is logged. The logger
/// remembers whether an error or notice was ever emitted; that flag alone
/// decides the exit code of a run.
#[derive(Debug, Default)]
pub struct Logger {
    debug: bool,
    called: Cell<bool>,
}

impl Logger {
    pub fn new(debug: bool) -> Self {
        Logger {
            debug,
            called: Cell::new(false),
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// True once any error or notice has been logged.
    pub fn called(&self) -> bool {
        self.called.get()
    }

    pub fn info(&self, message: &str) {
        self.log(Severity::Info, message, None, None);
    }

    pub fn notice(&self, message: &str) {
        self.log(Severity::Notice, message, None, None);
    }

    pub fn error(&self, message: &str) {
        self.log(Severity::Error, message, None, None);
    }

    /// Logs `message`. `prefix` of `None` uses the severity's default tag,
    /// `Some("")` prints the message untagged.
    pub fn log(
        &self,
        severity: Severity,
        message: &str,
        prefix: Option<&str>,
        location: Option<&Location>,
    ) {
        if severity != Severity::Info {
            self.called.set(true);
        }
        eprintln!("{}", render(severity, message, prefix));
        if self.debug && severity == Severity::Error {
            if let Some(loc) = location {
                eprintln!("  in {loc}");
            }
        }
    }
}

fn render(severity: Severity, message: &str, prefix: Option<&str>) -> String {
    let prefix = prefix.unwrap_or_else(|| severity.default_prefix());
    if prefix.is_empty() {
        return message.to_string();
    }
    let tag = format!("{prefix}:");
    let tag = match severity {
        Severity::Error => style(tag).red().for_stderr().to_string(),
        Severity::Notice => style(tag).yellow().for_stderr().to_string(),
        Severity::Info => tag,
    };
    format!("{tag} {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_does_not_mark_called() {
        let logger = Logger::new(false);
        logger.info("usage");
        assert!(!logger.called());
        logger.notice("careful");
        assert!(logger.called());
    }

    #[test]
    fn error_marks_called() {
        let logger = Logger::new(false);
        logger.log(Severity::Error, "", Some(""), None);
        assert!(logger.called());
    }

    #[test]
    fn empty_prefix_prints_bare_message() {
        console::set_colors_enabled_stderr(false);
        assert_eq!(render(Severity::Error, "", Some("")), "");
        assert_eq!(render(Severity::Error, "boom", None), "Error: boom");
        assert_eq!(render(Severity::Notice, "hm", None), "Notice: hm");
        assert_eq!(
            render(Severity::Error, "bad", Some("Parser error")),
            "Parser error: bad"
        );
        assert_eq!(render(Severity::Info, "plain", None), "plain");
    }
}
