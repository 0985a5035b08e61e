//! Conversion of runtime warnings, errors and uncaught failures into
//! diagnostics and exit codes.
//!
//! Collaborators never print or exit on their own. They report through a
//! [`FaultPolicy`] handed to them by the orchestrator; a fatal report comes
//! back as a [`Terminate`] error that unwinds to the entry point.

use std::fmt;

use thiserror::Error;

use crate::logger::{Location, Logger, Severity};

pub const E_ERROR: u32 = 1;
pub const E_WARNING: u32 = 2;
pub const E_PARSE: u32 = 4;
pub const E_NOTICE: u32 = 8;
pub const E_CORE_ERROR: u32 = 16;
pub const E_CORE_WARNING: u32 = 32;
pub const E_COMPILE_ERROR: u32 = 64;
pub const E_COMPILE_WARNING: u32 = 128;
pub const E_USER_ERROR: u32 = 256;
pub const E_USER_WARNING: u32 = 512;
pub const E_USER_NOTICE: u32 = 1024;
pub const E_STRICT: u32 = 2048;
pub const E_RECOVERABLE_ERROR: u32 = 4096;
pub const E_DEPRECATED: u32 = 8192;
pub const E_USER_DEPRECATED: u32 = 16384;
pub const E_ALL: u32 = 32767;

/// Display label for a numeric severity code.
pub fn label(code: u32) -> &'static str {
    match code {
        E_ERROR | E_USER_ERROR => "Error",
        E_WARNING | E_USER_WARNING => "Warning",
        E_PARSE => "Parser error",
        E_NOTICE | E_USER_NOTICE => "Notice",
        E_STRICT => "Strict",
        E_DEPRECATED | E_USER_DEPRECATED => "Deprecated",
        E_CORE_ERROR => "Error(Core)",
        E_CORE_WARNING => "Warning(Core)",
        E_COMPILE_ERROR => "Error(Compile)",
        E_COMPILE_WARNING => "Warning(Compile)",
        E_RECOVERABLE_ERROR => "Error(Recoverable)",
        _ => "Error",
    }
}

/// Request to stop the run with `code`. The message is already logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("terminated with status {code}")]
pub struct Terminate {
    pub code: i32,
}

/// Failures with their own exit status.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("Directory \"{0}\" doesn't exist")]
    MissingPath(String),

    #[error("Processor \"{0}\" not found")]
    UnknownProcessor(String),

    #[error("Unsupported format \"{0}\"")]
    UnsupportedFormat(String),

    #[error("Invalid bootstrap file {path}: {reason}")]
    Bootstrap { path: String, reason: String },
}

impl Failure {
    pub fn code(&self) -> i32 {
        match self {
            Failure::MissingPath(_) => 2,
            Failure::Bootstrap { .. }
            | Failure::UnknownProcessor(_)
            | Failure::UnsupportedFormat(_) => 1,
        }
    }
}

pub struct FaultPolicy<'a> {
    logger: &'a Logger,
    reporting: u32,
}

impl fmt::Debug for FaultPolicy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultPolicy")
            .field("reporting", &self.reporting)
            .finish_non_exhaustive()
    }
}

impl<'a> FaultPolicy<'a> {
    /// Installs the policy for one run. `reporting` is the error-reporting
    /// mask; codes outside it are dropped silently.
    pub fn install(logger: &'a Logger, reporting: u32) -> Self {
        tracing::debug!(reporting, "fault policy installed");
        FaultPolicy { logger, reporting }
    }

    pub fn logger(&self) -> &'a Logger {
        self.logger
    }

    /// Reports a runtime warning or error.
    ///
    /// # Errors
    /// Returns [`Terminate`] carrying `code` when the code's label is one of
    /// the `Error` classes.
    pub fn raise(
        &self,
        code: u32,
        message: &str,
        location: Option<&Location>,
    ) -> Result<(), Terminate> {
        if self.reporting & code == 0 {
            return Ok(());
        }
        let label = label(code);
        self.logger
            .log(Severity::Error, message, Some(label), location);
        if label.starts_with("Error") {
            return Err(Terminate {
                code: i32::try_from(code).unwrap_or(i32::MAX),
            });
        }
        Ok(())
    }

    /// Handles a failure that escaped the run and returns the exit code.
    pub fn uncaught(&self, err: &anyhow::Error) -> i32 {
        if let Some(term) = err.chain().find_map(|c| c.downcast_ref::<Terminate>()) {
            return term.code;
        }
        if self.logger.debug() {
            self.logger.error(&format!("{err:?}"));
        } else {
            self.logger.error(&format!("{err:#}"));
        }
        err.chain()
            .find_map(|cause| cause.downcast_ref::<Failure>())
            .map(Failure::code)
            .filter(|code| *code != 0)
            .unwrap_or(1)
    }
}
