//! Error taxonomy for the scratchpad core.
//!
//! Engine diagnostics are carried as opaque text on the failure variants;
//! the core never parses or pattern-matches OpenSCAD's own error phrasing
//! beyond exit-code classification.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the scratchpad core.
#[derive(Debug, Error)]
pub enum Error {
    /// The OpenSCAD binary could not be spawned at all. Fatal setup
    /// problem, never retried.
    #[error("OpenSCAD binary '{program}' not found; install OpenSCAD or set SCADPAD_OPENSCAD")]
    EngineNotFound { program: String },

    /// Unknown camera view name, rejected before any process spin-up.
    #[error("unknown camera view '{name}'; valid views: {valid}")]
    InvalidView { name: String, valid: String },

    /// Filename failed sanitization, rejected before any process spin-up.
    #[error("invalid filename '{name}': {reason}")]
    InvalidFilename { name: String, reason: String },

    /// The engine exceeded its wall-clock deadline and was killed.
    #[error("OpenSCAD timed out after {timeout_secs}s; simplify the script or raise the timeout")]
    TimedOut { timeout_secs: u64 },

    /// The engine ran to completion with a non-zero exit status.
    #[error("OpenSCAD exited with status {exit_code}: {stderr}")]
    ExecutionFailed { exit_code: i32, stderr: String },

    /// A render invocation failed; the engine's stderr is forwarded verbatim.
    #[error("render failed ({reason}): {engine_stderr}")]
    RenderFailed {
        reason: String,
        engine_stderr: String,
    },

    /// An export invocation failed; the engine's stderr is forwarded verbatim.
    #[error("export failed ({reason}): {engine_stderr}")]
    ExportFailed {
        reason: String,
        engine_stderr: String,
    },

    /// Filesystem problem reading or writing temp or output files.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Stable short code for log outcome classification.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EngineNotFound { .. } => "engine_not_found",
            Self::InvalidView { .. } => "invalid_view",
            Self::InvalidFilename { .. } => "invalid_filename",
            Self::TimedOut { .. } => "timed_out",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::RenderFailed { .. } => "render_failed",
            Self::ExportFailed { .. } => "export_failed",
            Self::Io { .. } => "io_failure",
        }
    }

    /// Shorthand for an `Io` variant carrying the affected path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
