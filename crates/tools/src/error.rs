//! External Tool Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An external tool error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for external tool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The executable could not be found in `PATH` or any fallback location.
    #[display("{_0} not detected on your system")]
    NotFound(#[error(not(source))] String),
    /// The process could not be started.
    #[display("failed to launch {_0}")]
    Launch(#[error(not(source))] String),
    /// The process exited unsuccessfully; its diagnostic output was discarded.
    #[display("{program} exited unsuccessfully ({status})")]
    Exited { program: String, status: String },
    /// The process exited unsuccessfully; `output` holds its combined
    /// standard output and standard error.
    #[display("{program} exited unsuccessfully ({status}): {output}")]
    Failed { program: String, status: String, output: String },
    /// A standard stream of the child process was not available.
    #[display("{_0} of child process unavailable")]
    Pipe(#[error(not(source))] &'static str),
    /// Reading from or waiting on the child process failed.
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing is retried automatically. A failed download may well succeed
    /// when the caller issues a fresh request, so it is reported as such.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Io)
    }
}
