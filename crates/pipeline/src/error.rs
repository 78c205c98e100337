//! Pipeline Error Types
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Each variant names the stage that failed; the error raised by the
//! underlying crate (tool output, I/O error, offending path) is kept as a
//! child frame in the tree.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a pipeline failure.
///
/// ### Input Errors
/// - [`ErrorKind::InvalidKey`]
/// - [`ErrorKind::InvalidIdentifier`]
///
/// ### Stage Errors
/// - [`ErrorKind::PathError`]
/// - [`ErrorKind::FetchFailed`]
/// - [`ErrorKind::DecodeFailed`]
/// - [`ErrorKind::PersistFailed`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The collection or item name is unusable once sanitized.
    #[display("invalid cache key")]
    InvalidKey,
    /// A media identifier could not be extracted from the input.
    #[display("invalid media identifier: {_0:?}")]
    InvalidIdentifier(#[error(not(source))] String),
    /// Checking the cache entry or creating its directories failed.
    #[display("cache directory unavailable")]
    PathError,
    /// The downloader could not be started or exited unsuccessfully.
    #[display("download failed")]
    FetchFailed,
    /// The decoder could not be started, its pipes failed, or it exited
    /// unsuccessfully.
    #[display("decode failed")]
    DecodeFailed,
    /// Writing the decoded entry failed. No partial entry is left behind.
    #[display("writing cache entry failed")]
    PersistFailed,
}

impl ErrorKind {
    /// Returns `true` if a fresh request might succeed. Nothing is retried
    /// automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::DecodeFailed | Self::PersistFailed)
    }
}
