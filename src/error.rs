//! Error handling for the Stamina library.
//!
//! The [`Error`] enum covers both halves of the failure taxonomy: state
//! errors, which are returned synchronously from engine operations and
//! signal a logic error in the caller, and transfer errors, which are
//! delivered through the event stream as [`Failed`] and retried
//! automatically.
//!
//! [`Failed`]: crate::event::DownloadEvent::Failed

use std::io;
use thiserror::Error;

/// Errors that can happen when using Stamina.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// This variant captures internal errors that don't fit into other
    /// categories, typically representing unexpected system-level failures.
    #[error("Internal error: {0}")]
    Internal(String),

    /// An engine operation was called out of sequence.
    ///
    /// Calling `pause()` while idle, `start()` twice, or any operation after
    /// the download finished is a programming error on the caller's side.
    /// These are never retried and never swallowed.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error from the underlying URL parser or the expected URL format.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The content-length probe could not determine the total size.
    ///
    /// The engine cannot verify completion without it, so a missing or
    /// unparseable `Content-Length` header fails the transfer attempt.
    #[error("Unable to determine content length: {0}")]
    ContentLength(String),

    /// The response stream ended cleanly before the expected total size.
    ///
    /// Truncation is classified as a transfer failure and retried, never
    /// accepted as success.
    #[error("Truncated stream: expected {expected} bytes, received {received}")]
    Truncated {
        /// Total size obtained from the content-length probe.
        expected: u64,
        /// Bytes actually present in the cache file.
        received: u64,
    },

    /// I/O Error.
    ///
    /// This variant wraps standard I/O errors that can occur while writing,
    /// promoting, or deleting the cache file.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    ///
    /// This variant wraps HTTP client errors from the reqwest library,
    /// including network failures, HTTP status errors, and response
    /// processing errors.
    #[error("Reqwest Error")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error from the Reqwest middleware stack.
    #[error("Reqwest Middleware Error")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },
}

impl Error {
    /// Whether this error signals a caller-side logic error rather than a
    /// recoverable transfer condition.
    pub fn is_state_error(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }
}

/// Result type alias for operations that can fail with a Stamina error.
pub type Result<T> = std::result::Result<T, Error>;
