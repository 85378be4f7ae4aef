//! Error types for the markdown-to-rw library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2RwError`] — **Fatal**: the requested operation cannot complete
//!   (missing input file, unwritable output, a failed upload that forced a
//!   rollback). Returned as `Err(Md2RwError)` from the top-level functions.
//!
//! * [`HostError`] — a single request to the media host failed. The upload
//!   workflow turns the first one into [`Md2RwError::UploadFailed`] after
//!   rolling back; delete failures during rollback are only recorded.
//!
//! The conversion pipeline itself never fails: absent elements are zero
//! matches and malformed HTML is tolerated.

use crate::output::RollbackSummary;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the markdown-to-rw library.
#[derive(Debug, Error)]
pub enum Md2RwError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read as UTF-8 text.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTML output path points at the Markdown input.
    #[error("Output file '{path}' is the Markdown input; writing it would destroy the source")]
    OutputOverwritesInput { path: PathBuf },

    // ── Replacement errors ────────────────────────────────────────────────
    /// Batch replacement was called with lists of different lengths.
    #[error("Substitution lists differ in length: {originals} originals, {replacements} replacements")]
    SubstitutionMismatch {
        originals: usize,
        replacements: usize,
    },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// An image upload failed; every image uploaded before it was deleted
    /// again (see `rollback` for what could not be removed).
    #[error("Upload of '{path}' failed: {reason} ({rollback})")]
    UploadFailed {
        path: PathBuf,
        reason: String,
        rollback: RollbackSummary,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A failed request against a [`crate::host::MediaHost`].
#[derive(Debug, Error)]
pub enum HostError {
    /// The local file could not be read for upload.
    #[error("Cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The host answered with a non-success status code.
    #[error("Host returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The host answered 2xx but the body was not what we expected.
    #[error("Unexpected response from host: {0}")]
    InvalidResponse(String),

    /// The host client could not be constructed.
    #[error("Invalid host configuration: {0}")]
    InvalidConfig(String),
}
