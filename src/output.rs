//! Result types returned by conversion and publishing.
//!
//! Everything here is plain data and `Serialize`, so the CLI can print any
//! of it as JSON with `--json`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A local image referenced by the generated HTML that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLink {
    /// The `src` value exactly as it appears in the HTML.
    pub local_path: String,
    /// `local_path` resolved against the HTML file's folder.
    pub full_path: PathBuf,
}

/// Output of [`crate::convert::convert_file`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The WordPress-ready HTML that was written.
    pub html: String,
    /// Local images found in the written HTML, in document order.
    pub images: Vec<ImageLink>,
    pub stats: ConversionStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub markdown_bytes: usize,
    pub html_bytes: usize,
    /// Number of `<img>` elements that resolved to an existing local file.
    pub local_images: usize,
    pub duration_ms: u64,
}

/// One image that was pushed to the media host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub local_path: String,
    pub url: String,
    pub id: u64,
}

/// Output of [`crate::upload::publish_images`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishReport {
    pub uploaded: Vec<UploadedImage>,
    /// The Markdown source was rewritten to reference the remote URLs.
    pub markdown_rewritten: bool,
    /// The HTML output was regenerated from the rewritten Markdown.
    pub html_rewritten: bool,
}

/// What happened to already-uploaded files after an upload failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackSummary {
    /// Media ids that were deleted again.
    pub deleted: Vec<u64>,
    /// Media ids the host refused or failed to delete.
    pub not_deleted: Vec<u64>,
}

impl RollbackSummary {
    /// True when nothing from this run remains on the host.
    pub fn is_clean(&self) -> bool {
        self.not_deleted.is_empty()
    }
}

impl fmt::Display for RollbackSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rollback: {} deleted, {} left on host",
            self.deleted.len(),
            self.not_deleted.len()
        )
    }
}
