//! Progress-callback trait for image upload events.
//!
//! Inject an [`Arc<dyn UploadProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events while [`crate::upload::publish_images`] pushes images to the host
//! and, on failure, rolls them back.
//!
//! # Example
//!
//! ```rust
//! use markdown_to_rw::{ConversionConfig, UploadProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     uploaded: Arc<AtomicUsize>,
//! }
//!
//! impl UploadProgressCallback for CountingCallback {
//!     fn on_file_uploaded(&self, index: usize, total: usize, path: &Path, url: &str) {
//!         self.uploaded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} -> {}", index, total, path.display(), url);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     uploaded: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn UploadProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the upload workflow as it processes each image.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Indices are 1-based.
pub trait UploadProgressCallback: Send + Sync {
    /// Called once, after scanning, with the number of distinct files to upload.
    fn on_upload_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is sent to the host.
    fn on_file_start(&self, index: usize, total_files: usize, path: &Path) {
        let _ = (index, total_files, path);
    }

    /// Called when the host accepted a file.
    fn on_file_uploaded(&self, index: usize, total_files: usize, path: &Path, url: &str) {
        let _ = (index, total_files, path, url);
    }

    /// Called when the host rejected a file. Rollback starts right after.
    fn on_file_failed(&self, index: usize, total_files: usize, path: &Path, error: &str) {
        let _ = (index, total_files, path, error);
    }

    /// Called once per previously uploaded media id during rollback.
    fn on_rollback(&self, media_id: u64, deleted: bool) {
        let _ = (media_id, deleted);
    }

    /// Called once after every file was uploaded successfully.
    fn on_upload_complete(&self, uploaded: usize) {
        let _ = uploaded;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl UploadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn UploadProgressCallback>;
