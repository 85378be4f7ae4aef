//! Remote media hosts that accept uploaded images.
//!
//! The upload workflow only needs two operations: push a file and get back a
//! public URL plus an id, and delete a file by id when a later upload fails.

pub mod wordpress;

use crate::error::HostError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;

pub use wordpress::{WordPressConfig, WordPressMediaHost};

/// A file accepted by a [`MediaHost`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    /// Public URL the HTML should reference.
    pub url: String,
    /// Host-side id, used to delete the file again.
    pub id: u64,
}

/// Somewhere images can be uploaded to and deleted from.
///
/// Implementations serialise their own side effects; the upload workflow
/// calls them one file at a time.
pub trait MediaHost: Send + Sync {
    /// Upload the file at `path`.
    fn upload(&self, path: &Path) -> impl Future<Output = Result<UploadedMedia, HostError>> + Send;

    /// Permanently delete a previously uploaded file.
    fn delete(&self, id: u64) -> impl Future<Output = Result<(), HostError>> + Send;
}
