//! Configuration types for Markdown-to-HTML conversion and image publishing.
//!
//! All behaviour that callers may tune is controlled through
//! [`ConversionConfig`], built via its [`ConversionConfigBuilder`]. The output
//! dialect itself (classes, shortcodes, spacing) is fixed and not configurable.

use crate::error::Md2RwError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for a conversion and, optionally, an image upload.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use markdown_to_rw::{ConversionConfig, UploadMode};
///
/// let config = ConversionConfig::builder()
///     .expand_tabs(2)
///     .upload_mode(UploadMode::HtmlOnly)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Default)]
pub struct ConversionConfig {
    /// Replace every tab in the Markdown with this many spaces before parsing.
    /// Range: 1–8. Default: None (tabs are left to the CommonMark parser).
    ///
    /// Editors that indent nested lists with tabs produce code blocks instead
    /// of sub-lists under strict CommonMark; two spaces keeps them as lists.
    pub expand_tabs: Option<usize>,

    /// What [`crate::upload::publish_images`] rewrites after uploading. Default: Skip.
    pub upload_mode: UploadMode,

    /// Optional progress callback for upload events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("expand_tabs", &self.expand_tabs)
            .field("upload_mode", &self.upload_mode)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn UploadProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn expand_tabs(mut self, width: usize) -> Self {
        self.config.expand_tabs = Some(width);
        self
    }

    pub fn upload_mode(mut self, mode: UploadMode) -> Self {
        self.config.upload_mode = mode;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2RwError> {
        if let Some(width) = self.config.expand_tabs {
            if !(1..=8).contains(&width) {
                return Err(Md2RwError::InvalidConfig(format!(
                    "Tab width must be 1–8, got {width}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which documents are rewritten after images are uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UploadMode {
    /// Do not upload anything. (default)
    #[default]
    Skip,
    /// Upload, then point both the Markdown source and the HTML at the
    /// uploaded copies.
    All,
    /// Upload, then regenerate only the HTML; the Markdown file is untouched.
    HtmlOnly,
}

impl UploadMode {
    /// Whether this mode writes the rewritten Markdown back to disk.
    pub fn rewrites_markdown(self) -> bool {
        matches!(self, UploadMode::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_skips_upload() {
        let c = ConversionConfig::default();
        assert_eq!(c.upload_mode, UploadMode::Skip);
        assert_eq!(c.expand_tabs, None);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn builder_accepts_valid_tab_width() {
        let c = ConversionConfig::builder().expand_tabs(2).build().unwrap();
        assert_eq!(c.expand_tabs, Some(2));
    }

    #[test]
    fn builder_rejects_zero_tab_width() {
        let err = ConversionConfig::builder().expand_tabs(0).build().unwrap_err();
        assert!(matches!(err, Md2RwError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_wide_tab_width() {
        assert!(ConversionConfig::builder().expand_tabs(9).build().is_err());
    }

    #[test]
    fn only_all_mode_rewrites_markdown() {
        assert!(UploadMode::All.rewrites_markdown());
        assert!(!UploadMode::HtmlOnly.rewrites_markdown());
        assert!(!UploadMode::Skip.rewrites_markdown());
    }

    #[test]
    fn debug_hides_callback() {
        let c = ConversionConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn UploadProgressCallback>"));
    }
}
