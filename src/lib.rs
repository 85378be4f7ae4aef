//! # markdown-to-rw
//!
//! Convert Markdown blog posts into the HTML dialect a WordPress site expects,
//! and optionally publish their local images to the site's media library.
//!
//! ## Why this crate?
//!
//! A stock CommonMark renderer produces correct but generic HTML. Pasting it
//! into WordPress means hand-fixing every post: the syntax highlighter wants
//! `<pre lang="…">`, the theme wants alignment classes on images, the editor
//! adds its own paragraphs, and callouts are site-specific markup. This crate
//! renders the Markdown and then applies those rewrites in a fixed order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Parse     CommonMark → HTML, entities decoded
//!  ├─ 2. Dialect   code blocks, image classes, link targets, paragraphs,
//!  │               spacing, emphasis, callouts, cleanup
//!  ├─ 3. Output    HTML written next to the source
//!  └─ 4. Publish   (optional) upload local images, relink, regenerate
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markdown_to_rw::{convert_file, default_html_path, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_file("post.md", default_html_path("post.md"), &config).await?;
//!     println!("{}", output.html);
//!     eprintln!("{} local images", output.stats.local_images);
//!     Ok(())
//! }
//! ```
//!
//! ## Publishing Images
//!
//! ```rust,no_run
//! use markdown_to_rw::{
//!     publish_images, ConversionConfig, UploadMode, WordPressConfig, WordPressMediaHost,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let host = WordPressMediaHost::new(WordPressConfig::new(
//!     "https://blog.example.org",
//!     "editor",
//!     "app-password",
//! ))?;
//! let config = ConversionConfig::builder().upload_mode(UploadMode::All).build()?;
//! let report = publish_images("post.md", "post.html", &host, &config).await?;
//! eprintln!("{} images uploaded", report.uploaded.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2rw` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! markdown-to-rw = { version = "0.5", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod host;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, UploadMode};
pub use convert::{convert_file, convert_markdown, default_html_path, html_folder};
pub use error::{HostError, Md2RwError};
pub use host::{MediaHost, UploadedMedia, WordPressConfig, WordPressMediaHost};
pub use output::{
    ConversionOutput, ConversionStats, ImageLink, PublishReport, RollbackSummary, UploadedImage,
};
pub use pipeline::images::scan_image_links;
pub use pipeline::postprocess::post_process;
pub use pipeline::replace::batch_replace;
pub use progress::{NoopProgressCallback, ProgressCallback, UploadProgressCallback};
pub use upload::publish_images;
