//! Conversion entry points.
//!
//! [`convert_markdown`] is the pure string-to-string core. [`convert_file`]
//! wraps it with file I/O: read the Markdown, write the HTML next to it, and
//! report which local images the HTML references so a caller can decide
//! whether to run [`crate::upload::publish_images`].

use crate::config::ConversionConfig;
use crate::error::Md2RwError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::{images, markdown, postprocess};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Convert a Markdown string to WordPress-ready HTML.
///
/// Never fails; malformed input yields best-effort output.
///
/// # Example
/// ```rust
/// use markdown_to_rw::{convert_markdown, ConversionConfig};
///
/// let html = convert_markdown("**Hello** [world](https://example.org)", &ConversionConfig::default());
/// assert!(html.contains("<em>Hello</em>"));
/// assert!(html.contains("target=\"_blank\""));
/// ```
pub fn convert_markdown(markdown_text: &str, config: &ConversionConfig) -> String {
    let source = match config.expand_tabs {
        Some(width) => markdown::expand_tabs(markdown_text, width),
        None => markdown_text.to_string(),
    };
    let html = markdown::render_html(&source);
    postprocess::post_process(&html)
}

/// Convert a Markdown file and write the HTML to `html_path`.
///
/// The write is atomic (temp file + rename), so a failed run never leaves a
/// half-written HTML file behind.
///
/// # Errors
/// - [`Md2RwError::OutputOverwritesInput`] when both paths are the same file
/// - [`Md2RwError::FileNotFound`] / [`Md2RwError::PermissionDenied`] /
///   [`Md2RwError::ReadFailed`] for the Markdown input
/// - [`Md2RwError::OutputWriteFailed`] for the HTML output
pub async fn convert_file(
    markdown_path: impl AsRef<Path>,
    html_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2RwError> {
    let start = Instant::now();
    let markdown_path = markdown_path.as_ref();
    let html_path = html_path.as_ref();
    info!("Converting {} → {}", markdown_path.display(), html_path.display());

    if same_file(markdown_path, html_path) {
        return Err(Md2RwError::OutputOverwritesInput {
            path: html_path.to_path_buf(),
        });
    }

    let markdown_text = read_text(markdown_path).await?;
    let html = convert_markdown(&markdown_text, config);
    write_text_atomic(html_path, &html).await?;

    let found = images::scan_image_links(&html, &html_folder(html_path));
    let stats = ConversionStats {
        markdown_bytes: markdown_text.len(),
        html_bytes: html.len(),
        local_images: found.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} bytes of HTML, {} local images, {}ms",
        stats.html_bytes, stats.local_images, stats.duration_ms
    );

    Ok(ConversionOutput {
        html,
        images: found,
        stats,
    })
}

/// Default HTML output path: the Markdown path with an `.html` extension.
pub fn default_html_path(markdown_path: impl AsRef<Path>) -> PathBuf {
    markdown_path.as_ref().with_extension("html")
}

/// Folder that image paths in an HTML file are relative to.
pub fn html_folder(html_path: impl AsRef<Path>) -> PathBuf {
    match html_path.as_ref().parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ── File helpers ─────────────────────────────────────────────────────────────

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Read a UTF-8 text file, mapping I/O failures to typed errors.
pub(crate) async fn read_text(path: &Path) -> Result<String, Md2RwError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            debug!("Read {} bytes from {}", text.len(), path.display());
            Ok(text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Md2RwError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(Md2RwError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(Md2RwError::ReadFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `content` to `path` via a sibling temp file and a rename.
pub(crate) async fn write_text_atomic(path: &Path, content: &str) -> Result<(), Md2RwError> {
    let write_err = |source| Md2RwError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, content).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(md: &str) -> String {
        convert_markdown(md, &ConversionConfig::default())
    }

    #[test]
    fn test_fenced_code_round_trip() {
        let html = convert("Intro\n\n```language-swift\nlet x = 1\n```\n\n```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre lang=\"swift\">let x = 1\n</pre>"), "got: {html}");
        assert!(html.contains("<pre lang=\"rust\">fn main() {}\n</pre>"), "got: {html}");
        assert!(!html.contains("language-"));
        assert!(!html.contains("lang-"));
        assert!(!html.contains("<code"));
    }

    #[test]
    fn test_code_entities_decoded() {
        let html = convert("```rust\nlet v: Vec<String> = a && b;\n```");
        assert_eq!(html, "<pre lang=\"rust\">let v: Vec<String> = a && b;\n</pre>");
    }

    #[test]
    fn test_paragraphs_flattened() {
        assert_eq!(convert("one\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn test_bold_becomes_em() {
        assert_eq!(convert("**bold** and *it*"), "<em>bold</em> and <em>it</em>");
    }

    #[test]
    fn test_heading_spacing() {
        assert_eq!(convert("text\n\n## Title"), "text\n\n<h2>Title</h2>");
    }

    #[test]
    fn test_list_spacing() {
        let html = convert("Intro\n\n- a\n- b");
        assert!(html.starts_with("Intro\n\n<ul>"), "got: {html}");
    }

    #[test]
    fn test_images_and_links() {
        let html = convert("![avatar](a.png)\n\n![shot](b.png)\n\n[site](https://example.org)");
        assert!(html.contains("class=\"alignright size-full\""));
        assert!(html.contains("class=\"aligncenter size-full\""));
        assert!(html.contains("rel=\"noopener\""));
        assert!(html.contains("target=\"_blank\""));
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn test_note_from_markdown() {
        let html = convert("> *Note*: remember this");
        assert_eq!(html, "<div class=\"note\">\n<em>Note</em>: remember this\n</div>");
    }

    #[test]
    fn test_bold_note_from_markdown() {
        let html = convert("> **Note:** bold style");
        assert!(html.starts_with("<div class=\"note\">"), "got: {html}");
    }

    #[test]
    fn test_spoilers_from_markdown() {
        let html = convert("> *Spoiler*\n> answer 1\n\nBetween\n\n> *Spoiler*\n> answer 2\n");
        assert_eq!(html.matches("[spoiler title=\"Solution\"]").count(), 2);
        assert_eq!(html.matches("[/spoiler]").count(), 2);
        assert!(!html.contains("blockquote"));
        assert!(!html.contains("</div>"));
        let first_close = html.find("[/spoiler]").unwrap();
        let between = html.find("Between").unwrap();
        assert!(first_close < between, "got: {html}");
    }

    #[test]
    fn test_plain_quote_is_div() {
        assert_eq!(convert("> quoted"), "<div>\nquoted\n</div>");
    }

    #[test]
    fn test_expand_tabs() {
        let config = ConversionConfig::builder().expand_tabs(2).build().unwrap();
        let html = convert_markdown("- a\n\t- b", &config);
        assert!(!html.contains("<pre"), "got: {html}");
        assert_eq!(html.matches("<ul>").count(), 2, "got: {html}");
    }

    #[test]
    fn test_deterministic() {
        let md = "# T\n\n![a](a.png) [x](y)\n\n> **Note** z\n\n```js\nx\n```";
        assert_eq!(convert(md), convert(md));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(convert(""), "");
    }

    #[test]
    fn test_default_html_path() {
        assert_eq!(
            default_html_path("posts/article.md"),
            PathBuf::from("posts/article.html")
        );
    }

    #[test]
    fn test_html_folder() {
        assert_eq!(html_folder("posts/article.html"), PathBuf::from("posts"));
        assert_eq!(html_folder("article.html"), PathBuf::from("."));
    }

    #[tokio::test]
    async fn test_convert_file_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("post.md");
        std::fs::write(&md, "x").unwrap();
        let err = convert_file(&md, &md, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Md2RwError::OutputOverwritesInput { .. }));
    }

    #[tokio::test]
    async fn test_convert_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_file(
            dir.path().join("nope.md"),
            dir.path().join("nope.html"),
            &ConversionConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Md2RwError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_write_atomic_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out.html");
        write_text_atomic(&out, "<em>x</em>").await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<em>x</em>");
        assert!(!dir.path().join("nested/out.html.tmp").exists());
    }
}
