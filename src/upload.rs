//! Image publishing: upload local images, then relink the documents.
//!
//! ## Workflow
//!
//! ```text
//! read md + html ─▶ scan <img> ─▶ upload each file ─▶ batch_replace md ─▶ re-convert ─▶ write
//!                                      │ (failure)
//!                                      └─▶ delete everything uploaded so far
//! ```
//!
//! Uploads are sequential. A half-published post is worse than an
//! unpublished one, so the first failure deletes every file this run already
//! pushed and nothing on disk is touched.

use crate::config::{ConversionConfig, UploadMode};
use crate::convert::{convert_markdown, html_folder, read_text, write_text_atomic};
use crate::error::Md2RwError;
use crate::host::MediaHost;
use crate::output::{ImageLink, PublishReport, RollbackSummary, UploadedImage};
use crate::pipeline::{images, replace};
use crate::progress::{NoopProgressCallback, UploadProgressCallback};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Upload the local images referenced by `html_path` and relink both files.
///
/// Image paths are resolved against the HTML file's folder. With
/// [`crate::UploadMode::Skip`] nothing happens. With `All` the Markdown
/// source is rewritten to the uploaded URLs and the HTML regenerated from it;
/// with `HtmlOnly` only the HTML is regenerated.
///
/// # Errors
/// - read errors for either file, as in [`crate::convert::convert_file`]
/// - [`Md2RwError::UploadFailed`] when the host rejects a file; the error
///   carries what the rollback managed to delete
/// - [`Md2RwError::OutputWriteFailed`] when a rewritten file cannot be saved
pub async fn publish_images<H: MediaHost>(
    markdown_path: impl AsRef<Path>,
    html_path: impl AsRef<Path>,
    host: &H,
    config: &ConversionConfig,
) -> Result<PublishReport, Md2RwError> {
    let markdown_path = markdown_path.as_ref();
    let html_path = html_path.as_ref();

    if config.upload_mode == UploadMode::Skip {
        debug!("Upload mode is Skip, nothing to publish");
        return Ok(PublishReport::default());
    }

    // ── Step 1: Find local images ────────────────────────────────────────
    let markdown_text = read_text(markdown_path).await?;
    let html = read_text(html_path).await?;
    let links = distinct(images::scan_image_links(&html, &html_folder(html_path)));

    if links.is_empty() {
        info!("No local images in {}", html_path.display());
        return Ok(PublishReport::default());
    }

    // ── Step 2: Upload, rolling back on the first failure ────────────────
    let noop = NoopProgressCallback;
    let progress: &dyn UploadProgressCallback = match &config.progress_callback {
        Some(cb) => cb.as_ref(),
        None => &noop,
    };
    let uploaded = upload_all(&links, host, progress).await?;

    // ── Step 3: Relink and regenerate ────────────────────────────────────
    let relinked = relink(&markdown_text, &uploaded)?;
    let new_html = convert_markdown(&relinked, config);

    write_text_atomic(html_path, &new_html).await?;
    let markdown_rewritten = config.upload_mode.rewrites_markdown();
    if markdown_rewritten {
        write_text_atomic(markdown_path, &relinked).await?;
    }

    info!(
        "Published {} images; HTML rewritten{}",
        uploaded.len(),
        if markdown_rewritten { ", Markdown rewritten" } else { "" }
    );

    Ok(PublishReport {
        uploaded,
        markdown_rewritten,
        html_rewritten: true,
    })
}

/// Point every local image reference at its uploaded URL.
///
/// Runs as two literal passes through unique placeholders so that neither a
/// local path that is part of a longer one (`a.png` in `data.png`) nor a URL
/// inserted earlier is rewritten again. Longer paths are substituted first.
fn relink(markdown: &str, uploaded: &[UploadedImage]) -> Result<String, Md2RwError> {
    let mut mark = String::from(PLACEHOLDER_MARK);
    while markdown.contains(&mark) || uploaded.iter().any(|u| u.url.contains(&mark)) {
        mark.push(PLACEHOLDER_MARK);
    }

    let mut order: Vec<&UploadedImage> = uploaded.iter().collect();
    order.sort_by(|a, b| b.local_path.len().cmp(&a.local_path.len()));

    let placeholders: Vec<String> = (0..order.len())
        .map(|i| format!("{mark}{i}{mark}"))
        .collect();
    let originals: Vec<&str> = order.iter().map(|u| u.local_path.as_str()).collect();
    let urls: Vec<&str> = order.iter().map(|u| u.url.as_str()).collect();

    let marked = replace::batch_replace(markdown, &originals, &placeholders)?;
    replace::batch_replace(&marked, &placeholders, &urls)
}

const PLACEHOLDER_MARK: char = '\u{E000}';

/// Drop repeated references to the same file, keeping first-seen order.
fn distinct(links: Vec<ImageLink>) -> Vec<ImageLink> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.local_path.clone()))
        .collect()
}

async fn upload_all<H: MediaHost>(
    links: &[ImageLink],
    host: &H,
    progress: &dyn UploadProgressCallback,
) -> Result<Vec<UploadedImage>, Md2RwError> {
    let total = links.len();
    progress.on_upload_start(total);
    let mut uploaded: Vec<UploadedImage> = Vec::with_capacity(total);

    for (i, link) in links.iter().enumerate() {
        let index = i + 1;
        progress.on_file_start(index, total, &link.full_path);

        match host.upload(&link.full_path).await {
            Ok(media) => {
                debug!("{}/{} {} → {}", index, total, link.local_path, media.url);
                progress.on_file_uploaded(index, total, &link.full_path, &media.url);
                uploaded.push(UploadedImage {
                    local_path: link.local_path.clone(),
                    url: media.url,
                    id: media.id,
                });
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Upload of {} failed: {}", link.full_path.display(), reason);
                progress.on_file_failed(index, total, &link.full_path, &reason);
                let rollback = roll_back(&uploaded, host, progress).await;
                return Err(Md2RwError::UploadFailed {
                    path: link.full_path.clone(),
                    reason,
                    rollback,
                });
            }
        }
    }

    progress.on_upload_complete(uploaded.len());
    Ok(uploaded)
}

/// Best-effort delete of everything uploaded so far.
async fn roll_back<H: MediaHost>(
    uploaded: &[UploadedImage],
    host: &H,
    progress: &dyn UploadProgressCallback,
) -> RollbackSummary {
    let mut summary = RollbackSummary::default();
    for image in uploaded {
        match host.delete(image.id).await {
            Ok(()) => {
                progress.on_rollback(image.id, true);
                summary.deleted.push(image.id);
            }
            Err(e) => {
                warn!("Rollback could not delete media {}: {}", image.id, e);
                progress.on_rollback(image.id, false);
                summary.not_deleted.push(image.id);
            }
        }
    }
    if !summary.is_clean() {
        warn!("{} uploaded files remain on the host", summary.not_deleted.len());
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::UploadedMedia;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory host that fails uploads whose file name contains `fail_on`.
    #[derive(Default)]
    struct FakeHost {
        fail_on: Option<&'static str>,
        refuse_delete: bool,
        next_id: Mutex<u64>,
        stored: Mutex<Vec<(u64, PathBuf)>>,
    }

    impl MediaHost for FakeHost {
        async fn upload(&self, path: &Path) -> Result<UploadedMedia, HostError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if self.fail_on.is_some_and(|f| name.contains(f)) {
                return Err(HostError::Status {
                    status: 413,
                    body: "too large".into(),
                });
            }
            let id = {
                let mut next = self.next_id.lock().unwrap();
                *next += 1;
                *next
            };
            self.stored.lock().unwrap().push((id, path.to_path_buf()));
            Ok(UploadedMedia {
                url: format!("https://cdn.example.org/{name}"),
                id,
            })
        }

        async fn delete(&self, id: u64) -> Result<(), HostError> {
            if self.refuse_delete {
                return Err(HostError::Status {
                    status: 403,
                    body: "forbidden".into(),
                });
            }
            self.stored.lock().unwrap().retain(|(i, _)| *i != id);
            Ok(())
        }
    }

    fn config(mode: UploadMode) -> ConversionConfig {
        ConversionConfig::builder().upload_mode(mode).build().unwrap()
    }

    /// Writes `post.md`, its converted `post.html`, and the named images.
    fn fixture(markdown: &str, image_names: &[&str]) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        for name in image_names {
            std::fs::write(dir.path().join(name), b"\x89PNG").unwrap();
        }
        let md = dir.path().join("post.md");
        let html = dir.path().join("post.html");
        std::fs::write(&md, markdown).unwrap();
        std::fs::write(&html, convert_markdown(markdown, &ConversionConfig::default())).unwrap();
        (dir, md, html)
    }

    #[tokio::test]
    async fn test_skip_does_nothing() {
        let (_dir, md, html) = fixture("![a](a.png)", &["a.png"]);
        let host = FakeHost::default();
        let report = publish_images(&md, &html, &host, &config(UploadMode::Skip))
            .await
            .unwrap();
        assert!(report.uploaded.is_empty());
        assert!(!report.html_rewritten);
        assert!(host.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_rewrites_both_files() {
        let (_dir, md, html) = fixture("![a](a.png)\n\n![b](b.png)\n\n![a again](a.png)", &["a.png", "b.png"]);
        let host = FakeHost::default();
        let report = publish_images(&md, &html, &host, &config(UploadMode::All))
            .await
            .unwrap();

        assert_eq!(report.uploaded.len(), 2);
        assert!(report.markdown_rewritten);
        assert!(report.html_rewritten);

        let new_md = std::fs::read_to_string(&md).unwrap();
        assert!(new_md.contains("](https://cdn.example.org/a.png)"));
        assert!(!new_md.contains("](a.png)"));

        let new_html = std::fs::read_to_string(&html).unwrap();
        assert!(new_html.contains("src=\"https://cdn.example.org/b.png\""));
        assert!(new_html.contains("class=\"alignright size-full\""));
    }

    #[tokio::test]
    async fn test_overlapping_paths_relinked_intact() {
        let (_dir, md, html) =
            fixture("![d](data.png)\n\n![a](a.png)\n\n![b](img/a.png)", &["data.png", "a.png"]);
        std::fs::create_dir(md.parent().unwrap().join("img")).unwrap();
        std::fs::write(md.parent().unwrap().join("img/a.png"), b"png").unwrap();
        let host = FakeHost::default();
        publish_images(&md, &html, &host, &config(UploadMode::All))
            .await
            .unwrap();

        let new_md = std::fs::read_to_string(&md).unwrap();
        assert_eq!(
            new_md,
            "![d](https://cdn.example.org/data.png)\n\n\
             ![a](https://cdn.example.org/a.png)\n\n\
             ![b](https://cdn.example.org/a.png)"
        );
    }

    #[test]
    fn test_relink_order_independent() {
        fn uploaded(pairs: &[(&str, &str)]) -> Vec<UploadedImage> {
            pairs
                .iter()
                .enumerate()
                .map(|(i, (local, url))| UploadedImage {
                    local_path: local.to_string(),
                    url: url.to_string(),
                    id: i as u64,
                })
                .collect()
        }
        let md = "![d](data.png) ![a](a.png)";
        let expected = "![d](https://h/u/data.png) ![a](https://h/u/a.png)";
        let forward = uploaded(&[
            ("data.png", "https://h/u/data.png"),
            ("a.png", "https://h/u/a.png"),
        ]);
        let backward = uploaded(&[
            ("a.png", "https://h/u/a.png"),
            ("data.png", "https://h/u/data.png"),
        ]);
        assert_eq!(relink(md, &forward).unwrap(), expected);
        assert_eq!(relink(md, &backward).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_html_only_keeps_markdown() {
        let source = "![a](a.png)";
        let (_dir, md, html) = fixture(source, &["a.png"]);
        let host = FakeHost::default();
        let report = publish_images(&md, &html, &host, &config(UploadMode::HtmlOnly))
            .await
            .unwrap();

        assert!(!report.markdown_rewritten);
        assert_eq!(std::fs::read_to_string(&md).unwrap(), source);
        assert!(std::fs::read_to_string(&html)
            .unwrap()
            .contains("https://cdn.example.org/a.png"));
    }

    #[tokio::test]
    async fn test_web_and_missing_images_ignored() {
        let (_dir, md, html) = fixture(
            "![w](https://example.org/w.png)\n\n![m](missing.png)",
            &[],
        );
        let host = FakeHost::default();
        let report = publish_images(&md, &html, &host, &config(UploadMode::All))
            .await
            .unwrap();
        assert!(report.uploaded.is_empty());
        assert!(!report.markdown_rewritten);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_and_leaves_files() {
        let source = "![a](a.png)\n\n![b](b.png)\n\n![c](c-bad.png)";
        let (_dir, md, html) = fixture(source, &["a.png", "b.png", "c-bad.png"]);
        let html_before = std::fs::read_to_string(&html).unwrap();
        let host = FakeHost {
            fail_on: Some("bad"),
            ..Default::default()
        };

        let err = publish_images(&md, &html, &host, &config(UploadMode::All))
            .await
            .unwrap_err();
        match err {
            Md2RwError::UploadFailed { path, rollback, .. } => {
                assert!(path.ends_with("c-bad.png"));
                assert_eq!(rollback.deleted, vec![1, 2]);
                assert!(rollback.is_clean());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(host.stored.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(&md).unwrap(), source);
        assert_eq!(std::fs::read_to_string(&html).unwrap(), html_before);
    }

    #[tokio::test]
    async fn test_failed_rollback_is_reported() {
        let (_dir, md, html) = fixture("![a](a.png)\n\n![b](b-bad.png)", &["a.png", "b-bad.png"]);
        let host = FakeHost {
            fail_on: Some("bad"),
            refuse_delete: true,
            ..Default::default()
        };
        let err = publish_images(&md, &html, &host, &config(UploadMode::All))
            .await
            .unwrap_err();
        let Md2RwError::UploadFailed { rollback, .. } = err else {
            panic!("expected UploadFailed");
        };
        assert_eq!(rollback.not_deleted, vec![1]);
        assert_eq!(host.stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_progress_events() {
        #[derive(Default)]
        struct Recorder {
            started: AtomicUsize,
            uploaded: AtomicUsize,
            rolled_back: AtomicUsize,
            complete: AtomicUsize,
        }
        impl UploadProgressCallback for Recorder {
            fn on_upload_start(&self, total: usize) {
                self.started.store(total, Ordering::SeqCst);
            }
            fn on_file_uploaded(&self, _i: usize, _t: usize, _p: &Path, _u: &str) {
                self.uploaded.fetch_add(1, Ordering::SeqCst);
            }
            fn on_rollback(&self, _id: u64, _deleted: bool) {
                self.rolled_back.fetch_add(1, Ordering::SeqCst);
            }
            fn on_upload_complete(&self, n: usize) {
                self.complete.store(n, Ordering::SeqCst);
            }
        }

        let (_dir, md, html) = fixture("![a](a.png)\n\n![b](b.png)", &["a.png", "b.png"]);
        let recorder = Arc::new(Recorder::default());
        let config = ConversionConfig::builder()
            .upload_mode(UploadMode::HtmlOnly)
            .progress_callback(recorder.clone())
            .build()
            .unwrap();

        publish_images(&md, &html, &FakeHost::default(), &config)
            .await
            .unwrap();
        assert_eq!(recorder.started.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.uploaded.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.rolled_back.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.complete.load(Ordering::SeqCst), 2);
    }
}
