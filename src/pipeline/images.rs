//! Local image discovery in generated HTML.
//!
//! Walks every `<img>` in document order and keeps the ones whose `src` is a
//! local file next to the HTML. Web images (`http…`, `www…`) are never upload
//! candidates; references to files that do not exist are silently skipped.

use crate::output::ImageLink;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use tracing::debug;

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Check if an image `src` points at the web rather than the local disk.
pub fn is_web_link(src: &str) -> bool {
    src.starts_with("http") || src.starts_with("www")
}

/// Find every local image in `html` that exists below `base_folder`.
///
/// `full_path` is `base_folder + "/" + src`. Never fails: no images, remote
/// images and missing files all just produce fewer records.
pub fn scan_image_links(html: &str, base_folder: &Path) -> Vec<ImageLink> {
    let doc = Html::parse_fragment(html);
    let mut links = Vec::new();

    for img in doc.select(&IMG) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        if is_web_link(src) {
            continue;
        }

        let full_path = local_file(base_folder, src);
        if full_path.is_file() {
            links.push(ImageLink {
                local_path: src.to_string(),
                full_path,
            });
        } else {
            debug!("Skipping missing image: {}", full_path.display());
        }
    }

    debug!("Found {} local images", links.len());
    links
}

/// `base_folder + "/" + src`, without a lossy round trip through `str`.
fn local_file(base_folder: &Path, src: &str) -> PathBuf {
    let mut full = base_folder.as_os_str().to_os_string();
    full.push("/");
    full.push(src);
    PathBuf::from(full)
}
