//! WordPress REST media library client.
//!
//! Uploads go to `POST {site}/wp-json/wp/v2/media` with the raw file as the
//! body; deletes go to `DELETE {site}/wp-json/wp/v2/media/{id}?force=true`
//! (without `force` WordPress refuses to delete attachments, they have no
//! trash). Credentials are sent as HTTP basic auth on every request, which is
//! what WordPress application passwords expect.

use super::{MediaHost, UploadedMedia};
use crate::error::HostError;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for [`WordPressMediaHost`].
#[derive(Clone)]
pub struct WordPressConfig {
    /// Site root, e.g. `https://blog.example.org`.
    pub site_url: String,
    pub username: String,
    /// Application password (or account password where basic auth is enabled).
    pub password: String,
    /// Per-request timeout in seconds. Default: 120.
    pub timeout_secs: u64,
}

impl WordPressConfig {
    pub fn new(
        site_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            site_url: site_url.into(),
            username: username.into(),
            password: password.into(),
            timeout_secs: 120,
        }
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }
}

impl fmt::Debug for WordPressConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordPressConfig")
            .field("site_url", &self.site_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// [`MediaHost`] backed by a WordPress media library.
pub struct WordPressMediaHost {
    client: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
}

impl WordPressMediaHost {
    pub fn new(config: WordPressConfig) -> Result<Self, HostError> {
        let site = config.site_url.trim();
        if !(site.starts_with("http://") || site.starts_with("https://")) {
            return Err(HostError::InvalidConfig(format!(
                "site URL must start with http:// or https://, got '{site}'"
            )));
        }
        if config.username.is_empty() {
            return Err(HostError::InvalidConfig("username is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: media_endpoint(site),
            username: config.username,
            password: config.password,
        })
    }

    /// The media collection URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl MediaHost for WordPressMediaHost {
    async fn upload(&self, path: &Path) -> Result<UploadedMedia, HostError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mime = mime_type(path);
        debug!("Uploading {} ({} bytes, {})", path.display(), bytes.len(), mime);

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, mime.to_string())
            .header(CONTENT_DISPOSITION, content_disposition(path))
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(HostError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let media = parse_media_response(&body)?;
        info!("Uploaded {} as media {}", path.display(), media.id);
        Ok(media)
    }

    async fn delete(&self, id: u64) -> Result<(), HostError> {
        let response = self
            .client
            .delete(format!("{}/{}?force=true", self.endpoint, id))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(HostError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        info!("Deleted media {}", id);
        Ok(())
    }
}

// ── Request/response helpers ─────────────────────────────────────────────────

/// Build the media collection URL for a site root.
pub fn media_endpoint(site_url: &str) -> String {
    format!("{}/wp-json/wp/v2/media", site_url.trim_end_matches('/'))
}

/// Guess the upload MIME type from the file extension.
pub fn mime_type(path: &Path) -> mime_guess::Mime {
    mime_guess::from_path(path).first_or_octet_stream()
}

fn content_disposition(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_else(|| "upload".to_string());
    format!("attachment; filename=\"{name}\"")
}

#[derive(Deserialize)]
struct MediaResponse {
    id: u64,
    source_url: String,
}

fn parse_media_response(body: &[u8]) -> Result<UploadedMedia, HostError> {
    let media: MediaResponse = serde_json::from_slice(body)
        .map_err(|e| HostError::InvalidResponse(format!("media JSON: {e}")))?;
    Ok(UploadedMedia {
        url: media.source_url,
        id: media.id,
    })
}

fn truncate_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body).chars().take(200).collect()
}
