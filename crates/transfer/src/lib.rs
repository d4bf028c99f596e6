//! Artifact transfer for modsmith
//!
//! Fetches one remote resource to a local path using a conditional GET. The
//! response `ETag` is kept with the file so a later fetch of an unchanged
//! resource completes with `304 Not Modified` and no body transfer.

pub mod atomic;
pub mod attribute;

use chrono::DateTime;
use filetime::FileTime;
use modsmith_core::{Error, Result};
use reqwest::header::{ETAG, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

const DEFAULT_USER_AGENT: &str = concat!("modsmith/", env!("CARGO_PKG_VERSION"));
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// What a single fetch did to the local file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded { bytes: usize },
    NotModified,
}

/// HTTP client for module artifacts
#[derive(Debug, Clone)]
pub struct Transfer {
    client: reqwest::Client,
}

impl Transfer {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| Error::network("client", format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch `uri` into `path` and return `path`.
    ///
    /// Errors are logged, never returned. Callers notice a failed fetch only
    /// by the artifact still being absent afterwards.
    pub async fn fetch(&self, uri: &str, path: &Path) -> PathBuf {
        match self.try_fetch(uri, path).await {
            Ok(FetchOutcome::Downloaded { bytes }) => {
                info!(uri = %uri, path = %path.display(), bytes, "fetched artifact");
            }
            Ok(FetchOutcome::NotModified) => {
                debug!(uri = %uri, path = %path.display(), "artifact not modified");
            }
            Err(e) => {
                warn!(uri = %uri, path = %path.display(), error = %e, "artifact transfer failed");
            }
        }
        path.to_path_buf()
    }

    /// Fetch with errors and the outcome reported to the caller
    pub async fn try_fetch(&self, uri: &str, path: &Path) -> Result<FetchOutcome> {
        let mut request = self.client.get(uri);
        if path.is_file() {
            match attribute::read_etag(path) {
                Ok(Some(etag)) => request = request.header(IF_NONE_MATCH, etag),
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot read stored etag, fetching unconditionally");
                }
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::network(uri, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if status != StatusCode::OK {
            return Err(Error::network(uri, format!("unexpected status {status}")));
        }

        let etag = header_value(&response, ETAG);
        let modified = header_value(&response, LAST_MODIFIED)
            .and_then(|value| parse_http_date(&value))
            .unwrap_or_else(SystemTime::now);

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::network(uri, e.to_string()))?;
        let bytes = body.len();

        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || store(&target, &body, etag.as_deref(), modified))
            .await
            .map_err(|e| Error::network(uri, format!("store task failed: {e}")))??;

        Ok(FetchOutcome::Downloaded { bytes })
    }
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn parse_http_date(value: &str) -> Option<SystemTime> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(SystemTime::from)
}

/// Write the body, then record the tag and the modification time.
///
/// Only the body write is fatal; attribute failures are logged.
fn store(path: &Path, body: &[u8], etag: Option<&str>, modified: SystemTime) -> Result<()> {
    atomic::write_atomic(path, body)?;
    if let Some(etag) = etag {
        if let Err(e) = attribute::write_etag(path, etag) {
            warn!(path = %path.display(), error = %e, "cannot store etag");
        }
    }
    if let Err(e) = filetime::set_file_mtime(path, FileTime::from_system_time(modified)) {
        let e = Error::file_system(path, "set modification time", e);
        warn!(path = %path.display(), error = %e, "cannot set modification time");
    }
    Ok(())
}
