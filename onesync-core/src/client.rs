use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, LAST_MODIFIED};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::timestamp::{DisplayZone, ModificationTime};

/// Bound on HEAD probes.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
/// Bound on GET and PUT transfers, body included.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECTED_DETAIL: &str = "Connected to WebDAV server";

#[derive(Debug, Error)]
pub enum WebDavError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("server returned {status}")]
    Status { status: StatusCode },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("local file does not exist: {}", .0.display())]
    LocalFileMissing(PathBuf),
}

impl WebDavError {
    /// HTTP status for failures caused by an unexpected response code.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            WebDavError::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// HTTP basic auth pair. `Debug` never prints the password.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub status: Duration,
    pub transfer: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            status: STATUS_TIMEOUT,
            transfer: TRANSFER_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub reachable: bool,
    pub detail: String,
}

impl ConnectionStatus {
    pub fn connected() -> Self {
        Self {
            reachable: true,
            detail: CONNECTED_DETAIL.to_string(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            reachable: false,
            detail: detail.into(),
        }
    }
}

/// Client for the three WebDAV verbs used against a single file.
///
/// Every method issues at most one request. Probes never fail: they fold
/// transport errors and unexpected statuses into their return value.
#[derive(Clone)]
pub struct WebDavClient {
    http: Client,
    timeouts: Timeouts,
    zone: DisplayZone,
}

impl WebDavClient {
    pub fn new() -> Self {
        Self::with_settings(Timeouts::default(), DisplayZone::default())
    }

    pub fn with_settings(timeouts: Timeouts, zone: DisplayZone) -> Self {
        Self {
            http: Client::new(),
            timeouts,
            zone,
        }
    }

    /// HEAD on the file, returning its `Last-Modified` in the display zone.
    pub async fn remote_modification_time(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> ModificationTime {
        let response = match self.head(url, credentials).await {
            Ok(response) => response,
            Err(err) => {
                error!(url, error = %err, "WebDAV connection error");
                return ModificationTime::Unavailable;
            }
        };
        let status = response.status();
        if status != StatusCode::OK {
            warn!(url, status = status.as_u16(), "WebDAV HEAD request failed");
            return ModificationTime::Unavailable;
        }
        let Some(raw) = response.headers().get(LAST_MODIFIED) else {
            warn!(url, "WebDAV response has no Last-Modified header");
            return ModificationTime::Unavailable;
        };
        match raw.to_str().ok().and_then(|raw| self.zone.parse_http_date(raw)) {
            Some(at) => {
                let remote = ModificationTime::At(at);
                info!(%remote, zone = self.zone.name(), "Remote file date");
                remote
            }
            None => {
                error!(value = ?raw, "Error parsing remote date");
                ModificationTime::ParseError
            }
        }
    }

    /// HEAD on the server root. Only a 200 counts as reachable.
    pub async fn check_connectivity(
        &self,
        server_url: &str,
        credentials: &Credentials,
    ) -> ConnectionStatus {
        info!(
            url = server_url,
            username = %credentials.username,
            "Checking WebDAV connection"
        );
        match self.head(server_url, credentials).await {
            Ok(response) => {
                let status = response.status();
                info!(status = status.as_u16(), "WebDAV connection check answered");
                if status == StatusCode::OK {
                    ConnectionStatus::connected()
                } else {
                    ConnectionStatus::failed(format!("Status code: {}", status.as_u16()))
                }
            }
            Err(err) => {
                warn!(url = server_url, error = %err, "WebDAV server is unreachable");
                ConnectionStatus::failed(err.to_string())
            }
        }
    }

    /// GET the file and replace `target` with the body.
    ///
    /// The body is streamed into a sibling `.partial` file that is renamed
    /// over `target` once complete, so a failed transfer leaves the old
    /// content in place. Non-200 responses never touch the filesystem.
    pub async fn download(
        &self,
        url: &str,
        credentials: &Credentials,
        target: &Path,
    ) -> Result<u64, WebDavError> {
        let url = Url::parse(url)?;
        let response = Self::authorized(self.http.get(url), credentials)
            .timeout(self.timeouts.transfer)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(WebDavError::Status { status });
        }

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let partial = partial_path(target);
        let written = match write_body(response, &partial).await {
            Ok(written) => written,
            Err(err) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(err);
            }
        };
        tokio::fs::rename(&partial, target).await?;
        debug!(path = %target.display(), bytes = written, "Download stored");
        Ok(written)
    }

    /// PUT the contents of `source`. 200, 201 and 204 count as success.
    ///
    /// A missing source fails before any request is made.
    pub async fn upload(
        &self,
        url: &str,
        credentials: &Credentials,
        source: &Path,
    ) -> Result<StatusCode, WebDavError> {
        if !source.exists() {
            return Err(WebDavError::LocalFileMissing(source.to_path_buf()));
        }
        let url = Url::parse(url)?;
        let file = tokio::fs::File::open(source).await?;
        let length = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let response = Self::authorized(self.http.put(url), credentials)
            .header(CONTENT_LENGTH, length)
            .body(body)
            .timeout(self.timeouts.transfer)
            .send()
            .await?;
        let status = response.status();
        if matches!(
            status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT
        ) {
            debug!(path = %source.display(), bytes = length, status = status.as_u16(), "Upload accepted");
            Ok(status)
        } else {
            Err(WebDavError::Status { status })
        }
    }

    async fn head(&self, url: &str, credentials: &Credentials) -> Result<Response, WebDavError> {
        let url = Url::parse(url)?;
        Ok(Self::authorized(self.http.head(url), credentials)
            .timeout(self.timeouts.status)
            .send()
            .await?)
    }

    fn authorized(builder: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
        builder.basic_auth(&credentials.username, Some(&credentials.password))
    }
}

impl Default for WebDavClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn write_body(response: Response, partial: &Path) -> Result<u64, WebDavError> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

fn partial_path(target: &Path) -> PathBuf {
    target.with_extension(format!(
        "{}partial",
        target
            .extension()
            .map(|ext| format!("{}.", ext.to_string_lossy()))
            .unwrap_or_default()
    ))
}
