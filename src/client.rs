//! Remote storage contract and the Box implementation.
//!
//! The [`StorageClient`] trait is the seam between the orchestration shell
//! and the vendor API: one call uploads one local file into a destination
//! folder. The trait is agnostic of authentication and transport; callers
//! only see the error classification. It is annotated for `mockall` so
//! tests can script deterministic clients.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use reqwest::{multipart, Body};
use serde::Deserialize;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::credentials::ClientConfig;

const API_BASE_URL: &str = "https://api.box.com";
const UPLOAD_URL: &str = "https://upload.box.com/api/2.0/files/content";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Classification of upload failures. Only transient kinds are eligible
/// for retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeouts, connection failures, throttling, server-side 5xx.
    Transient,
    /// The destination already holds an item with this name.
    Conflict,
    PermissionDenied,
    NotFound,
    QuotaExceeded,
    Unknown,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Transient => "transient",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::NotFound => "not found",
            ErrorKind::QuotaExceeded => "quota exceeded",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A classified upload failure.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct UploadError {
    kind: ErrorKind,
    message: String,
}

impl UploadError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for UploadError {
    /// Network-level failures (connect, reset, timeout) are worth another
    /// attempt.
    fn from(e: reqwest::Error) -> Self {
        UploadError::new(ErrorKind::Transient, e.to_string())
    }
}

/// Proof of a completed upload, as reported by the remote side.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub file_id: String,
    pub name: String,
}

/// Uploads one local file into a destination folder.
///
/// The acting identity, when configured, is part of client construction;
/// there is no ambient or per-call identity state.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn upload(
        &self,
        local_path: &Path,
        destination_folder_id: &str,
        chunk_size: u64,
    ) -> Result<UploadReceipt, UploadError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct UploadedEntries {
    entries: Vec<UploadedFile>,
}

#[derive(Deserialize)]
struct UploadedFile {
    id: String,
    name: String,
}

/// Production client against the Box API.
pub struct BoxClient {
    http: reqwest::Client,
    token: String,
    as_user: Option<String>,
    upload_url: String,
}

impl BoxClient {
    /// Exchanges the service-account credential for an access token and
    /// returns a client ready to upload. The token is fetched once and
    /// held for the whole run.
    pub async fn connect(config: &ClientConfig) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", config.credential.app_settings.client_id.as_str()),
            (
                "client_secret",
                config.credential.app_settings.client_secret.as_str(),
            ),
            ("box_subject_type", "enterprise"),
            ("box_subject_id", config.credential.enterprise_id.as_str()),
        ];
        let response = http
            .post(format!("{API_BASE_URL}/oauth2/token"))
            .form(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| UploadError::new(ErrorKind::Unknown, format!("malformed token response: {e}")))?;

        info!(
            enterprise_id = %config.credential.enterprise_id,
            acting_as = config.as_user.as_deref().unwrap_or("service account"),
            "authenticated against Box API"
        );
        Ok(Self {
            http,
            token: token.access_token,
            as_user: config.as_user.clone(),
            upload_url: UPLOAD_URL.to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for BoxClient {
    async fn upload(
        &self,
        local_path: &Path,
        destination_folder_id: &str,
        chunk_size: u64,
    ) -> Result<UploadReceipt, UploadError> {
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                UploadError::new(
                    ErrorKind::Unknown,
                    format!("path has no usable file name: {}", local_path.display()),
                )
            })?;

        let file = tokio::fs::File::open(local_path).await.map_err(|e| {
            UploadError::new(
                ErrorKind::Unknown,
                format!("failed to open {}: {e}", local_path.display()),
            )
        })?;
        let size = file
            .metadata()
            .await
            .map_err(|e| {
                UploadError::new(
                    ErrorKind::Unknown,
                    format!("failed to stat {}: {e}", local_path.display()),
                )
            })?
            .len();

        let attributes = serde_json::json!({
            "name": file_name,
            "parent": { "id": destination_folder_id },
        });
        // The body is read in chunk_size blocks; chunking mechanics beyond
        // the read size live entirely on the server side of this call.
        let stream = ReaderStream::with_capacity(file, chunk_size as usize);
        let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), size)
            .file_name(file_name.clone());
        let form = multipart::Form::new()
            .text("attributes", attributes.to_string())
            .part("file", part);

        let mut request = self
            .http
            .post(&self.upload_url)
            .bearer_auth(&self.token)
            .multipart(form);
        if let Some(user) = &self.as_user {
            request = request.header("As-User", user);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }
        let uploaded: UploadedEntries = response.json().await.map_err(|e| {
            UploadError::new(ErrorKind::Unknown, format!("malformed upload response: {e}"))
        })?;
        let entry = uploaded.entries.into_iter().next().ok_or_else(|| {
            UploadError::new(ErrorKind::Unknown, "upload response carried no entries")
        })?;

        debug!(file = %entry.name, file_id = %entry.id, "upload accepted");
        Ok(UploadReceipt {
            file_id: entry.id,
            name: entry.name,
        })
    }
}

/// Maps an HTTP failure onto the retry taxonomy.
async fn classify_response(response: reqwest::Response) -> UploadError {
    let status = response.status();
    let body: Option<ApiErrorBody> = response.json().await.ok();
    let code = body
        .as_ref()
        .and_then(|b| b.code.as_deref())
        .unwrap_or_default();
    let detail = body
        .as_ref()
        .and_then(|b| b.message.clone())
        .unwrap_or_else(|| status.to_string());

    let kind = match status.as_u16() {
        429 => ErrorKind::Transient,
        500..=599 => ErrorKind::Transient,
        409 => ErrorKind::Conflict,
        404 => ErrorKind::NotFound,
        403 if code == "storage_limit_exceeded" => ErrorKind::QuotaExceeded,
        401 | 403 => ErrorKind::PermissionDenied,
        _ => ErrorKind::Unknown,
    };
    UploadError::new(kind, format!("HTTP {status}: {detail}"))
}
