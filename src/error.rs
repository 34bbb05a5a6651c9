use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems, reported before any upload is attempted.
///
/// Everything here aborts the run with exit code 2. Per-file upload
/// failures are never represented as `ConfigError`; they are collected as
/// outcomes instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("provide --jwt-config or set JWT_CONFIG_BASE_64")]
    MissingCredential,

    #[error("--jwt-config and JWT_CONFIG_BASE_64 are mutually exclusive; provide exactly one")]
    AmbiguousCredential,

    #[error("failed to read credential file {path}: {source}")]
    UnreadableCredential {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JWT_CONFIG_BASE_64 is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("JWT_CONFIG_BASE_64 did not decode to UTF-8 text")]
    NonUtf8Credential,

    #[error("credential document is not valid JSON: {0}")]
    MalformedCredential(#[from] serde_json::Error),

    #[error("invalid local folder: {0}")]
    InvalidSourceRoot(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    UnreadableSourceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("--backoff must be a positive number of seconds, got {0}")]
    InvalidBackoff(f64),
}
