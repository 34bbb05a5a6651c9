//! Service-account credential resolution.
//!
//! The credential document is the JWT app-settings JSON downloaded from the
//! Box developer console. It can be supplied as a file via `--jwt-config`,
//! or inline as base64 through the `JWT_CONFIG_BASE_64` environment
//! variable. Exactly one of the two sources must be present.

use std::fs;
use std::path::Path;

use base64::Engine;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ConfigError;

/// Environment variable carrying the base64-encoded credential document.
pub const CREDENTIAL_ENV_VAR: &str = "JWT_CONFIG_BASE_64";

/// Box JWT application settings document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtAppConfig {
    #[serde(rename = "boxAppSettings")]
    pub app_settings: AppSettings,
    #[serde(rename = "enterpriseID")]
    pub enterprise_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(rename = "appAuth", default)]
    pub app_auth: Option<AppAuth>,
}

/// Key material block of the credential document. Parsed for completeness;
/// the client-credentials grant only needs the id/secret pair.
#[derive(Debug, Clone, Deserialize)]
pub struct AppAuth {
    #[serde(rename = "publicKeyID")]
    pub public_key_id: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
    #[serde(default)]
    pub passphrase: Option<String>,
}

/// Immutable client configuration, derived once from the credential source
/// and shared read-only by every worker for the duration of the run.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credential: JwtAppConfig,
    /// Identity to act as; uploads run on behalf of this user instead of
    /// the service account when set.
    pub as_user: Option<String>,
}

/// Resolves the credential document from exactly one of the two supported
/// sources and binds the optional act-as identity. No network calls.
pub fn load_client_config(
    jwt_config: Option<&Path>,
    as_user: Option<String>,
) -> Result<ClientConfig, ConfigError> {
    let inline = std::env::var(CREDENTIAL_ENV_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty());

    let raw = match (jwt_config, inline) {
        (Some(_), Some(_)) => return Err(ConfigError::AmbiguousCredential),
        (None, None) => return Err(ConfigError::MissingCredential),
        (Some(path), None) => {
            debug!(path = %path.display(), "reading credential document from file");
            fs::read_to_string(path).map_err(|source| ConfigError::UnreadableCredential {
                path: path.to_path_buf(),
                source,
            })?
        }
        (None, Some(encoded)) => {
            debug!("decoding credential document from {}", CREDENTIAL_ENV_VAR);
            let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
            String::from_utf8(bytes).map_err(|_| ConfigError::NonUtf8Credential)?
        }
    };

    let credential: JwtAppConfig = serde_json::from_str(&raw)?;
    info!(
        enterprise_id = %credential.enterprise_id,
        acting_as = as_user.as_deref().unwrap_or("service account"),
        "credential document loaded"
    );

    Ok(ClientConfig {
        credential,
        as_user,
    })
}
