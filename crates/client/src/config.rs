//! Client configuration module.
//!
//! Supports loading configuration from:
//! 1. YAML config file (`~/.quizdeck/config.yaml` or `$QUIZDECK_CONFIG`)
//! 2. Environment variables
//!
//! Environment variables take precedence over config file values. The API
//! base URL is never hard-coded: an explicit `api_url` wins, otherwise the
//! machine's host name decides between the local and remote endpoints.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AuthError, AuthResult};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Explicit API base URL; overrides host-based selection when set
    pub api_url: Option<String>,
    /// Endpoint used when the host name looks loopback/private
    pub local_api_url: String,
    /// Endpoint used for every other host
    pub remote_api_url: String,
    /// Directory holding the persisted session (`token`, `user.json`)
    pub session_dir: PathBuf,
    /// HTTP request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            local_api_url: "http://localhost:8080".to_string(),
            remote_api_url: "https://api.quizdeck.app".to_string(),
            session_dir: default_session_dir(),
            request_timeout_secs: 30,
        }
    }
}

/// `~/.quizdeck`, falling back to a relative directory when the home
/// directory cannot be resolved.
fn default_session_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".quizdeck"))
        .unwrap_or_else(|| PathBuf::from(".quizdeck"))
}

impl ClientConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables override file values.
    pub fn load() -> AuthResult<Self> {
        let mut config = if let Ok(path) = std::env::var("QUIZDECK_CONFIG") {
            let config = Self::from_file(&path)?;
            tracing::debug!("Loaded configuration from: {}", path);
            config
        } else {
            let default_path = default_session_dir().join("config.yaml");
            if default_path.exists() {
                Self::from_file(&default_path)?
            } else {
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AuthResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ClientConfig = serde_yaml::from_str(&content)
            .map_err(|e| AuthError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("QUIZDECK_API_URL") {
            self.api_url = Some(val);
        }
        if let Ok(val) = std::env::var("QUIZDECK_LOCAL_API_URL") {
            self.local_api_url = val;
        }
        if let Ok(val) = std::env::var("QUIZDECK_REMOTE_API_URL") {
            self.remote_api_url = val;
        }
        if let Ok(val) = std::env::var("QUIZDECK_SESSION_DIR") {
            self.session_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("QUIZDECK_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.request_timeout_secs = secs;
            }
        }
    }

    /// Pick the API base URL for the given host name.
    pub fn resolve_api_url(&self, host: &str) -> &str {
        if let Some(url) = self.api_url.as_deref().filter(|u| !u.is_empty()) {
            return url;
        }
        if is_local_host(host) {
            &self.local_api_url
        } else {
            &self.remote_api_url
        }
    }

    /// The API base URL for this machine.
    pub fn base_url(&self) -> String {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "localhost".to_string());
        self.resolve_api_url(&host).to_string()
    }
}

/// True when the host name matches a loopback or private-network pattern.
pub fn is_local_host(host: &str) -> bool {
    let host = host.trim().to_ascii_lowercase();
    if host.is_empty()
        || host == "localhost"
        || host == "0.0.0.0"
        || host == "::1"
        || host.starts_with("127.")
        || host.starts_with("10.")
        || host.starts_with("192.168.")
        || host.ends_with(".local")
        || host.ends_with(".lan")
        || host.ends_with(".internal")
    {
        return true;
    }
    // 172.16.0.0/12
    if let Some(rest) = host.strip_prefix("172.") {
        if let Some(second) = rest.split('.').next() {
            if let Ok(octet) = second.parse::<u8>() {
                return (16..=31).contains(&octet);
            }
        }
    }
    false
}
