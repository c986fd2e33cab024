//! Mirror configuration.
//!
//! Configuration is a small JSON document. Every field has a default, so an
//! empty object (or no file at all) describes a local store with the standard
//! keynode names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::constants::{DEFAULT_ENDPOINT, NREL_LOGIN, UI_USER};

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`MirrorConfig`].
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The endpoint is not a `ws://` or `wss://` URL.
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl ConfigError {
    /// Check if the configuration file itself could not be used.
    pub fn is_file_error(&self) -> bool {
        matches!(self, ConfigError::Read { .. } | ConfigError::Parse { .. })
    }
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}

/// Names of the keynodes anchoring identity subgraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeynodeNames {
    pub login_relation: String,
    pub ui_user: String,
}

impl Default for KeynodeNames {
    fn default() -> Self {
        Self {
            login_relation: NREL_LOGIN.to_string(),
            ui_user: UI_USER.to_string(),
        }
    }
}

/// Where the mirror connects and which keynodes it uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub endpoint: String,
    pub keynodes: KeynodeNames,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            keynodes: KeynodeNames::default(),
        }
    }
}

impl MirrorConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: MirrorConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the endpoint, validating the new one.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        self.endpoint = endpoint.into();
        self.validate()?;
        Ok(self)
    }

    /// Check that the endpoint is a WebSocket URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url().map(|_| ())
    }

    /// The endpoint as a parsed URL.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };
        let url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }
}
