//! Configuration System
//!
//! Layered configuration: built-in defaults, then a TOML file (the global
//! `$XDG_CONFIG_HOME/tether/config.toml` or an explicit path), then
//! `TETHER__SECTION__KEY` environment variables.

use crate::backend::{InMemoryBackend, ObjectBackend, SledObjectBackend};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::service::SymlinkService;
use crate::store::retry::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF, DEFAULT_MAX_RETRIES,
};
use crate::store::{RetryPolicy, SymlinkStore, DEFAULT_METADATA_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod facade;
mod merge;
mod paths;
mod sources;

pub use facade::ConfigLoader;

/// XDG path helpers
pub mod xdg {
    pub use super::paths::*;
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TetherConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata document settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Name of the per-directory metadata object
    #[serde(default = "default_metadata_file_name")]
    pub metadata_file_name: String,
}

fn default_metadata_file_name() -> String {
    DEFAULT_METADATA_FILE_NAME.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            metadata_file_name: default_metadata_file_name(),
        }
    }
}

/// Conflict retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_initial_backoff_ms() -> u64 {
    DEFAULT_INITIAL_BACKOFF.as_millis() as u64
}

fn default_max_backoff_ms() -> u64 {
    DEFAULT_MAX_BACKOFF.as_millis() as u64
}

fn default_backoff_multiplier() -> u32 {
    DEFAULT_BACKOFF_MULTIPLIER
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.backoff_multiplier,
        }
    }
}

/// Which object backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_kind")]
    pub kind: BackendKind,

    /// Database directory for the sled backend (defaults to the XDG data dir)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_backend_kind() -> BackendKind {
    BackendKind::Sled
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            path: None,
        }
    }
}

impl BackendConfig {
    /// Sled database directory, falling back to the XDG data dir.
    pub fn resolved_path(&self) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => paths::default_store_path(),
        }
    }

    pub fn open(&self) -> Result<Arc<dyn ObjectBackend>, ApiError> {
        match self.kind {
            BackendKind::Memory => Ok(Arc::new(InMemoryBackend::new())),
            BackendKind::Sled => {
                let path = self.resolved_path()?;
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        ApiError::ConfigError(format!(
                            "Failed to create store directory {:?}: {}",
                            parent, e
                        ))
                    })?;
                }
                Ok(Arc::new(SledObjectBackend::open(&path)?))
            }
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Store(String),
    Retry(String),
    Backend(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Store(msg) => write!(f, "Store: {}", msg),
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
            ValidationError::Backend(msg) => write!(f, "Backend: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl TetherConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = &self.store.metadata_file_name;
        if name.is_empty() {
            errors.push(ValidationError::Store(
                "Metadata file name cannot be empty".to_string(),
            ));
        } else if name.contains('/') {
            errors.push(ValidationError::Store(format!(
                "Metadata file name '{}' must not contain '/'",
                name
            )));
        }

        if self.retry.backoff_multiplier == 0 {
            errors.push(ValidationError::Retry(
                "Backoff multiplier must be at least 1".to_string(),
            ));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            errors.push(ValidationError::Retry(format!(
                "Initial backoff ({} ms) exceeds max backoff ({} ms)",
                self.retry.initial_backoff_ms, self.retry.max_backoff_ms
            )));
        }

        if let Some(path) = &self.backend.path {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::Backend(
                    "Store path cannot be empty".to_string(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, open the configured backend and wire up a service.
    pub fn build_service(&self) -> Result<SymlinkService, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let backend = self.backend.open()?;
        let store = SymlinkStore::new(backend, self.store.metadata_file_name.clone())
            .with_retry_policy(self.retry.policy());
        Ok(SymlinkService::new(store))
    }
}
