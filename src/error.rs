//! Error types for the symlink metadata layer.

use thiserror::Error;

/// Errors reported by an object-storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The write precondition (`If-Match` / `If-None-Match`) did not hold.
    #[error("precondition failed for {key}")]
    PreconditionFailed { key: String },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Other(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }

    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, BackendError::PreconditionFailed { .. })
    }
}

/// Errors from document handling and the load/save protocol.
#[derive(Debug, Error)]
pub enum SymlinkError {
    #[error("malformed symlink metadata document: {0}")]
    MalformedDocument(#[source] serde_json::Error),

    #[error("unsupported symlink metadata schema version {found} (supported: {supported})")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },

    #[error("failed to serialize symlink metadata: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Another writer changed (or created, or deleted) the document first.
    #[error("conflict detected writing {key}")]
    ConflictDetected { key: String },

    #[error("symlink metadata conflict: max retries ({max_retries}) exceeded: {last}")]
    RetriesExceeded {
        max_retries: u32,
        #[source]
        last: Box<SymlinkError>,
    },

    #[error("merge function failed: {0}")]
    MergeFailed(#[source] anyhow::Error),

    #[error("invalid symlink name: {0:?}")]
    InvalidName(String),

    #[error("symlink already exists: {0}")]
    AlreadyExists(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SymlinkError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, SymlinkError::ConflictDetected { .. })
    }
}

/// Errors surfaced at the outer layer: configuration, logging and the CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Symlink(#[from] SymlinkError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Symlink(SymlinkError::Backend(err))
    }
}
