//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, SymlinkError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Symlink(SymlinkError::RetriesExceeded { max_retries, .. }) => format!(
            "{} (another writer kept updating the directory; gave up after {} retries)",
            e, max_retries
        ),
        _ => e.to_string(),
    }
}
