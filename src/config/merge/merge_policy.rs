//! Merge rules: defaults, override order, conflict handling.

use crate::store::retry::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF, DEFAULT_MAX_RETRIES,
};
use crate::store::DEFAULT_METADATA_FILE_NAME;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key, so a file that only sets
/// `retry.max_retries` keeps every other default.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("store.metadata_file_name", DEFAULT_METADATA_FILE_NAME)?
        .set_default("retry.max_retries", DEFAULT_MAX_RETRIES as i64)?
        .set_default(
            "retry.initial_backoff_ms",
            DEFAULT_INITIAL_BACKOFF.as_millis() as i64,
        )?
        .set_default("retry.max_backoff_ms", DEFAULT_MAX_BACKOFF.as_millis() as i64)?
        .set_default("retry.backoff_multiplier", DEFAULT_BACKOFF_MULTIPLIER as i64)?
        .set_default("backend.kind", "sled")
}
