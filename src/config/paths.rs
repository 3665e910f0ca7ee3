//! XDG locations for config and local store data.

use crate::error::ApiError;
use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs, ApiError> {
    ProjectDirs::from("", "", "tether").ok_or_else(|| {
        ApiError::ConfigError("Could not determine home directory".to_string())
    })
}

/// `$XDG_CONFIG_HOME/tether/config.toml`
pub fn global_config_file() -> Result<PathBuf, ApiError> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// `$XDG_DATA_HOME/tether/store`, the default sled database directory.
pub fn default_store_path() -> Result<PathBuf, ApiError> {
    Ok(project_dirs()?.data_dir().join("store"))
}
