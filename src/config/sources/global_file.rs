//! Global config file source: $XDG_CONFIG_HOME/tether/config.toml

use super::super::paths;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

/// Add the global config file, if one exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match paths::global_config_file() {
        Ok(path) if path.exists() => Ok(add_file(builder, &path, false)),
        _ => Ok(builder),
    }
}

/// Add a specific config file. A missing required file fails the build.
pub fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from(path).required(required))
}
