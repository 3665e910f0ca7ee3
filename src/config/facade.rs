//! Config loader: runs the layered sources and deserializes the result.

use super::merge::merge_policy;
use super::sources::{environment, global_file};
use super::TetherConfig;
use config::ConfigError;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global config file, then the environment.
    pub fn load() -> Result<TetherConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Defaults, then `path` (which must exist), then the environment.
    pub fn load_from_file(path: &Path) -> Result<TetherConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_file(builder, path, true);
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// `load_from_file` when a path is given, `load` otherwise.
    pub fn load_with(path: Option<&Path>) -> Result<TetherConfig, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }
}
