//! CLI route: single route table and run context. Dispatches to the symlink service and presentation.

use crate::backend::GetOutcome;
use crate::config::{BackendKind, ConfigLoader, TetherConfig};
use crate::error::{ApiError, BackendError};
use crate::service::SymlinkService;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::parse::Commands;
use crate::cli::presentation::{format_document_raw, format_symlink_list};

/// Runtime context for CLI execution: loaded config and the service built from it.
pub struct RunContext {
    config: TetherConfig,
    service: SymlinkService,
}

impl RunContext {
    /// Load config (explicit file or layered defaults), apply the `--store`
    /// override and open the backend.
    pub fn new(config_path: Option<PathBuf>, store_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let mut config = ConfigLoader::load_with(config_path.as_deref())?;
        if let Some(path) = store_path {
            config.backend.kind = BackendKind::Sled;
            config.backend.path = Some(path);
        }
        Self::from_config(config)
    }

    pub fn from_config(config: TetherConfig) -> Result<Self, ApiError> {
        let service = config.build_service()?;
        Ok(Self { config, service })
    }

    pub fn config(&self) -> &TetherConfig {
        &self.config
    }

    pub fn service(&self) -> &SymlinkService {
        &self.service
    }

    /// Execute a command and return its printable output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        debug!(command = command_name(command), "Executing command");
        match command {
            Commands::Ls { dir, format } => {
                let entries = self.service.list_symlinks(dir)?;
                format_symlink_list(&entries, format)
            }
            Commands::Ln { dir, name, target } => {
                let token = self.service.create_symlink(dir, name, target)?;
                Ok(format!("{} -> {} ({})", name, target, token))
            }
            Commands::Rm { dir, name } => {
                if self.service.remove_symlink(dir, name)? {
                    Ok(format!("Removed {}", name))
                } else {
                    Err(ApiError::InvalidArgument(format!("{} is not a symlink", name)))
                }
            }
            Commands::Readlink { dir, name } => match self.service.read_link(dir, name)? {
                Some(target) => Ok(target),
                None => Err(ApiError::InvalidArgument(format!("{} is not a symlink", name))),
            },
            Commands::Cat { dir } => {
                let store = self.service.store();
                let key = store.key_for(dir);
                match store.backend().get(&key, None) {
                    Ok(GetOutcome::Found(object)) => Ok(format_document_raw(Some(&object.body))),
                    Ok(GetOutcome::NotModified) | Err(BackendError::NotFound { .. }) => {
                        Ok(format_document_raw(None))
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Ls { .. } => "ls",
        Commands::Ln { .. } => "ln",
        Commands::Rm { .. } => "rm",
        Commands::Readlink { .. } => "readlink",
        Commands::Cat { .. } => "cat",
    }
}
