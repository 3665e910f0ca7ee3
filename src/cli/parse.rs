//! CLI parse: clap types for Tether. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tether CLI - inspect and edit shared symlink metadata
#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Inspect and edit per-directory symlink metadata in an object store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Local sled store directory (overrides backend.path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the symlinks of a directory
    Ls {
        /// Directory prefix ("" for the bucket root)
        #[arg(default_value = "")]
        dir: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a symlink
    Ln {
        dir: String,
        name: String,
        target: String,
    },
    /// Remove a symlink
    Rm { dir: String, name: String },
    /// Print the target of a symlink
    Readlink { dir: String, name: String },
    /// Print a directory's raw metadata document
    Cat {
        #[arg(default_value = "")]
        dir: String,
    },
}
