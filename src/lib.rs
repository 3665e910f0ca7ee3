//! Tether: shared symlink metadata for object-store filesystems
//!
//! Object stores have no symlinks. Tether keeps them in one small JSON object
//! per directory and updates it with conditional writes, so several mounts of
//! the same bucket can create and remove symlinks without losing each other's
//! changes.

pub mod backend;
pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod service;
pub mod store;
pub mod types;
