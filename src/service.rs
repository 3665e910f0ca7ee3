//! Symlink service
//!
//! What the filesystem dispatcher and the directory-listing layer call. Each
//! mount builds one [`SymlinkService`] over the shared bucket; mutations go
//! through the store's retry loop and the service keeps its cache in step with
//! whatever was persisted.
//!
//! If a directory's metadata object is deleted out-of-band, its symlinks are
//! gone until a new symlink is created there or the object is restored. The
//! service does not rebuild it.

use crate::cache::SymlinkCache;
use crate::document::{SymlinkEntry, SymlinksDocument};
use crate::error::SymlinkError;
use crate::store::{Persisted, SymlinkStore};
use crate::types::VersionToken;
use anyhow::anyhow;
use tracing::{debug, info};

pub struct SymlinkService {
    store: SymlinkStore,
    cache: SymlinkCache,
}

impl SymlinkService {
    pub fn new(store: SymlinkStore) -> Self {
        Self::with_cache(store, SymlinkCache::new())
    }

    pub fn with_cache(store: SymlinkStore, cache: SymlinkCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &SymlinkStore {
        &self.store
    }

    pub fn cache(&self) -> &SymlinkCache {
        &self.cache
    }

    /// Whether `name` is this layer's own metadata object, which listings hide.
    pub fn is_metadata_file(&self, name: &str) -> bool {
        name == self.store.file_name()
    }

    fn validate_name(&self, name: &str) -> Result<(), SymlinkError> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || self.is_metadata_file(name)
        {
            return Err(SymlinkError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// Create symlink `name` in `directory` pointing at `target`.
    ///
    /// Fails with `AlreadyExists` if the name is already a symlink. If another
    /// mount creates the same name concurrently, the merge keeps its entry when
    /// the targets agree and fails otherwise.
    pub fn create_symlink(
        &self,
        directory: &str,
        name: &str,
        target: &str,
    ) -> Result<VersionToken, SymlinkError> {
        self.validate_name(name)?;

        let current = self.cache.refresh(&self.store, directory)?;
        if current.document.has(name) {
            return Err(SymlinkError::AlreadyExists(name.to_string()));
        }

        let mut document = (*current.document).clone();
        document.add_or_replace(name, target);

        let persisted = self.store.save_with_retry(
            directory,
            document,
            &current.token,
            |mut remote: SymlinksDocument| {
                match remote.get(name) {
                    Some(existing) if existing == target => {}
                    Some(existing) => {
                        return Err(anyhow!(
                            "symlink {} was concurrently created with target {}",
                            name,
                            existing
                        ))
                    }
                    None => remote.add_or_replace(name, target),
                }
                Ok(remote)
            },
        )?;

        info!(directory, name, target, "Created symlink");
        Ok(self.remember(directory, persisted))
    }

    /// Remove symlink `name` from `directory`. Returns `false` if it was not a
    /// symlink, in which case nothing is written.
    pub fn remove_symlink(&self, directory: &str, name: &str) -> Result<bool, SymlinkError> {
        let current = self.cache.refresh(&self.store, directory)?;
        if !current.document.has(name) {
            return Ok(false);
        }

        let mut document = (*current.document).clone();
        document.remove(name);

        let persisted = self.store.save_with_retry(
            directory,
            document,
            &current.token,
            |mut remote: SymlinksDocument| {
                remote.remove(name);
                Ok(remote)
            },
        )?;

        info!(directory, name, "Removed symlink");
        self.remember(directory, persisted);
        Ok(true)
    }

    /// Target of `name` if it is a symlink in `directory`.
    pub fn read_link(&self, directory: &str, name: &str) -> Result<Option<String>, SymlinkError> {
        let current = self.cache.refresh(&self.store, directory)?;
        Ok(current.document.get(name).map(str::to_string))
    }

    pub fn is_symlink(&self, directory: &str, name: &str) -> Result<bool, SymlinkError> {
        let current = self.cache.refresh(&self.store, directory)?;
        Ok(current.document.has(name))
    }

    /// All symlinks of `directory`, in name order.
    pub fn list_symlinks(
        &self,
        directory: &str,
    ) -> Result<Vec<(String, SymlinkEntry)>, SymlinkError> {
        let current = self.cache.refresh(&self.store, directory)?;
        Ok(current
            .document
            .iter()
            .map(|(name, entry)| (name.to_string(), entry.clone()))
            .collect())
    }

    fn remember(&self, directory: &str, persisted: Persisted) -> VersionToken {
        debug!(directory, retries = persisted.retries, etag = %persisted.token, "Caching persisted symlink metadata");
        let token = persisted.token.clone();
        self.cache.store(directory, persisted.document, persisted.token);
        token
    }
}
