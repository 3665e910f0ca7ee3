//! Local symlink metadata cache
//!
//! Holds the last document loaded for each directory together with its
//! version token and load time. Readers share a directory's entry; a refresh
//! replaces the whole triple at once. Entries never expire on their own:
//! callers validate them with a conditional load, which costs one round trip
//! and no transfer when nothing changed.
//!
//! Each mount owns its own [`SymlinkCache`]; nothing here is global.

use crate::document::SymlinksDocument;
use crate::error::SymlinkError;
use crate::store::{LoadOutcome, SymlinkStore};
use crate::types::VersionToken;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One directory's cached document.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub document: Arc<SymlinksDocument>,
    pub token: VersionToken,
    pub loaded_at: DateTime<Utc>,
}

impl CachedDocument {
    pub fn new(document: SymlinksDocument, token: VersionToken) -> Self {
        Self {
            document: Arc::new(document),
            token,
            loaded_at: Utc::now(),
        }
    }
}

/// Cache slot for a single directory.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    slot: RwLock<Option<CachedDocument>>,
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the cached entry. The document itself is shared, not copied.
    pub fn get(&self) -> Option<CachedDocument> {
        self.slot.read().clone()
    }

    /// Cached token, or the empty token when nothing is cached.
    pub fn token(&self) -> VersionToken {
        self.slot
            .read()
            .as_ref()
            .map(|cached| cached.token.clone())
            .unwrap_or_default()
    }

    pub fn replace(&self, cached: CachedDocument) {
        *self.slot.write() = Some(cached);
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }
}

/// Per-mount cache of symlink documents, indexed by directory prefix.
#[derive(Debug, Default)]
pub struct SymlinkCache {
    directories: RwLock<HashMap<String, Arc<DirectoryCache>>>,
}

impl SymlinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `directory`, created on first use.
    pub fn directory(&self, directory: &str) -> Arc<DirectoryCache> {
        if let Some(slot) = self.directories.read().get(directory) {
            return slot.clone();
        }
        self.directories
            .write()
            .entry(directory.to_string())
            .or_default()
            .clone()
    }

    pub fn get(&self, directory: &str) -> Option<CachedDocument> {
        self.directories
            .read()
            .get(directory)
            .and_then(|slot| slot.get())
    }

    pub fn store(&self, directory: &str, document: SymlinksDocument, token: VersionToken) {
        self.directory(directory)
            .replace(CachedDocument::new(document, token));
    }

    /// Drop `directory` from the cache. A slot already handed out is cleared and detached.
    pub fn invalidate(&self, directory: &str) {
        if let Some(slot) = self.directories.write().remove(directory) {
            slot.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.directories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.read().is_empty()
    }

    /// Validate the cached entry for `directory` against the backend.
    ///
    /// Issues a conditional load with the cached token. An unchanged document
    /// is returned as cached; anything else replaces the entry. No lock is held
    /// across the backend call.
    pub fn refresh(
        &self,
        store: &SymlinkStore,
        directory: &str,
    ) -> Result<CachedDocument, SymlinkError> {
        let slot = self.directory(directory);
        let cached = slot.get();
        let token = cached
            .as_ref()
            .map(|c| c.token.clone())
            .unwrap_or_default();

        match store.load_if_changed(directory, &token)? {
            LoadOutcome::Unchanged(_) => {
                if let Some(cached) = cached {
                    return Ok(cached);
                }
                // A token with no entry cannot come from this slot; reload fully.
                let (document, token) = store.load(directory)?;
                let fresh = CachedDocument::new(document, token);
                slot.replace(fresh.clone());
                Ok(fresh)
            }
            LoadOutcome::Loaded(document, token) => {
                debug!(directory, etag = %token, "Refreshed symlink cache");
                let fresh = CachedDocument::new(document, token);
                slot.replace(fresh.clone());
                Ok(fresh)
            }
        }
    }
}
