//! Symlink metadata store
//!
//! Load, save and delete a directory's [`SymlinksDocument`] against an
//! [`ObjectBackend`], plus the optimistic-concurrency loop that keeps the
//! document coherent across mounts that share a bucket but share nothing else.
//!
//! # Write policy
//!
//! | document | expected token | backend call |
//! |---|---|---|
//! | empty | empty | none |
//! | empty | set | unconditional delete |
//! | non-empty | empty | put `If-None-Match: *` |
//! | non-empty | set | put `If-Match: <token>` |
//!
//! A failed precondition is a [`SymlinkError::ConflictDetected`]. Nothing else
//! is ever reported as a conflict.

pub mod key;
pub mod retry;

pub use key::resolve_key;
pub use retry::{BackoffSchedule, RetryPolicy};

use crate::backend::{GetOutcome, ObjectBackend, WriteCondition};
use crate::document::SymlinksDocument;
use crate::error::{BackendError, SymlinkError};
use crate::types::VersionToken;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default name of the per-directory metadata object.
pub const DEFAULT_METADATA_FILE_NAME: &str = ".symlinks";

/// Outcome of [`SymlinkStore::load_if_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The cached token is still current; nothing was transferred.
    Unchanged(VersionToken),
    /// A fresh document (empty with an empty token if the object is gone).
    Loaded(SymlinksDocument, VersionToken),
}

/// A document as persisted by [`SymlinkStore::save_with_retry`].
#[derive(Debug, Clone)]
pub struct Persisted {
    /// The document that was finally written (after any merges).
    pub document: SymlinksDocument,
    /// Token of the written object; empty if the document ended up absent.
    pub token: VersionToken,
    /// Number of conflicts that were resolved by reloading and merging.
    pub retries: u32,
}

pub struct SymlinkStore {
    backend: Arc<dyn ObjectBackend>,
    file_name: String,
    policy: RetryPolicy,
}

impl SymlinkStore {
    pub fn new(backend: Arc<dyn ObjectBackend>, file_name: impl Into<String>) -> Self {
        Self {
            backend,
            file_name: file_name.into(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn backend(&self) -> &Arc<dyn ObjectBackend> {
        &self.backend
    }

    /// Storage key of the document for `directory`.
    pub fn key_for(&self, directory: &str) -> String {
        resolve_key(directory, &self.file_name)
    }

    /// Fetch the document for `directory`.
    ///
    /// A missing object is not an error: it yields an empty document and an
    /// empty token.
    pub fn load(&self, directory: &str) -> Result<(SymlinksDocument, VersionToken), SymlinkError> {
        let key = self.key_for(directory);
        match self.backend.get(&key, None) {
            Ok(GetOutcome::Found(object)) => {
                let document = SymlinksDocument::parse(&object.body)?;
                Ok((document, object.etag))
            }
            // Only possible if a backend ignores the absent precondition.
            Ok(GetOutcome::NotModified) => Err(SymlinkError::Backend(BackendError::Other(
                format!("unexpected not-modified reply for unconditional read of {}", key),
            ))),
            Err(BackendError::NotFound { .. }) => Ok((SymlinksDocument::new(), VersionToken::empty())),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch the document only if it changed since `cached`.
    ///
    /// A deleted object always wins over the cache: the result is then an
    /// empty document with an empty token, whatever `cached` was.
    pub fn load_if_changed(
        &self,
        directory: &str,
        cached: &VersionToken,
    ) -> Result<LoadOutcome, SymlinkError> {
        let key = self.key_for(directory);
        let condition = if cached.is_empty() { None } else { Some(cached) };

        match self.backend.get(&key, condition) {
            Ok(GetOutcome::NotModified) => Ok(LoadOutcome::Unchanged(cached.clone())),
            Ok(GetOutcome::Found(object)) => {
                let document = SymlinksDocument::parse(&object.body)?;
                debug!(key = %key, etag = %object.etag, entries = document.len(), "Loaded symlink metadata");
                Ok(LoadOutcome::Loaded(document, object.etag))
            }
            Err(BackendError::NotFound { .. }) => Ok(LoadOutcome::Loaded(
                SymlinksDocument::new(),
                VersionToken::empty(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist `document`, expecting `expected` to be the current token.
    ///
    /// Returns the new token, which is empty when the document is (or stays)
    /// absent. See the module docs for the write policy.
    pub fn save(
        &self,
        directory: &str,
        document: &SymlinksDocument,
        expected: &VersionToken,
    ) -> Result<VersionToken, SymlinkError> {
        let key = self.key_for(directory);

        if document.is_empty() {
            if expected.is_empty() {
                return Ok(VersionToken::empty());
            }
            self.delete_key(&key)?;
            info!(key = %key, "Deleted empty symlink metadata");
            return Ok(VersionToken::empty());
        }

        let body = document.serialize()?;
        let condition = WriteCondition::expecting(expected);

        match self.backend.put(&key, &body, &condition) {
            Ok(token) => {
                if expected.is_empty() {
                    info!(key = %key, "Created symlink metadata");
                }
                Ok(token)
            }
            Err(BackendError::PreconditionFailed { .. }) => {
                Err(SymlinkError::ConflictDetected { key })
            }
            // If-Match against an object that was deleted in the meantime.
            Err(BackendError::NotFound { .. }) if !expected.is_empty() => {
                Err(SymlinkError::ConflictDetected { key })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unconditionally delete the document for `directory`.
    pub fn delete(&self, directory: &str) -> Result<(), SymlinkError> {
        self.delete_key(&self.key_for(directory))
    }

    fn delete_key(&self, key: &str) -> Result<(), SymlinkError> {
        match self.backend.delete(key) {
            Ok(()) | Err(BackendError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist `document`, resolving write conflicts by reload and merge.
    ///
    /// On a conflict the loop backs off, reloads the authoritative document
    /// and hands it to `merge`, which must fold the caller's intended change
    /// into it. The merged result is saved against the reloaded token. Only
    /// conflicts are retried; a merge error or any other failure ends the loop
    /// immediately. No lock is held between attempts.
    pub fn save_with_retry<F>(
        &self,
        directory: &str,
        document: SymlinksDocument,
        expected: &VersionToken,
        mut merge: F,
    ) -> Result<Persisted, SymlinkError>
    where
        F: FnMut(SymlinksDocument) -> anyhow::Result<SymlinksDocument>,
    {
        let mut document = document;
        let mut expected = expected.clone();
        let mut backoff = self.policy.schedule();
        let mut retries = 0;

        loop {
            let conflict = match self.save(directory, &document, &expected) {
                Ok(token) => {
                    if retries > 0 {
                        debug!(directory, retries, "Symlink metadata saved after conflicts");
                    }
                    return Ok(Persisted {
                        document,
                        token,
                        retries,
                    });
                }
                Err(e) if e.is_conflict() => e,
                Err(e) => return Err(e),
            };

            if retries >= self.policy.max_retries {
                warn!(
                    directory,
                    max_retries = self.policy.max_retries,
                    "Giving up on conflicting symlink metadata write"
                );
                return Err(SymlinkError::RetriesExceeded {
                    max_retries: self.policy.max_retries,
                    last: Box::new(conflict),
                });
            }

            let wait = backoff.next_wait();
            debug!(
                directory,
                attempt = retries + 1,
                backoff_ms = wait.as_millis() as u64,
                "Symlink metadata conflict, retrying"
            );
            std::thread::sleep(wait);

            let (remote, token) = self.load(directory).map_err(|e| {
                warn!(directory, error = %e, "Failed to reload symlink metadata during retry");
                e
            })?;

            document = merge(remote).map_err(SymlinkError::MergeFailed)?;
            expected = token;
            retries += 1;
        }
    }
}
