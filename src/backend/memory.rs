//! In-process backend
//!
//! A mutex-guarded map with the same conditional-write semantics as the real
//! object store. Every operation runs under one lock, so checks and writes are
//! atomic. Used for tests and for embedding where no bucket is available.

use super::{content_token, GetOutcome, ObjectBackend, ObjectData, WriteCondition};
use crate::error::BackendError;
use crate::types::VersionToken;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Request counters, for observing how much traffic the metadata layer issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub gets: u64,
    pub puts: u64,
    pub deletes: u64,
}

#[derive(Default)]
pub struct InMemoryBackend {
    objects: Mutex<HashMap<String, ObjectData>>,
    gets: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> BackendStats {
        BackendStats {
            gets: self.gets.load(Ordering::SeqCst),
            puts: self.puts.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().contains_key(key)
    }

    /// Current body and token of `key`, bypassing the counters.
    pub fn object(&self, key: &str) -> Option<ObjectData> {
        self.objects.lock().get(key).cloned()
    }

    /// Store raw bytes without any precondition, as an out-of-band writer would.
    pub fn insert_raw(&self, key: &str, body: impl Into<Vec<u8>>) -> VersionToken {
        let body = body.into();
        let etag = content_token(&body);
        self.objects.lock().insert(
            key.to_string(),
            ObjectData {
                body,
                etag: etag.clone(),
            },
        );
        etag
    }

    /// Remove an object out-of-band.
    pub fn remove_raw(&self, key: &str) -> Option<ObjectData> {
        self.objects.lock().remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl ObjectBackend for InMemoryBackend {
    fn get(
        &self,
        key: &str,
        if_none_match: Option<&VersionToken>,
    ) -> Result<GetOutcome, BackendError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock();
        let object = objects.get(key).ok_or_else(|| BackendError::NotFound {
            key: key.to_string(),
        })?;

        if if_none_match == Some(&object.etag) {
            return Ok(GetOutcome::NotModified);
        }
        Ok(GetOutcome::Found(object.clone()))
    }

    fn put(
        &self,
        key: &str,
        body: &[u8],
        condition: &WriteCondition,
    ) -> Result<VersionToken, BackendError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock();

        let holds = match (condition, objects.get(key)) {
            (WriteCondition::Unconditional, _) => true,
            (WriteCondition::IfAbsent, existing) => existing.is_none(),
            (WriteCondition::IfMatch(expected), Some(current)) => current.etag == *expected,
            (WriteCondition::IfMatch(_), None) => false,
        };
        if !holds {
            return Err(BackendError::PreconditionFailed {
                key: key.to_string(),
            });
        }

        let etag = content_token(body);
        objects.insert(
            key.to_string(),
            ObjectData {
                body: body.to_vec(),
                etag: etag.clone(),
            },
        );
        Ok(etag)
    }

    fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        match self.objects.lock().remove(key) {
            Some(_) => Ok(()),
            None => Err(BackendError::NotFound {
                key: key.to_string(),
            }),
        }
    }
}
