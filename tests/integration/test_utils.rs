//! Shared test utilities for integration tests
//!
//! Backend wrappers that inject failures or record the conditions the store
//! sends, so the write protocol can be observed from outside.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tether::backend::{GetOutcome, InMemoryBackend, ObjectBackend, WriteCondition};
use tether::error::BackendError;
use tether::store::{RetryPolicy, SymlinkStore};
use tether::types::VersionToken;

pub const FILE: &str = ".symlinks";

/// Retry policy with millisecond backoffs so tests stay fast.
pub fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries).with_backoff(Duration::from_millis(1), Duration::from_millis(4))
}

pub fn fast_store(backend: Arc<dyn ObjectBackend>, max_retries: u32) -> SymlinkStore {
    SymlinkStore::new(backend, FILE).with_retry_policy(fast_policy(max_retries))
}

/// Every put fails its precondition; reads and deletes hit the inner backend.
pub struct AlwaysConflictBackend {
    pub inner: Arc<InMemoryBackend>,
    pub puts: AtomicU64,
}

impl AlwaysConflictBackend {
    pub fn new(inner: Arc<InMemoryBackend>) -> Self {
        Self {
            inner,
            puts: AtomicU64::new(0),
        }
    }

    pub fn put_attempts(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }
}

impl ObjectBackend for AlwaysConflictBackend {
    fn get(&self, key: &str, if_none_match: Option<&VersionToken>) -> Result<GetOutcome, BackendError> {
        self.inner.get(key, if_none_match)
    }

    fn put(&self, key: &str, _body: &[u8], _condition: &WriteCondition) -> Result<VersionToken, BackendError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::PreconditionFailed { key: key.to_string() })
    }

    fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.inner.delete(key)
    }
}

/// Every put fails with a transport error.
pub struct FailingBackend {
    pub inner: Arc<InMemoryBackend>,
}

impl ObjectBackend for FailingBackend {
    fn get(&self, key: &str, if_none_match: Option<&VersionToken>) -> Result<GetOutcome, BackendError> {
        self.inner.get(key, if_none_match)
    }

    fn put(&self, _key: &str, _body: &[u8], _condition: &WriteCondition) -> Result<VersionToken, BackendError> {
        Err(BackendError::Other("network error: connection refused".to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.inner.delete(key)
    }
}

/// Records the condition of every put and the key of every delete.
pub struct RecordingBackend {
    pub inner: Arc<InMemoryBackend>,
    pub conditions: Mutex<Vec<WriteCondition>>,
    pub deletes: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn new(inner: Arc<InMemoryBackend>) -> Self {
        Self {
            inner,
            conditions: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    pub fn conditions(&self) -> Vec<WriteCondition> {
        self.conditions.lock().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().clone()
    }
}

impl ObjectBackend for RecordingBackend {
    fn get(&self, key: &str, if_none_match: Option<&VersionToken>) -> Result<GetOutcome, BackendError> {
        self.inner.get(key, if_none_match)
    }

    fn put(&self, key: &str, body: &[u8], condition: &WriteCondition) -> Result<VersionToken, BackendError> {
        self.conditions.lock().push(condition.clone());
        self.inner.put(key, body, condition)
    }

    fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.deletes.lock().push(key.to_string());
        self.inner.delete(key)
    }
}

/// Answers an `If-Match` put on a missing key with `NotFound`, as S3 does.
pub struct S3StyleBackend {
    pub inner: Arc<InMemoryBackend>,
}

impl ObjectBackend for S3StyleBackend {
    fn get(&self, key: &str, if_none_match: Option<&VersionToken>) -> Result<GetOutcome, BackendError> {
        self.inner.get(key, if_none_match)
    }

    fn put(&self, key: &str, body: &[u8], condition: &WriteCondition) -> Result<VersionToken, BackendError> {
        if matches!(condition, WriteCondition::IfMatch(_)) && !self.inner.contains(key) {
            return Err(BackendError::NotFound { key: key.to_string() });
        }
        self.inner.put(key, body, condition)
    }

    fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.inner.delete(key)
    }
}
