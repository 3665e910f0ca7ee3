//! Sled-backed object store
//!
//! Durable single-process backend. Conditional puts go through
//! `compare_and_swap` so the precondition check and the write are one atomic
//! step, matching what the remote store guarantees for a single key.

use super::{content_token, GetOutcome, ObjectBackend, ObjectData, WriteCondition};
use crate::error::BackendError;
use crate::types::VersionToken;
use std::path::Path;

pub struct SledObjectBackend {
    db: sled::Db,
}

fn sled_error(context: &str, err: sled::Error) -> BackendError {
    BackendError::Other(format!("{}: {}", context, err))
}

impl SledObjectBackend {
    /// Open (or create) a sled database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        let db = sled::open(path).map_err(|e| sled_error("Failed to open sled database", e))?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> Result<(), BackendError> {
        self.db
            .flush()
            .map_err(|e| sled_error("Failed to flush sled database", e))?;
        Ok(())
    }

    fn precondition_failed(key: &str) -> BackendError {
        BackendError::PreconditionFailed {
            key: key.to_string(),
        }
    }
}

impl ObjectBackend for SledObjectBackend {
    fn get(
        &self,
        key: &str,
        if_none_match: Option<&VersionToken>,
    ) -> Result<GetOutcome, BackendError> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| sled_error("Failed to read object", e))?
            .ok_or_else(|| BackendError::NotFound {
                key: key.to_string(),
            })?;

        let etag = content_token(&value);
        if if_none_match == Some(&etag) {
            return Ok(GetOutcome::NotModified);
        }
        Ok(GetOutcome::Found(ObjectData {
            body: value.to_vec(),
            etag,
        }))
    }

    fn put(
        &self,
        key: &str,
        body: &[u8],
        condition: &WriteCondition,
    ) -> Result<VersionToken, BackendError> {
        match condition {
            WriteCondition::Unconditional => {
                self.db
                    .insert(key.as_bytes(), body)
                    .map_err(|e| sled_error("Failed to write object", e))?;
            }
            WriteCondition::IfAbsent => {
                self.db
                    .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(body))
                    .map_err(|e| sled_error("Failed to create object", e))?
                    .map_err(|_| Self::precondition_failed(key))?;
            }
            WriteCondition::IfMatch(expected) => {
                let current = self
                    .db
                    .get(key.as_bytes())
                    .map_err(|e| sled_error("Failed to read object", e))?
                    .ok_or_else(|| Self::precondition_failed(key))?;
                if content_token(&current) != *expected {
                    return Err(Self::precondition_failed(key));
                }
                // The swap re-checks the exact bytes we validated.
                self.db
                    .compare_and_swap(key.as_bytes(), Some(current), Some(body))
                    .map_err(|e| sled_error("Failed to replace object", e))?
                    .map_err(|_| Self::precondition_failed(key))?;
            }
        }
        Ok(content_token(body))
    }

    fn delete(&self, key: &str) -> Result<(), BackendError> {
        match self
            .db
            .remove(key.as_bytes())
            .map_err(|e| sled_error("Failed to delete object", e))?
        {
            Some(_) => Ok(()),
            None => Err(BackendError::NotFound {
                key: key.to_string(),
            }),
        }
    }
}
