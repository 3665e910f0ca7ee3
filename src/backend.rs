//! Object-storage backend contract
//!
//! The metadata layer only needs three operations on a single key, but it needs
//! them to be atomic and strongly consistent: a read that can short-circuit on
//! an unchanged version token, a put guarded by `If-Match` / `If-None-Match`,
//! and a delete. Everything above this trait is correct only as long as the
//! backend honours those preconditions atomically.

pub mod memory;
pub mod persistence;

pub use memory::{BackendStats, InMemoryBackend};
pub use persistence::SledObjectBackend;

use crate::error::BackendError;
use crate::types::VersionToken;

/// Object body plus the token identifying this revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectData {
    pub body: Vec<u8>,
    pub etag: VersionToken,
}

/// Result of a (possibly conditional) read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetOutcome {
    Found(ObjectData),
    /// The caller's `if_none_match` token still names the current revision.
    NotModified,
}

/// Precondition attached to a put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCondition {
    Unconditional,
    /// `If-None-Match: *` - create only if no object exists.
    IfAbsent,
    /// `If-Match: <token>` - replace only if the current token is `token`.
    IfMatch(VersionToken),
}

impl WriteCondition {
    /// Condition for a save that expects `token` to be current.
    /// The empty token means the object is expected not to exist.
    pub fn expecting(token: &VersionToken) -> Self {
        if token.is_empty() {
            WriteCondition::IfAbsent
        } else {
            WriteCondition::IfMatch(token.clone())
        }
    }

    /// Value for an `If-Match` header, if any.
    pub fn if_match(&self) -> Option<&str> {
        match self {
            WriteCondition::IfMatch(token) => Some(token.as_str()),
            _ => None,
        }
    }

    /// Value for an `If-None-Match` header, if any.
    pub fn if_none_match(&self) -> Option<&str> {
        match self {
            WriteCondition::IfAbsent => Some("*"),
            _ => None,
        }
    }
}

/// Storage backend consumed by the metadata layer.
pub trait ObjectBackend: Send + Sync {
    /// Read `key`. Returns `NotModified` when `if_none_match` equals the
    /// current token, and `BackendError::NotFound` when there is no object.
    fn get(&self, key: &str, if_none_match: Option<&VersionToken>)
        -> Result<GetOutcome, BackendError>;

    /// Write `key` if `condition` holds, returning the new token.
    /// A failed condition is `BackendError::PreconditionFailed`.
    fn put(
        &self,
        key: &str,
        body: &[u8],
        condition: &WriteCondition,
    ) -> Result<VersionToken, BackendError>;

    /// Remove `key`. Implementations may report `NotFound` for a missing key.
    fn delete(&self, key: &str) -> Result<(), BackendError>;
}

/// Content-derived version token, quoted the way S3 quotes ETags.
pub fn content_token(body: &[u8]) -> VersionToken {
    let hash = blake3::hash(body);
    VersionToken::new(format!("\"{}\"", hex::encode(&hash.as_bytes()[..16])))
}
