//! Shared value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque revision identifier handed out by the storage backend (an entity tag).
///
/// Equal tokens mean equal content. The empty token stands for "no backing
/// object known", which is what a conditional create expects. Tokens are only
/// ever compared for equality; they carry no ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        VersionToken(token.into())
    }

    /// The token of an object that does not exist.
    pub fn empty() -> Self {
        VersionToken(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VersionToken {
    fn from(token: String) -> Self {
        VersionToken(token)
    }
}

impl From<&str> for VersionToken {
    fn from(token: &str) -> Self {
        VersionToken(token.to_string())
    }
}

/// Seconds since the Unix epoch.
pub type UnixSeconds = i64;
