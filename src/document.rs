//! Per-directory symlink metadata document
//!
//! One document describes every symlink that lives directly inside a directory.
//! It is stored as a single JSON object next to the directory's other objects:
//!
//! ```json
//! {
//!   "version": 1,
//!   "symlinks": {
//!     "link1": { "target": "../target1", "mtime": 1760000000 }
//!   }
//! }
//! ```
//!
//! An empty document is never persisted; "no symlinks" is represented by the
//! absence of the backing object.

use crate::error::SymlinkError;
use crate::types::UnixSeconds;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Current on-disk format version.
pub const SCHEMA_VERSION: u32 = 1;

/// One symlink record. Replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymlinkEntry {
    /// Link target, relative or absolute. Never resolved or checked for existence.
    pub target: String,

    /// When the entry was written.
    #[serde(rename = "mtime", alias = "modifiedAt", default)]
    pub modified_at: UnixSeconds,
}

impl SymlinkEntry {
    pub fn new(target: impl Into<String>, modified_at: UnixSeconds) -> Self {
        Self {
            target: target.into(),
            modified_at,
        }
    }
}

/// The full symlink set of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymlinksDocument {
    #[serde(rename = "version", alias = "schemaVersion", default)]
    schema_version: u32,

    #[serde(default, deserialize_with = "null_as_empty")]
    symlinks: BTreeMap<String, SymlinkEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, SymlinkEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, SymlinkEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for SymlinksDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SymlinksDocument {
    /// Create an empty document at the current schema version.
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            symlinks: BTreeMap::new(),
        }
    }

    /// Parse stored bytes.
    ///
    /// Empty input yields a fresh empty document. A missing or `null` symlink
    /// map is normalized to an empty map.
    pub fn parse(bytes: &[u8]) -> Result<Self, SymlinkError> {
        if bytes.is_empty() {
            return Ok(Self::new());
        }

        let document: SymlinksDocument =
            serde_json::from_slice(bytes).map_err(SymlinkError::MalformedDocument)?;

        if document.schema_version > SCHEMA_VERSION {
            return Err(SymlinkError::UnsupportedSchemaVersion {
                found: document.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        Ok(document)
    }

    /// Encode as pretty-printed JSON. Names are emitted in sorted order.
    pub fn serialize(&self) -> Result<Vec<u8>, SymlinkError> {
        serde_json::to_vec_pretty(self).map_err(SymlinkError::Serialize)
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Add or replace `name`, stamping the entry with the current time.
    pub fn add_or_replace(&mut self, name: impl Into<String>, target: impl Into<String>) {
        let now = chrono::Utc::now().timestamp();
        self.insert_entry(name, SymlinkEntry::new(target, now));
    }

    /// Insert a fully formed entry, keeping its timestamp.
    pub fn insert_entry(&mut self, name: impl Into<String>, entry: SymlinkEntry) {
        self.symlinks.insert(name.into(), entry);
    }

    /// Remove `name`, returning the old entry. Absent names are a no-op.
    pub fn remove(&mut self, name: &str) -> Option<SymlinkEntry> {
        self.symlinks.remove(name)
    }

    /// Target of `name`, if it is a symlink.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.symlinks.get(name).map(|entry| entry.target.as_str())
    }

    pub fn entry(&self, name: &str) -> Option<&SymlinkEntry> {
        self.symlinks.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.symlinks.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.symlinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symlinks.len()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymlinkEntry)> {
        self.symlinks.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}
