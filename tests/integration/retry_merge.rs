//! Integration tests for conflict retry with reload and merge

use super::test_utils::{fast_store, AlwaysConflictBackend, FailingBackend, S3StyleBackend};
use anyhow::anyhow;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tether::backend::InMemoryBackend;
use tether::document::SymlinksDocument;
use tether::error::{BackendError, SymlinkError};
use tether::types::VersionToken;

fn add(name: &'static str, target: &'static str) -> impl FnMut(SymlinksDocument) -> anyhow::Result<SymlinksDocument> {
    move |mut remote| {
        remote.add_or_replace(name, target);
        Ok(remote)
    }
}

/// Two mounts adding different links to the same directory both survive
#[test]
fn test_concurrent_creates_both_persist() {
    let backend = Arc::new(InMemoryBackend::new());
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = [("a", "../a"), ("b", "../b")]
        .into_iter()
        .map(|(name, target)| {
            let store = fast_store(backend.clone(), 3);
            let barrier = barrier.clone();
            thread::spawn(move || {
                let (mut document, token) = store.load("shared").unwrap();
                // Both writers start from the same (absent) version.
                barrier.wait();
                document.add_or_replace(name, target);

                let merges = AtomicU32::new(0);
                let persisted = store
                    .save_with_retry("shared", document, &token, |mut remote| {
                        merges.fetch_add(1, Ordering::SeqCst);
                        remote.add_or_replace(name, target);
                        Ok(remote)
                    })
                    .unwrap();
                assert_eq!(persisted.retries, merges.load(Ordering::SeqCst));
                persisted.retries
            })
        })
        .collect();

    let mut retries: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    retries.sort();
    assert_eq!(retries, vec![0, 1]);

    let store = fast_store(backend.clone(), 3);
    let (document, _) = store.load("shared").unwrap();
    assert_eq!(document.get("a"), Some("../a"));
    assert_eq!(document.get("b"), Some("../b"));
}

/// A writer that keeps losing gives up after exactly max_retries merges
#[test]
fn test_retries_exhausted() {
    let inner = Arc::new(InMemoryBackend::new());
    let backend = Arc::new(AlwaysConflictBackend::new(inner));
    let store = fast_store(backend.clone(), 2);

    let mut document = SymlinksDocument::new();
    document.add_or_replace("a", "../a");
    let merges = AtomicU32::new(0);

    let err = store
        .save_with_retry("dir", document, &VersionToken::empty(), |mut remote| {
            merges.fetch_add(1, Ordering::SeqCst);
            remote.add_or_replace("a", "../a");
            Ok(remote)
        })
        .unwrap_err();

    assert_eq!(merges.load(Ordering::SeqCst), 2);
    assert_eq!(backend.put_attempts(), 3);
    match &err {
        SymlinkError::RetriesExceeded { max_retries, last } => {
            assert_eq!(*max_retries, 2);
            assert!(last.is_conflict());
        }
        other => panic!("expected RetriesExceeded, got {:?}", other),
    }
    assert!(err.to_string().contains("max retries (2) exceeded"));
}

/// Transport failures are not conflicts and are never retried
#[test]
fn test_network_error_not_retried() {
    let backend = Arc::new(FailingBackend {
        inner: Arc::new(InMemoryBackend::new()),
    });
    let store = fast_store(backend, 3);

    let mut document = SymlinksDocument::new();
    document.add_or_replace("a", "../a");
    let merges = AtomicU32::new(0);

    let err = store
        .save_with_retry("dir", document, &VersionToken::empty(), |remote| {
            merges.fetch_add(1, Ordering::SeqCst);
            Ok(remote)
        })
        .unwrap_err();

    assert_eq!(merges.load(Ordering::SeqCst), 0);
    assert!(!err.is_conflict());
    assert!(matches!(err, SymlinkError::Backend(BackendError::Other(ref msg)) if msg.contains("connection refused")));
}

/// A merge that refuses the remote state aborts the save
#[test]
fn test_merge_error_aborts() {
    let inner = Arc::new(InMemoryBackend::new());
    inner.insert_raw(
        "dir/.symlinks",
        r#"{"version":1,"symlinks":{"a":{"target":"../other","mtime":1}}}"#,
    );
    let store = fast_store(inner.clone(), 3);

    let mut document = SymlinksDocument::new();
    document.add_or_replace("a", "../a");

    let err = store
        .save_with_retry("dir", document, &VersionToken::empty(), |_remote| {
            Err(anyhow!("remote already has a"))
        })
        .unwrap_err();

    assert!(matches!(err, SymlinkError::MergeFailed(_)));
    let (remote, _) = store.load("dir").unwrap();
    assert_eq!(remote.get("a"), Some("../other"));
}

/// A stale token whose object was deleted meanwhile is treated as a conflict
#[test]
fn test_update_after_remote_delete_recreates() {
    let inner = Arc::new(InMemoryBackend::new());
    let stale = inner.insert_raw(
        "dir/.symlinks",
        r#"{"version":1,"symlinks":{"a":{"target":"../a","mtime":1}}}"#,
    );
    inner.remove_raw("dir/.symlinks");
    let store = fast_store(inner.clone(), 3);

    let mut document = SymlinksDocument::new();
    document.add_or_replace("b", "../b");

    let persisted = store
        .save_with_retry("dir", document, &stale, add("b", "../b"))
        .unwrap();
    assert_eq!(persisted.retries, 1);
    assert!(!persisted.document.has("a"));
    assert!(inner.contains("dir/.symlinks"));
}

/// A stale If-Match answered with NotFound is retried like any other conflict
#[test]
fn test_if_match_not_found_reloads_and_recreates() {
    let inner = Arc::new(InMemoryBackend::new());
    let stale = inner.insert_raw(
        "dir/.symlinks",
        r#"{"version":1,"symlinks":{"a":{"target":"../a","mtime":1}}}"#,
    );
    inner.remove_raw("dir/.symlinks");
    let store = fast_store(Arc::new(S3StyleBackend { inner: inner.clone() }), 3);

    let mut document = SymlinksDocument::new();
    document.add_or_replace("a", "../a");
    document.add_or_replace("b", "../b");
    let merges = AtomicU32::new(0);

    let persisted = store
        .save_with_retry("dir", document, &stale, |mut remote| {
            merges.fetch_add(1, Ordering::SeqCst);
            assert!(remote.is_empty());
            remote.add_or_replace("b", "../b");
            Ok(remote)
        })
        .unwrap();

    assert_eq!(persisted.retries, 1);
    assert_eq!(merges.load(Ordering::SeqCst), 1);
    assert!(!persisted.token.is_empty());
    let (remote, token) = store.load("dir").unwrap();
    assert_eq!(token, persisted.token);
    assert_eq!(remote.get("b"), Some("../b"));
    assert!(!remote.has("a"));
}

/// Zero retries surfaces the first conflict without reloading
#[test]
fn test_zero_retries() {
    let inner = Arc::new(InMemoryBackend::new());
    inner.insert_raw("dir/.symlinks", r#"{"version":1,"symlinks":{}}"#);
    let store = fast_store(inner.clone(), 0);

    let mut document = SymlinksDocument::new();
    document.add_or_replace("a", "../a");
    let err = store
        .save_with_retry("dir", document, &VersionToken::empty(), add("a", "../a"))
        .unwrap_err();
    assert!(matches!(err, SymlinkError::RetriesExceeded { max_retries: 0, .. }));
}
