//! Integration tests for several mounts sharing one bucket

use super::test_utils::fast_store;
use std::sync::Arc;
use std::thread;
use tether::backend::InMemoryBackend;
use tether::error::SymlinkError;
use tether::service::SymlinkService;

fn mount(backend: &Arc<InMemoryBackend>) -> SymlinkService {
    SymlinkService::new(fast_store(backend.clone(), 5))
}

/// A link created on one mount is visible on another
#[test]
fn test_link_visible_across_mounts() {
    let backend = Arc::new(InMemoryBackend::new());
    let first = mount(&backend);
    let second = mount(&backend);

    assert!(second.list_symlinks("docs").unwrap().is_empty());
    first.create_symlink("docs", "readme", "../README.md").unwrap();

    assert_eq!(
        second.read_link("docs", "readme").unwrap().as_deref(),
        Some("../README.md")
    );
    assert!(second.create_symlink("docs", "readme", "../other").is_err());
}

/// A mount with a stale cache still merges instead of overwriting
#[test]
fn test_stale_cache_does_not_lose_links() {
    let backend = Arc::new(InMemoryBackend::new());
    let first = mount(&backend);
    let second = mount(&backend);

    first.create_symlink("dir", "a", "../a").unwrap();
    second.list_symlinks("dir").unwrap();
    first.create_symlink("dir", "b", "../b").unwrap();

    second.create_symlink("dir", "c", "../c").unwrap();
    let names: Vec<String> = first
        .list_symlinks("dir")
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

/// Removal on one mount and creation on another both take effect
#[test]
fn test_remove_and_create_interleaved() {
    let backend = Arc::new(InMemoryBackend::new());
    let first = mount(&backend);
    let second = mount(&backend);

    first.create_symlink("dir", "a", "../a").unwrap();
    first.create_symlink("dir", "b", "../b").unwrap();
    second.list_symlinks("dir").unwrap();

    assert!(first.remove_symlink("dir", "a").unwrap());
    second.create_symlink("dir", "c", "../c").unwrap();

    assert!(!second.is_symlink("dir", "a").unwrap());
    assert!(first.is_symlink("dir", "b").unwrap());
    assert!(first.is_symlink("dir", "c").unwrap());
}

/// Concurrent creators racing on one name: exactly one target wins
#[test]
fn test_same_name_different_targets() {
    let backend = Arc::new(InMemoryBackend::new());

    let handles: Vec<_> = ["../one", "../two"]
        .into_iter()
        .map(|target| {
            let service = mount(&backend);
            thread::spawn(move || service.create_symlink("dir", "link", target).map(|_| target))
        })
        .collect();
    let results: Vec<Result<&str, SymlinkError>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<&str> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(winners.len(), 1);
    for result in &results {
        if let Err(e) = result {
            assert!(matches!(
                e,
                SymlinkError::AlreadyExists(_) | SymlinkError::MergeFailed(_)
            ));
        }
    }

    let observer = mount(&backend);
    assert_eq!(
        observer.read_link("dir", "link").unwrap().as_deref(),
        Some(winners[0])
    );
}

/// Deleting the metadata object out-of-band drops every link in that directory
#[test]
fn test_out_of_band_delete_loses_links() {
    let backend = Arc::new(InMemoryBackend::new());
    let service = mount(&backend);
    service.create_symlink("dir", "a", "../a").unwrap();
    service.create_symlink("other", "b", "../b").unwrap();

    backend.remove_raw("dir/.symlinks");

    assert!(service.list_symlinks("dir").unwrap().is_empty());
    assert!(service.is_symlink("other", "b").unwrap());

    // Creating a new link starts a fresh document; the old one is not rebuilt.
    service.create_symlink("dir", "c", "../c").unwrap();
    let names: Vec<String> = service
        .list_symlinks("dir")
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["c"]);
}
