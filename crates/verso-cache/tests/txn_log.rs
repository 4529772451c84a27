//! End-to-end tests of the two-tier transaction log.

use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use verso_cache::{Cache, PersistentCache, TransactionLog};
use verso_common::types::{PageKey, Revision};
use verso_storage::page::{KeyValuePage, PageContainer, PageKind};

type Container = PageContainer<u64, String>;

fn container(page_key: u64, marker: &str) -> Container {
    let mut complete: KeyValuePage<u64, String> =
        KeyValuePage::new(PageKey::new(page_key), PageKind::Records, None, 8);
    complete.put_record(0, marker.to_owned()).unwrap();
    complete.put_record(1, marker.to_owned()).unwrap();
    let mut modified = complete.new_sibling(None);
    modified.put_record(0, marker.to_owned()).unwrap();
    PageContainer::new(complete, modified)
}

fn reopen_secondary(dir: &TempDir, revision: Revision) -> PersistentCache<Container> {
    PersistentCache::open(dir.path(), revision, "records", false).unwrap()
}

#[test]
fn eviction_spills_but_log_reads_ram_only() {
    let dir = TempDir::new().unwrap();
    let revision = Revision::new(1);
    let log: TransactionLog<u64, String> =
        TransactionLog::open(dir.path(), revision, "records", 2).unwrap();

    log.put(PageKey::new(1), container(1, "one")).unwrap();
    log.put(PageKey::new(2), container(2, "two")).unwrap();
    log.put(PageKey::new(3), container(3, "three")).unwrap();

    // Key 1 was evicted from RAM; the log's get is RAM-only and reports a
    // miss even though the entry lives in the persistent tier.
    assert!(log.get(PageKey::new(1)).is_empty());
    assert!(!log.get(PageKey::new(2)).is_empty());
    assert!(!log.get(PageKey::new(3)).is_empty());
    log.close().unwrap();

    let mut secondary = reopen_secondary(&dir, revision);
    let spilled: Option<Container> = secondary.get(&PageKey::new(1)).unwrap();
    let spilled = spilled.expect("evicted entry must be in the persistent tier");
    assert_eq!(
        spilled.complete().unwrap().record(&0),
        Some(&"one".to_owned())
    );
}

#[test]
fn drain_copies_ram_and_keeps_it() {
    let dir = TempDir::new().unwrap();
    let revision = Revision::new(2);
    let log: TransactionLog<u64, String> =
        TransactionLog::open(dir.path(), revision, "records", 8).unwrap();

    log.put(PageKey::new(1), container(1, "one")).unwrap();
    log.put(PageKey::new(2), container(2, "two")).unwrap();
    log.drain_to_secondary().unwrap();

    // RAM is not cleared by a drain.
    assert_eq!(log.len(), 2);
    assert!(!log.get(PageKey::new(1)).is_empty());
    log.close().unwrap();

    let mut secondary = reopen_secondary(&dir, revision);
    assert!(secondary.get(&PageKey::new(1)).unwrap().is_some());
    assert!(secondary.get(&PageKey::new(2)).unwrap().is_some());
}

#[test]
fn remove_deletes_from_both_tiers() {
    let dir = TempDir::new().unwrap();
    let revision = Revision::new(3);
    let log: TransactionLog<u64, String> =
        TransactionLog::open(dir.path(), revision, "records", 8).unwrap();

    log.put(PageKey::new(1), container(1, "one")).unwrap();
    log.put(PageKey::new(2), container(2, "two")).unwrap();
    log.drain_to_secondary().unwrap();

    log.remove(PageKey::new(1)).unwrap();
    assert!(log.get(PageKey::new(1)).is_empty());
    log.close().unwrap();

    let mut secondary = reopen_secondary(&dir, revision);
    assert!(secondary.get(&PageKey::new(1)).unwrap().is_none());
    assert!(secondary.get(&PageKey::new(2)).unwrap().is_some());
}

#[test]
fn clear_is_ram_only() {
    let dir = TempDir::new().unwrap();
    let revision = Revision::new(4);
    let log: TransactionLog<u64, String> =
        TransactionLog::open(dir.path(), revision, "records", 8).unwrap();

    log.put(PageKey::new(1), container(1, "one")).unwrap();
    log.drain_to_secondary().unwrap();
    log.clear().unwrap();

    assert!(log.is_empty());
    assert!(log.get(PageKey::new(1)).is_empty());
    log.close().unwrap();

    // What was drained before the clear is still durable.
    let mut secondary = reopen_secondary(&dir, revision);
    assert!(secondary.get(&PageKey::new(1)).unwrap().is_some());
}

#[test]
fn concurrent_readers_never_observe_torn_containers() {
    let dir = TempDir::new().unwrap();
    let log: Arc<TransactionLog<u64, String>> = Arc::new(
        TransactionLog::open(dir.path(), Revision::new(5), "records", 4).unwrap(),
    );

    const KEYS: u64 = 8;
    const WRITES: u64 = 200;

    thread::scope(|scope| {
        let writer_log = Arc::clone(&log);
        scope.spawn(move || {
            for round in 0..WRITES {
                let key = round % KEYS;
                let marker = format!("k{key}r{round}");
                writer_log.put(PageKey::new(key), container(key, &marker)).unwrap();
            }
        });

        for _ in 0..4 {
            let reader_log = Arc::clone(&log);
            scope.spawn(move || {
                for round in 0..WRITES * 4 {
                    let key = PageKey::new(round % KEYS);
                    let found = reader_log.get(key);
                    if found.is_empty() {
                        continue;
                    }
                    // A container is either absent or structurally
                    // complete: both pages present, same page key, and the
                    // delta's record agreeing with the complete page's.
                    let complete = found.complete().expect("complete page");
                    let modified = found.modified().expect("modified page");
                    assert_eq!(complete.page_key(), key);
                    assert_eq!(modified.page_key(), key);
                    assert_eq!(complete.record(&0), modified.record(&0));
                    assert_eq!(complete.record(&0), complete.record(&1));
                }
            });
        }
    });

    log.close().unwrap();
}
