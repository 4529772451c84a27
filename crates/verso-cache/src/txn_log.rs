//! Thread-safe two-tier transaction log.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use verso_common::error::VersoResult;
use verso_common::types::{PageKey, Revision};
use verso_storage::page::PageContainer;

use crate::lru::LruCache;
use crate::persistent::PersistentCache;
use crate::Cache;

/// Thread-safe transaction log buffering the page containers a write
/// transaction produces, in RAM first and in a persistent second tier
/// once RAM overflows or the transaction drains at commit.
///
/// A single reader/writer lock covers both tiers: the persistent tier is
/// only touched under the write lock (eviction, drain, removal), so shared
/// readers always observe a consistent RAM snapshot.
pub struct TransactionLog<K: Ord, V> {
    inner: RwLock<LruCache<PageKey, PageContainer<K, V>, PersistentCache<PageContainer<K, V>>>>,
}

impl<K, V> TransactionLog<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Opens the transaction log for `(revision, log_type)` under `base`,
    /// bounding the RAM tier at `capacity` containers.
    pub fn open(
        base: impl AsRef<Path>,
        revision: Revision,
        log_type: &str,
        capacity: usize,
    ) -> VersoResult<Self> {
        let secondary = PersistentCache::open(base, revision, log_type, false)?;
        Ok(Self {
            inner: RwLock::new(LruCache::new(capacity, secondary)),
        })
    }

    /// Returns the RAM-resident container for `key`, or the
    /// [`PageContainer::Empty`] sentinel on a miss.
    ///
    /// Lookups leave recency untouched so they can run under the shared
    /// lock; recency moves only under the write lock.
    pub fn get(&self, key: PageKey) -> PageContainer<K, V> {
        let inner = self.inner.read();
        inner.peek(&key).cloned().unwrap_or(PageContainer::Empty)
    }

    /// Returns a snapshot of the RAM-resident subset of `keys`.
    pub fn get_all(
        &self,
        keys: impl IntoIterator<Item = PageKey>,
    ) -> HashMap<PageKey, PageContainer<K, V>> {
        let inner = self.inner.read();
        keys.into_iter()
            .filter_map(|key| inner.peek(&key).map(|container| (key, container.clone())))
            .collect()
    }

    /// Buffers `container` under `key`, spilling the least recently used
    /// entry to the persistent tier if the RAM tier is at capacity.
    pub fn put(&self, key: PageKey, container: PageContainer<K, V>) -> VersoResult<()> {
        self.inner.write().put(key, container)
    }

    /// Buffers every entry of `entries`.
    pub fn put_all(
        &self,
        entries: impl IntoIterator<Item = (PageKey, PageContainer<K, V>)>,
    ) -> VersoResult<()> {
        self.inner.write().put_all(entries)
    }

    /// Removes `key` from RAM and, when spilled there earlier, from the
    /// persistent tier as well.
    pub fn remove(&self, key: PageKey) -> VersoResult<()> {
        let mut inner = self.inner.write();
        inner.remove_entry(&key);
        if inner.secondary().contains(&key) {
            inner.secondary_mut().remove(&key)?;
        }
        Ok(())
    }

    /// Removes every RAM-resident entry. The persistent tier keeps what
    /// was already spilled or drained.
    pub fn clear(&self) -> VersoResult<()> {
        self.inner.write().clear()
    }

    /// Copies the RAM snapshot into the persistent tier, leaving RAM in
    /// place. Called when the owning transaction commits.
    pub fn drain_to_secondary(&self) -> VersoResult<()> {
        let mut inner = self.inner.write();
        let entries = inner.len();
        inner.spill_all()?;
        debug!(entries, "drained transaction log to the persistent tier");
        Ok(())
    }

    /// Closes the RAM tier, which closes the persistent tier behind it.
    pub fn close(&self) -> VersoResult<()> {
        self.inner.write().close()
    }

    /// Returns the number of RAM-resident containers.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if no containers are RAM-resident.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
