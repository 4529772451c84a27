//! # verso-cache
//!
//! Two-tier transaction log for VersoDB.
//!
//! While a write transaction is open, the page containers it produces are
//! buffered in a bounded in-memory tier ([`LruCache`]); entries evicted
//! from it spill into a persistent tier ([`PersistentCache`]) keyed by the
//! same page key. The [`TransactionLog`] facade puts both tiers behind one
//! reader/writer lock so the surrounding transaction infrastructure can
//! read and write concurrently.
//!
//! ## Example
//!
//! ```rust,no_run
//! use verso_common::types::{PageKey, Revision};
//! use verso_cache::TransactionLog;
//! use verso_storage::page::PageContainer;
//!
//! # fn main() -> verso_common::error::VersoResult<()> {
//! let log: TransactionLog<u64, String> =
//!     TransactionLog::open("/tmp/verso", Revision::new(3), "records", 1024)?;
//! let container = log.get(PageKey::new(1));
//! assert!(container.is_empty());
//!
//! log.put(PageKey::new(1), PageContainer::Empty)?;
//! log.drain_to_secondary()?;
//! log.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lru;
pub mod persistent;
pub mod stats;
pub mod txn_log;

pub use lru::LruCache;
pub use persistent::PersistentCache;
pub use stats::CacheStats;
pub use txn_log::TransactionLog;

use verso_common::error::VersoResult;

/// The contract shared by both cache tiers.
///
/// `get` takes `&mut self` because a lookup may do work: the first tier
/// updates recency and reads through to its secondary, the second tier
/// performs file I/O.
pub trait Cache<K, V> {
    /// Looks up the value stored under `key`.
    fn get(&mut self, key: &K) -> VersoResult<Option<V>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, key: K, value: V) -> VersoResult<()>;

    /// Stores every entry of `entries`.
    fn put_all<I>(&mut self, entries: I) -> VersoResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        Self: Sized,
    {
        for (key, value) in entries {
            self.put(key, value)?;
        }
        Ok(())
    }

    /// Removes the entry stored under `key`, if any.
    fn remove(&mut self, key: &K) -> VersoResult<()>;

    /// Removes all entries.
    fn clear(&mut self) -> VersoResult<()>;

    /// Releases the resources behind the cache.
    fn close(&mut self) -> VersoResult<()>;
}
