//! The key/value page fragment container.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use verso_common::error::{VersoError, VersoResult};
use verso_common::types::PageKey;

use super::{PageKind, PageReference};

/// A fixed-capacity page fragment holding two keyspaces: record entries
/// and page-reference entries.
///
/// Record entries carry the opaque user payload `V`; reference entries
/// point at child pages and make a page act as an indirection node. The
/// two keyspaces are disjoint by construction and the page enforces only
/// their combined capacity.
///
/// Fragments are immutable once written to disk. The versioning layer
/// treats pages handed to it as read-only inputs and produces fresh pages
/// through [`KeyValuePage::new_sibling`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyValuePage<K: Ord, V> {
    page_key: PageKey,
    page_kind: PageKind,
    previous_reference: Option<PageReference>,
    records: BTreeMap<K, V>,
    references: BTreeMap<K, PageReference>,
    capacity: usize,
    dirty: bool,
}

impl<K: Ord + Clone, V: Clone> KeyValuePage<K, V> {
    /// Creates an empty page.
    pub fn new(
        page_key: PageKey,
        page_kind: PageKind,
        previous_reference: Option<PageReference>,
        capacity: usize,
    ) -> Self {
        Self {
            page_key,
            page_kind,
            previous_reference,
            records: BTreeMap::new(),
            references: BTreeMap::new(),
            capacity,
            dirty: false,
        }
    }

    /// Creates an empty sibling of this page: same page key, kind, and
    /// capacity, with the supplied back-reference.
    #[must_use]
    pub fn new_sibling(&self, previous_reference: Option<PageReference>) -> Self {
        Self::new(
            self.page_key,
            self.page_kind,
            previous_reference,
            self.capacity,
        )
    }

    /// Returns the key of the logical page this fragment belongs to.
    #[inline]
    pub fn page_key(&self) -> PageKey {
        self.page_key
    }

    /// Returns the page kind.
    #[inline]
    pub fn page_kind(&self) -> PageKind {
        self.page_kind
    }

    /// Returns the back-reference to the prior fragment of this logical
    /// page, if any.
    #[inline]
    pub fn previous_reference(&self) -> Option<PageReference> {
        self.previous_reference
    }

    /// Returns the fixed entry capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of entries across both keyspaces.
    #[inline]
    pub fn size(&self) -> usize {
        self.records.len() + self.references.len()
    }

    /// Returns true if the page holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns true once the page holds `capacity` entries.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.size() >= self.capacity
    }

    /// Returns the dirty flag.
    #[inline]
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Sets the dirty flag.
    #[inline]
    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Looks up a record entry.
    pub fn record(&self, key: &K) -> Option<&V> {
        self.records.get(key)
    }

    /// Returns true if a record entry exists for `key`.
    pub fn contains_record(&self, key: &K) -> bool {
        self.records.contains_key(key)
    }

    /// Inserts or replaces a record entry.
    ///
    /// Replacing an existing entry always succeeds; inserting a fresh key
    /// into a full page fails with `CapacityExceeded`.
    pub fn put_record(&mut self, key: K, value: V) -> VersoResult<()> {
        if !self.records.contains_key(&key) && self.is_full() {
            return Err(VersoError::capacity_exceeded(self.page_key, self.capacity));
        }
        self.records.insert(key, value);
        Ok(())
    }

    /// Looks up a page-reference entry.
    pub fn reference(&self, key: &K) -> Option<&PageReference> {
        self.references.get(key)
    }

    /// Returns true if a reference entry exists for `key`.
    pub fn contains_reference(&self, key: &K) -> bool {
        self.references.contains_key(key)
    }

    /// Inserts or replaces a page-reference entry.
    ///
    /// Replacing an existing entry always succeeds; inserting a fresh key
    /// into a full page fails with `CapacityExceeded`.
    pub fn put_reference(&mut self, key: K, reference: PageReference) -> VersoResult<()> {
        if !self.references.contains_key(&key) && self.is_full() {
            return Err(VersoError::capacity_exceeded(self.page_key, self.capacity));
        }
        self.references.insert(key, reference);
        Ok(())
    }

    /// Iterates record entries in key order.
    pub fn records(&self) -> impl Iterator<Item = (&K, &V)> {
        self.records.iter()
    }

    /// Iterates page-reference entries in key order.
    pub fn references(&self) -> impl Iterator<Item = (&K, &PageReference)> {
        self.references.iter()
    }
}

/// Selects one of the two keyspaces of a [`KeyValuePage`].
///
/// The fold rules of the versioning strategies apply symmetrically and
/// independently to records and references; implementing them once,
/// generic over the keyspace, keeps the two paths in lockstep.
pub(crate) trait EntryKind<K: Ord, V> {
    /// Entry payload of the selected keyspace.
    type Value: Clone;

    /// The selected keyspace of `page`.
    fn entries(page: &KeyValuePage<K, V>) -> &BTreeMap<K, Self::Value>;

    /// The selected keyspace of `page`, mutably.
    ///
    /// Callers check [`KeyValuePage::is_full`] before inserting fresh
    /// keys; the raw map does not re-check capacity.
    fn entries_mut(page: &mut KeyValuePage<K, V>) -> &mut BTreeMap<K, Self::Value>;
}

/// The record keyspace.
pub(crate) struct RecordEntries;

impl<K: Ord, V: Clone> EntryKind<K, V> for RecordEntries {
    type Value = V;

    fn entries(page: &KeyValuePage<K, V>) -> &BTreeMap<K, V> {
        &page.records
    }

    fn entries_mut(page: &mut KeyValuePage<K, V>) -> &mut BTreeMap<K, V> {
        &mut page.records
    }
}

/// The page-reference keyspace.
pub(crate) struct ReferenceEntries;

impl<K: Ord, V> EntryKind<K, V> for ReferenceEntries {
    type Value = PageReference;

    fn entries(page: &KeyValuePage<K, V>) -> &BTreeMap<K, PageReference> {
        &page.references
    }

    fn entries_mut(page: &mut KeyValuePage<K, V>) -> &mut BTreeMap<K, PageReference> {
        &mut page.references
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(capacity: usize) -> KeyValuePage<u64, String> {
        KeyValuePage::new(PageKey::new(1), PageKind::Records, None, capacity)
    }

    #[test]
    fn test_size_spans_both_keyspaces() {
        let mut page = page(4);
        page.put_record(1, "a".into()).unwrap();
        page.put_record(2, "b".into()).unwrap();
        page.put_reference(3, PageReference::new(64)).unwrap();
        assert_eq!(page.size(), 3);
        assert!(!page.is_full());

        page.put_reference(4, PageReference::new(128)).unwrap();
        assert!(page.is_full());
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut page = page(2);
        page.put_record(1, "a".into()).unwrap();
        page.put_record(2, "b".into()).unwrap();

        let err = page.put_record(3, "c".into()).unwrap_err();
        assert!(matches!(err, VersoError::CapacityExceeded { .. }));
        let err = page.put_reference(3, PageReference::new(0)).unwrap_err();
        assert!(matches!(err, VersoError::CapacityExceeded { .. }));

        // Replacing an existing key is always allowed.
        page.put_record(2, "b2".into()).unwrap();
        assert_eq!(page.record(&2), Some(&"b2".to_owned()));
    }

    #[test]
    fn test_sibling_is_empty_twin() {
        let mut page = page(8);
        page.put_record(1, "a".into()).unwrap();
        page.set_dirty(true);

        let back_ref = PageReference::new(512).with_page_key(PageKey::new(1));
        let sibling = page.new_sibling(Some(back_ref));
        assert_eq!(sibling.page_key(), page.page_key());
        assert_eq!(sibling.page_kind(), page.page_kind());
        assert_eq!(sibling.capacity(), page.capacity());
        assert!(sibling.is_empty());
        assert!(!sibling.dirty());
        assert_eq!(sibling.previous_reference(), Some(back_ref));
    }

    #[test]
    fn test_iteration_in_key_order() {
        let mut page = page(8);
        page.put_record(3, "c".into()).unwrap();
        page.put_record(1, "a".into()).unwrap();
        page.put_record(2, "b".into()).unwrap();

        let keys: Vec<u64> = page.records().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }
}
