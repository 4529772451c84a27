//! First-tier LRU cache with spill to a secondary tier.
//!
//! A classic O(1) LRU: a `HashMap` for lookups and an intrusive
//! doubly-linked list for access order. Unlike a plain LRU, the cache owns
//! a secondary [`Cache`] tier: entries evicted at capacity are spilled
//! into it, and lookups that miss in RAM read through it and promote the
//! entry back.

use std::collections::HashMap;
use std::hash::Hash;
use std::ptr::NonNull;

use tracing::trace;
use verso_common::error::VersoResult;

use crate::stats::CacheStats;
use crate::Cache;

/// A node in the LRU linked list.
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<NonNull<Node<K, V>>>,
    next: Option<NonNull<Node<K, V>>>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            prev: None,
            next: None,
        }
    }
}

/// A bounded LRU map backed by a secondary cache tier.
///
/// All mutation goes through `&mut self`; [`LruCache::peek`] is the only
/// lookup usable through a shared reference and deliberately leaves the
/// access order untouched.
pub struct LruCache<K, V, S> {
    /// Maximum number of RAM-resident entries.
    capacity: usize,
    /// Map from key to node pointer.
    map: HashMap<K, NonNull<Node<K, V>>>,
    /// Head of the list (most recently used).
    head: Option<NonNull<Node<K, V>>>,
    /// Tail of the list (least recently used).
    tail: Option<NonNull<Node<K, V>>>,
    /// Spill target for evicted entries.
    secondary: S,
    /// Statistics.
    stats: CacheStats,
}

// Safety: LruCache manages its own memory; the raw node pointers are
// reachable only through it.
unsafe impl<K: Send, V: Send, S: Send> Send for LruCache<K, V, S> {}
unsafe impl<K: Send + Sync, V: Send + Sync, S: Send + Sync> Sync for LruCache<K, V, S> {}

impl<K, V, S> LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: Cache<K, V>,
{
    /// Creates a new LRU cache bounded at `capacity`, spilling evicted
    /// entries into `secondary`.
    pub fn new(capacity: usize, secondary: S) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
            secondary,
            stats: CacheStats::new(),
        }
    }

    /// Returns the current number of RAM-resident entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no entries are RAM-resident.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the maximum RAM capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Checks if `key` is RAM-resident without updating recency.
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Looks up `key` in RAM without updating recency and without
    /// consulting the secondary tier.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map
            .get(key)
            // Safety: the pointer is owned by the map and valid.
            .map(|&node_ptr| unsafe { &(*node_ptr.as_ptr()).value })
    }

    /// Removes `key` from RAM only, leaving the secondary tier untouched.
    pub fn remove_entry(&mut self, key: &K) -> Option<V> {
        if let Some(node_ptr) = self.map.remove(key) {
            self.unlink(node_ptr);
            // Safety: removed from the map, so we own the node now.
            let node = unsafe { Box::from_raw(node_ptr.as_ptr()) };
            Some(node.value)
        } else {
            None
        }
    }

    /// Returns a snapshot of all RAM-resident entries.
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.map
            .iter()
            // Safety: pointers owned by the map and valid.
            .map(|(key, &node_ptr)| (key.clone(), unsafe { (*node_ptr.as_ptr()).value.clone() }))
            .collect()
    }

    /// Copies every RAM-resident entry into the secondary tier.
    ///
    /// RAM contents are left in place.
    pub fn spill_all(&mut self) -> VersoResult<()> {
        let entries = self.snapshot();
        self.secondary.put_all(entries)
    }

    /// Returns the secondary tier.
    pub fn secondary(&self) -> &S {
        &self.secondary
    }

    /// Returns the secondary tier mutably.
    pub fn secondary_mut(&mut self) -> &mut S {
        &mut self.secondary
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Moves a node to the front of the list.
    fn move_to_front(&mut self, node_ptr: NonNull<Node<K, V>>) {
        if Some(node_ptr) == self.head {
            return;
        }
        self.unlink(node_ptr);
        self.push_front(node_ptr);
    }

    /// Pushes a node to the front of the list.
    fn push_front(&mut self, node_ptr: NonNull<Node<K, V>>) {
        unsafe {
            (*node_ptr.as_ptr()).prev = None;
            (*node_ptr.as_ptr()).next = self.head;

            if let Some(head) = self.head {
                (*head.as_ptr()).prev = Some(node_ptr);
            }

            self.head = Some(node_ptr);

            if self.tail.is_none() {
                self.tail = Some(node_ptr);
            }
        }
    }

    /// Unlinks a node from the list.
    fn unlink(&mut self, node_ptr: NonNull<Node<K, V>>) {
        unsafe {
            let prev = (*node_ptr.as_ptr()).prev;
            let next = (*node_ptr.as_ptr()).next;

            if let Some(prev) = prev {
                (*prev.as_ptr()).next = next;
            } else {
                self.head = next;
            }

            if let Some(next) = next {
                (*next.as_ptr()).prev = prev;
            } else {
                self.tail = prev;
            }
        }
    }

    /// Detaches the least recently used entry.
    fn pop_lru(&mut self) -> Option<(K, V)> {
        let tail = self.tail?;
        // Safety: tail is owned by the map and valid.
        let key = unsafe { (*tail.as_ptr()).key.clone() };
        self.map.remove(&key);
        self.unlink(tail);
        // Safety: removed from the map, so we own the node now.
        let node = unsafe { Box::from_raw(tail.as_ptr()) };
        Some((node.key, node.value))
    }

    /// Drops every RAM-resident node.
    fn clear_ram(&mut self) {
        let mut current = self.head;
        while let Some(node_ptr) = current {
            unsafe {
                current = (*node_ptr.as_ptr()).next;
                drop(Box::from_raw(node_ptr.as_ptr()));
            }
        }
        self.map.clear();
        self.head = None;
        self.tail = None;
    }
}

impl<K, V, S> Cache<K, V> for LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: Cache<K, V>,
{
    /// Looks up `key`, reading through to the secondary tier on a RAM
    /// miss and promoting the entry back into RAM.
    fn get(&mut self, key: &K) -> VersoResult<Option<V>> {
        if let Some(&node_ptr) = self.map.get(key) {
            self.stats.record_hit();
            self.move_to_front(node_ptr);
            // Safety: the pointer is owned by the map and valid.
            return Ok(Some(unsafe { (*node_ptr.as_ptr()).value.clone() }));
        }

        self.stats.record_miss();
        match self.secondary.get(key)? {
            Some(value) => {
                self.put(key.clone(), value.clone())?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put(&mut self, key: K, value: V) -> VersoResult<()> {
        if let Some(&node_ptr) = self.map.get(&key) {
            self.move_to_front(node_ptr);
            // Safety: the pointer is owned by the map and valid.
            unsafe {
                (*node_ptr.as_ptr()).value = value;
            }
            return Ok(());
        }

        if self.map.len() >= self.capacity {
            if let Some((evicted_key, evicted_value)) = self.pop_lru() {
                self.stats.record_eviction();
                self.stats.record_spill();
                trace!("spilling evicted entry to the secondary tier");
                self.secondary.put(evicted_key, evicted_value)?;
            }
        }

        let node = Box::new(Node::new(key.clone(), value));
        let node_ptr = NonNull::from(Box::leak(node));
        self.push_front(node_ptr);
        self.map.insert(key, node_ptr);
        Ok(())
    }

    /// Removes `key` from RAM; the secondary tier is untouched.
    fn remove(&mut self, key: &K) -> VersoResult<()> {
        self.remove_entry(key);
        Ok(())
    }

    /// Clears RAM; the secondary tier is untouched.
    fn clear(&mut self) -> VersoResult<()> {
        self.clear_ram();
        Ok(())
    }

    /// Clears RAM and closes the secondary tier.
    fn close(&mut self) -> VersoResult<()> {
        self.clear_ram();
        self.secondary.close()
    }
}

impl<K, V, S> Drop for LruCache<K, V, S> {
    fn drop(&mut self) {
        let mut current = self.head;
        while let Some(node_ptr) = current {
            unsafe {
                current = (*node_ptr.as_ptr()).next;
                drop(Box::from_raw(node_ptr.as_ptr()));
            }
        }
    }
}
