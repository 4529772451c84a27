//! Containers pairing the readable page with the delta to serialize.

use serde::{Deserialize, Serialize};

use verso_common::types::PageKey;

use super::KeyValuePage;

/// The product of combining fragments for modification: a fully
/// materialized page for reading and the subset of entries that must be
/// persisted as the next delta.
///
/// The `Empty` sentinel is what cache lookups return on a miss, so callers
/// can distinguish "not buffered" from a buffered-but-empty page without
/// an extra wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PageContainer<K: Ord, V> {
    /// Cache-miss sentinel; holds no pages.
    Empty,
    /// A buffered page pair. Both pages share the same page key.
    Loaded {
        /// The complete view of the page, up to capacity.
        complete: KeyValuePage<K, V>,
        /// The entries to emit as the next on-disk fragment.
        modified: KeyValuePage<K, V>,
    },
}

impl<K: Ord + Clone, V: Clone> PageContainer<K, V> {
    /// Creates a container from a complete/modified page pair.
    pub fn new(complete: KeyValuePage<K, V>, modified: KeyValuePage<K, V>) -> Self {
        debug_assert_eq!(complete.page_key(), modified.page_key());
        Self::Loaded { complete, modified }
    }

    /// Returns true for the cache-miss sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the page key both pages share, unless empty.
    pub fn page_key(&self) -> Option<PageKey> {
        match self {
            Self::Empty => None,
            Self::Loaded { complete, .. } => Some(complete.page_key()),
        }
    }

    /// Returns the complete page, unless empty.
    pub fn complete(&self) -> Option<&KeyValuePage<K, V>> {
        match self {
            Self::Empty => None,
            Self::Loaded { complete, .. } => Some(complete),
        }
    }

    /// Returns the page holding the next delta, unless empty.
    pub fn modified(&self) -> Option<&KeyValuePage<K, V>> {
        match self {
            Self::Empty => None,
            Self::Loaded { modified, .. } => Some(modified),
        }
    }

    /// Returns the complete page mutably, unless empty.
    pub fn complete_mut(&mut self) -> Option<&mut KeyValuePage<K, V>> {
        match self {
            Self::Empty => None,
            Self::Loaded { complete, .. } => Some(complete),
        }
    }

    /// Returns the delta page mutably, unless empty.
    pub fn modified_mut(&mut self) -> Option<&mut KeyValuePage<K, V>> {
        match self {
            Self::Empty => None,
            Self::Loaded { modified, .. } => Some(modified),
        }
    }

    /// Consumes the container, yielding the page pair unless empty.
    pub fn into_pages(self) -> Option<(KeyValuePage<K, V>, KeyValuePage<K, V>)> {
        match self {
            Self::Empty => None,
            Self::Loaded { complete, modified } => Some((complete, modified)),
        }
    }
}
