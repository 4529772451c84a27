//! References to on-disk page fragments.

use serde::{Deserialize, Serialize};
use std::fmt;

use verso_common::types::PageKey;

/// The on-disk location of a page or page fragment.
///
/// A reference is a relation, not ownership: pages carry references to
/// prior fragments and to child pages, but the reconstruction engine never
/// dereferences one itself. Resolving a reference to bytes is the job of
/// the surrounding storage layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageReference {
    /// Storage-file offset of the referenced fragment.
    key: u64,
    /// Logical page the referenced fragment belongs to, when known.
    page_key: Option<PageKey>,
}

impl PageReference {
    /// Creates a reference to the fragment stored at `key`.
    #[inline]
    #[must_use]
    pub const fn new(key: u64) -> Self {
        Self {
            key,
            page_key: None,
        }
    }

    /// Annotates the reference with the logical page it points into.
    #[inline]
    #[must_use]
    pub const fn with_page_key(mut self, page_key: PageKey) -> Self {
        self.page_key = Some(page_key);
        self
    }

    /// Returns the storage-file offset.
    #[inline]
    #[must_use]
    pub const fn key(self) -> u64 {
        self.key
    }

    /// Returns the logical page key, if annotated.
    #[inline]
    #[must_use]
    pub const fn page_key(self) -> Option<PageKey> {
        self.page_key
    }
}

impl fmt::Debug for PageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page_key {
            Some(page_key) => write!(f, "PageReference({} -> {})", self.key, page_key),
            None => write!(f, "PageReference({})", self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation() {
        let reference = PageReference::new(4096);
        assert_eq!(reference.key(), 4096);
        assert_eq!(reference.page_key(), None);

        let annotated = reference.with_page_key(PageKey::new(3));
        assert_eq!(annotated.key(), 4096);
        assert_eq!(annotated.page_key(), Some(PageKey::new(3)));
    }
}
