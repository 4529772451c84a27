//! Core identifier types for VersoDB.
//!
//! These types provide type-safe wrappers around numeric identifiers,
//! preventing accidental misuse of different ID kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page key - identifies a logical page across all revisions.
///
/// Every fragment ever written for the same logical page carries the same
/// page key; the versioning layer folds those fragments back into a single
/// page.
///
/// # Example
///
/// ```rust
/// use verso_common::types::PageKey;
///
/// let page = PageKey::new(42);
/// assert_eq!(page.as_u64(), 42);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PageKey(u64);

impl PageKey {
    /// Invalid page key, used as a sentinel value.
    pub const INVALID: Self = Self(u64::MAX);

    /// First valid page key.
    pub const FIRST: Self = Self(0);

    /// Creates a new `PageKey` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(key: u64) -> Self {
        Self(key)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checks if this is a valid page key.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }

    /// Creates a PageKey from bytes (little-endian).
    #[inline]
    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }

    /// Converts to bytes (little-endian).
    #[inline]
    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Debug for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "PageKey(INVALID)")
        } else {
            write!(f, "PageKey({})", self.0)
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PageKey {
    #[inline]
    fn from(key: u64) -> Self {
        Self::new(key)
    }
}

impl From<PageKey> for u64 {
    #[inline]
    fn from(key: PageKey) -> Self {
        key.0
    }
}

/// Revision number - identifies one committed snapshot of the database.
///
/// Revisions are non-negative and monotonically increasing: every commit
/// produces the next revision. Fetch plans walk backwards from a revision,
/// saturating at revision 0.
///
/// # Example
///
/// ```rust
/// use verso_common::types::Revision;
///
/// let rev = Revision::new(5);
/// assert_eq!(rev.next().as_u32(), 6);
/// assert_eq!(rev.back(10), Revision::new(0));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Revision(u32);

impl Revision {
    /// The initial revision, produced by the very first commit.
    pub const FIRST: Self = Self(0);

    /// Creates a new `Revision` from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(revision: u32) -> Self {
        Self(revision)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the next revision.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the revision `steps` commits back, saturating at 0.
    #[inline]
    #[must_use]
    pub const fn back(self, steps: u32) -> Self {
        Self(self.0.saturating_sub(steps))
    }

    /// Returns the most recent revision at or before `self` that is a
    /// multiple of `period`.
    ///
    /// Used by the differential strategy to locate the last full dump.
    #[inline]
    #[must_use]
    pub const fn align_down(self, period: u32) -> Self {
        Self(self.0 - self.0 % period)
    }

    /// Checks whether this revision falls on a `period` boundary.
    #[inline]
    #[must_use]
    pub const fn is_multiple_of(self, period: u32) -> bool {
        self.0 % period == 0
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({})", self.0)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Revision {
    #[inline]
    fn from(revision: u32) -> Self {
        Self::new(revision)
    }
}

impl From<Revision> for u32 {
    #[inline]
    fn from(revision: Revision) -> Self {
        revision.0
    }
}
