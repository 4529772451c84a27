//! System-wide constants for VersoDB.
//!
//! This module defines the capacities and defaults used across the
//! storage and cache layers.

// =============================================================================
// Page Constants
// =============================================================================

/// Number of entries a record page can hold.
///
/// A page fragment never carries more than this many entries across both
/// of its keyspaces (records and page references); a reconstructed page is
/// complete once it reaches this count.
pub const NDP_NODE_COUNT: usize = 512;

// =============================================================================
// Versioning Constants
// =============================================================================

/// Default number of revisions a reconstruction fold may range across.
///
/// Bounds read amplification for the incremental and sliding-snapshot
/// strategies and sets the full-dump period for the differential strategy.
pub const DEFAULT_REVS_TO_RESTORE: u32 = 4;

// =============================================================================
// Cache Constants
// =============================================================================

/// Default capacity of the in-memory first-tier transaction-log cache.
///
/// Entries beyond this spill to the persistent second tier.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;
