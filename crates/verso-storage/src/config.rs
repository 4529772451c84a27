//! Engine configuration.
//!
//! A [`ResourceConfig`] is fixed when a database is created and never
//! changes afterwards: fragments written under one configuration are only
//! reconstructible under the same configuration.

use serde::{Deserialize, Serialize};

use verso_common::constants::{DEFAULT_REVS_TO_RESTORE, NDP_NODE_COUNT};
use verso_common::error::{VersoError, VersoResult};

use crate::versioning::Versioning;

/// Immutable per-database configuration of the reconstruction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// The versioning strategy fragments are written and folded under.
    pub versioning: Versioning,

    /// The window `w`: how many revisions a reconstruction fold may range
    /// across. Must be at least 1.
    pub revs_to_restore: u32,

    /// Fixed entry capacity of every page.
    pub entries_per_page: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            versioning: Versioning::Incremental,
            revs_to_restore: DEFAULT_REVS_TO_RESTORE,
            entries_per_page: NDP_NODE_COUNT,
        }
    }
}

impl ResourceConfig {
    /// Creates a configuration for the given strategy with default window
    /// and page capacity.
    pub fn new(versioning: Versioning) -> Self {
        Self {
            versioning,
            ..Default::default()
        }
    }

    /// Sets the reconstruction window.
    #[must_use]
    pub fn with_revs_to_restore(mut self, revs_to_restore: u32) -> Self {
        self.revs_to_restore = revs_to_restore;
        self
    }

    /// Sets the per-page entry capacity.
    #[must_use]
    pub fn with_entries_per_page(mut self, entries_per_page: usize) -> Self {
        self.entries_per_page = entries_per_page;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> VersoResult<()> {
        if self.revs_to_restore == 0 {
            return Err(VersoError::invariant("revs_to_restore must be at least 1"));
        }
        if self.entries_per_page == 0 {
            return Err(VersoError::invariant("entries_per_page must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResourceConfig::default();
        assert_eq!(config.versioning, Versioning::Incremental);
        assert_eq!(config.revs_to_restore, DEFAULT_REVS_TO_RESTORE);
        assert_eq!(config.entries_per_page, NDP_NODE_COUNT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ResourceConfig::new(Versioning::SlidingSnapshot)
            .with_revs_to_restore(3)
            .with_entries_per_page(4);
        assert_eq!(config.versioning, Versioning::SlidingSnapshot);
        assert_eq!(config.revs_to_restore, 3);
        assert_eq!(config.entries_per_page, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let config = ResourceConfig::default().with_revs_to_restore(0);
        assert!(config.validate().is_err());

        let config = ResourceConfig::default().with_entries_per_page(0);
        assert!(config.validate().is_err());
    }
}
