//! # verso-storage
//!
//! Page model and versioning strategies for VersoDB.
//!
//! VersoDB never rewrites a page in place. Each commit appends *fragments*
//! (possibly partial page images) and the configured [`Versioning`]
//! strategy decides which prior fragments a reader must fetch, how they
//! fold back into one complete page, and which entries the next commit has
//! to persist so that every revision inside the configured window stays
//! reconstructible.
//!
//! ## Example
//!
//! ```rust
//! use verso_common::types::{PageKey, Revision};
//! use verso_storage::page::{KeyValuePage, PageKind};
//! use verso_storage::trx::SnapshotTrx;
//! use verso_storage::versioning::Versioning;
//!
//! # fn main() -> verso_common::error::VersoResult<()> {
//! let mut fragment = KeyValuePage::new(PageKey::new(1), PageKind::Records, None, 512);
//! fragment.put_record(4_u64, "payload".to_owned())?;
//!
//! let strategy = Versioning::Full;
//! let plan = strategy.fetch_plan(Revision::new(3), 4);
//! assert_eq!(plan, vec![Revision::new(3)]);
//!
//! let trx = SnapshotTrx::new(Revision::new(3));
//! let page = strategy.combine_for_read(vec![fragment], 4, &trx)?;
//! assert_eq!(page.record(&4), Some(&"payload".to_owned()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod page;
pub mod trx;
pub mod versioning;

pub use config::ResourceConfig;
pub use page::{KeyValuePage, PageContainer, PageKind, PageReference};
pub use trx::{PageReadTrx, SnapshotTrx};
pub use versioning::Versioning;
