//! Page model: fragments, containers, and page metadata.
//!
//! A logical page is identified by a [`PageKey`](verso_common::types::PageKey)
//! and materialized by folding one or more on-disk *fragments*, each a
//! [`KeyValuePage`]. During modification the fold additionally yields the
//! delta to serialize next, carried alongside the readable page in a
//! [`PageContainer`].

mod container;
mod kv;
mod reference;
mod types;

pub use container::PageContainer;
pub use kv::KeyValuePage;
pub use reference::PageReference;
pub use types::PageKind;

pub(crate) use kv::{EntryKind, RecordEntries, ReferenceEntries};
