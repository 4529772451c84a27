//! # verso-common
//!
//! Common types, errors, and constants for VersoDB.
//!
//! This crate provides the foundational pieces shared by the storage and
//! cache layers:
//!
//! - **Types**: core identifiers (`PageKey`, `Revision`)
//! - **Errors**: unified error handling with `VersoError`
//! - **Constants**: system-wide capacities and defaults
//!
//! ## Example
//!
//! ```rust
//! use verso_common::types::{PageKey, Revision};
//! use verso_common::error::VersoResult;
//!
//! fn example() -> VersoResult<()> {
//!     let page = PageKey::new(42);
//!     let revision = Revision::new(7);
//!     assert!(page.is_valid());
//!     assert_eq!(revision.next().as_u32(), 8);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{VersoError, VersoResult};
pub use types::{PageKey, Revision};
