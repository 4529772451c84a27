//! Page kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of key/value pages in VersoDB.
///
/// Fragments of the same logical page always share a kind; the kind also
/// selects the transaction-log partition a page container spills into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PageKind {
    /// Record page (stores user records).
    Records = 1,
    /// Path summary page.
    Path = 2,
    /// Name/dictionary page.
    Name = 3,
    /// Secondary-index page.
    Index = 4,
}

impl PageKind {
    /// Creates a PageKind from a raw byte value.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Records),
            2 => Some(Self::Path),
            3 => Some(Self::Name),
            4 => Some(Self::Index),
            _ => None,
        }
    }

    /// Returns the raw byte value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the transaction-log partition name for this kind.
    pub const fn log_type(self) -> &'static str {
        match self {
            Self::Records => "records",
            Self::Path => "path",
            Self::Name => "name",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Records => write!(f, "Records"),
            Self::Path => write!(f, "Path"),
            Self::Name => write!(f, "Name"),
            Self::Index => write!(f, "Index"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for kind in [
            PageKind::Records,
            PageKind::Path,
            PageKind::Name,
            PageKind::Index,
        ] {
            assert_eq!(PageKind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(PageKind::from_u8(0), None);
        assert_eq!(PageKind::from_u8(9), None);
    }

    #[test]
    fn test_log_type() {
        assert_eq!(PageKind::Records.log_type(), "records");
        assert_eq!(PageKind::Path.log_type(), "path");
        assert_eq!(PageKind::Name.log_type(), "name");
        assert_eq!(PageKind::Index.log_type(), "index");
    }
}
