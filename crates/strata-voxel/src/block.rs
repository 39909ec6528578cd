//! Block identifiers stored in every run of the hierarchy.

use std::fmt;

/// Compact identifier for the block occupying a cell (4 bytes).
///
/// Air is always ID 0 so that a freshly created grid represents empty space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    /// Empty space.
    pub const AIR: Self = Self(0);
}

impl From<u32> for BlockId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
