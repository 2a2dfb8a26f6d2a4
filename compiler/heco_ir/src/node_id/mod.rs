//! Process-unique node identities.
//!
//! Per-node analysis results (secret taint) are keyed by `NodeId`, not by
//! address, so they stay valid while the tree is rewritten. Identities are
//! drawn from one atomic counter: two nodes created anywhere in the process,
//! on any thread, never share an id unless one is an id-preserving clone of
//! the other.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one AST node.
///
/// Has Copy, Clone, Eq, `PartialEq`, Hash, Ord so it can key hash maps and
/// sorted dumps.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Draw a fresh identity.
    #[inline]
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild an id from its raw value (diagnostics and tests).
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        NodeId(raw)
    }

    /// Get the raw value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests;
