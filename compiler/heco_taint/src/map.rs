use rustc_hash::FxHashMap;

use heco_ir::NodeId;

/// Per-node secret flags.
///
/// A node without an entry is not secret.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecretTaintMap {
    taint: FxHashMap<NodeId, bool>,
}

impl SecretTaintMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_secret(&self, id: NodeId) -> bool {
        self.taint.get(&id).copied().unwrap_or(false)
    }

    /// The recorded fact, distinguishing "not analyzed" from "not secret".
    pub fn get(&self, id: NodeId) -> Option<bool> {
        self.taint.get(&id).copied()
    }

    /// Record a fact; rewriting uses this for the nodes it creates.
    pub fn insert(&mut self, id: NodeId, secret: bool) {
        self.taint.insert(id, secret);
    }

    pub fn len(&self) -> usize {
        self.taint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taint.is_empty()
    }

    /// Number of nodes recorded as secret.
    pub fn secret_count(&self) -> usize {
        self.taint.values().filter(|&&secret| secret).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, bool)> + '_ {
        self.taint.iter().map(|(&id, &secret)| (id, secret))
    }
}
