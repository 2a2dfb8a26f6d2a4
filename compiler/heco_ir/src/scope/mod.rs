//! Lexical scopes.
//!
//! Scopes form a tree rooted at the global scope. Blocks and `for` loops
//! open a nested scope keyed by the id of the opening node, so re-entering
//! the same node (a loop body on its next iteration) lands in the same
//! scope instead of stacking a new one. Every entry starts the scope empty:
//! declarations of a previous entry are not visible.
//!
//! Declarations are keyed by the declaring node. Visiting the same
//! declaration again re-binds the name; a different node declaring the same
//! name in the same scope is an error. Shadowing in a nested scope is fine.

use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::NodeId;

/// Index of a scope in its [`ScopeTree`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The global scope.
    pub const ROOT: ScopeId = ScopeId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope{}", self.0)
    }
}

/// A name qualified by the scope that declared it.
///
/// Two bindings with the same name in different scopes are distinct keys.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ScopedIdentifier {
    pub scope: ScopeId,
    pub name: String,
}

impl ScopedIdentifier {
    pub fn new(scope: ScopeId, name: impl Into<String>) -> Self {
        ScopedIdentifier {
            scope,
            name: name.into(),
        }
    }
}

impl fmt::Display for ScopedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.scope, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("`{name}` is already declared in this scope")]
    Redeclared { name: String },

    #[error("undeclared identifier `{0}`")]
    Unresolved(String),

    #[error("cannot exit the global scope")]
    ExitRoot,
}

#[derive(Clone, Debug)]
struct Scope {
    parent: Option<ScopeId>,
    opener: Option<NodeId>,
    declarations: FxHashMap<String, NodeId>,
    nested: FxHashMap<NodeId, ScopeId>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, opener: Option<NodeId>) -> Self {
        Scope {
            parent,
            opener,
            declarations: FxHashMap::default(),
            nested: FxHashMap::default(),
        }
    }
}

/// Arena of scopes plus a cursor on the current one.
#[derive(Clone, Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![Scope::new(None, None)],
            current: ScopeId::ROOT,
        }
    }

    #[inline]
    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    #[inline]
    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Number of scopes created so far.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn parent_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.index()].parent
    }

    /// Node that opened `scope`; `None` for the global scope.
    pub fn opener_of(&self, scope: ScopeId) -> Option<NodeId> {
        self.scopes[scope.index()].opener
    }

    /// Enter the scope opened by `opener`, creating it on first entry.
    ///
    /// Declarations left over from a previous entry are dropped.
    pub fn enter(&mut self, opener: NodeId) -> ScopeId {
        let current = self.current;
        let next = match self.scopes[current.index()].nested.get(&opener) {
            Some(&existing) => {
                self.scopes[existing.index()].declarations.clear();
                existing
            }
            None => {
                let id = self.allocate(Scope::new(Some(current), Some(opener)));
                self.scopes[current.index()].nested.insert(opener, id);
                id
            }
        };
        self.current = next;
        next
    }

    /// Return to the enclosing scope.
    pub fn exit(&mut self) -> Result<ScopeId, ScopeError> {
        let parent = self.scopes[self.current.index()]
            .parent
            .ok_or(ScopeError::ExitRoot)?;
        self.current = parent;
        Ok(parent)
    }

    /// Make `scope` current; used to evaluate in the global scope.
    pub fn set_current(&mut self, scope: ScopeId) {
        debug_assert!(scope.index() < self.scopes.len());
        self.current = scope;
    }

    /// Declare `name` in the current scope.
    pub fn declare(&mut self, name: &str, declared_by: NodeId) -> Result<ScopedIdentifier, ScopeError> {
        let scope = self.current;
        let declarations = &mut self.scopes[scope.index()].declarations;
        match declarations.get(name) {
            Some(&existing) if existing != declared_by => {
                return Err(ScopeError::Redeclared {
                    name: name.to_string(),
                });
            }
            Some(_) => {}
            None => {
                declarations.insert(name.to_string(), declared_by);
            }
        }
        Ok(ScopedIdentifier::new(scope, name))
    }

    /// Find the innermost declaration of `name` visible from the current
    /// scope.
    pub fn resolve(&self, name: &str) -> Result<ScopedIdentifier, ScopeError> {
        self.resolve_from(self.current, name)
    }

    /// Resolve `name` ignoring the cursor, starting at the global scope.
    pub fn resolve_in_root(&self, name: &str) -> Result<ScopedIdentifier, ScopeError> {
        self.resolve_from(ScopeId::ROOT, name)
    }

    pub fn resolve_from(&self, start: ScopeId, name: &str) -> Result<ScopedIdentifier, ScopeError> {
        let mut scope = Some(start);
        while let Some(id) = scope {
            let entry = &self.scopes[id.index()];
            if entry.declarations.contains_key(name) {
                return Ok(ScopedIdentifier::new(id, name));
            }
            scope = entry.parent;
        }
        Err(ScopeError::Unresolved(name.to_string()))
    }

    /// Node that declared `identifier`, if any.
    pub fn declared_by(&self, identifier: &ScopedIdentifier) -> Option<NodeId> {
        self.scopes
            .get(identifier.scope.index())
            .and_then(|scope| scope.declarations.get(&identifier.name))
            .copied()
    }

    fn allocate(&mut self, scope: Scope) -> ScopeId {
        let index = u32::try_from(self.scopes.len()).unwrap_or(u32::MAX);
        self.scopes.push(scope);
        ScopeId(index)
    }
}

#[cfg(test)]
mod tests;
