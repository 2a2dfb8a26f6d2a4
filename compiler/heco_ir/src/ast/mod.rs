//! AST Types
//!
//! The tree is made of two node families:
//! - `Expr`: produces a value (literals, variables, operators, index access)
//! - `Stmt`: has no value (blocks, assignments, declarations, control flow)
//!
//! `Node` sums the two for places that accept either (a program root, a
//! `replace_child` argument); `NodeRef` is the borrowed view yielded by
//! child iteration.
//!
//! # Ownership
//!
//! Parents own their children (`Box`/`Vec`). The back reference is the
//! parent's `NodeId`, kept consistent by every constructor and by the only
//! two mutation entry points, `edit` and `replace_child`.

mod expr;
mod literal;
mod stmt;

use smallvec::SmallVec;

use crate::{IrError, NodeId};

pub use expr::{
    BinaryExpression, Expr, ExprKind, ExpressionList, IndexAccess, OperatorExpression,
    UnaryExpression, Variable,
};
pub use literal::Literal;
pub use stmt::{
    Assignment, Block, Call, For, Function, FunctionParameter, If, Return, Stmt, StmtKind,
    VariableDeclaration, While,
};

/// Direct children of one node; most nodes have at most four.
pub type Children<'a> = SmallVec<[NodeRef<'a>; 4]>;

/// An owned node of either family.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Expr(Expr),
    Stmt(Stmt),
}

/// A borrowed node of either family.
#[derive(Copy, Clone, Debug)]
pub enum NodeRef<'a> {
    Expr(&'a Expr),
    Stmt(&'a Stmt),
}

/// Mutable access to one child slot (crate-internal tree surgery).
pub(crate) enum SlotMut<'a> {
    Expr(&'a mut Expr),
    Stmt(&'a mut Stmt),
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.as_ref().id()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.as_ref().parent()
    }

    pub fn as_ref(&self) -> NodeRef<'_> {
        match self {
            Node::Expr(expr) => NodeRef::Expr(expr),
            Node::Stmt(stmt) => NodeRef::Stmt(stmt),
        }
    }

    pub fn node_type(&self) -> &'static str {
        self.as_ref().node_type()
    }

    pub fn children(&self) -> Children<'_> {
        self.as_ref().children()
    }

    pub fn count_children(&self) -> usize {
        self.as_ref().count_children()
    }

    /// Deep copy; see [`Expr::clone_tree`].
    #[must_use]
    pub fn clone_tree(&self, keep_original_id: bool) -> Node {
        match self {
            Node::Expr(expr) => Node::Expr(expr.clone_tree(keep_original_id)),
            Node::Stmt(stmt) => Node::Stmt(stmt.clone_tree(keep_original_id)),
        }
    }

    /// Replace the direct child `child` with `replacement`, returning the
    /// detached old child.
    pub fn replace_child(&mut self, child: NodeId, replacement: Node) -> Result<Node, IrError> {
        match self {
            Node::Expr(expr) => expr.replace_child(child, replacement),
            Node::Stmt(stmt) => stmt.replace_child(child, replacement),
        }
    }

    pub fn into_expr(self) -> Option<Expr> {
        match self {
            Node::Expr(expr) => Some(expr),
            Node::Stmt(_) => None,
        }
    }

    pub fn into_stmt(self) -> Option<Stmt> {
        match self {
            Node::Stmt(stmt) => Some(stmt),
            Node::Expr(_) => None,
        }
    }
}

impl From<Expr> for Node {
    fn from(expr: Expr) -> Self {
        Node::Expr(expr)
    }
}

impl From<Stmt> for Node {
    fn from(stmt: Stmt) -> Self {
        Node::Stmt(stmt)
    }
}

impl<'a> NodeRef<'a> {
    pub fn id(self) -> NodeId {
        match self {
            NodeRef::Expr(expr) => expr.id(),
            NodeRef::Stmt(stmt) => stmt.id(),
        }
    }

    pub fn parent(self) -> Option<NodeId> {
        match self {
            NodeRef::Expr(expr) => expr.parent(),
            NodeRef::Stmt(stmt) => stmt.parent(),
        }
    }

    /// Concrete variant name, also the JSON `type` discriminator.
    pub fn node_type(self) -> &'static str {
        match self {
            NodeRef::Expr(expr) => expr.node_type(),
            NodeRef::Stmt(stmt) => stmt.node_type(),
        }
    }

    /// Direct children, one level only.
    pub fn children(self) -> Children<'a> {
        match self {
            NodeRef::Expr(expr) => expr.children(),
            NodeRef::Stmt(stmt) => stmt.children(),
        }
    }

    pub fn count_children(self) -> usize {
        self.children().len()
    }

    pub fn as_expr(self) -> Option<&'a Expr> {
        match self {
            NodeRef::Expr(expr) => Some(expr),
            NodeRef::Stmt(_) => None,
        }
    }

    pub fn as_stmt(self) -> Option<&'a Stmt> {
        match self {
            NodeRef::Stmt(stmt) => Some(stmt),
            NodeRef::Expr(_) => None,
        }
    }

    /// Tree equality ignoring ids and parent links.
    pub fn structurally_eq(self, other: NodeRef<'_>) -> bool {
        match (self, other) {
            (NodeRef::Expr(a), NodeRef::Expr(b)) => a == b,
            (NodeRef::Stmt(a), NodeRef::Stmt(b)) => a == b,
            _ => false,
        }
    }

    /// Ids of this node and all descendants, pre-order.
    pub fn preorder_ids(self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            ids.push(node.id());
            let children = node.children();
            pending.extend(children.into_iter().rev());
        }
        ids
    }

    /// `true` if every node below this one names its owner as parent.
    pub fn verify_parent_links(self) -> bool {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            for child in node.children() {
                if child.parent() != Some(node.id()) {
                    return false;
                }
                pending.push(child);
            }
        }
        true
    }
}

impl<'a> From<&'a Expr> for NodeRef<'a> {
    fn from(expr: &'a Expr) -> Self {
        NodeRef::Expr(expr)
    }
}

impl<'a> From<&'a Stmt> for NodeRef<'a> {
    fn from(stmt: &'a Stmt) -> Self {
        NodeRef::Stmt(stmt)
    }
}

/// Read a required optional child, failing with a null-access error.
pub(crate) fn required<'a, T>(
    slot: &'a Option<Box<T>>,
    node: &'static str,
    name: &'static str,
) -> Result<&'a T, IrError> {
    slot.as_deref()
        .ok_or(IrError::MissingChild { node, slot: name })
}

/// Swap `replacement` into the first slot whose node has id `child`.
///
/// `owner` is the id written into the replacement's parent link; the
/// returned old node is detached.
pub(crate) fn swap_slot(
    owner: NodeId,
    owner_type: &'static str,
    slots: SmallVec<[SlotMut<'_>; 4]>,
    child: NodeId,
    replacement: Node,
) -> Result<Node, IrError> {
    let slot = slots.into_iter().find(|slot| match slot {
        SlotMut::Expr(current) => current.id() == child,
        SlotMut::Stmt(current) => current.id() == child,
    });
    let Some(slot) = slot else {
        return Err(IrError::NoSuchChild {
            parent: owner,
            child,
        });
    };

    match (slot, replacement) {
        (SlotMut::Expr(current), Node::Expr(mut new)) => {
            new.set_parent(Some(owner));
            let mut old = std::mem::replace(current, new);
            old.set_parent(None);
            Ok(Node::Expr(old))
        }
        (SlotMut::Stmt(current), Node::Stmt(mut new)) => {
            new.set_parent(Some(owner));
            let mut old = std::mem::replace(current, new);
            old.set_parent(None);
            Ok(Node::Stmt(old))
        }
        (SlotMut::Expr(_), Node::Stmt(_)) => Err(IrError::SlotKindMismatch {
            node: owner_type,
            expected: "an expression",
            found: "a statement",
        }),
        (SlotMut::Stmt(_), Node::Expr(_)) => Err(IrError::SlotKindMismatch {
            node: owner_type,
            expected: "a statement",
            found: "an expression",
        }),
    }
}
