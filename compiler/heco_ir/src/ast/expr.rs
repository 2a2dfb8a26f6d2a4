//! Expression nodes.

use heco_stack::ensure_sufficient_stack;
use smallvec::SmallVec;

use super::{required, swap_slot, Children, Literal, Node, NodeRef, SlotMut};
use crate::{IrError, NodeId, Operator};

/// Expression node.
///
/// Equality is structural: ids and parent links are ignored.
#[derive(Clone, Debug)]
pub struct Expr {
    id: NodeId,
    parent: Option<NodeId>,
    kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Variable(Variable),
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    IndexAccess(IndexAccess),
    List(ExpressionList),
    Operator(OperatorExpression),
}

/// Reference to a named binding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variable {
    pub identifier: String,
}

/// `left op right`
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryExpression {
    pub left: Option<Box<Expr>>,
    pub operator: Operator,
    pub right: Option<Box<Expr>>,
}

impl BinaryExpression {
    pub fn left(&self) -> Result<&Expr, IrError> {
        required(&self.left, "BinaryExpression", "left")
    }

    pub fn right(&self) -> Result<&Expr, IrError> {
        required(&self.right, "BinaryExpression", "right")
    }

    pub fn has_left(&self) -> bool {
        self.left.is_some()
    }

    pub fn has_right(&self) -> bool {
        self.right.is_some()
    }
}

/// `op operand`
#[derive(Clone, Debug, PartialEq)]
pub struct UnaryExpression {
    pub operator: Operator,
    pub operand: Option<Box<Expr>>,
}

impl UnaryExpression {
    pub fn operand(&self) -> Result<&Expr, IrError> {
        required(&self.operand, "UnaryExpression", "operand")
    }

    pub fn has_operand(&self) -> bool {
        self.operand.is_some()
    }
}

/// `target[index]`
#[derive(Clone, Debug, PartialEq)]
pub struct IndexAccess {
    pub target: Option<Box<Expr>>,
    pub index: Option<Box<Expr>>,
}

impl IndexAccess {
    pub fn target(&self) -> Result<&Expr, IrError> {
        required(&self.target, "IndexAccess", "target")
    }

    pub fn index(&self) -> Result<&Expr, IrError> {
        required(&self.index, "IndexAccess", "index")
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }
}

/// `{e1, e2, ...}`
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionList {
    pub expressions: Vec<Expr>,
}

/// One operator applied to any number of operands (batched form).
#[derive(Clone, Debug, PartialEq)]
pub struct OperatorExpression {
    pub operator: Operator,
    pub operands: Vec<Expr>,
}

impl Expr {
    /// Wrap `kind` under a fresh id and adopt its children.
    pub fn new(kind: ExprKind) -> Self {
        Self::from_parts(NodeId::fresh(), kind)
    }

    /// Rebuild a node under an existing identity.
    ///
    /// The caller is responsible for `id` being unique in the tree it ends
    /// up in; rewriting uses this to keep analysis results attached.
    pub fn from_parts(id: NodeId, kind: ExprKind) -> Self {
        let mut expr = Expr {
            id,
            parent: None,
            kind,
        };
        expr.adopt_children();
        expr
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::new(ExprKind::Literal(value.into()))
    }

    pub fn variable(identifier: impl Into<String>) -> Self {
        Self::new(ExprKind::Variable(Variable {
            identifier: identifier.into(),
        }))
    }

    pub fn binary(left: Expr, operator: Operator, right: Expr) -> Self {
        Self::new(ExprKind::Binary(BinaryExpression {
            left: Some(Box::new(left)),
            operator,
            right: Some(Box::new(right)),
        }))
    }

    pub fn unary(operator: Operator, operand: Expr) -> Self {
        Self::new(ExprKind::Unary(UnaryExpression {
            operator,
            operand: Some(Box::new(operand)),
        }))
    }

    pub fn index_access(target: Expr, index: Expr) -> Self {
        Self::new(ExprKind::IndexAccess(IndexAccess {
            target: Some(Box::new(target)),
            index: Some(Box::new(index)),
        }))
    }

    pub fn list(expressions: Vec<Expr>) -> Self {
        Self::new(ExprKind::List(ExpressionList { expressions }))
    }

    pub fn operator(operator: Operator, operands: Vec<Expr>) -> Self {
        Self::new(ExprKind::Operator(OperatorExpression { operator, operands }))
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// Split into id and payload. Children keep their stale parent link
    /// until the payload is wrapped again.
    pub fn into_parts(self) -> (NodeId, ExprKind) {
        (self.id, self.kind)
    }

    pub fn into_kind(self) -> ExprKind {
        self.kind
    }

    /// Mutate the payload in place; parent links are restored afterwards.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut ExprKind) -> R) -> R {
        let result = f(&mut self.kind);
        self.adopt_children();
        result
    }

    pub fn node_type(&self) -> &'static str {
        match &self.kind {
            ExprKind::Literal(literal) => literal.node_type(),
            ExprKind::Variable(_) => "Variable",
            ExprKind::Binary(_) => "BinaryExpression",
            ExprKind::Unary(_) => "UnaryExpression",
            ExprKind::IndexAccess(_) => "IndexAccess",
            ExprKind::List(_) => "ExpressionList",
            ExprKind::Operator(_) => "OperatorExpression",
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match &self.kind {
            ExprKind::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// The variable at the root of an lvalue: `v` for `v`, `v[i]` and
    /// `v[i][j]`.
    pub fn base_variable(&self) -> Option<&Variable> {
        match &self.kind {
            ExprKind::Variable(variable) => Some(variable),
            ExprKind::IndexAccess(access) => access.target.as_deref()?.base_variable(),
            _ => None,
        }
    }

    pub fn as_index_access(&self) -> Option<&IndexAccess> {
        match &self.kind {
            ExprKind::IndexAccess(access) => Some(access),
            _ => None,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Children<'_> {
        let mut children = SmallVec::new();
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Variable(_) => {}
            ExprKind::Binary(binary) => {
                children.extend(binary.left.as_deref().map(NodeRef::Expr));
                children.extend(binary.right.as_deref().map(NodeRef::Expr));
            }
            ExprKind::Unary(unary) => {
                children.extend(unary.operand.as_deref().map(NodeRef::Expr));
            }
            ExprKind::IndexAccess(access) => {
                children.extend(access.target.as_deref().map(NodeRef::Expr));
                children.extend(access.index.as_deref().map(NodeRef::Expr));
            }
            ExprKind::List(list) => {
                children.extend(list.expressions.iter().map(NodeRef::Expr));
            }
            ExprKind::Operator(op) => {
                children.extend(op.operands.iter().map(NodeRef::Expr));
            }
        }
        children
    }

    pub fn count_children(&self) -> usize {
        self.children().len()
    }

    /// Replace the direct child `child` with `replacement`.
    ///
    /// Returns the old child, detached (no parent). Fails if `child` is not
    /// a direct child or `replacement` is a statement.
    pub fn replace_child(&mut self, child: NodeId, replacement: Node) -> Result<Node, IrError> {
        let owner = self.id;
        let owner_type = self.node_type();
        swap_slot(owner, owner_type, self.slots_mut(), child, replacement)
    }

    /// Deep copy of this subtree.
    ///
    /// With `keep_original_id` every copied node keeps the id of its source;
    /// otherwise every node gets a fresh one. Either way the copy is
    /// detached from the original's parent.
    #[must_use]
    pub fn clone_tree(&self, keep_original_id: bool) -> Expr {
        let mut copy = self.clone();
        copy.parent = None;
        if !keep_original_id {
            copy.refresh_ids();
        }
        copy
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(super) fn refresh_ids(&mut self) {
        ensure_sufficient_stack(|| {
            self.id = NodeId::fresh();
            let id = self.id;
            for slot in self.slots_mut() {
                match slot {
                    SlotMut::Expr(expr) => {
                        expr.refresh_ids();
                        expr.parent = Some(id);
                    }
                    SlotMut::Stmt(stmt) => {
                        stmt.refresh_ids();
                        stmt.set_parent(Some(id));
                    }
                }
            }
        });
    }

    fn adopt_children(&mut self) {
        let id = self.id;
        for slot in self.slots_mut() {
            if let SlotMut::Expr(expr) = slot {
                expr.parent = Some(id);
            }
        }
    }

    fn slots_mut(&mut self) -> SmallVec<[SlotMut<'_>; 4]> {
        let mut slots = SmallVec::new();
        match &mut self.kind {
            ExprKind::Literal(_) | ExprKind::Variable(_) => {}
            ExprKind::Binary(binary) => {
                slots.extend(binary.left.as_deref_mut().map(SlotMut::Expr));
                slots.extend(binary.right.as_deref_mut().map(SlotMut::Expr));
            }
            ExprKind::Unary(unary) => {
                slots.extend(unary.operand.as_deref_mut().map(SlotMut::Expr));
            }
            ExprKind::IndexAccess(access) => {
                slots.extend(access.target.as_deref_mut().map(SlotMut::Expr));
                slots.extend(access.index.as_deref_mut().map(SlotMut::Expr));
            }
            ExprKind::List(list) => {
                slots.extend(list.expressions.iter_mut().map(SlotMut::Expr));
            }
            ExprKind::Operator(op) => {
                slots.extend(op.operands.iter_mut().map(SlotMut::Expr));
            }
        }
        slots
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}
