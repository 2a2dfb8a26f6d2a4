//! Statement nodes.

use heco_stack::ensure_sufficient_stack;
use smallvec::SmallVec;

use super::{required, swap_slot, Children, Expr, Node, NodeRef, SlotMut};
use crate::{Datatype, IrError, NodeId};

/// Statement node.
///
/// Equality is structural: ids and parent links are ignored.
#[derive(Clone, Debug)]
pub struct Stmt {
    id: NodeId,
    parent: Option<NodeId>,
    kind: StmtKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Block(Block),
    Assignment(Assignment),
    VariableDeclaration(VariableDeclaration),
    If(If),
    For(For),
    While(While),
    Function(Function),
    Call(Call),
    Return(Return),
}

/// `{ s1 s2 ... }`; opens a scope.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// `target = value;` where target is a `Variable` or an `IndexAccess`.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub target: Option<Box<Expr>>,
    pub value: Option<Box<Expr>>,
}

impl Assignment {
    pub fn target(&self) -> Result<&Expr, IrError> {
        required(&self.target, "Assignment", "target")
    }

    pub fn value(&self) -> Result<&Expr, IrError> {
        required(&self.value, "Assignment", "value")
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

/// `datatype identifier [= value];`
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDeclaration {
    pub datatype: Datatype,
    pub identifier: String,
    pub value: Option<Box<Expr>>,
}

impl VariableDeclaration {
    pub fn value(&self) -> Result<&Expr, IrError> {
        required(&self.value, "VariableDeclaration", "value")
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct If {
    pub condition: Option<Box<Expr>>,
    pub then_branch: Option<Box<Stmt>>,
    pub else_branch: Option<Box<Stmt>>,
}

impl If {
    pub fn condition(&self) -> Result<&Expr, IrError> {
        required(&self.condition, "If", "condition")
    }

    pub fn then_branch(&self) -> Result<&Stmt, IrError> {
        required(&self.then_branch, "If", "thenBranch")
    }

    pub fn else_branch(&self) -> Result<&Stmt, IrError> {
        required(&self.else_branch, "If", "elseBranch")
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub fn has_then_branch(&self) -> bool {
        self.then_branch.is_some()
    }

    pub fn has_else_branch(&self) -> bool {
        self.else_branch.is_some()
    }
}

/// `for (initializer; condition; update) body`; opens a scope.
#[derive(Clone, Debug, PartialEq)]
pub struct For {
    pub initializer: Option<Box<Stmt>>,
    pub condition: Option<Box<Expr>>,
    pub update: Option<Box<Stmt>>,
    pub body: Option<Box<Stmt>>,
}

impl For {
    pub fn initializer(&self) -> Result<&Stmt, IrError> {
        required(&self.initializer, "For", "initializer")
    }

    pub fn condition(&self) -> Result<&Expr, IrError> {
        required(&self.condition, "For", "condition")
    }

    pub fn update(&self) -> Result<&Stmt, IrError> {
        required(&self.update, "For", "update")
    }

    pub fn body(&self) -> Result<&Stmt, IrError> {
        required(&self.body, "For", "body")
    }

    pub fn has_initializer(&self) -> bool {
        self.initializer.is_some()
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// `while (condition) body`
#[derive(Clone, Debug, PartialEq)]
pub struct While {
    pub condition: Option<Box<Expr>>,
    pub body: Option<Box<Stmt>>,
}

impl While {
    pub fn condition(&self) -> Result<&Expr, IrError> {
        required(&self.condition, "While", "condition")
    }

    pub fn body(&self) -> Result<&Stmt, IrError> {
        required(&self.body, "While", "body")
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionParameter {
    pub datatype: Datatype,
    pub identifier: String,
}

/// Function definition; `return_type` is `None` for `void`.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub identifier: String,
    pub return_type: Option<Datatype>,
    pub parameters: Vec<FunctionParameter>,
    pub body: Option<Box<Stmt>>,
}

impl Function {
    pub fn body(&self) -> Result<&Stmt, IrError> {
        required(&self.body, "Function", "body")
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// `identifier(arguments...);`
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub identifier: String,
    pub arguments: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Return {
    pub values: Vec<Expr>,
}

impl Stmt {
    /// Wrap `kind` under a fresh id and adopt its children.
    pub fn new(kind: StmtKind) -> Self {
        Self::from_parts(NodeId::fresh(), kind)
    }

    /// Rebuild a node under an existing identity; see [`Expr::from_parts`].
    pub fn from_parts(id: NodeId, kind: StmtKind) -> Self {
        let mut stmt = Stmt {
            id,
            parent: None,
            kind,
        };
        stmt.adopt_children();
        stmt
    }

    pub fn block(statements: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(Block { statements }))
    }

    pub fn assignment(target: Expr, value: Expr) -> Self {
        Self::new(StmtKind::Assignment(Assignment {
            target: Some(Box::new(target)),
            value: Some(Box::new(value)),
        }))
    }

    pub fn declaration(datatype: Datatype, identifier: impl Into<String>, value: Option<Expr>) -> Self {
        Self::new(StmtKind::VariableDeclaration(VariableDeclaration {
            datatype,
            identifier: identifier.into(),
            value: value.map(Box::new),
        }))
    }

    pub fn if_else(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Self {
        Self::new(StmtKind::If(If {
            condition: Some(Box::new(condition)),
            then_branch: Some(Box::new(then_branch)),
            else_branch: else_branch.map(Box::new),
        }))
    }

    pub fn for_loop(initializer: Stmt, condition: Expr, update: Stmt, body: Stmt) -> Self {
        Self::new(StmtKind::For(For {
            initializer: Some(Box::new(initializer)),
            condition: Some(Box::new(condition)),
            update: Some(Box::new(update)),
            body: Some(Box::new(body)),
        }))
    }

    pub fn while_loop(condition: Expr, body: Stmt) -> Self {
        Self::new(StmtKind::While(While {
            condition: Some(Box::new(condition)),
            body: Some(Box::new(body)),
        }))
    }

    pub fn function(
        identifier: impl Into<String>,
        return_type: Option<Datatype>,
        parameters: Vec<FunctionParameter>,
        body: Stmt,
    ) -> Self {
        Self::new(StmtKind::Function(Function {
            identifier: identifier.into(),
            return_type,
            parameters,
            body: Some(Box::new(body)),
        }))
    }

    pub fn call(identifier: impl Into<String>, arguments: Vec<Expr>) -> Self {
        Self::new(StmtKind::Call(Call {
            identifier: identifier.into(),
            arguments,
        }))
    }

    pub fn return_values(values: Vec<Expr>) -> Self {
        Self::new(StmtKind::Return(Return { values }))
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
    pub fn kind(&self) -> &StmtKind {
        &self.kind
    }

    /// Split into id and payload; see [`Expr::into_parts`].
    pub fn into_parts(self) -> (NodeId, StmtKind) {
        (self.id, self.kind)
    }

    pub fn into_kind(self) -> StmtKind {
        self.kind
    }

    /// Mutate the payload in place; parent links are restored afterwards.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut StmtKind) -> R) -> R {
        let result = f(&mut self.kind);
        self.adopt_children();
        result
    }

    pub fn node_type(&self) -> &'static str {
        match &self.kind {
            StmtKind::Block(_) => "Block",
            StmtKind::Assignment(_) => "Assignment",
            StmtKind::VariableDeclaration(_) => "VariableDeclaration",
            StmtKind::If(_) => "If",
            StmtKind::For(_) => "For",
            StmtKind::While(_) => "While",
            StmtKind::Function(_) => "Function",
            StmtKind::Call(_) => "Call",
            StmtKind::Return(_) => "Return",
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match &self.kind {
            StmtKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_assignment(&self) -> Option<&Assignment> {
        match &self.kind {
            StmtKind::Assignment(assignment) => Some(assignment),
            _ => None,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Children<'_> {
        let mut children = SmallVec::new();
        match &self.kind {
            StmtKind::Block(block) => {
                children.extend(block.statements.iter().map(NodeRef::Stmt));
            }
            StmtKind::Assignment(assignment) => {
                children.extend(assignment.target.as_deref().map(NodeRef::Expr));
                children.extend(assignment.value.as_deref().map(NodeRef::Expr));
            }
            StmtKind::VariableDeclaration(decl) => {
                children.extend(decl.value.as_deref().map(NodeRef::Expr));
            }
            StmtKind::If(if_stmt) => {
                children.extend(if_stmt.condition.as_deref().map(NodeRef::Expr));
                children.extend(if_stmt.then_branch.as_deref().map(NodeRef::Stmt));
                children.extend(if_stmt.else_branch.as_deref().map(NodeRef::Stmt));
            }
            StmtKind::For(for_stmt) => {
                children.extend(for_stmt.initializer.as_deref().map(NodeRef::Stmt));
                children.extend(for_stmt.condition.as_deref().map(NodeRef::Expr));
                children.extend(for_stmt.update.as_deref().map(NodeRef::Stmt));
                children.extend(for_stmt.body.as_deref().map(NodeRef::Stmt));
            }
            StmtKind::While(while_stmt) => {
                children.extend(while_stmt.condition.as_deref().map(NodeRef::Expr));
                children.extend(while_stmt.body.as_deref().map(NodeRef::Stmt));
            }
            StmtKind::Function(function) => {
                children.extend(function.body.as_deref().map(NodeRef::Stmt));
            }
            StmtKind::Call(call) => {
                children.extend(call.arguments.iter().map(NodeRef::Expr));
            }
            StmtKind::Return(ret) => {
                children.extend(ret.values.iter().map(NodeRef::Expr));
            }
        }
        children
    }

    pub fn count_children(&self) -> usize {
        self.children().len()
    }

    /// Replace the direct child `child` with `replacement`; see
    /// [`Expr::replace_child`].
    pub fn replace_child(&mut self, child: NodeId, replacement: Node) -> Result<Node, IrError> {
        let owner = self.id;
        let owner_type = self.node_type();
        swap_slot(owner, owner_type, self.slots_mut(), child, replacement)
    }

    /// Deep copy of this subtree; see [`Expr::clone_tree`].
    #[must_use]
    pub fn clone_tree(&self, keep_original_id: bool) -> Stmt {
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
                        expr.set_parent(Some(id));
                    }
                    SlotMut::Stmt(stmt) => {
                        stmt.refresh_ids();
                        stmt.parent = Some(id);
                    }
                }
            }
        });
    }

    fn adopt_children(&mut self) {
        let id = self.id;
        for slot in self.slots_mut() {
            match slot {
                SlotMut::Expr(expr) => expr.set_parent(Some(id)),
                SlotMut::Stmt(stmt) => stmt.parent = Some(id),
            }
        }
    }

    fn slots_mut(&mut self) -> SmallVec<[SlotMut<'_>; 4]> {
        let mut slots = SmallVec::new();
        match &mut self.kind {
            StmtKind::Block(block) => {
                slots.extend(block.statements.iter_mut().map(SlotMut::Stmt));
            }
            StmtKind::Assignment(assignment) => {
                slots.extend(assignment.target.as_deref_mut().map(SlotMut::Expr));
                slots.extend(assignment.value.as_deref_mut().map(SlotMut::Expr));
            }
            StmtKind::VariableDeclaration(decl) => {
                slots.extend(decl.value.as_deref_mut().map(SlotMut::Expr));
            }
            StmtKind::If(if_stmt) => {
                slots.extend(if_stmt.condition.as_deref_mut().map(SlotMut::Expr));
                slots.extend(if_stmt.then_branch.as_deref_mut().map(SlotMut::Stmt));
                slots.extend(if_stmt.else_branch.as_deref_mut().map(SlotMut::Stmt));
            }
            StmtKind::For(for_stmt) => {
                slots.extend(for_stmt.initializer.as_deref_mut().map(SlotMut::Stmt));
                slots.extend(for_stmt.condition.as_deref_mut().map(SlotMut::Expr));
                slots.extend(for_stmt.update.as_deref_mut().map(SlotMut::Stmt));
                slots.extend(for_stmt.body.as_deref_mut().map(SlotMut::Stmt));
            }
            StmtKind::While(while_stmt) => {
                slots.extend(while_stmt.condition.as_deref_mut().map(SlotMut::Expr));
                slots.extend(while_stmt.body.as_deref_mut().map(SlotMut::Stmt));
            }
            StmtKind::Function(function) => {
                slots.extend(function.body.as_deref_mut().map(SlotMut::Stmt));
            }
            StmtKind::Call(call) => {
                slots.extend(call.arguments.iter_mut().map(SlotMut::Expr));
            }
            StmtKind::Return(ret) => {
                slots.extend(ret.values.iter_mut().map(SlotMut::Expr));
            }
        }
        slots
    }
}

impl PartialEq for Stmt {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}
