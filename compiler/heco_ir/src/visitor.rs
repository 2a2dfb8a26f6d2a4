//! AST Visitor Pattern
//!
//! Double dispatch over the node variants. `Expr::accept` / `Stmt::accept`
//! select the matching `visit_*` method; the default of every method walks
//! the node's direct children in source order.
//!
//! # Design
//!
//! Every method is fallible so that analyses (taint) and the evaluator can
//! abort the traversal with their own error type. Visitors that cannot fail
//! use `std::convert::Infallible`; the renderer uses `fmt::Error`.
//!
//! Overriding a method replaces the traversal of that node entirely; call
//! [`walk_expr`] / [`walk_stmt`] to keep descending.
//!
//! # Example
//!
//! ```text
//! struct CountVariables {
//!     count: usize,
//! }
//!
//! impl<'ast> Visitor<'ast> for CountVariables {
//!     type Error = Infallible;
//!
//!     fn visit_variable(&mut self, _: &'ast Expr, _: &'ast Variable) -> Result<(), Infallible> {
//!         self.count += 1;
//!         Ok(())
//!     }
//! }
//! ```

use heco_stack::ensure_sufficient_stack;

use crate::ast::{
    Assignment, BinaryExpression, Block, Call, Expr, ExprKind, ExpressionList, For, Function, If,
    IndexAccess, Literal, Node, NodeRef, OperatorExpression, Return, Stmt, StmtKind,
    UnaryExpression, Variable, VariableDeclaration, While,
};

/// AST Visitor trait.
///
/// Each method receives the node itself (for its id) and the variant
/// payload.
pub trait Visitor<'ast> {
    type Error;

    fn visit_literal(&mut self, expr: &'ast Expr, literal: &'ast Literal) -> Result<(), Self::Error> {
        let _ = (expr, literal);
        Ok(())
    }

    fn visit_variable(&mut self, expr: &'ast Expr, variable: &'ast Variable) -> Result<(), Self::Error> {
        let _ = (expr, variable);
        Ok(())
    }

    fn visit_binary(&mut self, expr: &'ast Expr, binary: &'ast BinaryExpression) -> Result<(), Self::Error> {
        let _ = binary;
        walk_expr(self, expr)
    }

    fn visit_unary(&mut self, expr: &'ast Expr, unary: &'ast UnaryExpression) -> Result<(), Self::Error> {
        let _ = unary;
        walk_expr(self, expr)
    }

    fn visit_index_access(&mut self, expr: &'ast Expr, access: &'ast IndexAccess) -> Result<(), Self::Error> {
        let _ = access;
        walk_expr(self, expr)
    }

    fn visit_expression_list(
        &mut self,
        expr: &'ast Expr,
        list: &'ast ExpressionList,
    ) -> Result<(), Self::Error> {
        let _ = list;
        walk_expr(self, expr)
    }

    fn visit_operator_expression(
        &mut self,
        expr: &'ast Expr,
        op: &'ast OperatorExpression,
    ) -> Result<(), Self::Error> {
        let _ = op;
        walk_expr(self, expr)
    }

    fn visit_block(&mut self, stmt: &'ast Stmt, block: &'ast Block) -> Result<(), Self::Error> {
        let _ = block;
        walk_stmt(self, stmt)
    }

    fn visit_assignment(&mut self, stmt: &'ast Stmt, assignment: &'ast Assignment) -> Result<(), Self::Error> {
        let _ = assignment;
        walk_stmt(self, stmt)
    }

    fn visit_variable_declaration(
        &mut self,
        stmt: &'ast Stmt,
        decl: &'ast VariableDeclaration,
    ) -> Result<(), Self::Error> {
        let _ = decl;
        walk_stmt(self, stmt)
    }

    fn visit_if(&mut self, stmt: &'ast Stmt, if_stmt: &'ast If) -> Result<(), Self::Error> {
        let _ = if_stmt;
        walk_stmt(self, stmt)
    }

    fn visit_for(&mut self, stmt: &'ast Stmt, for_stmt: &'ast For) -> Result<(), Self::Error> {
        let _ = for_stmt;
        walk_stmt(self, stmt)
    }

    fn visit_while(&mut self, stmt: &'ast Stmt, while_stmt: &'ast While) -> Result<(), Self::Error> {
        let _ = while_stmt;
        walk_stmt(self, stmt)
    }

    fn visit_function(&mut self, stmt: &'ast Stmt, function: &'ast Function) -> Result<(), Self::Error> {
        let _ = function;
        walk_stmt(self, stmt)
    }

    fn visit_call(&mut self, stmt: &'ast Stmt, call: &'ast Call) -> Result<(), Self::Error> {
        let _ = call;
        walk_stmt(self, stmt)
    }

    fn visit_return(&mut self, stmt: &'ast Stmt, ret: &'ast Return) -> Result<(), Self::Error> {
        let _ = ret;
        walk_stmt(self, stmt)
    }
}

/// Visit every direct child of `expr`.
pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, expr: &'ast Expr) -> Result<(), V::Error> {
    for child in expr.children() {
        child.accept(visitor)?;
    }
    Ok(())
}

/// Visit every direct child of `stmt`.
pub fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, stmt: &'ast Stmt) -> Result<(), V::Error> {
    for child in stmt.children() {
        child.accept(visitor)?;
    }
    Ok(())
}

impl Expr {
    /// Dispatch to the `visit_*` method for this node's variant.
    pub fn accept<'ast, V: Visitor<'ast> + ?Sized>(&'ast self, visitor: &mut V) -> Result<(), V::Error> {
        ensure_sufficient_stack(|| match self.kind() {
            ExprKind::Literal(literal) => visitor.visit_literal(self, literal),
            ExprKind::Variable(variable) => visitor.visit_variable(self, variable),
            ExprKind::Binary(binary) => visitor.visit_binary(self, binary),
            ExprKind::Unary(unary) => visitor.visit_unary(self, unary),
            ExprKind::IndexAccess(access) => visitor.visit_index_access(self, access),
            ExprKind::List(list) => visitor.visit_expression_list(self, list),
            ExprKind::Operator(op) => visitor.visit_operator_expression(self, op),
        })
    }
}

impl Stmt {
    /// Dispatch to the `visit_*` method for this node's variant.
    pub fn accept<'ast, V: Visitor<'ast> + ?Sized>(&'ast self, visitor: &mut V) -> Result<(), V::Error> {
        ensure_sufficient_stack(|| match self.kind() {
            StmtKind::Block(block) => visitor.visit_block(self, block),
            StmtKind::Assignment(assignment) => visitor.visit_assignment(self, assignment),
            StmtKind::VariableDeclaration(decl) => visitor.visit_variable_declaration(self, decl),
            StmtKind::If(if_stmt) => visitor.visit_if(self, if_stmt),
            StmtKind::For(for_stmt) => visitor.visit_for(self, for_stmt),
            StmtKind::While(while_stmt) => visitor.visit_while(self, while_stmt),
            StmtKind::Function(function) => visitor.visit_function(self, function),
            StmtKind::Call(call) => visitor.visit_call(self, call),
            StmtKind::Return(ret) => visitor.visit_return(self, ret),
        })
    }
}

impl<'ast> NodeRef<'ast> {
    pub fn accept<V: Visitor<'ast> + ?Sized>(self, visitor: &mut V) -> Result<(), V::Error> {
        match self {
            NodeRef::Expr(expr) => expr.accept(visitor),
            NodeRef::Stmt(stmt) => stmt.accept(visitor),
        }
    }
}

impl Node {
    pub fn accept<'ast, V: Visitor<'ast> + ?Sized>(&'ast self, visitor: &mut V) -> Result<(), V::Error> {
        self.as_ref().accept(visitor)
    }
}
