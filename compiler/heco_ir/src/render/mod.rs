//! Textual forms of the tree.
//!
//! `Display` on `Expr`/`Stmt` prints C-like source (`x = a + (b * c);`),
//! used in error messages and logs. [`TreePrinter`] prints the indented
//! node-type outline used by `heco print --tree` and in tests.
//!
//! Unset child slots print as `_`.

use std::fmt::{self, Write};

use crate::ast::{
    Assignment, BinaryExpression, Block, Call, Expr, ExprKind, ExpressionList, For, Function, If,
    IndexAccess, Literal, NodeRef, OperatorExpression, Return, Stmt, StmtKind, UnaryExpression,
    Variable, VariableDeclaration, While,
};
use crate::visitor::Visitor;

struct Renderer<'w, W: Write> {
    out: &'w mut W,
    /// Inside a `for` header: statements lose their trailing `;`.
    header: bool,
}

impl<'w, W: Write> Renderer<'w, W> {
    fn new(out: &'w mut W) -> Self {
        Renderer { out, header: false }
    }

    fn expr<'ast>(&mut self, slot: Option<&'ast Expr>) -> fmt::Result {
        match slot {
            Some(expr) => expr.accept(self),
            None => self.out.write_char('_'),
        }
    }

    /// Operands of a binary expression; nested operators get parentheses.
    fn operand<'ast>(&mut self, slot: Option<&'ast Expr>) -> fmt::Result {
        match slot {
            Some(expr) if matches!(expr.kind(), ExprKind::Binary(_)) => {
                self.out.write_char('(')?;
                expr.accept(self)?;
                self.out.write_char(')')
            }
            other => self.expr(other),
        }
    }

    fn stmt<'ast>(&mut self, slot: Option<&'ast Stmt>) -> fmt::Result {
        match slot {
            Some(stmt) => stmt.accept(self),
            None => self.out.write_char('_'),
        }
    }

    fn comma_separated<'ast>(&mut self, exprs: &'ast [Expr]) -> fmt::Result {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            expr.accept(self)?;
        }
        Ok(())
    }

    fn terminate(&mut self) -> fmt::Result {
        if self.header {
            Ok(())
        } else {
            self.out.write_char(';')
        }
    }
}

impl<'ast, W: Write> Visitor<'ast> for Renderer<'_, W> {
    type Error = fmt::Error;

    fn visit_literal(&mut self, _: &'ast Expr, literal: &'ast Literal) -> fmt::Result {
        write!(self.out, "{literal}")
    }

    fn visit_variable(&mut self, _: &'ast Expr, variable: &'ast Variable) -> fmt::Result {
        self.out.write_str(&variable.identifier)
    }

    fn visit_binary(&mut self, _: &'ast Expr, binary: &'ast BinaryExpression) -> fmt::Result {
        self.operand(binary.left.as_deref())?;
        write!(self.out, " {} ", binary.operator)?;
        self.operand(binary.right.as_deref())
    }

    fn visit_unary(&mut self, _: &'ast Expr, unary: &'ast UnaryExpression) -> fmt::Result {
        write!(self.out, "{}", unary.operator)?;
        self.operand(unary.operand.as_deref())
    }

    fn visit_index_access(&mut self, _: &'ast Expr, access: &'ast IndexAccess) -> fmt::Result {
        self.expr(access.target.as_deref())?;
        self.out.write_char('[')?;
        self.expr(access.index.as_deref())?;
        self.out.write_char(']')
    }

    fn visit_expression_list(&mut self, _: &'ast Expr, list: &'ast ExpressionList) -> fmt::Result {
        self.out.write_char('{')?;
        self.comma_separated(&list.expressions)?;
        self.out.write_char('}')
    }

    fn visit_operator_expression(&mut self, _: &'ast Expr, op: &'ast OperatorExpression) -> fmt::Result {
        write!(self.out, "{}(", op.operator)?;
        self.comma_separated(&op.operands)?;
        self.out.write_char(')')
    }

    fn visit_block(&mut self, _: &'ast Stmt, block: &'ast Block) -> fmt::Result {
        if block.statements.is_empty() {
            return self.out.write_str("{}");
        }
        let header = std::mem::replace(&mut self.header, false);
        self.out.write_str("{ ")?;
        for stmt in &block.statements {
            stmt.accept(self)?;
            self.out.write_char(' ')?;
        }
        self.header = header;
        self.out.write_char('}')
    }

    fn visit_assignment(&mut self, _: &'ast Stmt, assignment: &'ast Assignment) -> fmt::Result {
        self.expr(assignment.target.as_deref())?;
        self.out.write_str(" = ")?;
        self.expr(assignment.value.as_deref())?;
        self.terminate()
    }

    fn visit_variable_declaration(&mut self, _: &'ast Stmt, decl: &'ast VariableDeclaration) -> fmt::Result {
        write!(self.out, "{} {}", decl.datatype, decl.identifier)?;
        if let Some(value) = decl.value.as_deref() {
            self.out.write_str(" = ")?;
            value.accept(self)?;
        }
        self.terminate()
    }

    fn visit_if(&mut self, _: &'ast Stmt, if_stmt: &'ast If) -> fmt::Result {
        self.out.write_str("if (")?;
        self.expr(if_stmt.condition.as_deref())?;
        self.out.write_str(") ")?;
        self.stmt(if_stmt.then_branch.as_deref())?;
        if let Some(else_branch) = if_stmt.else_branch.as_deref() {
            self.out.write_str(" else ")?;
            else_branch.accept(self)?;
        }
        Ok(())
    }

    fn visit_for(&mut self, _: &'ast Stmt, for_stmt: &'ast For) -> fmt::Result {
        self.out.write_str("for (")?;
        let header = std::mem::replace(&mut self.header, true);
        if let Some(initializer) = for_stmt.initializer.as_deref() {
            initializer.accept(self)?;
        }
        self.out.write_str("; ")?;
        self.expr(for_stmt.condition.as_deref())?;
        self.out.write_str("; ")?;
        if let Some(update) = for_stmt.update.as_deref() {
            update.accept(self)?;
        }
        self.header = header;
        self.out.write_str(") ")?;
        self.stmt(for_stmt.body.as_deref())
    }

    fn visit_while(&mut self, _: &'ast Stmt, while_stmt: &'ast While) -> fmt::Result {
        self.out.write_str("while (")?;
        self.expr(while_stmt.condition.as_deref())?;
        self.out.write_str(") ")?;
        self.stmt(while_stmt.body.as_deref())
    }

    fn visit_function(&mut self, _: &'ast Stmt, function: &'ast Function) -> fmt::Result {
        match function.return_type {
            Some(datatype) => write!(self.out, "{datatype} ")?,
            None => self.out.write_str("void ")?,
        }
        write!(self.out, "{}(", function.identifier)?;
        for (i, param) in function.parameters.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            write!(self.out, "{} {}", param.datatype, param.identifier)?;
        }
        self.out.write_str(") ")?;
        self.stmt(function.body.as_deref())
    }

    fn visit_call(&mut self, _: &'ast Stmt, call: &'ast Call) -> fmt::Result {
        write!(self.out, "{}(", call.identifier)?;
        self.comma_separated(&call.arguments)?;
        self.out.write_char(')')?;
        self.terminate()
    }

    fn visit_return(&mut self, _: &'ast Stmt, ret: &'ast Return) -> fmt::Result {
        self.out.write_str("return")?;
        if !ret.values.is_empty() {
            self.out.write_char(' ')?;
            self.comma_separated(&ret.values)?;
        }
        self.terminate()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.accept(&mut Renderer::new(f))
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.accept(&mut Renderer::new(f))
    }
}

/// Indented outline of a subtree, one node per line.
///
/// ```text
/// Assignment
///   Variable (foo)
///   LiteralBool (true)
/// ```
pub struct TreePrinter {
    indent: usize,
}

impl Default for TreePrinter {
    fn default() -> Self {
        TreePrinter { indent: 2 }
    }
}

impl TreePrinter {
    pub fn with_indent(indent: usize) -> Self {
        TreePrinter { indent }
    }

    pub fn print<'a>(&self, root: impl Into<NodeRef<'a>>) -> String {
        let mut out = String::new();
        let mut pending = vec![(root.into(), 0usize)];
        while let Some((node, depth)) = pending.pop() {
            for _ in 0..depth * self.indent {
                out.push(' ');
            }
            out.push_str(node.node_type());
            if let Some(detail) = detail(node) {
                out.push_str(" (");
                out.push_str(&detail);
                out.push(')');
            }
            out.push('\n');
            pending.extend(node.children().into_iter().rev().map(|child| (child, depth + 1)));
        }
        out
    }
}

fn detail(node: NodeRef<'_>) -> Option<String> {
    match node {
        NodeRef::Expr(expr) => match expr.kind() {
            ExprKind::Literal(literal) => Some(match literal {
                Literal::Bool(v) => v.to_string(),
                Literal::Char(v) => v.to_string(),
                Literal::Int(v) => v.to_string(),
                Literal::Float(v) => v.to_string(),
                Literal::Double(v) => v.to_string(),
                Literal::String(v) => v.clone(),
            }),
            ExprKind::Variable(variable) => Some(variable.identifier.clone()),
            ExprKind::Binary(binary) => Some(binary.operator.to_string()),
            ExprKind::Unary(unary) => Some(unary.operator.to_string()),
            ExprKind::Operator(op) => Some(op.operator.to_string()),
            ExprKind::IndexAccess(_) | ExprKind::List(_) => None,
        },
        NodeRef::Stmt(stmt) => match stmt.kind() {
            StmtKind::VariableDeclaration(decl) => Some(format!("{} {}", decl.datatype, decl.identifier)),
            StmtKind::Function(function) => Some(function.identifier.clone()),
            StmtKind::Call(call) => Some(call.identifier.clone()),
            StmtKind::Block(_)
            | StmtKind::Assignment(_)
            | StmtKind::If(_)
            | StmtKind::For(_)
            | StmtKind::While(_)
            | StmtKind::Return(_) => None,
        },
    }
}
