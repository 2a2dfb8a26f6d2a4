//! JSON encoding of the tree.
//!
//! Every node is an object with a `type` discriminator naming the variant
//! (`BinaryExpression`, `LiteralInt`, `Block`, ...). Child slots use
//! camelCase keys; unset optional slots are omitted when encoding and
//! accepted as absent or `null` when decoding. Datatypes are written as
//! source text (`"secret int"`), operators as symbols (`"+"`); decoding
//! also accepts operator names (`"addition"`).
//!
//! Ids are not part of the format: decoding assigns fresh ones.

use heco_stack::ensure_sufficient_stack;
use serde_json::{json, Map, Value};

use crate::ast::{
    Assignment, BinaryExpression, Block, Call, Expr, ExprKind, ExpressionList, For, Function,
    FunctionParameter, If, IndexAccess, Literal, Node, OperatorExpression, Return, Stmt, StmtKind,
    UnaryExpression, Variable, VariableDeclaration, While,
};
use crate::{Datatype, IrError, Operator};

const EXPR_TYPES: &[&str] = &[
    "LiteralBool",
    "LiteralChar",
    "LiteralInt",
    "LiteralFloat",
    "LiteralDouble",
    "LiteralString",
    "Variable",
    "BinaryExpression",
    "UnaryExpression",
    "IndexAccess",
    "ExpressionList",
    "OperatorExpression",
];

impl Expr {
    pub fn to_json(&self) -> Value {
        ensure_sufficient_stack(|| encode_expr(self))
    }

    pub fn from_json(value: &Value) -> Result<Expr, IrError> {
        ensure_sufficient_stack(|| decode_expr(value))
    }
}

impl Stmt {
    pub fn to_json(&self) -> Value {
        ensure_sufficient_stack(|| encode_stmt(self))
    }

    pub fn from_json(value: &Value) -> Result<Stmt, IrError> {
        ensure_sufficient_stack(|| decode_stmt(value))
    }
}

impl Node {
    pub fn to_json(&self) -> Value {
        match self {
            Node::Expr(expr) => expr.to_json(),
            Node::Stmt(stmt) => stmt.to_json(),
        }
    }

    /// Decode either family, choosing by the `type` discriminator.
    pub fn from_json(value: &Value) -> Result<Node, IrError> {
        let ty = type_of(value)?;
        if EXPR_TYPES.contains(&ty) {
            Expr::from_json(value).map(Node::Expr)
        } else {
            Stmt::from_json(value).map(Node::Stmt)
        }
    }

    /// Parse JSON text and decode it.
    pub fn parse_json(text: &str) -> Result<Node, IrError> {
        let value: Value = serde_json::from_str(text)?;
        Node::from_json(&value)
    }
}

// Encoding

fn encode_expr(expr: &Expr) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), Value::from(expr.node_type()));
    match expr.kind() {
        ExprKind::Literal(literal) => {
            obj.insert("value".into(), encode_literal(literal));
        }
        ExprKind::Variable(variable) => {
            obj.insert("identifier".into(), Value::from(variable.identifier.as_str()));
        }
        ExprKind::Binary(binary) => {
            put_expr(&mut obj, "left", binary.left.as_deref());
            obj.insert("operator".into(), Value::from(binary.operator.as_symbol()));
            put_expr(&mut obj, "right", binary.right.as_deref());
        }
        ExprKind::Unary(unary) => {
            obj.insert("operator".into(), Value::from(unary.operator.as_symbol()));
            put_expr(&mut obj, "operand", unary.operand.as_deref());
        }
        ExprKind::IndexAccess(access) => {
            put_expr(&mut obj, "target", access.target.as_deref());
            put_expr(&mut obj, "index", access.index.as_deref());
        }
        ExprKind::List(list) => {
            obj.insert("expressions".into(), encode_exprs(&list.expressions));
        }
        ExprKind::Operator(op) => {
            obj.insert("operator".into(), Value::from(op.operator.as_symbol()));
            obj.insert("operands".into(), encode_exprs(&op.operands));
        }
    }
    Value::Object(obj)
}

fn encode_literal(literal: &Literal) -> Value {
    match literal {
        Literal::Bool(v) => Value::from(*v),
        Literal::Char(v) => Value::from(v.to_string()),
        Literal::Int(v) => Value::from(*v),
        Literal::Float(v) => json!(f64::from(*v)),
        Literal::Double(v) => json!(*v),
        Literal::String(v) => Value::from(v.as_str()),
    }
}

fn encode_exprs(exprs: &[Expr]) -> Value {
    Value::Array(exprs.iter().map(encode_expr).collect())
}

fn put_expr(obj: &mut Map<String, Value>, key: &str, slot: Option<&Expr>) {
    if let Some(expr) = slot {
        obj.insert(key.into(), encode_expr(expr));
    }
}

fn put_stmt(obj: &mut Map<String, Value>, key: &str, slot: Option<&Stmt>) {
    if let Some(stmt) = slot {
        obj.insert(key.into(), encode_stmt(stmt));
    }
}

fn encode_stmt(stmt: &Stmt) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), Value::from(stmt.node_type()));
    match stmt.kind() {
        StmtKind::Block(block) => {
            let statements = block.statements.iter().map(encode_stmt).collect();
            obj.insert("statements".into(), Value::Array(statements));
        }
        StmtKind::Assignment(assignment) => {
            put_expr(&mut obj, "target", assignment.target.as_deref());
            put_expr(&mut obj, "value", assignment.value.as_deref());
        }
        StmtKind::VariableDeclaration(decl) => {
            obj.insert("datatype".into(), Value::from(decl.datatype.to_string()));
            obj.insert(
                "target".into(),
                json!({ "type": "Variable", "identifier": decl.identifier }),
            );
            put_expr(&mut obj, "value", decl.value.as_deref());
        }
        StmtKind::If(if_stmt) => {
            put_expr(&mut obj, "condition", if_stmt.condition.as_deref());
            put_stmt(&mut obj, "thenBranch", if_stmt.then_branch.as_deref());
            put_stmt(&mut obj, "elseBranch", if_stmt.else_branch.as_deref());
        }
        StmtKind::For(for_stmt) => {
            put_stmt(&mut obj, "initializer", for_stmt.initializer.as_deref());
            put_expr(&mut obj, "condition", for_stmt.condition.as_deref());
            put_stmt(&mut obj, "update", for_stmt.update.as_deref());
            put_stmt(&mut obj, "body", for_stmt.body.as_deref());
        }
        StmtKind::While(while_stmt) => {
            put_expr(&mut obj, "condition", while_stmt.condition.as_deref());
            put_stmt(&mut obj, "body", while_stmt.body.as_deref());
        }
        StmtKind::Function(function) => {
            obj.insert("identifier".into(), Value::from(function.identifier.as_str()));
            let return_type = function
                .return_type
                .map_or_else(|| "void".to_string(), |datatype| datatype.to_string());
            obj.insert("returnType".into(), Value::from(return_type));
            let parameters = function
                .parameters
                .iter()
                .map(|param| {
                    json!({
                        "type": "FunctionParameter",
                        "datatype": param.datatype.to_string(),
                        "identifier": param.identifier,
                    })
                })
                .collect();
            obj.insert("parameters".into(), Value::Array(parameters));
            put_stmt(&mut obj, "body", function.body.as_deref());
        }
        StmtKind::Call(call) => {
            obj.insert("identifier".into(), Value::from(call.identifier.as_str()));
            obj.insert("arguments".into(), encode_exprs(&call.arguments));
        }
        StmtKind::Return(ret) => {
            obj.insert("values".into(), encode_exprs(&ret.values));
        }
    }
    Value::Object(obj)
}

// Decoding

fn type_of(value: &Value) -> Result<&str, IrError> {
    let obj = value
        .as_object()
        .ok_or_else(|| IrError::Json(format!("expected a node object, found {value}")))?;
    obj.get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| IrError::MissingField {
            node: "node".to_string(),
            field: "type",
        })
}

/// Field access for one node object, carrying its type for error messages.
struct Fields<'v> {
    ty: &'v str,
    obj: &'v Map<String, Value>,
}

impl<'v> Fields<'v> {
    fn of(value: &'v Value) -> Result<Self, IrError> {
        let ty = type_of(value)?;
        let obj = value
            .as_object()
            .ok_or_else(|| IrError::Json(format!("expected an object for {ty}")))?;
        Ok(Fields { ty, obj })
    }

    fn present(&self, field: &'static str) -> Option<&'v Value> {
        self.obj.get(field).filter(|value| !value.is_null())
    }

    fn require(&self, field: &'static str) -> Result<&'v Value, IrError> {
        self.present(field).ok_or_else(|| IrError::MissingField {
            node: self.ty.to_string(),
            field,
        })
    }

    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> IrError {
        IrError::InvalidField {
            node: self.ty.to_string(),
            field,
            reason: reason.into(),
        }
    }

    fn string(&self, field: &'static str) -> Result<String, IrError> {
        self.require(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(field, "expected a string"))
    }

    fn operator(&self) -> Result<Operator, IrError> {
        let text = self
            .require("operator")?
            .as_str()
            .ok_or_else(|| self.invalid("operator", "expected a string"))?;
        Operator::from_symbol(text).ok_or_else(|| IrError::UnknownOperator(text.to_string()))
    }

    fn datatype(&self, field: &'static str) -> Result<Datatype, IrError> {
        self.string(field)?.parse()
    }

    fn expr(&self, field: &'static str) -> Result<Option<Box<Expr>>, IrError> {
        self.present(field)
            .map(|value| decode_expr(value).map(Box::new))
            .transpose()
    }

    fn stmt(&self, field: &'static str) -> Result<Option<Box<Stmt>>, IrError> {
        self.present(field)
            .map(|value| decode_stmt(value).map(Box::new))
            .transpose()
    }

    fn array(&self, field: &'static str) -> Result<&'v [Value], IrError> {
        match self.present(field) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(self.invalid(field, "expected an array")),
        }
    }

    fn exprs(&self, field: &'static str) -> Result<Vec<Expr>, IrError> {
        self.array(field)?.iter().map(decode_expr).collect()
    }
}

fn decode_expr(value: &Value) -> Result<Expr, IrError> {
    let fields = Fields::of(value)?;
    let kind = match fields.ty {
        ty if ty.starts_with("Literal") => ExprKind::Literal(decode_literal(&fields)?),
        "Variable" => ExprKind::Variable(Variable {
            identifier: fields.string("identifier")?,
        }),
        "BinaryExpression" => ExprKind::Binary(BinaryExpression {
            left: fields.expr("left")?,
            operator: fields.operator()?,
            right: fields.expr("right")?,
        }),
        "UnaryExpression" => ExprKind::Unary(UnaryExpression {
            operator: fields.operator()?,
            operand: fields.expr("operand")?,
        }),
        "IndexAccess" => ExprKind::IndexAccess(IndexAccess {
            target: fields.expr("target")?,
            index: fields.expr("index")?,
        }),
        "ExpressionList" => ExprKind::List(ExpressionList {
            expressions: fields.exprs("expressions")?,
        }),
        "OperatorExpression" => ExprKind::Operator(OperatorExpression {
            operator: fields.operator()?,
            operands: fields.exprs("operands")?,
        }),
        other => return Err(IrError::UnknownNodeType(other.to_string())),
    };
    Ok(Expr::new(kind))
}

#[allow(clippy::cast_possible_truncation, reason = "float literals are stored as f32")]
fn decode_literal(fields: &Fields<'_>) -> Result<Literal, IrError> {
    let value = fields.require("value")?;
    let mismatch = |expected: &str| fields.invalid("value", format!("expected {expected}"));
    match fields.ty {
        "LiteralBool" => value.as_bool().map(Literal::Bool).ok_or_else(|| mismatch("a bool")),
        "LiteralChar" => {
            let text = value.as_str().ok_or_else(|| mismatch("a string"))?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Literal::Char(c)),
                _ => Err(mismatch("a single character")),
            }
        }
        "LiteralInt" => value.as_i64().map(Literal::Int).ok_or_else(|| mismatch("an integer")),
        "LiteralFloat" => value
            .as_f64()
            .map(|v| Literal::Float(v as f32))
            .ok_or_else(|| mismatch("a number")),
        "LiteralDouble" => value.as_f64().map(Literal::Double).ok_or_else(|| mismatch("a number")),
        "LiteralString" => value
            .as_str()
            .map(|s| Literal::String(s.to_string()))
            .ok_or_else(|| mismatch("a string")),
        other => Err(IrError::UnknownNodeType(other.to_string())),
    }
}

fn decode_stmt(value: &Value) -> Result<Stmt, IrError> {
    let fields = Fields::of(value)?;
    let kind = match fields.ty {
        "Block" => StmtKind::Block(Block {
            statements: fields
                .array("statements")?
                .iter()
                .map(decode_stmt)
                .collect::<Result<_, _>>()?,
        }),
        "Assignment" => StmtKind::Assignment(Assignment {
            target: fields.expr("target")?,
            value: fields.expr("value")?,
        }),
        "VariableDeclaration" => StmtKind::VariableDeclaration(VariableDeclaration {
            datatype: fields.datatype("datatype")?,
            identifier: declared_identifier(&fields)?,
            value: fields.expr("value")?,
        }),
        "If" => StmtKind::If(If {
            condition: fields.expr("condition")?,
            then_branch: fields.stmt("thenBranch")?,
            else_branch: fields.stmt("elseBranch")?,
        }),
        "For" => StmtKind::For(For {
            initializer: fields.stmt("initializer")?,
            condition: fields.expr("condition")?,
            update: fields.stmt("update")?,
            body: fields.stmt("body")?,
        }),
        "While" => StmtKind::While(While {
            condition: fields.expr("condition")?,
            body: fields.stmt("body")?,
        }),
        "Function" => StmtKind::Function(Function {
            identifier: fields.string("identifier")?,
            return_type: match fields.present("returnType").and_then(Value::as_str) {
                None | Some("void") => None,
                Some(text) => Some(text.parse()?),
            },
            parameters: fields
                .array("parameters")?
                .iter()
                .map(decode_parameter)
                .collect::<Result<_, _>>()?,
            body: fields.stmt("body")?,
        }),
        "Call" => StmtKind::Call(Call {
            identifier: fields.string("identifier")?,
            arguments: fields.exprs("arguments")?,
        }),
        "Return" => StmtKind::Return(Return {
            values: match fields.present("value") {
                Some(single) => vec![decode_expr(single)?],
                None => fields.exprs("values")?,
            },
        }),
        other => return Err(IrError::UnknownNodeType(other.to_string())),
    };
    Ok(Stmt::new(kind))
}

/// A declaration names its variable through a `Variable` target object;
/// a bare `identifier` string is accepted as well.
fn declared_identifier(fields: &Fields<'_>) -> Result<String, IrError> {
    if let Some(target) = fields.present("target") {
        let target = Fields::of(target)?;
        if target.ty != "Variable" {
            return Err(fields.invalid("target", format!("expected a Variable, found {}", target.ty)));
        }
        return target.string("identifier");
    }
    fields.string("identifier")
}

fn decode_parameter(value: &Value) -> Result<FunctionParameter, IrError> {
    let fields = Fields::of(value)?;
    Ok(FunctionParameter {
        datatype: fields.datatype("datatype")?,
        identifier: fields.string("identifier")?,
    })
}

#[cfg(test)]
mod tests;
