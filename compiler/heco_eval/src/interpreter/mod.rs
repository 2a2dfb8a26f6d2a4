//! The runtime visitor.
//!
//! Expressions push exactly one [`Value`] onto the evaluation stack;
//! statements push nothing. Bindings live in one of two stores, chosen by
//! the secret flag of the declared datatype: secret identifiers hold a
//! ciphertext, all others a cleartext.
//!
//! Before a node runs, its secret taint is consulted so that shapes the
//! rewriter should have removed (secret conditions, non-FHE operators over
//! secret operands) fail with the offending snippet instead of computing
//! something wrong. The same checks are repeated on the runtime values.

mod builder;
mod output;
mod scope_guard;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use heco_ir::visitor::walk_stmt;
use heco_ir::{
    Assignment, BinaryExpression, Block, Call, Datatype, Expr, ExprKind, ExpressionList, For,
    Function, If, IndexAccess, Literal, NodeId, Operator, OperatorExpression, PrimitiveKind,
    Return, ScopeId, ScopeTree, ScopedIdentifier, Stmt, StmtKind, UnaryExpression, Variable,
    VariableDeclaration, Visitor, While,
};
use heco_taint::SecretTaintMap;

use crate::backend::{Ciphertext, CiphertextFactory};
use crate::errors::{
    ciphertext_into_cleartext, index_out_of_bounds, invalid_assignment_target,
    nested_index_access, not_live, secret_condition, structural, unresolved,
    unsupported_ciphertext_operation, unsupported_construct, EvalError,
};
use crate::value::{evaluate_binary, evaluate_unary, Cleartext, Value};

pub use builder::EvaluatorBuilder;
pub use output::Output;

/// Evaluates one program instance.
///
/// Stores are owned by the evaluator; run independent executions with
/// independent evaluators.
pub struct Evaluator<'a> {
    factory: &'a dyn CiphertextFactory,
    taint: Option<&'a SecretTaintMap>,
    scopes: ScopeTree,
    stack: Vec<Value>,
    declared_ciphertexts: FxHashMap<ScopedIdentifier, Box<dyn Ciphertext>>,
    declared_cleartexts: FxHashMap<ScopedIdentifier, Cleartext>,
    identifier_datatypes: FxHashMap<ScopedIdentifier, Datatype>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(factory: &'a dyn CiphertextFactory, taint: Option<&'a SecretTaintMap>) -> Self {
        Evaluator {
            factory,
            taint,
            scopes: ScopeTree::new(),
            stack: Vec::new(),
            declared_ciphertexts: FxHashMap::default(),
            declared_cleartexts: FxHashMap::default(),
            identifier_datatypes: FxHashMap::default(),
        }
    }

    pub fn builder(factory: &'a dyn CiphertextFactory) -> EvaluatorBuilder<'a> {
        EvaluatorBuilder::new(factory)
    }

    pub fn factory(&self) -> &'a dyn CiphertextFactory {
        self.factory
    }

    /// Run the program body.
    ///
    /// A top-level `Block` executes directly in the global scope, next to
    /// the inputs, so that output extraction sees its declarations.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self, program: &Stmt) -> Result<(), EvalError> {
        self.run_root(program)?;
        debug!(
            ciphertexts = self.declared_ciphertexts.len(),
            cleartexts = self.declared_cleartexts.len(),
            "evaluation complete"
        );
        Ok(())
    }

    /// The value bound to `name` as visible from the global scope.
    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        let id = self.scopes.resolve_in_root(name)?;
        self.load(&id)
    }

    /// Datatype of `name` as visible from the global scope.
    pub fn datatype_of(&self, name: &str) -> Option<Datatype> {
        let id = self.scopes.resolve_in_root(name).ok()?;
        self.identifier_datatypes.get(&id).copied()
    }

    pub(crate) fn run_root(&mut self, root: &Stmt) -> Result<(), EvalError> {
        self.scopes.set_current(ScopeId::ROOT);
        match root.kind() {
            StmtKind::Block(block) => {
                for stmt in &block.statements {
                    stmt.accept(self)?;
                }
                Ok(())
            }
            _ => root.accept(self),
        }
    }

    /// Evaluate `expr` and take its value off the stack.
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        expr.accept(self)?;
        self.stack
            .pop()
            .ok_or_else(|| structural(format!("`{expr}` produced no value")))
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn is_secret(&self, id: NodeId) -> bool {
        self.taint.is_some_and(|taint| taint.is_secret(id))
    }

    fn datatype(&self, id: &ScopedIdentifier) -> Result<Datatype, EvalError> {
        self.identifier_datatypes
            .get(id)
            .copied()
            .ok_or_else(|| unresolved(&id.name))
    }

    /// Clone of the stored value; the store keeps its own copy.
    fn load(&self, id: &ScopedIdentifier) -> Result<Value, EvalError> {
        if self.datatype(id)?.secret {
            self.declared_ciphertexts
                .get(id)
                .map(|ciphertext| Value::Ciphertext(ciphertext.clone_ciphertext()))
                .ok_or_else(|| not_live(&id.name))
        } else {
            self.declared_cleartexts
                .get(id)
                .map(|cleartext| Value::Cleartext(cleartext.clone()))
                .ok_or_else(|| not_live(&id.name))
        }
    }

    /// Overwrite the binding `id`, encrypting cleartexts bound for secret
    /// identifiers.
    fn store(&mut self, id: &ScopedIdentifier, value: Value) -> Result<(), EvalError> {
        let datatype = self.datatype(id)?;
        trace!(%id, secret = datatype.secret, "store");
        if datatype.secret {
            let ciphertext = self.encrypt(value, datatype)?;
            self.declared_ciphertexts.insert(id.clone(), ciphertext);
        } else {
            let Value::Cleartext(cleartext) = value else {
                return Err(ciphertext_into_cleartext(&id.name));
            };
            self.declared_cleartexts
                .insert(id.clone(), cleartext.coerce_to(datatype.kind)?);
        }
        Ok(())
    }

    fn encrypt(&self, value: Value, datatype: Datatype) -> Result<Box<dyn Ciphertext>, EvalError> {
        match value {
            Value::Ciphertext(ciphertext) => Ok(ciphertext),
            Value::Cleartext(cleartext) => self
                .factory
                .create_ciphertext(&cleartext.coerce_to(datatype.kind)?),
        }
    }

    /// Write `value` into element `index` of the binding `id`.
    ///
    /// A cleartext vector grows as needed. A ciphertext is blended with
    /// slot masks: `old * (1 - e_i) + rotate(value, -i) * e_i`; an unset
    /// ciphertext starts from encrypted zeros.
    fn store_element(&mut self, id: &ScopedIdentifier, index: i64, value: Value) -> Result<(), EvalError> {
        let datatype = self.datatype(id)?;
        trace!(%id, index, secret = datatype.secret, "store element");
        if !datatype.secret {
            let Value::Cleartext(element) = value else {
                return Err(ciphertext_into_cleartext(&id.name));
            };
            return self
                .declared_cleartexts
                .entry(id.clone())
                .or_insert_with(|| Cleartext::empty(datatype.kind))
                .set(index, element);
        }

        let slots = self.factory.slot_count();
        let slot = usize::try_from(index)
            .ok()
            .filter(|&slot| slot < slots)
            .ok_or_else(|| index_out_of_bounds(index, slots))?;
        let mut kept = match self.declared_ciphertexts.remove(id) {
            Some(ciphertext) => ciphertext,
            None => self
                .factory
                .create_ciphertext(&Cleartext::zeros(datatype.kind, 1))?,
        };
        let mut placed = self.encrypt(value, datatype)?.rotate_rows(-index)?;
        kept.multiply_plain_inplace(&slot_mask(datatype, slots, slot, false)?)?;
        placed.multiply_plain_inplace(&slot_mask(datatype, slots, slot, true)?)?;
        kept.add_inplace(placed.as_ref())?;
        self.declared_ciphertexts.insert(id.clone(), kept);
        Ok(())
    }

    /// A cleartext index; secret indices are rejected.
    fn eval_index(&mut self, index: &Expr) -> Result<i64, EvalError> {
        match self.eval_expr(index)? {
            Value::Cleartext(cleartext) => cleartext.as_int(),
            Value::Ciphertext(_) => Err(unsupported_construct("a secret index", &index.to_string())),
        }
    }

    /// A cleartext `bool` condition of an `If` or `For`.
    fn eval_condition(&mut self, condition: &Expr, construct: &str) -> Result<bool, EvalError> {
        if self.is_secret(condition.id()) {
            return Err(secret_condition(construct, &condition.to_string()));
        }
        match self.eval_expr(condition)? {
            Value::Cleartext(cleartext) => cleartext.as_bool(),
            Value::Ciphertext(_) => Err(secret_condition(construct, &condition.to_string())),
        }
    }

    /// Apply `operator`; a ciphertext operand is always the receiver.
    fn apply_binary(&self, expr: &Expr, operator: Operator, left: Value, right: Value) -> Result<Value, EvalError> {
        let (mut receiver, operand) = match (left, right) {
            (Value::Cleartext(l), Value::Cleartext(r)) => {
                return Ok(Value::Cleartext(evaluate_binary(operator, &l, &r)?));
            }
            (Value::Ciphertext(l), r) => (l, r),
            (Value::Cleartext(l), Value::Ciphertext(r)) if operator.is_commutative() => {
                (r, Value::Cleartext(l))
            }
            // `plain - secret`: encrypt the minuend to keep operand order.
            (Value::Cleartext(l), Value::Ciphertext(r)) => {
                (self.factory.create_ciphertext(&l)?, Value::Ciphertext(r))
            }
        };
        match (operator.to_plain(), &operand) {
            (Operator::Add, Value::Ciphertext(c)) => receiver.add_inplace(c.as_ref())?,
            (Operator::Add, Value::Cleartext(p)) => receiver.add_plain_inplace(p)?,
            (Operator::Sub, Value::Ciphertext(c)) => receiver.subtract_inplace(c.as_ref())?,
            (Operator::Sub, Value::Cleartext(p)) => receiver.subtract_plain_inplace(p)?,
            (Operator::Mul, Value::Ciphertext(c)) => receiver.multiply_inplace(c.as_ref())?,
            (Operator::Mul, Value::Cleartext(p)) => receiver.multiply_plain_inplace(p)?,
            _ => return Err(unsupported_ciphertext_operation(operator, &expr.to_string())),
        }
        Ok(Value::Ciphertext(receiver))
    }

    fn run_for(&mut self, stmt: &Stmt, for_stmt: &For) -> Result<(), EvalError> {
        let Some(condition) = for_stmt.condition.as_deref() else {
            return Err(unsupported_construct("a For without a condition", &stmt.to_string()));
        };
        if let Some(initializer) = for_stmt.initializer.as_deref() {
            initializer.accept(self)?;
        }
        let mut iterations = 0_u64;
        while self.eval_condition(condition, "For")? {
            if let Some(body) = for_stmt.body.as_deref() {
                body.accept(self)?;
            }
            if let Some(update) = for_stmt.update.as_deref() {
                update.accept(self)?;
            }
            iterations += 1;
        }
        trace!(iterations, "loop finished");
        Ok(())
    }
}

/// `e_i` (`hot`) or `1 - e_i` over `slots` slots, in the element kind of
/// `datatype`.
fn slot_mask(datatype: Datatype, slots: usize, index: usize, hot: bool) -> Result<Cleartext, EvalError> {
    let mask = Cleartext::Bool((0..slots).map(|slot| (slot == index) == hot).collect());
    if datatype.kind == PrimitiveKind::Bool {
        Ok(mask)
    } else {
        mask.coerce_to(PrimitiveKind::Int)?
            .coerce_to(datatype.kind)
    }
}

impl<'ast> Visitor<'ast> for Evaluator<'_> {
    type Error = EvalError;

    fn visit_literal(&mut self, _: &'ast Expr, literal: &'ast Literal) -> Result<(), EvalError> {
        self.push(Value::Cleartext(Cleartext::from(literal)));
        Ok(())
    }

    fn visit_variable(&mut self, _: &'ast Expr, variable: &'ast Variable) -> Result<(), EvalError> {
        let id = self.scopes.resolve(&variable.identifier)?;
        let value = self.load(&id)?;
        self.push(value);
        Ok(())
    }

    fn visit_binary(&mut self, expr: &'ast Expr, binary: &'ast BinaryExpression) -> Result<(), EvalError> {
        let left = binary.left()?;
        let right = binary.right()?;
        let secret = self.is_secret(left.id()) || self.is_secret(right.id());
        if secret && !binary.operator.is_fhe_compatible() {
            return Err(unsupported_ciphertext_operation(binary.operator, &expr.to_string()));
        }
        let left = self.eval_expr(left)?;
        let right = self.eval_expr(right)?;
        let result = self.apply_binary(expr, binary.operator, left, right)?;
        self.push(result);
        Ok(())
    }

    fn visit_unary(&mut self, expr: &'ast Expr, unary: &'ast UnaryExpression) -> Result<(), EvalError> {
        let operand = unary.operand()?;
        if self.is_secret(operand.id()) {
            return Err(unsupported_ciphertext_operation(unary.operator, &expr.to_string()));
        }
        match self.eval_expr(operand)? {
            Value::Cleartext(cleartext) => {
                let result = evaluate_unary(unary.operator, &cleartext)?;
                self.push(Value::Cleartext(result));
                Ok(())
            }
            Value::Ciphertext(_) => Err(unsupported_ciphertext_operation(unary.operator, &expr.to_string())),
        }
    }

    fn visit_index_access(&mut self, _: &'ast Expr, access: &'ast IndexAccess) -> Result<(), EvalError> {
        let target = self.eval_expr(access.target()?)?;
        let index = self.eval_index(access.index()?)?;
        let element = match target {
            Value::Cleartext(cleartext) => Value::Cleartext(cleartext.get(index)?),
            // The element lands in slot 0.
            Value::Ciphertext(ciphertext) => Value::Ciphertext(ciphertext.rotate_rows(index)?),
        };
        self.push(element);
        Ok(())
    }

    fn visit_expression_list(&mut self, expr: &'ast Expr, list: &'ast ExpressionList) -> Result<(), EvalError> {
        let mut elements = Vec::with_capacity(list.expressions.len());
        for element in &list.expressions {
            match self.eval_expr(element)? {
                Value::Cleartext(cleartext) => elements.push(cleartext),
                Value::Ciphertext(_) => {
                    return Err(unsupported_construct(
                        "an ExpressionList with a secret element",
                        &expr.to_string(),
                    ));
                }
            }
        }
        let mut elements = elements.into_iter();
        let Some(mut aggregate) = elements.next() else {
            return Err(structural(format!("cannot infer the element type of `{expr}`")));
        };
        let kind = aggregate.kind();
        for element in elements {
            aggregate.extend(element.coerce_to(kind)?)?;
        }
        self.push(Value::Cleartext(aggregate));
        Ok(())
    }

    fn visit_operator_expression(
        &mut self,
        expr: &'ast Expr,
        _: &'ast OperatorExpression,
    ) -> Result<(), EvalError> {
        Err(unsupported_construct("OperatorExpression", &expr.to_string()))
    }

    fn visit_block(&mut self, stmt: &'ast Stmt, _: &'ast Block) -> Result<(), EvalError> {
        let mut scoped = self.scoped(stmt.id());
        walk_stmt(&mut *scoped, stmt)
    }

    fn visit_assignment(&mut self, stmt: &'ast Stmt, assignment: &'ast Assignment) -> Result<(), EvalError> {
        let target = assignment.target()?;
        let value = assignment.value()?;
        match target.kind() {
            ExprKind::Variable(variable) => {
                let id = self.scopes.resolve(&variable.identifier)?;
                let value = self.eval_expr(value)?;
                self.store(&id, value)
            }
            ExprKind::IndexAccess(access) => {
                let Some(variable) = access.target()?.as_variable() else {
                    return Err(nested_index_access(&stmt.to_string()));
                };
                let id = self.scopes.resolve(&variable.identifier)?;
                let index = self.eval_index(access.index()?)?;
                let value = self.eval_expr(value)?;
                self.store_element(&id, index, value)
            }
            _ => Err(invalid_assignment_target(&target.to_string())),
        }
    }

    fn visit_variable_declaration(
        &mut self,
        stmt: &'ast Stmt,
        decl: &'ast VariableDeclaration,
    ) -> Result<(), EvalError> {
        let value = match decl.value.as_deref() {
            Some(init) => Some(self.eval_expr(init)?),
            None => None,
        };
        let id = self.scopes.declare(&decl.identifier, stmt.id())?;
        self.identifier_datatypes.insert(id.clone(), decl.datatype);
        match value {
            Some(value) => self.store(&id, value),
            None => {
                // Declared but not live until assigned.
                self.declared_ciphertexts.remove(&id);
                self.declared_cleartexts.remove(&id);
                Ok(())
            }
        }
    }

    fn visit_if(&mut self, _: &'ast Stmt, if_stmt: &'ast If) -> Result<(), EvalError> {
        let branch = if self.eval_condition(if_stmt.condition()?, "If")? {
            if_stmt.then_branch.as_deref()
        } else {
            if_stmt.else_branch.as_deref()
        };
        match branch {
            Some(branch) => branch.accept(self),
            None => Ok(()),
        }
    }

    fn visit_for(&mut self, stmt: &'ast Stmt, for_stmt: &'ast For) -> Result<(), EvalError> {
        let mut scoped = self.scoped(stmt.id());
        scoped.run_for(stmt, for_stmt)
    }

    fn visit_while(&mut self, _: &'ast Stmt, while_stmt: &'ast While) -> Result<(), EvalError> {
        let condition = while_stmt.condition()?;
        let mut iterations = 0_u64;
        while self.eval_condition(condition, "While")? {
            if let Some(body) = while_stmt.body.as_deref() {
                body.accept(self)?;
            }
            iterations += 1;
        }
        trace!(iterations, "loop finished");
        Ok(())
    }

    fn visit_function(&mut self, stmt: &'ast Stmt, _: &'ast Function) -> Result<(), EvalError> {
        Err(unsupported_construct("Function", &stmt.to_string()))
    }

    /// `rotate(v, k)`: rotate the ciphertext bound to `v` in place.
    fn visit_call(&mut self, stmt: &'ast Stmt, call: &'ast Call) -> Result<(), EvalError> {
        if call.identifier != "rotate" {
            return Err(unsupported_construct(
                &format!("call to `{}`", call.identifier),
                &stmt.to_string(),
            ));
        }
        let [target, steps] = call.arguments.as_slice() else {
            return Err(structural(format!(
                "rotate expects 2 arguments, got {}: `{stmt}`",
                call.arguments.len()
            )));
        };
        let Some(variable) = target.as_variable() else {
            return Err(structural(format!(
                "rotate expects a variable as its first argument: `{stmt}`"
            )));
        };
        let Some(&Literal::Int(steps)) = steps.as_literal() else {
            return Err(structural(format!(
                "rotate expects an integer literal as its second argument: `{stmt}`"
            )));
        };
        let id = self.scopes.resolve(&variable.identifier)?;
        let Some(ciphertext) = self.declared_ciphertexts.get_mut(&id) else {
            return Err(structural(format!(
                "rotate expects a declared ciphertext, `{}` is not one",
                variable.identifier
            )));
        };
        trace!(%id, steps, "rotate");
        ciphertext.rotate_rows_inplace(steps)
    }

    fn visit_return(&mut self, stmt: &'ast Stmt, _: &'ast Return) -> Result<(), EvalError> {
        Err(unsupported_construct("Return", &stmt.to_string()))
    }
}

#[cfg(test)]
mod tests;
