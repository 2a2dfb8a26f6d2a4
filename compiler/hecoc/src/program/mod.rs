//! Compiled programs and their execution.
//!
//! A [`Program`] holds the parsed tree as a template. Every run clones it
//! with fresh node ids, so per-node facts (taint) and runtime state of one
//! run never reach another, and batched runs can proceed in parallel.

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use serde_json::Value as Json;
use tracing::{debug, warn};

use heco_eval::{CiphertextFactory, Cleartext, EvaluatorBuilder, Value};
use heco_ir::{Expr, Node, Stmt, StmtKind};
use heco_rewrite::rewrite_program;
use heco_taint::analyze_program;

use crate::{ExecError, ExecutionConfig, Inputs};

/// Stack size of batch worker threads (32 MiB).
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

/// A parsed program, reusable across runs.
#[derive(Clone, Debug)]
pub struct Program {
    root: Stmt,
}

/// One decrypted output of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputValue {
    pub name: String,
    pub secret: bool,
    #[serde(serialize_with = "serialize_cleartext")]
    pub value: Cleartext,
    /// Display form produced by the backend.
    pub rendered: String,
}

/// Outputs of one run, in the requested order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Execution {
    pub outputs: Vec<OutputValue>,
}

impl Execution {
    pub fn get(&self, name: &str) -> Option<&OutputValue> {
        self.outputs.iter().find(|output| output.name == name)
    }

    /// `name: value` lines.
    pub fn render(&self) -> String {
        self.outputs
            .iter()
            .map(|output| format!("{}: {}\n", output.name, output.rendered))
            .collect()
    }
}

/// Secret flag of one top-level statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatementTaint {
    pub statement: String,
    pub secret: bool,
}

impl Program {
    pub fn new(root: Stmt) -> Self {
        Program { root }
    }

    /// Parse the JSON form of a program; the root must be a statement.
    pub fn from_json(text: &str) -> Result<Self, ExecError> {
        match Node::parse_json(text)? {
            Node::Stmt(root) => Ok(Program { root }),
            Node::Expr(expr) => Err(ExecError::ExpressionRoot(expr.node_type())),
        }
    }

    pub fn root(&self) -> &Stmt {
        &self.root
    }

    /// Run the program once: taint analysis, rewriting (if enabled),
    /// evaluation and output extraction.
    #[tracing::instrument(level = "debug", skip_all, fields(inputs = inputs.len(), outputs = outputs.len()))]
    pub fn execute<S: AsRef<str>>(
        &self,
        inputs: &Inputs,
        outputs: &[S],
        factory: &dyn CiphertextFactory,
        config: &ExecutionConfig,
    ) -> Result<Execution, ExecError> {
        let program = self.root.clone_tree(false);
        let input_block = inputs.to_block()?;
        let output_block = output_block(outputs);

        let mut taint = analyze_program(&input_block, &program, &output_block)?;
        let program = if config.rewrite {
            rewrite_program(program, &mut taint)?
        } else {
            program
        };

        let mut evaluator = EvaluatorBuilder::new(factory)
            .taint(&taint)
            .inputs(&input_block)
            .build()?;
        evaluator.run(&program)?;
        let values = evaluator.get_output(&output_block)?;

        let mut execution = Execution::default();
        for (name, value) in values {
            let secret = matches!(value, Value::Ciphertext(_));
            execution.outputs.push(OutputValue {
                rendered: evaluator.render_value(&value)?,
                value: evaluator.decrypt(&value)?,
                secret,
                name,
            });
        }
        debug!(outputs = execution.outputs.len(), "execution complete");
        Ok(execution)
    }

    /// Run the program once per input set, in parallel.
    ///
    /// Each run owns its clone of the tree, its taint map and its
    /// evaluator; results come back in input order.
    pub fn execute_batch<S: AsRef<str> + Sync>(
        &self,
        batch: &[Inputs],
        outputs: &[S],
        factory: &dyn CiphertextFactory,
        config: &ExecutionConfig,
    ) -> Vec<Result<Execution, ExecError>> {
        let run = |inputs: &Inputs| self.execute(inputs, outputs, factory, config);
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallelism)
            .stack_size(WORKER_STACK_SIZE)
            .build_scoped(rayon::ThreadBuilder::run, |pool| {
                pool.install(|| batch.par_iter().map(run).collect::<Vec<_>>())
            })
            .unwrap_or_else(|e| {
                warn!("failed to create thread pool ({e}), running sequentially");
                batch.iter().map(run).collect()
            })
    }

    /// Secret flags of the top-level statements for the given inputs.
    pub fn analyze(&self, inputs: &Inputs) -> Result<Vec<StatementTaint>, ExecError> {
        let input_block = inputs.to_block()?;
        let taint = analyze_program(&input_block, &self.root, &Stmt::block(Vec::new()))?;
        let statements = match self.root.kind() {
            StmtKind::Block(block) => block.statements.iter().collect(),
            _ => vec![&self.root],
        };
        Ok(statements
            .into_iter()
            .map(|stmt| StatementTaint {
                statement: stmt.to_string(),
                secret: taint.is_secret(stmt.id()),
            })
            .collect())
    }
}

/// `Block[Assignment(y, y)...]` for the requested output names.
fn output_block<S: AsRef<str>>(names: &[S]) -> Stmt {
    Stmt::block(
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                Stmt::assignment(Expr::variable(name), Expr::variable(name))
            })
            .collect(),
    )
}

/// Scalars as JSON scalars, vectors as arrays.
pub fn cleartext_to_json(value: &Cleartext) -> Json {
    fn collect<T: Clone + Into<Json>>(items: &[T]) -> Json {
        match items {
            [single] => single.clone().into(),
            _ => Json::Array(items.iter().cloned().map(Into::into).collect()),
        }
    }
    match value {
        Cleartext::Bool(v) => collect(v),
        Cleartext::Char(v) => collect(&v.iter().map(char::to_string).collect::<Vec<_>>()),
        Cleartext::Int(v) => collect(v),
        Cleartext::Float(v) => collect(v),
        Cleartext::Double(v) => collect(v),
        Cleartext::String(v) => collect(v),
    }
}

fn serialize_cleartext<S: Serializer>(value: &Cleartext, serializer: S) -> Result<S::Ok, S::Error> {
    cleartext_to_json(value).serialize(serializer)
}
