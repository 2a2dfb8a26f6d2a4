//! Program execution for HECO.
//!
//! Ties the phases together for a caller holding a serialized program:
//! decode the AST once, then for every set of inputs clone it, run secret
//! taint analysis, rewrite secret-dependent control flow, evaluate against a
//! ciphertext backend and decrypt the requested outputs.
//!
//! ```text
//! let program = Program::from_json(&text)?;
//! let inputs = Inputs::from_json(&input_text)?;
//! let config = ExecutionConfig::default();
//! let run = program.execute(&inputs, &["y"], &config.factory(), &config)?;
//! ```

mod config;
mod errors;
mod inputs;
mod program;

use std::sync::Once;

pub use config::{ExecutionConfig, DEFAULT_SLOTS};
pub use errors::ExecError;
pub use inputs::{Input, Inputs};
pub use program::{cleartext_to_json, Execution, OutputValue, Program, StatementTaint};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=heco_eval=trace` or
/// `RUST_LOG=debug`; nothing is installed when `RUST_LOG` is unset.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};
        use tracing_tree::HierarchicalLayer;

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .init();
        }
    });
}
