//! Execution settings.

use heco_eval::DummyCiphertextFactory;

/// Slot count of the simulated backend unless configured.
pub const DEFAULT_SLOTS: usize = 16;

/// Settings shared by every run of a program.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Slots per ciphertext of the simulated backend.
    pub slots: usize,
    /// Run the standard rewrite rules before evaluation.
    pub rewrite: bool,
    /// Worker threads for batched runs; `0` lets rayon decide.
    pub parallelism: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            slots: DEFAULT_SLOTS,
            rewrite: true,
            parallelism: 0,
        }
    }
}

impl ExecutionConfig {
    #[must_use]
    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    #[must_use]
    pub fn with_rewrite(mut self, rewrite: bool) -> Self {
        self.rewrite = rewrite;
        self
    }

    #[must_use]
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads;
        self
    }

    /// The simulated backend for these settings.
    pub fn factory(&self) -> DummyCiphertextFactory {
        DummyCiphertextFactory::new(self.slots)
    }
}
