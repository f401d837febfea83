//! Execution context for state-mutating operations.
//!
//! Invoker identity, wall time, and block index are passed explicitly
//! instead of being read from ambient globals, so every operation is a
//! pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::ids::Address;

/// Who is acting, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Identity of the invoker.
    pub caller: Address,
    /// Current time in seconds.
    pub timestamp: u64,
    /// Current block index.
    pub block_number: u64,
}

impl ExecutionContext {
    /// Creates a new execution context.
    #[must_use]
    pub const fn new(caller: Address, timestamp: u64, block_number: u64) -> Self {
        Self {
            caller,
            timestamp,
            block_number,
        }
    }

    /// Same block and time, different invoker.
    #[must_use]
    pub const fn with_caller(self, caller: Address) -> Self {
        Self { caller, ..self }
    }

    /// Moves to the next block, `seconds` later.
    #[must_use]
    pub const fn advance(self, seconds: u64) -> Self {
        Self {
            caller: self.caller,
            timestamp: self.timestamp.saturating_add(seconds),
            block_number: self.block_number.saturating_add(1),
        }
    }
}
