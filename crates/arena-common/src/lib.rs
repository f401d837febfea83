//! # Arena Common
//!
//! Common types shared by every Beast Arena subsystem:
//! - Identity types (`Address`, `BeastId`, `BattleId`)
//! - The execution context passed into every state-mutating operation
//! - Version information for stored records
//! - Codec error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod context;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
