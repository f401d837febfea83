//! # Arena World
//!
//! Persistent world state for Beast Arena.
//!
//! This crate provides:
//! - The `Store` read/write façade over typed records
//! - A versioned record codec (magic bytes + bincode)
//! - An in-memory `WorldStore` with snapshot files
//! - Per-key locks that serialize actions on the same battle or beast
//! - `ArenaSystem`, the transactional action layer players call into

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod locks;
pub mod record;
pub mod store;
pub mod system;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::locks::*;
    pub use crate::record::*;
    pub use crate::store::*;
    pub use crate::system::*;
}

pub use prelude::*;
