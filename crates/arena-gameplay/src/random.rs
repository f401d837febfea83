//! Deterministic pseudo-random rolls.
//!
//! Every roll is a pure function of the execution context (block time and
//! block index) and two caller-supplied seeds. Two identical calls within
//! the same block return the same value.

use std::hash::{Hash, Hasher};

use arena_common::ExecutionContext;
use rustc_hash::FxHasher;
use thiserror::Error;
use tracing::trace;

/// Errors from the pseudo-random generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RandomError {
    /// Requested range is empty or inverted
    #[error("min must be less than max (min {min}, max {max})")]
    InvalidRange {
        /// Lower bound requested
        min: u8,
        /// Upper bound requested
        max: u8,
    },
}

/// Result type for random rolls.
pub type RandomResult<T> = Result<T, RandomError>;

/// Salt for the hit point roll.
pub const HP_SALT: u16 = 1;
/// Salt for the attack roll.
pub const ATTACK_SALT: u16 = 2;
/// Salt for the defense roll.
pub const DEFENSE_SALT: u16 = 3;
/// Salt for the speed roll.
pub const SPEED_SALT: u16 = 4;
/// Salt for the paralysis check.
pub const PARALYSIS_SALT: u16 = 5;

/// Rolls a value in `[min, max]` inclusive.
///
/// Fails with [`RandomError::InvalidRange`] unless `min < max`.
pub fn generate_random_u8(
    ctx: &ExecutionContext,
    seed_a: u64,
    seed_b: u16,
    min: u8,
    max: u8,
) -> RandomResult<u8> {
    if min >= max {
        return Err(RandomError::InvalidRange { min, max });
    }

    let mut hasher = FxHasher::default();
    ctx.timestamp.hash(&mut hasher);
    ctx.block_number.hash(&mut hasher);
    seed_a.hash(&mut hasher);
    seed_b.hash(&mut hasher);
    let wide = mix(hasher.finish());

    let span = u64::from(max - min) + 1;
    let value = min + (wide % span) as u8;
    trace!(seed_a, seed_b, min, max, value, "random roll");
    Ok(value)
}

/// Rolls a percentage in `[1, 100]`.
pub fn roll_percent(ctx: &ExecutionContext, seed_a: u64, seed_b: u16) -> RandomResult<u8> {
    generate_random_u8(ctx, seed_a, seed_b, 1, 100)
}

/// splitmix64 finalizer, spreads the low-entropy inputs over all bits.
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
