//! # Arena Engine
//!
//! Entry point for Beast Arena.
//!
//! Ties the subsystems together:
//! - World: record store, snapshots, and battle actions
//! - Gameplay: beasts, stats, and the battle state machine
//!
//! Usage: `arena [config.toml]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod duel;

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use arena_common::{Address, ExecutionContext};
use arena_world::{ArenaSystem, WorldStore};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ArenaConfig;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("arena=info".parse()?))
        .init();

    info!("Beast Arena starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => ArenaConfig::load_from(path),
        None => ArenaConfig::load(),
    };

    let store = WorldStore::new(config.store_config());
    if config.load_snapshot {
        store.load_snapshot().context("loading world snapshot")?;
    }
    let system = ArenaSystem::new(store);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before 1970")?
        .as_secs();
    let start = ExecutionContext::new(Address::ZERO, now, 1);
    let summary = duel::run_duel(&system, &config, duel::CONTENDERS, start)?;
    match summary.winner {
        Some(winner) => info!("{} won {} in {} turns", winner, summary.battle_id, summary.turns),
        None => info!("{} undecided after {} turns", summary.battle_id, summary.turns),
    }

    if config.save_snapshot {
        system
            .store()
            .save_snapshot()
            .context("saving world snapshot")?;
    }

    info!("Beast Arena shutdown complete");
    Ok(())
}
