//! Runner configuration.
//!
//! Loaded from `arena.toml`. Missing or unreadable files fall back to the
//! defaults.

use arena_gameplay::MAX_LEVEL;
use arena_world::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "arena.toml";

/// Runner configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    // === Persistence ===
    /// Directory holding the world snapshot
    pub data_dir: PathBuf,
    /// Snapshot file name inside `data_dir`
    pub snapshot_name: String,
    /// Restore the snapshot on startup
    pub load_snapshot: bool,
    /// Write the snapshot on shutdown
    pub save_snapshot: bool,

    // === Duel ===
    /// Level of freshly spawned beasts
    pub starting_level: u8,
    /// Turn limit before the duel is abandoned
    pub max_turns: u32,
    /// Seconds between blocks
    pub block_time_secs: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("saves/arena"),
            snapshot_name: "world.arsn".to_owned(),
            load_snapshot: true,
            save_snapshot: true,

            starting_level: 1,
            max_turns: 50,
            block_time_secs: 6,
        }
    }
}

impl ArenaConfig {
    /// Load configuration from `arena.toml` in the working directory.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.starting_level = self.starting_level.clamp(1, MAX_LEVEL);
        self.max_turns = self.max_turns.clamp(1, 10_000);
        self.block_time_secs = self.block_time_secs.clamp(1, 3_600);

        if self.snapshot_name.trim().is_empty() {
            self.snapshot_name = Self::default().snapshot_name;
        }
    }

    /// Store settings derived from this config.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            save_dir: self.data_dir.clone(),
            snapshot_name: self.snapshot_name.clone(),
        }
    }
}
