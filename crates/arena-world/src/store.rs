//! Key-value record store and world snapshots.

use dashmap::DashMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use arena_common::{CodecError, MagicBytes, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::record::{decode_record, encode_record, Record, StoreKey};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record or snapshot encoding failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Snapshot file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read/write access to typed records.
pub trait Store {
    /// Reads the record stored under `key`.
    fn read<R: Record>(&self, key: &R::Key) -> StoreResult<Option<R>>;

    /// Writes `record` under its own key, replacing any previous value.
    fn write<R: Record>(&self, record: &R) -> StoreResult<()>;
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the snapshot file
    pub save_dir: PathBuf,
    /// Snapshot file name
    pub snapshot_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("saves/arena"),
            snapshot_name: "world.arsn".to_owned(),
        }
    }
}

/// A batch of encoded writes applied together.
///
/// Encoding happens while staging, so a commit cannot fail halfway.
#[derive(Debug, Default)]
pub struct Transaction {
    writes: Vec<(StoreKey, Vec<u8>)>,
}

impl Transaction {
    /// Creates an empty transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a record write.
    pub fn stage<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        let key = StoreKey::of::<R>(&record.key())?;
        let bytes = encode_record(record)?;
        self.writes.push((key, bytes));
        Ok(())
    }

    /// Number of staged writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Snapshot file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotHeader {
    magic: [u8; 4],
    version: SchemaVersion,
    entries: u64,
}

/// In-memory record store with snapshot persistence.
#[derive(Debug)]
pub struct WorldStore {
    /// Configuration
    config: StoreConfig,
    /// Encoded records
    entries: DashMap<StoreKey, Vec<u8>>,
}

impl Default for WorldStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl WorldStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies every staged write.
    pub fn commit(&self, tx: Transaction) {
        let count = tx.writes.len();
        for (key, bytes) in tx.writes {
            self.entries.insert(key, bytes);
        }
        debug!(count, "committed transaction");
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.config.save_dir.join(&self.config.snapshot_name)
    }

    /// Saves a snapshot to the configured location.
    pub fn save_snapshot(&self) -> StoreResult<usize> {
        self.save_to(self.snapshot_path())
    }

    /// Loads the configured snapshot, if one exists.
    ///
    /// A missing file leaves the store empty and returns 0.
    pub fn load_snapshot(&self) -> StoreResult<usize> {
        let path = self.snapshot_path();
        if !path.exists() {
            info!("No snapshot at {}, starting empty", path.display());
            return Ok(0);
        }
        self.load_from(path)
    }

    /// Writes every record to `path`.
    ///
    /// The snapshot goes to `<path>.tmp` first and is renamed into place, so
    /// a failed save leaves any previous snapshot intact.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> StoreResult<usize> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut entries: Vec<(StoreKey, Vec<u8>)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let header = SnapshotHeader {
            magic: MagicBytes::SNAPSHOT.0,
            version: SchemaVersion::SNAPSHOT,
            entries: entries.len() as u64,
        };
        let header_bytes = bincode::serialize(&header)
            .map_err(|e| CodecError::SerializationFailed(e.to_string()))?;
        let body = bincode::serialize(&entries)
            .map_err(|e| CodecError::SerializationFailed(e.to_string()))?;

        let mut bytes = Vec::with_capacity(4 + header_bytes.len() + body.len());
        bytes.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&header_bytes);
        bytes.extend_from_slice(&body);

        let temp_path = temp_path(path);
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, path)?;

        info!("Saved {} records to {}", entries.len(), path.display());
        Ok(entries.len())
    }

    /// Replaces the store contents with the snapshot at `path`.
    pub fn load_from<P: AsRef<Path>>(&self, path: P) -> StoreResult<usize> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        if bytes.len() < 4 {
            return Err(CodecError::DeserializationFailed("snapshot too short".into()).into());
        }

        let header_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if bytes.len() < 4 + header_len {
            return Err(
                CodecError::DeserializationFailed("header length mismatch".into()).into(),
            );
        }
        let header: SnapshotHeader = bincode::deserialize(&bytes[4..4 + header_len])
            .map_err(|e| CodecError::DeserializationFailed(e.to_string()))?;
        if header.magic != MagicBytes::SNAPSHOT.0 {
            return Err(CodecError::InvalidFormat {
                expected: MagicBytes::SNAPSHOT.0,
            }
            .into());
        }
        if !SchemaVersion::SNAPSHOT.can_read(&header.version) {
            return Err(CodecError::VersionMismatch {
                expected: SchemaVersion::SNAPSHOT.to_string(),
                actual: header.version.to_string(),
            }
            .into());
        }

        let entries: Vec<(StoreKey, Vec<u8>)> = bincode::deserialize(&bytes[4 + header_len..])
            .map_err(|e| CodecError::DeserializationFailed(e.to_string()))?;
        if entries.len() as u64 != header.entries {
            warn!(
                "Snapshot header lists {} records, found {}",
                header.entries,
                entries.len()
            );
        }

        self.entries.clear();
        let count = entries.len();
        for (key, value) in entries {
            self.entries.insert(key, value);
        }
        info!("Loaded {count} records from {}", path.display());
        Ok(count)
    }
}

impl Store for WorldStore {
    fn read<R: Record>(&self, key: &R::Key) -> StoreResult<Option<R>> {
        let key = StoreKey::of::<R>(key)?;
        match self.entries.get(&key) {
            Some(bytes) => Ok(Some(decode_record(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn write<R: Record>(&self, record: &R) -> StoreResult<()> {
        let mut tx = Transaction::new();
        tx.stage(record)?;
        self.commit(tx);
        Ok(())
    }
}

/// Sibling path a snapshot is staged at before the rename.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_common::{Address, BattleId, BeastId};
    use arena_gameplay::{Battle, BattleParams, Beast, BeastStats, BeastType};

    #[test]
    fn test_read_missing_is_none() {
        let store = WorldStore::default();
        let stats: Option<BeastStats> = store.read(&BeastId::new(1)).expect("read");
        assert!(stats.is_none());
    }

    #[test]
    fn test_write_then_read() {
        let store = WorldStore::default();
        let beast = Beast::new(Address::new(5), BeastId::new(2), BeastType::Shadow);
        store.write(&beast).expect("write");

        let loaded: Option<Beast> = store
            .read(&(Address::new(5), BeastId::new(2)))
            .expect("read");
        assert_eq!(loaded, Some(beast));

        let other_owner: Option<Beast> = store
            .read(&(Address::new(6), BeastId::new(2)))
            .expect("read");
        assert!(other_owner.is_none());
    }

    #[test]
    fn test_write_overwrites() {
        let store = WorldStore::default();
        let mut stats = BeastStats::with_values(BeastId::new(1), 80, 60, 60, 20);
        store.write(&stats).expect("write");
        stats.take_damage(30, 10);
        store.write(&stats).expect("write");

        let loaded: BeastStats = store.read(&BeastId::new(1)).expect("read").expect("present");
        assert_eq!(loaded.current_hp, 50);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_uncommitted_transaction_writes_nothing() {
        let store = WorldStore::default();
        let mut tx = Transaction::new();
        tx.stage(&BeastStats::with_values(BeastId::new(1), 80, 60, 60, 20))
            .expect("stage");
        assert_eq!(tx.len(), 1);
        drop(tx);
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StoreConfig {
            save_dir: dir.path().to_path_buf(),
            snapshot_name: "test.arsn".to_owned(),
        };
        let store = WorldStore::new(config.clone());
        let battle = Battle::new(BattleId::new(3), BattleParams::default()).expect("battle");
        store.write(&battle).expect("write");
        store
            .write(&BeastStats::with_values(BeastId::new(1), 80, 60, 60, 20))
            .expect("write");
        assert_eq!(store.save_snapshot().expect("save"), 2);

        let restored = WorldStore::new(config);
        assert_eq!(restored.load_snapshot().expect("load"), 2);
        let loaded: Option<Battle> = restored.read(&BattleId::new(3)).expect("read");
        assert_eq!(loaded, Some(battle));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("world.arsn");
        let store = WorldStore::default();
        store
            .write(&BeastStats::with_values(BeastId::new(1), 80, 60, 60, 20))
            .expect("write");
        store.save_to(&path).expect("save");
        store.save_to(&path).expect("save again");

        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("world.arsn")]);
    }

    #[test]
    fn test_failed_save_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("world.arsn");
        let store = WorldStore::default();
        store
            .write(&BeastStats::with_values(BeastId::new(1), 80, 60, 60, 20))
            .expect("write");
        assert_eq!(store.save_to(&path).expect("save"), 1);

        store
            .write(&BeastStats::with_values(BeastId::new(2), 70, 60, 60, 20))
            .expect("write");
        // A directory in the way makes the staging file impossible to create.
        fs::create_dir(temp_path(&path)).expect("block temp path");
        assert!(matches!(store.save_to(&path), Err(StoreError::Io(_))));

        let restored = WorldStore::default();
        assert_eq!(restored.load_from(&path).expect("load"), 1);
        let second: Option<BeastStats> = restored.read(&BeastId::new(2)).expect("read");
        assert!(second.is_none());
    }

    #[test]
    fn test_missing_snapshot_loads_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = WorldStore::new(StoreConfig {
            save_dir: dir.path().join("nowhere"),
            snapshot_name: "none.arsn".to_owned(),
        });
        assert_eq!(store.load_snapshot().expect("load"), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.arsn");
        std::fs::write(&path, b"\x02\x00\x00\x00zz").expect("write");
        let store = WorldStore::default();
        assert!(matches!(store.load_from(&path), Err(StoreError::Codec(_))));
    }
}
