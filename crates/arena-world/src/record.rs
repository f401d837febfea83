//! Stored records and their byte encoding.
//!
//! Layout of an encoded record:
//! `u32 header length (LE) | bincode(RecordHeader) | bincode(record)`.

use arena_common::{Address, BattleId, BeastId, CodecError, CodecResult, MagicBytes, SchemaVersion};
use arena_gameplay::{Battle, Beast, BeastStats};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A value persisted under a typed key.
pub trait Record: Serialize + DeserializeOwned {
    /// Key tuple identifying the record within its table.
    type Key: Serialize;

    /// Table name, unique per record type.
    const TABLE: &'static str;

    /// This record's key.
    fn key(&self) -> Self::Key;
}

impl Record for Battle {
    type Key = BattleId;
    const TABLE: &'static str = "battle";

    fn key(&self) -> Self::Key {
        self.id()
    }
}

impl Record for Beast {
    type Key = (Address, BeastId);
    const TABLE: &'static str = "beast";

    fn key(&self) -> Self::Key {
        (self.player, self.beast_id)
    }
}

impl Record for BeastStats {
    type Key = BeastId;
    const TABLE: &'static str = "beast_stats";

    fn key(&self) -> Self::Key {
        self.beast_id
    }
}

/// Last battle id handed out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleCounter {
    /// Highest id allocated so far.
    pub last_id: BattleId,
}

impl Record for BattleCounter {
    type Key = ();
    const TABLE: &'static str = "battle_counter";

    fn key(&self) -> Self::Key {}
}

/// Fully qualified storage key: table plus encoded record key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey {
    /// Table name.
    pub table: String,
    /// bincode-encoded record key.
    pub key: Vec<u8>,
}

impl StoreKey {
    /// Builds the storage key for a record key.
    pub fn of<R: Record>(key: &R::Key) -> CodecResult<Self> {
        let key =
            bincode::serialize(key).map_err(|e| CodecError::SerializationFailed(e.to_string()))?;
        Ok(Self {
            table: R::TABLE.to_owned(),
            key,
        })
    }
}

/// Header written before every record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordHeader {
    /// Magic bytes for format identification
    pub magic: [u8; 4],
    /// Schema version
    pub version: SchemaVersion,
}

impl RecordHeader {
    /// Header for the current record format.
    #[must_use]
    pub fn current() -> Self {
        Self {
            magic: MagicBytes::RECORD.0,
            version: SchemaVersion::RECORD,
        }
    }

    /// Validates the header.
    pub fn validate(&self) -> CodecResult<()> {
        if self.magic != MagicBytes::RECORD.0 {
            return Err(CodecError::InvalidFormat {
                expected: MagicBytes::RECORD.0,
            });
        }
        if !SchemaVersion::RECORD.can_read(&self.version) {
            return Err(CodecError::VersionMismatch {
                expected: SchemaVersion::RECORD.to_string(),
                actual: self.version.to_string(),
            });
        }
        Ok(())
    }
}

/// Encodes a record with its header.
pub fn encode_record<R: Record>(record: &R) -> CodecResult<Vec<u8>> {
    encode_with_header(&RecordHeader::current(), record)
}

/// Decodes a record, validating its header.
pub fn decode_record<R: Record>(bytes: &[u8]) -> CodecResult<R> {
    if bytes.len() < 4 {
        return Err(CodecError::DeserializationFailed("data too short".into()));
    }

    let header_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if bytes.len() < 4 + header_len {
        return Err(CodecError::DeserializationFailed(
            "header length mismatch".into(),
        ));
    }

    let header: RecordHeader = bincode::deserialize(&bytes[4..4 + header_len])
        .map_err(|e| CodecError::DeserializationFailed(e.to_string()))?;
    header.validate()?;

    bincode::deserialize(&bytes[4 + header_len..])
        .map_err(|e| CodecError::DeserializationFailed(e.to_string()))
}

fn encode_with_header<R: Record>(header: &RecordHeader, record: &R) -> CodecResult<Vec<u8>> {
    let header_bytes =
        bincode::serialize(header).map_err(|e| CodecError::SerializationFailed(e.to_string()))?;
    let body =
        bincode::serialize(record).map_err(|e| CodecError::SerializationFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(4 + header_bytes.len() + body.len());
    result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&body);
    Ok(result)
}
