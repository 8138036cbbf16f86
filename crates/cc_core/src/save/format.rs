use super::error::SaveError;
use super::SAVE_VERSION;
use crate::models::{Match, Player, Withdrawal};
use serde::{Deserialize, Serialize};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

/// The whole application state as one persistable blob.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppSave {
    /// Save format version; newer-than-supported blobs are refused
    pub version: u32,

    /// Save timestamp (unix milliseconds)
    pub timestamp: u64,

    /// Every registered player
    pub players: Vec<Player>,

    /// Every match, scheduled through completed
    pub matches: Vec<Match>,

    /// Withdrawal ledger, newest first
    pub withdrawals: Vec<Withdrawal>,
}

impl Default for AppSave {
    fn default() -> Self {
        Self::new()
    }
}

impl AppSave {
    pub fn new() -> Self {
        Self {
            version: SAVE_VERSION,
            timestamp: current_timestamp(),
            players: Vec::new(),
            matches: Vec::new(),
            withdrawals: Vec::new(),
        }
    }

    pub fn update_timestamp(&mut self) {
        self.timestamp = current_timestamp();
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        // Duplicate ids mean the blob did not come from this system.
        let mut player_ids = std::collections::HashSet::new();
        for player in &self.players {
            if !player_ids.insert(&player.id) {
                return Err(SaveError::Corrupted);
            }
        }

        let mut match_ids = std::collections::HashSet::new();
        for match_rec in &self.matches {
            if !match_ids.insert(&match_rec.id) {
                return Err(SaveError::Corrupted);
            }
        }

        Ok(())
    }
}

/// Serialize and compress the application state.
pub fn serialize_and_compress(save: &AppSave) -> Result<Vec<u8>, SaveError> {
    // Validate before serialization
    save.validate()?;

    // 1. Serialize to MessagePack with field names
    let msgpack = to_vec_named(save).map_err(SaveError::Serialization)?;

    // 2. Compress with LZ4 (size prepended for easy decompression)
    let compressed = compress_prepend_size(&msgpack);

    // 3. Add SHA256 checksum at the end
    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hasher.finalize();

    let mut result = compressed;
    result.extend_from_slice(&checksum);

    Ok(result)
}

/// Decompress and deserialize the application state.
pub fn decompress_and_deserialize(bytes: &[u8]) -> Result<AppSave, SaveError> {
    // Check minimum size (header + checksum)
    if bytes.len() < 4 + 32 {
        return Err(SaveError::Corrupted);
    }

    // Split payload and checksum
    let (payload, checksum_bytes) = bytes.split_at(bytes.len() - 32);

    // Verify checksum
    let mut hasher = Sha256::new();
    hasher.update(payload);
    let calculated_checksum = hasher.finalize();

    if &calculated_checksum[..] != checksum_bytes {
        return Err(SaveError::ChecksumMismatch);
    }

    // Decompress
    let msgpack = decompress_size_prepended(payload).map_err(|_| SaveError::Decompression)?;

    // Deserialize
    let save: AppSave = from_slice(&msgpack).map_err(SaveError::Deserialization)?;

    // Validate version
    if save.version > SAVE_VERSION {
        return Err(SaveError::VersionMismatch { found: save.version, expected: SAVE_VERSION });
    }

    Ok(save)
}

pub fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}
