//! On-disk record envelope and the codec that reads and writes it.
//!
//! Each cache entry is stored as:
//!
//! ```json
//! {
//!   "createdAt": "2024-05-01T09:30:00Z",
//!   "updatedAt": "2024-05-02T11:00:12.345Z",
//!   "data": { "any": "json" }
//! }
//! ```
//!
//! The payload is opaque to the store. Serialization goes through a
//! [`RecordCodec`] so the envelope format can be swapped without touching
//! the store itself.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced while encoding or decoding a record.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes were not a valid record, or the payload could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persisted unit: a payload plus its provenance timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord<T> {
    /// When the entry was first written. Preserved across overwrites.
    pub created_at: DateTime<Utc>,
    /// When the entry was last written.
    pub updated_at: DateTime<Utc>,
    /// Caller-supplied payload.
    pub data: T,
}

impl<T> CacheRecord<T> {
    /// Build a record for a write happening at `now`.
    ///
    /// `created_at` is taken from the previous record when one existed.
    #[must_use]
    pub fn stamped(data: T, previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        Self {
            created_at: previous.unwrap_or(now),
            updated_at: now,
            data,
        }
    }
}

/// Provenance pair of a record.
///
/// Deserializes directly from a full record file; the `data` field is
/// skipped, so recovering timestamps never depends on the payload type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serialization strategy for record files.
pub trait RecordCodec {
    /// Encode a record into the bytes written to disk.
    fn encode<T: Serialize>(&self, record: &CacheRecord<T>) -> Result<Vec<u8>, CodecError>;

    /// Decode a full record.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<CacheRecord<T>, CodecError>;

    /// Decode only the provenance timestamps.
    fn decode_metadata(&self, bytes: &[u8]) -> Result<CacheMetadata, CodecError>;
}

/// JSON codec, pretty-printed by default so records stay human-diffable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec {
    pub pretty: bool,
}

impl JsonCodec {
    #[must_use]
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl RecordCodec for JsonCodec {
    fn encode<T: Serialize>(&self, record: &CacheRecord<T>) -> Result<Vec<u8>, CodecError> {
        let mut bytes = if self.pretty {
            serde_json::to_vec_pretty(record)?
        } else {
            serde_json::to_vec(record)?
        };
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<CacheRecord<T>, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn decode_metadata(&self, bytes: &[u8]) -> Result<CacheMetadata, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
