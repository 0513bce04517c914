//! Native storage format: a small versioned header around a Postcard payload.
//!
//! # Format Structure
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic ("SFRT")
//! 4       1     Format version
//! 5       3     Reserved (zero)
//! 8       8     Payload length (u64, little-endian)
//! 16      ...   Postcard-encoded payload
//! ```

use thiserror::Error;

use super::payload::Payload;

/// Magic bytes identifying a streamforest model.
pub const MAGIC: &[u8; 4] = b"SFRT";

/// Current format version.
pub const CURRENT_VERSION: u8 = 1;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Errors from encoding or decoding persisted forest state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Input shorter than the fixed header.
    #[error("input too short for a {HEADER_SIZE}-byte header")]
    TruncatedHeader,

    /// Magic bytes did not match.
    #[error("bad magic bytes: not a streamforest model")]
    BadMagic,

    /// Unknown format version.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// Payload length field disagrees with the input length.
    #[error("payload length mismatch: header says {expected}, input has {got}")]
    PayloadLength { expected: usize, got: usize },

    /// Postcard serialization or deserialization failure.
    #[error("codec error: {0}")]
    Codec(#[from] postcard::Error),

    /// The state was saved with a shared schema; the caller must supply it.
    #[error("schema must be supplied to restore this model")]
    SchemaRequired,

    /// The supplied schema does not match the persisted dimension count.
    #[error("schema has {got} dimensions, model expects {expected}")]
    SchemaMismatch { expected: usize, got: usize },
}

/// Encode a payload with the native header.
pub fn encode_payload(payload: &Payload) -> Result<Vec<u8>, PersistError> {
    let body = postcard::to_allocvec(payload)?;
    let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(CURRENT_VERSION);
    bytes.extend_from_slice(&[0u8; 3]);
    bytes.extend_from_slice(&(body.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode a payload, validating the native header.
pub fn decode_payload(bytes: &[u8]) -> Result<Payload, PersistError> {
    if bytes.len() < HEADER_SIZE {
        return Err(PersistError::TruncatedHeader);
    }
    if &bytes[0..4] != MAGIC {
        return Err(PersistError::BadMagic);
    }
    let version = bytes[4];
    if version != CURRENT_VERSION {
        return Err(PersistError::UnsupportedVersion(version));
    }
    let expected = u64::from_le_bytes(bytes[8..16].try_into().expect("slice is 8 bytes")) as usize;
    let body = &bytes[HEADER_SIZE..];
    if body.len() != expected {
        return Err(PersistError::PayloadLength {
            expected,
            got: body.len(),
        });
    }
    Ok(postcard::from_bytes(body)?)
}
