use thiserror::Error;

use super::hash::double_sha256;

/// Length of the base-58 check suffix.
pub const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("invalid base-58 character {character:?} at position {index}")]
    InvalidCharacter { character: char, index: usize },

    #[error("invalid length: {0} bytes")]
    InvalidLength(usize),

    #[error("unexpected version byte {0:#04x}")]
    InvalidVersion(u8),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("address {0} is not derived from this key")]
    AddressMismatch(String),

    #[error("invalid hex")]
    InvalidHex,
}

impl From<bs58::decode::Error> for EncodingError {
    fn from(err: bs58::decode::Error) -> Self {
        match err {
            bs58::decode::Error::InvalidCharacter { character, index } => {
                EncodingError::InvalidCharacter { character, index }
            }
            bs58::decode::Error::NonAsciiCharacter { index } => EncodingError::InvalidCharacter {
                character: '?',
                index,
            },
            _ => EncodingError::InvalidLength(0),
        }
    }
}

/// Plain base-58 (Bitcoin alphabet: no `0`, `O`, `I`, `l`).
pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn base58_decode(s: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(bs58::decode(s).into_vec()?)
}

/// Base-58 of `version ‖ payload ‖ checksum`, where the checksum is the first
/// four bytes of double-SHA-256 over `version ‖ payload`.
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    base58_encode(&data)
}

/// Inverse of [`base58check_encode`]. Returns `(version, payload)` only if the
/// checksum recomputes.
pub fn base58check_decode(s: &str) -> Result<(u8, Vec<u8>), EncodingError> {
    let data = base58_decode(s)?;
    if data.len() < 1 + CHECKSUM_LEN {
        return Err(EncodingError::InvalidLength(data.len()));
    }
    let (body, checksum) = data.split_at(data.len() - CHECKSUM_LEN);
    if double_sha256(body)[..CHECKSUM_LEN] != *checksum {
        return Err(EncodingError::ChecksumMismatch);
    }
    Ok((body[0], body[1..].to_vec()))
}
