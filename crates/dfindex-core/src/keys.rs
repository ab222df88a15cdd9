//! Sortable key encoding for projection ids and sort keys.
//!
//! Heights and vout indices are rendered as fixed-width (8 char) lowercase
//! hex so a sorted-key store orders them numerically. Scripts are reduced to
//! a sha256 `hid`, which is the partition key for every script projection.

use sha2::{Digest, Sha256};

use crate::error::KeyError;

/// Width of an encoded height or vout index.
pub const ENCODED_WIDTH: usize = 8;

fn encode_u32(value: u64) -> Result<String, KeyError> {
    let v = u32::try_from(value).map_err(|_| KeyError::ValueOutOfRange { value })?;
    Ok(format!("{v:08x}"))
}

fn decode_u32(encoded: &str) -> Result<u32, KeyError> {
    if encoded.len() != ENCODED_WIDTH {
        return Err(KeyError::InvalidHex {
            input: encoded.to_string(),
            reason: format!("expected {ENCODED_WIDTH} chars"),
        });
    }
    u32::from_str_radix(encoded, 16).map_err(|e| KeyError::InvalidHex {
        input: encoded.to_string(),
        reason: e.to_string(),
    })
}

/// Encode a block height as 8 hex chars.
pub fn encode_height(height: u64) -> Result<String, KeyError> {
    encode_u32(height)
}

/// Encode a vout (or transaction position) index as 8 hex chars.
pub fn encode_vout_index(n: u64) -> Result<String, KeyError> {
    encode_u32(n)
}

/// Inverse of [`encode_height`].
pub fn decode_height(encoded: &str) -> Result<u64, KeyError> {
    decode_u32(encoded).map(u64::from)
}

/// Inverse of [`encode_vout_index`].
pub fn decode_vout_index(encoded: &str) -> Result<u64, KeyError> {
    decode_u32(encoded).map(u64::from)
}

/// sha256 of the script bytes, hex encoded (64 chars).
pub fn hash_script(script_hex: &str) -> Result<String, KeyError> {
    let bytes = hex::decode(script_hex).map_err(|e| KeyError::InvalidHex {
        input: script_hex.to_string(),
        reason: e.to_string(),
    })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
