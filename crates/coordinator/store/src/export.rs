//! Shareable configuration tokens.
//!
//! A token is `base64(json || hex(blake2b256(json)))`. The checksum catches truncation and
//! accidental edits when the token is copied between people.

use alephium_multisig_coordinator_codec::blake2b256;
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{
    error::{MultisigStoreError, Result, ValidationReason},
    record::ConfigRecord,
};

const CHECKSUM_HEX_LEN: usize = 64;

pub fn encode_token(config: &ConfigRecord) -> Result<String> {
    let json = serde_json::to_string(config)
        .map_err(|e| MultisigStoreError::serialization(e.to_string()))?;
    let checksum = hex::encode(blake2b256(json.as_bytes()));

    Ok(STANDARD.encode(format!("{json}{checksum}")))
}

pub fn decode_token(token: &str) -> Result<ConfigRecord> {
    let payload = STANDARD
        .decode(token.trim())
        .map_err(|e| MultisigStoreError::integrity(format!("not base64: {e}")))?;

    if payload.len() <= CHECKSUM_HEX_LEN {
        return Err(MultisigStoreError::integrity("token too short"));
    }

    let (json, checksum) = payload.split_at(payload.len() - CHECKSUM_HEX_LEN);
    if hex::encode(blake2b256(json)).as_bytes() != checksum {
        return Err(MultisigStoreError::integrity("checksum mismatch"));
    }

    serde_json::from_slice(json)
        .map_err(|e| ValidationReason::MalformedJson(e.to_string()).into())
}
