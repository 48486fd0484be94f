//! codec crate for multisig coordinator system.
//!
//! Byte-level encodings shared by the coordinator: P2MPKH addresses, multisig unlock scripts,
//! Alephium compact integers, transaction ids and signature verification.

mod address;
mod compact;
mod error;
mod hash;
mod matching;
mod signature;
mod unlock_script;

pub use self::{
    address::{AddressKind, decode_address, descriptor_address, encode_multisig_address, is_valid_address},
    compact::{decode_compact_int, encode_compact_int},
    error::CodecError,
    hash::{blake2b256, tx_id_of},
    matching::{AmbiguousMatch, match_descriptor},
    signature::verify_signature,
    unlock_script::{SAME_AS_PREVIOUS, UNLOCK_P2MPKH_TAG, decode_unlock_script, encode_unlock_script},
};
