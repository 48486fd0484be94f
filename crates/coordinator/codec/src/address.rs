use core::num::NonZeroU32;

use alephium_multisig_coordinator_domain::{descriptor::MultisigDescriptor, key::PublicKey};

use crate::{CodecError, blake2b256, decode_compact_int, encode_compact_int};

const HASH_SIZE: usize = 32;

/// The kind of an Alephium address, identified by its leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Pay to public key hash.
    P2pkh,
    /// Pay to multiple public key hashes, carrying `M` of `N`.
    P2mpkh {
        /// The number of key hashes.
        signers: u32,
        /// The signature threshold.
        threshold: u32,
    },
    /// Pay to script hash.
    P2sh,
    /// Pay to contract.
    P2c,
}

impl AddressKind {
    const P2PKH_TAG: u8 = 0x00;
    const P2MPKH_TAG: u8 = 0x01;
    const P2SH_TAG: u8 = 0x02;
    const P2C_TAG: u8 = 0x03;

    fn name(self) -> &'static str {
        match self {
            Self::P2pkh => "p2pkh",
            Self::P2mpkh { .. } => "p2mpkh",
            Self::P2sh => "p2sh",
            Self::P2c => "p2c",
        }
    }
}

/// Encodes the P2MPKH address of `public_keys` with the given threshold.
///
/// The address commits to the key order: the same keys in another order give another
/// address.
pub fn encode_multisig_address<'a, I>(public_keys: I, threshold: NonZeroU32) -> String
where
    I: IntoIterator<Item = &'a PublicKey>,
    I::IntoIter: ExactSizeIterator,
{
    let public_keys = public_keys.into_iter();
    let mut bytes = Vec::with_capacity(2 + public_keys.len() * HASH_SIZE + 5);

    bytes.push(AddressKind::P2MPKH_TAG);
    encode_compact_int(compact_len(public_keys.len()), &mut bytes);
    for public_key in public_keys {
        bytes.extend_from_slice(&blake2b256(&public_key.to_bytes()));
    }
    encode_compact_int(compact_len(threshold.get() as usize), &mut bytes);

    bs58::encode(bytes).into_string()
}

/// Returns the P2MPKH address of a descriptor.
pub fn descriptor_address<AUX>(descriptor: &MultisigDescriptor<AUX>) -> String {
    encode_multisig_address(descriptor.public_keys(), descriptor.threshold())
}

fn compact_len(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Decodes an address and returns its kind.
///
/// # Errors
///
/// When the text is not base58, the leading byte is unknown, or the payload length does not
/// match the kind.
pub fn decode_address(address: &str) -> Result<AddressKind, CodecError> {
    let bytes = bs58::decode(address).into_vec()?;
    let (tag, payload) = bytes.split_first().ok_or_else(|| CodecError::invalid_address("empty"))?;

    let kind = match *tag {
        AddressKind::P2PKH_TAG => AddressKind::P2pkh,
        AddressKind::P2SH_TAG => AddressKind::P2sh,
        AddressKind::P2C_TAG => AddressKind::P2c,
        AddressKind::P2MPKH_TAG => return decode_multisig_payload(payload),
        other => return Err(CodecError::invalid_address(format!("unknown address tag {other:#04x}"))),
    };

    if payload.len() != HASH_SIZE {
        return Err(CodecError::invalid_address(format!(
            "{} payload must be {HASH_SIZE} bytes, got {}",
            kind.name(),
            payload.len()
        )));
    }

    Ok(kind)
}

fn decode_multisig_payload(payload: &[u8]) -> Result<AddressKind, CodecError> {
    let (signers, consumed) = decode_compact_int(payload)?;
    let signers = u32::try_from(signers)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| CodecError::invalid_address("multisig address without keys"))?;

    let hashes_end = (signers as usize)
        .checked_mul(HASH_SIZE)
        .and_then(|len| len.checked_add(consumed))
        .filter(|end| *end <= payload.len())
        .ok_or_else(|| CodecError::invalid_address("truncated key hashes"))?;

    let (threshold, consumed) = decode_compact_int(&payload[hashes_end..])?;
    if hashes_end + consumed != payload.len() {
        return Err(CodecError::invalid_address("trailing bytes after threshold"));
    }

    let threshold = u32::try_from(threshold)
        .ok()
        .filter(|m| (1..=signers).contains(m))
        .ok_or_else(|| CodecError::invalid_address("threshold out of range"))?;

    Ok(AddressKind::P2mpkh { signers, threshold })
}

/// Returns whether `address` decodes to a known address kind.
pub fn is_valid_address(address: &str) -> bool {
    decode_address(address).is_ok()
}
