use alephium_multisig_coordinator_domain::{
    key::PublicKey,
    tx::{MAX_UNLOCK_KEYS, UnlockKey, UnlockScript},
};

use crate::{CodecError, decode_compact_int, encode_compact_int};

/// Leading byte of a multi-public-key unlock script.
pub const UNLOCK_P2MPKH_TAG: u8 = 0x01;

/// Serialized unlock script of an input that reuses the previous input's script.
pub const SAME_AS_PREVIOUS: &[u8] = &[0x03];

// compressed public key plus its slot index byte
const UNLOCK_KEY_SIZE: usize = PublicKey::SERIALIZED_SIZE + 1;

/// Decodes a serialized multi-public-key unlock script.
///
/// The layout is the tag byte, a compact key count between one and [`MAX_UNLOCK_KEYS`], then
/// for each key the 33-byte compressed public key followed by its raw one-byte slot index.
///
/// # Errors
///
/// [`CodecError::MalformedScript`] on a wrong tag, an empty or oversized key list, a length
/// mismatch or an undecodable public key.
pub fn decode_unlock_script(raw: &[u8]) -> Result<UnlockScript, CodecError> {
    let Some((&UNLOCK_P2MPKH_TAG, mut rest)) = raw.split_first() else {
        return Err(CodecError::malformed_script("not a multi-public-key unlock script"));
    };

    let (count, consumed) = decode_compact_int(rest).map_err(|_| CodecError::malformed_script("missing key count"))?;
    let count = usize::try_from(count)
        .ok()
        .filter(|n| (1..=MAX_UNLOCK_KEYS).contains(n))
        .ok_or_else(|| CodecError::malformed_script(format!("key count {count} out of range")))?;
    rest = &rest[consumed..];

    let mut keys = Vec::with_capacity(count);
    for n in 0..count {
        if rest.len() < UNLOCK_KEY_SIZE {
            return Err(CodecError::malformed_script(format!("key #{n} is truncated")));
        }
        let (pair, tail) = rest.split_at(UNLOCK_KEY_SIZE);
        let (key, &[slot_index]) = pair.split_at(PublicKey::SERIALIZED_SIZE) else {
            return Err(CodecError::malformed_script(format!("key #{n} has no slot index")));
        };
        let public_key = PublicKey::from_slice(key)
            .map_err(|e| CodecError::malformed_script(format!("key #{n}: {e}")))?;

        keys.push(UnlockKey::new(public_key, slot_index));
        rest = tail;
    }

    if !rest.is_empty() {
        return Err(CodecError::malformed_script(format!("{} trailing bytes", rest.len())));
    }

    UnlockScript::new(keys).map_err(|e| CodecError::malformed_script(e.to_string()))
}

/// Serializes an unlock script; the inverse of [`decode_unlock_script`].
pub fn encode_unlock_script(script: &UnlockScript) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + script.len() * UNLOCK_KEY_SIZE);

    out.push(UNLOCK_P2MPKH_TAG);
    // at most 16 keys, never truncates
    encode_compact_int(script.len() as i32, &mut out);
    for key in script.keys() {
        out.extend_from_slice(&key.public_key().to_bytes());
        out.push(key.slot_index());
    }

    out
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use super::*;

    const A: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const C: &str = "02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9";

    fn script() -> UnlockScript {
        UnlockScript::new(vec![
            UnlockKey::new(PublicKey::from_str(A).unwrap(), 0),
            UnlockKey::new(PublicKey::from_str(C).unwrap(), 2),
        ])
        .unwrap()
    }

    #[test]
    fn hex_layout_matches_wire_format() {
        let encoded = hex::encode(encode_unlock_script(&script()));
        assert_eq!(encoded, format!("0102{A}00{C}02"));
        assert_eq!(decode_unlock_script(&hex::decode(encoded).unwrap()).unwrap(), script());
    }

    #[test]
    fn slot_indices_are_single_raw_bytes() {
        for slot in [31u8, 32, 0x40, 200, 255] {
            let raw = hex::decode(format!("0101{A}{slot:02x}")).unwrap();
            let decoded = decode_unlock_script(&raw).unwrap();

            assert_eq!(decoded.keys()[0].slot_index(), slot);
            assert_eq!(encode_unlock_script(&decoded), raw);
        }
    }

    #[test]
    fn empty_key_list_is_rejected() {
        assert!(matches!(decode_unlock_script(&[0x01, 0x00]), Err(CodecError::MalformedScript(_))));
    }

    #[test]
    fn malformed_scripts_are_rejected() {
        let good = encode_unlock_script(&script());

        let mut wrong_tag = good.clone();
        wrong_tag[0] = 0x00;
        assert!(matches!(decode_unlock_script(&wrong_tag), Err(CodecError::MalformedScript(_))));

        let mut too_many = good.clone();
        too_many[1] = 17;
        assert!(matches!(decode_unlock_script(&too_many), Err(CodecError::MalformedScript(_))));

        assert!(matches!(
            decode_unlock_script(&good[..good.len() - 1]),
            Err(CodecError::MalformedScript(_))
        ));

        let mut trailing = good.clone();
        trailing.push(0);
        assert!(matches!(decode_unlock_script(&trailing), Err(CodecError::MalformedScript(_))));

        let mut bad_key = good;
        bad_key[2] = 0x05;
        assert!(matches!(decode_unlock_script(&bad_key), Err(CodecError::MalformedScript(_))));

        assert!(matches!(decode_unlock_script(SAME_AS_PREVIOUS), Err(CodecError::MalformedScript(_))));
    }
}
