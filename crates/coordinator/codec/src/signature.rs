use std::sync::LazyLock;

use alephium_multisig_coordinator_domain::{
    key::{PublicKey, Signature},
    tx::TxId,
};
use secp256k1::{Message, Secp256k1, VerifyOnly, ecdsa};

static SECP: LazyLock<Secp256k1<VerifyOnly>> = LazyLock::new(Secp256k1::verification_only);

/// Returns whether `signature` is a valid ECDSA signature of `tx_id` under `public_key`.
///
/// High-S signatures are normalized before verification.
pub fn verify_signature(tx_id: &TxId, public_key: &PublicKey, signature: &Signature) -> bool {
    let Ok(mut signature) = ecdsa::Signature::from_compact(signature.as_bytes()) else {
        return false;
    };
    signature.normalize_s();

    let message = Message::from_digest(*tx_id.as_bytes());
    SECP.verify_ecdsa(&message, &signature, public_key.as_secp256k1()).is_ok()
}
