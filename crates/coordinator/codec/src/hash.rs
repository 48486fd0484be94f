use alephium_multisig_coordinator_domain::tx::TxId;
use blake2::{Blake2b, Digest, digest::consts::U32};

type Blake2b256 = Blake2b<U32>;

/// Returns the blake2b-256 digest of `data`.
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// Computes the id of an unsigned transaction from its serialized bytes.
pub fn tx_id_of(unsigned_tx: &[u8]) -> TxId {
    blake2b256(unsigned_tx).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_digest() {
        assert_eq!(
            hex::encode(blake2b256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }
}
