use alephium_multisig_coordinator_codec::blake2b256;
use alephium_multisig_coordinator_domain::{
    descriptor::MultisigDescriptor,
    key::{PublicKey, Signature},
    tx::TxId,
};
use rand::RngCore;
use secp256k1::{Message, Secp256k1, SecretKey};

/// A signer key pair for tests.
#[derive(Debug, Clone)]
pub struct TestSigner {
    secret: SecretKey,
    public: PublicKey,
}

impl TestSigner {
    /// Returns the signer whose secret key is 32 copies of `seed`.
    ///
    /// # Panics
    ///
    /// When `seed` is zero.
    pub fn from_seed(seed: u8) -> Self {
        Self::from_secret(SecretKey::from_slice(&[seed; 32]).expect("non-zero seed"))
    }

    /// Returns a signer with a random secret key.
    pub fn random<R: RngCore>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if let Ok(secret) = SecretKey::from_slice(&bytes) {
                return Self::from_secret(secret);
            }
        }
    }

    /// Returns `N` deterministic signers, seeded `1..=N`.
    pub fn fixtures<const N: usize>() -> [Self; N] {
        core::array::from_fn(|i| Self::from_seed(i as u8 + 1))
    }

    fn from_secret(secret: SecretKey) -> Self {
        let public = secp256k1::PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret);
        Self { secret, public: public.into() }
    }

    /// Returns the compressed public key.
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Signs a transaction id the way a wallet does.
    pub fn sign(&self, tx_id: &TxId) -> Signature {
        let message = Message::from_digest(*tx_id.as_bytes());
        Secp256k1::signing_only().sign_ecdsa(&message, &self.secret).serialize_compact().into()
    }
}

/// Builds a descriptor whose `i`-th signer is named `names[i]` and uses
/// [`TestSigner::from_seed(i + 1)`](TestSigner::from_seed).
///
/// # Panics
///
/// When the arguments do not form a valid descriptor.
pub fn descriptor(name: &str, names: &[&str], threshold: u32) -> MultisigDescriptor<()> {
    let signers = names
        .iter()
        .enumerate()
        .map(|(i, signer)| ((*signer).to_owned(), TestSigner::from_seed(i as u8 + 1).public_key()))
        .collect();

    MultisigDescriptor::builder()
        .name(name)
        .signers(signers)
        .threshold(threshold)
        .aux(())
        .build()
        .expect("valid test descriptor")
}

/// Returns a P2PKH address derived from `seed`, usable as a payment recipient.
pub fn p2pkh_address(seed: u8) -> String {
    let mut bytes = vec![0x00];
    bytes.extend_from_slice(&blake2b256(&[seed]));
    bs58::encode(bytes).into_string()
}
