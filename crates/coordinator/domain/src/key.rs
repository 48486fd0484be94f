//! Signer public keys and signatures.

use core::{fmt, str::FromStr};

/// A compressed secp256k1 public key.
///
/// The key is validated as a curve point when parsed, so holding a [`PublicKey`] means the
/// bytes can be used for signature verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub struct PublicKey(secp256k1::PublicKey);

impl PublicKey {
    /// The size of a compressed public key in bytes.
    pub const SERIALIZED_SIZE: usize = 33;

    /// Parses a compressed public key from its raw bytes.
    ///
    /// # Errors
    ///
    /// When the slice is not exactly 33 bytes or does not decode to a curve point.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != Self::SERIALIZED_SIZE {
            return Err(KeyError::InvalidLength {
                expected: Self::SERIALIZED_SIZE,
                actual: bytes.len(),
            });
        }

        secp256k1::PublicKey::from_slice(bytes).map(Self).map_err(|_| KeyError::InvalidPoint)
    }

    /// Returns the compressed serialization of the key.
    pub fn to_bytes(&self) -> [u8; Self::SERIALIZED_SIZE] {
        self.0.serialize()
    }

    /// Returns the underlying secp256k1 key.
    pub fn as_secp256k1(&self) -> &secp256k1::PublicKey {
        &self.0
    }
}

impl From<secp256k1::PublicKey> for PublicKey {
    fn from(key: secp256k1::PublicKey) -> Self {
        Self(key)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

/// A 64-byte compact ECDSA signature (`r || s`).
///
/// Parsing only checks the encoding; whether the signature verifies is decided elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub struct Signature([u8; Signature::SERIALIZED_SIZE]);

impl Signature {
    /// The size of a compact signature in bytes.
    pub const SERIALIZED_SIZE: usize = 64;

    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; Self::SERIALIZED_SIZE] {
        &self.0
    }
}

impl From<[u8; Signature::SERIALIZED_SIZE]> for Signature {
    fn from(bytes: [u8; Signature::SERIALIZED_SIZE]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let actual = bytes.len();

        <[u8; Self::SERIALIZED_SIZE]>::try_from(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidLength { expected: Self::SERIALIZED_SIZE, actual })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Error that occurs while parsing a [`PublicKey`] or a [`Signature`].
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The input is not valid hex.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The decoded bytes have the wrong length.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// The required length.
        expected: usize,
        /// The length that was supplied.
        actual: usize,
    },

    /// The bytes do not decode to a secp256k1 point.
    #[error("not a valid secp256k1 public key")]
    InvalidPoint,
}
