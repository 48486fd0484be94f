//! Multisig transaction domain models.

use core::{fmt, str::FromStr};

use bon::Builder;
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::key::{PublicKey, Signature};

#[cfg(feature = "serde")]
use crate::with_serde;

/// The maximum number of keys a multisig unlock script may carry.
pub const MAX_UNLOCK_KEYS: usize = 16;

/// Decimal places of the native ALPH token.
pub const ALPH_DECIMALS: u32 = 18;

/// The minimal ALPH amount that must accompany every token output, in atto-ALPH.
pub const DUST_AMOUNT: u128 = 1_000_000_000_000_000;

/// The identifier of an unsigned transaction: the blake2b-256 digest of its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub struct TxId([u8; 32]);

impl TxId {
    /// Returns the digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for TxId {
    fn from(digest: [u8; 32]) -> Self {
        Self(digest)
    }
}

/// The identifier of a fungible token. The all-zero id denotes ALPH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub struct TokenId([u8; 32]);

impl TokenId {
    /// The id of the native ALPH token.
    pub const ALPH: Self = Self([0; 32]);

    /// Returns whether this is the native ALPH token.
    pub fn is_alph(&self) -> bool {
        *self == Self::ALPH
    }

    /// Returns the id bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for TokenId {
    fn from(id: [u8; 32]) -> Self {
        Self(id)
    }
}

fn parse_hash(s: &str) -> Result<[u8; 32], TxError> {
    let bytes = hex::decode(s).map_err(|_| TxError::InvalidHash(s.to_owned()))?;
    <[u8; 32]>::try_from(bytes).map_err(|_| TxError::InvalidHash(s.to_owned()))
}

impl FromStr for TxId {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hash(s).map(Self)
    }
}

impl FromStr for TokenId {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hash(s).map(Self)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A `(public key, slot index)` pair of a multisig unlock script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct UnlockKey {
    public_key: PublicKey,
    slot_index: u8,
}

impl UnlockKey {
    /// Creates a new unlock key.
    pub fn new(public_key: PublicKey, slot_index: u8) -> Self {
        Self { public_key, slot_index }
    }

    /// Returns the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns the descriptor slot the key claims.
    pub fn slot_index(&self) -> u8 {
        self.slot_index
    }
}

/// The ordered keys that unlock a P2MPKH input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct UnlockScript(Vec<UnlockKey>);

impl UnlockScript {
    /// Creates an unlock script from its keys.
    ///
    /// # Errors
    ///
    /// When more than [`MAX_UNLOCK_KEYS`] keys are supplied.
    pub fn new(keys: Vec<UnlockKey>) -> Result<Self, TxError> {
        if keys.len() > MAX_UNLOCK_KEYS {
            return Err(TxError::TooManyUnlockKeys(keys.len()));
        }

        Ok(Self(keys))
    }

    /// Returns the keys in script order.
    pub fn keys(&self) -> &[UnlockKey] {
        &self.0
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the script carries no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An unsigned transaction ready to be distributed to signers.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct UnsignedTransaction {
    /// The serialized transaction.
    #[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))]
    bytes: Vec<u8>,

    /// The digest signers sign over.
    tx_id: TxId,

    /// The unlock script shared by every input.
    unlock_script: UnlockScript,
}

impl UnsignedTransaction {
    /// Returns the serialized transaction.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the serialized transaction as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Returns the transaction id.
    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    /// Returns the unlock script.
    pub fn unlock_script(&self) -> &UnlockScript {
        &self.unlock_script
    }
}

/// A signature attributed to a named signer.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct SignatureRecord {
    /// The signer the signature is claimed to come from.
    #[builder(into)]
    signer_name: String,

    /// The compact signature over the transaction id.
    signature: Signature,
}

impl SignatureRecord {
    /// Returns the claimed signer name.
    pub fn signer_name(&self) -> &str {
        &self.signer_name
    }

    /// Returns the signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// A payment to one recipient in one asset.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct Destination {
    /// The recipient address.
    #[builder(into)]
    address: String,

    /// The asset to send.
    #[builder(default = TokenId::ALPH)]
    token_id: TokenId,

    /// The amount as a decimal string in whole token units, e.g. `"1.5"`.
    #[builder(into)]
    amount: String,
}

impl Destination {
    /// Returns the recipient address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the token id.
    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    /// Returns the decimal amount string.
    pub fn amount(&self) -> &str {
        &self.amount
    }
}

/// Acceptance details reported by the node for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct NodeReceipt {
    /// The group the inputs belong to.
    from_group: u32,
    /// The group of the first output.
    to_group: u32,
}

impl NodeReceipt {
    /// Returns the source group.
    pub fn from_group(&self) -> u32 {
        self.from_group
    }

    /// Returns the destination group.
    pub fn to_group(&self) -> u32 {
        self.to_group
    }
}

/// Whether the explorer indexed a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case", tag = "status"))]
pub enum Confirmation {
    /// The explorer reports the transaction.
    Indexed {
        /// The number of polls performed.
        attempts: u32,
    },
    /// Polling gave up before the explorer reported the transaction.
    Unconfirmed {
        /// The number of polls performed.
        attempts: u32,
    },
}

/// The terminal artifact of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct SubmissionResult {
    /// The submitted transaction id.
    tx_id: TxId,
    /// The node acceptance details.
    receipt: NodeReceipt,
    /// The explorer indexing outcome.
    confirmation: Confirmation,
}

impl SubmissionResult {
    /// Returns the submitted transaction id.
    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    /// Returns the node acceptance details.
    pub fn receipt(&self) -> &NodeReceipt {
        &self.receipt
    }

    /// Returns the explorer indexing outcome.
    pub fn confirmation(&self) -> Confirmation {
        self.confirmation
    }

    /// Returns whether the explorer indexed the transaction.
    pub fn is_confirmed(&self) -> bool {
        matches!(self.confirmation, Confirmation::Indexed { .. })
    }
}

/// Error that occurs while constructing transaction domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    /// The input is not 32 bytes of hex.
    #[error("invalid 32-byte hex hash: {0}")]
    InvalidHash(String),

    /// An unlock script carries too many keys.
    #[error("unlock script has {0} keys, at most {MAX_UNLOCK_KEYS} allowed")]
    TooManyUnlockKeys(usize),
}
