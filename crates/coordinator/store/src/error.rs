use std::borrow::Cow;

use alephium_multisig_coordinator_domain::descriptor::DescriptorError;

use crate::kv::KvError;

pub type Result<T, E = MultisigStoreError> = core::result::Result<T, E>;

/// Errors that can occur when interacting with the store
#[derive(Debug, thiserror::Error)]
pub enum MultisigStoreError {
    /// The key-value backend failed.
    #[error("storage error: {0}")]
    Kv(#[from] KvError),

    /// A descriptor failed validation.
    ///
    /// Returned on create and import; the reason names the violated rule.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationReason),

    /// An export token is corrupted.
    ///
    /// Returned when the token is not base64, is too short to carry a checksum, or the
    /// checksum does not match the payload.
    #[error("integrity error: {0}")]
    Integrity(Cow<'static, str>),

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(Cow<'static, str>),
}

impl MultisigStoreError {
    pub(crate) fn integrity<E>(reason: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Integrity(reason.into())
    }

    pub(crate) fn serialization<E>(reason: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Serialization(reason.into())
    }
}

/// The rule a descriptor violates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationReason {
    /// A structural rule of the descriptor itself.
    ///
    /// Covers empty names, signer count, duplicate names or keys and threshold range.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// A signer public key is not a valid compressed secp256k1 key.
    #[error("invalid public key for signer {signer}: {reason}")]
    InvalidPublicKey {
        /// The signer whose key is invalid.
        signer: String,
        /// Why the key was rejected.
        reason: String,
    },

    /// A descriptor with the same name is already stored.
    #[error("multisig {0} already exists")]
    AlreadyExists(String),

    /// The configuration JSON does not have the expected shape.
    #[error("malformed configuration: {0}")]
    MalformedJson(String),
}
