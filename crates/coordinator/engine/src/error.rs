use std::borrow::Cow;

use alephium_multisig_client::NodeClientError;
use alephium_multisig_coordinator_codec::{AmbiguousMatch, CodecError};

/// Top-level error of the multisig engine.
///
/// This enum wraps the error of each stage of the transaction lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum MultisigEngineError {
    /// Building or loading an unsigned transaction failed.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// Collecting a signature failed.
    #[error("signature collection error: {0}")]
    Collector(#[from] CollectorError),

    /// Submitting a co-signed transaction failed.
    #[error("submission error: {0}")]
    Submit(#[from] SubmitError),
}

/// Caller picked signers that cannot spend from the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The number of selected signers differs from the threshold.
    #[error("expected {expected} signers, got {actual}")]
    WrongSignerCount { expected: usize, actual: usize },

    /// A selected name has no slot in the descriptor.
    #[error("unknown signer {0}")]
    UnknownSigner(String),

    /// A signer was selected twice.
    #[error("signer {0} selected more than once")]
    DuplicateSigner(String),
}

/// A signature failed verification against its claimed signer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The claimed signer is not selected and no selected signer produced the signature.
    #[error("unknown signer {0}")]
    UnknownSigner(String),

    /// The signature verifies against no selected signer.
    #[error("invalid signature for {signer}")]
    InvalidSignature { signer: String },

    /// The signature was produced by a different selected signer.
    #[error("signature claimed by {claimed} was produced by {actual}")]
    MisattributedSignature { claimed: String, actual: String },
}

/// Errors of [`TxBuilder`](crate::TxBuilder).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Malformed input caught before any node call.
    #[error("validation failure: {0}")]
    Validation(Cow<'static, str>),

    /// The signer selection is invalid.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The spendable balance does not cover the transfer.
    #[error("insufficient {asset} balance: required {required}, available {available}")]
    InsufficientBalance { asset: String, required: u128, available: u128 },

    /// The node needs several transactions to sweep the balance.
    #[error("sweep needs {transactions} transactions, only single-transaction sweeps are supported")]
    UnsupportedSweep { transactions: usize },

    /// The transaction does not spend from a single multisig unlock script.
    #[error("malformed script: {0}")]
    MalformedScript(Cow<'static, str>),

    /// The node reply contradicts the request or the transaction bytes.
    #[error("inconsistent node reply: {0}")]
    Inconsistent(Cow<'static, str>),

    /// A node call failed.
    #[error(transparent)]
    Node(#[from] NodeClientError),
}

impl BuildError {
    pub(crate) fn validation<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Validation(err.into())
    }

    pub(crate) fn inconsistent<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Inconsistent(err.into())
    }
}

impl From<CodecError> for BuildError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::MalformedScript(reason) => Self::MalformedScript(reason),
            other => Self::MalformedScript(other.to_string().into()),
        }
    }
}

/// Errors of [`SignatureCollector`](crate::SignatureCollector).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectorError {
    /// No unsigned transaction is loaded.
    #[error("no unsigned transaction loaded")]
    NotLoaded,

    /// A transaction is already loaded; reset first.
    #[error("an unsigned transaction is already loaded")]
    AlreadyLoaded,

    /// The unlock script names no signers, so no quorum can be collected.
    #[error("unlock script has no signers")]
    NoSigners,

    /// Several known descriptors match the unlock script.
    #[error(transparent)]
    Ambiguous(#[from] AmbiguousMatch),

    /// The signature was rejected.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The slot already holds an accepted signature.
    #[error("slot {slot_index} of {signer} already holds a signature")]
    DuplicateSignature { signer: String, slot_index: u8 },

    /// The collector has not reached the threshold yet.
    #[error("collected {accepted} of {required} signatures")]
    Incomplete { accepted: usize, required: usize },
}

/// Errors of [`TxSubmitter`](crate::TxSubmitter).
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The number of signature records differs from the threshold.
    #[error("expected {expected} signatures, got {actual}")]
    WrongSignatureCount { expected: usize, actual: usize },

    /// The signer selection is invalid.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// A record failed verification.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Two records resolve to the same slot.
    #[error("slot {slot_index} of {signer} signed more than once")]
    DuplicateSignature { signer: String, slot_index: u8 },

    /// The transaction unlock script was not produced by the selected signers.
    #[error("unlock script does not match the selected signers")]
    UnlockScriptMismatch,

    /// The collector is not complete.
    #[error(transparent)]
    Collector(#[from] CollectorError),

    /// A node call failed.
    #[error(transparent)]
    Node(#[from] NodeClientError),
}
