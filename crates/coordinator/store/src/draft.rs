//! Work-in-progress form snapshots.
//!
//! Drafts hold whatever the user has typed so far, so every field is unvalidated text.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// A signer row of a descriptor draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct DraftSigner {
    /// The signer name typed so far.
    #[builder(into, default)]
    name: String,
    /// The public key hex typed so far.
    #[builder(into, default)]
    pubkey: String,
}

/// A descriptor creation form in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default, rename_all = "camelCase")]
pub struct DescriptorDraft {
    /// The wallet name.
    #[builder(into, default)]
    name: String,
    /// The signer rows.
    #[builder(default)]
    pubkeys: Vec<DraftSigner>,
    /// The threshold.
    #[builder(default = 1)]
    m_of_n: u32,
}

/// A destination row of a transaction draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default, rename_all = "camelCase")]
pub struct DraftDestination {
    /// The recipient address.
    #[builder(into, default)]
    address: String,
    /// The token id hex, empty for ALPH.
    #[builder(into, default)]
    token_id: String,
    /// The amount in whole token units.
    #[builder(into, default)]
    amount: String,
}

/// A signature pasted into a transaction draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct DraftSignature {
    #[builder(into, default)]
    signer: String,
    /// The signature hex typed so far.
    #[builder(into, default)]
    signature: String,
}

/// A transaction build form in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default, rename_all = "camelCase")]
pub struct TxDraft {
    /// The selected wallet.
    #[builder(into, default)]
    multisig_name: String,
    /// The selected signers.
    #[builder(default)]
    signers: Vec<String>,
    /// The payment rows.
    #[builder(default)]
    destinations: Vec<DraftDestination>,
    /// Whether the whole balance is swept instead of paying the destinations.
    #[builder(default)]
    sweep: bool,
    /// The sweep recipient typed so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sweep_to: Option<String>,
    /// The built transaction hex, once the form got that far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unsigned_tx: Option<String>,
    /// Signatures collected so far, one row per selected signer.
    #[builder(default)]
    signatures: Vec<DraftSignature>,
    /// The form step the user was on.
    #[builder(default)]
    step: u32,
}
