use alephium_multisig_coordinator_store::ConfigRecord;
use dissolve_derive::Dissolve;
use serde::Deserialize;

#[derive(Debug, Dissolve, Deserialize)]
pub struct CreateMultisigRequestPayload {
    config: ConfigRecord,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct MultisigNameRequestPayload {
    name: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct ImportMultisigRequestPayload {
    token: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct DestinationRequestPayload {
    address: String,

    /// Hex token id, ALPH when absent
    #[serde(default)]
    token_id: Option<String>,

    amount: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct BuildTxRequestPayload {
    multisig_name: String,
    signers: Vec<String>,
    destinations: Vec<DestinationRequestPayload>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct BuildSweepTxRequestPayload {
    multisig_name: String,
    signers: Vec<String>,
    to_address: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct UnsignedTxRequestPayload {
    unsigned_tx: String,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct AddSignatureRequestPayload {
    signer: String,

    /// Compact secp256k1 signature, 128 hex characters
    signature: String,
}
