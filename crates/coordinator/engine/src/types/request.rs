//! Request types for multisig engine operations.

use alephium_multisig_coordinator_domain::{
    Timestamps,
    descriptor::MultisigDescriptor,
    tx::{Destination, SignatureRecord, UnsignedTransaction},
};
use bon::Builder;
use dissolve_derive::Dissolve;

/// Request to build an unsigned transfer from a multisig address.
#[derive(Debug, Builder, Dissolve)]
pub struct BuildTxRequest<AUX = Timestamps> {
    /// The multisig spending the funds
    descriptor: MultisigDescriptor<AUX>,

    /// Names of the signers who will co-sign, exactly the threshold many
    signer_names: Vec<String>,

    /// The payments to make
    destinations: Vec<Destination>,
}

/// Request to build an unsigned transaction moving the whole balance to one address.
#[derive(Debug, Builder, Dissolve)]
pub struct BuildSweepTxRequest<AUX = Timestamps> {
    /// The multisig spending the funds
    descriptor: MultisigDescriptor<AUX>,

    /// Names of the signers who will co-sign, exactly the threshold many
    signer_names: Vec<String>,

    /// The recipient of the whole balance
    #[builder(into)]
    to_address: String,
}

/// Request to submit a co-signed transaction.
#[derive(Debug, Builder, Dissolve)]
pub struct SubmitTxRequest<AUX = Timestamps> {
    /// The multisig spending the funds
    descriptor: MultisigDescriptor<AUX>,

    /// Names of the signers the transaction was built for
    signer_names: Vec<String>,

    /// The transaction to submit
    unsigned_tx: UnsignedTransaction,

    /// One signature per selected signer
    records: Vec<SignatureRecord>,
}
