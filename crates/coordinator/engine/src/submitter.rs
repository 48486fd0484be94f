use std::time::Duration;

use alephium_multisig_client::{
    ExplorerApi, NodeApi,
    api::{SubmitMultisig, TxStatus},
};
use alephium_multisig_coordinator_domain::{
    descriptor::MultisigDescriptor,
    tx::{Confirmation, NodeReceipt, SignatureRecord, SubmissionResult, TxId, UnsignedTransaction},
};
use bon::Builder;

use crate::{
    collector::{CollectedSignatures, SignatureCollector},
    error::SubmitError,
    signer::{SelectedSigner, check_signature, expected_unlock_keys, select_signers},
};

/// How long to wait for the explorer to index a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct PollConfig {
    /// Explorer lookups before giving up.
    #[builder(default = 10)]
    attempts: u32,

    /// Delay between lookups.
    #[builder(default = Duration::from_secs(3))]
    interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PollConfig {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Submits co-signed transactions to the node and waits for the explorer to index them.
#[derive(Debug)]
pub struct TxSubmitter<'a, N, E> {
    node: &'a N,
    explorer: &'a E,
    poll: PollConfig,
}

impl<'a, N: NodeApi, E: ExplorerApi> TxSubmitter<'a, N, E> {
    pub fn new(node: &'a N, explorer: &'a E, poll: PollConfig) -> Self {
        Self { node, explorer, poll }
    }

    /// Submits `unsigned_tx` with one signature per selected signer.
    ///
    /// Every record is verified again before anything is sent, and the node is called at most
    /// once. An explorer that does not index the transaction in time yields
    /// [`Confirmation::Unconfirmed`], not an error.
    #[tracing::instrument(skip_all, fields(multisig = descriptor.name(), tx_id = %unsigned_tx.tx_id()))]
    pub async fn submit<AUX, S>(
        &self,
        descriptor: &MultisigDescriptor<AUX>,
        signer_names: &[S],
        unsigned_tx: &UnsignedTransaction,
        records: &[SignatureRecord],
    ) -> Result<SubmissionResult, SubmitError>
    where
        S: AsRef<str>,
    {
        let expected = descriptor.threshold().get() as usize;
        if records.len() != expected {
            return Err(SubmitError::WrongSignatureCount { expected, actual: records.len() });
        }

        let signers = select_signers(descriptor, signer_names)?;
        if unsigned_tx.unlock_script().keys() != expected_unlock_keys(&signers).as_slice() {
            return Err(SubmitError::UnlockScriptMismatch);
        }

        self.submit_verified(unsigned_tx, &signers, descriptor.signer_count(), records).await
    }

    /// Submits the signatures of a complete collector.
    ///
    /// Works for transactions whose descriptor is unknown; signers are then the keys of the
    /// unlock script.
    pub async fn submit_collected(&self, collector: &SignatureCollector) -> Result<SubmissionResult, SubmitError> {
        let collected = collector.collected()?;
        self.submit_signed(&collected).await
    }

    /// Submits signatures detached from a collector with [`SignatureCollector::collected`].
    #[tracing::instrument(skip_all, fields(tx_id = %collected.tx.tx_id()))]
    pub async fn submit_signed(&self, collected: &CollectedSignatures) -> Result<SubmissionResult, SubmitError> {
        let expected = collected.signers.len();
        if collected.records.len() != expected {
            return Err(SubmitError::WrongSignatureCount { expected, actual: collected.records.len() });
        }

        self.submit_verified(&collected.tx, &collected.signers, collected.slot_count, &collected.records)
            .await
    }

    async fn submit_verified(
        &self,
        unsigned_tx: &UnsignedTransaction,
        signers: &[SelectedSigner],
        slot_count: usize,
        records: &[SignatureRecord],
    ) -> Result<SubmissionResult, SubmitError> {
        let tx_id = unsigned_tx.tx_id();
        let slots = signature_slots(&tx_id, signers, slot_count, records)?;

        let request = SubmitMultisig {
            unsigned_tx: unsigned_tx.to_hex(),
            signatures: slots.into_iter().filter(|s| !s.is_empty()).collect(),
        };
        let submitted = self.node.submit_multisig_tx(&request).await?;

        if submitted.tx_id.parse::<TxId>().ok() != Some(tx_id) {
            tracing::warn!(node_tx_id = %submitted.tx_id, %tx_id, "node reported a different tx id");
        }
        tracing::info!(%tx_id, from_group = submitted.from_group, "node accepted tx");

        let receipt = NodeReceipt::builder().from_group(submitted.from_group).to_group(submitted.to_group).build();
        let confirmation = self.await_indexed(&tx_id).await;

        Ok(SubmissionResult::builder().tx_id(tx_id).receipt(receipt).confirmation(confirmation).build())
    }

    async fn await_indexed(&self, tx_id: &TxId) -> Confirmation {
        let id = tx_id.to_string();

        for attempt in 1..=self.poll.attempts {
            match self.explorer.transaction_status(&id).await {
                Ok(TxStatus::Indexed) => return Confirmation::Indexed { attempts: attempt },
                Ok(TxStatus::NotFound) => {},
                Err(e) => tracing::debug!(error = %e, attempt, "explorer lookup failed"),
            }

            if attempt < self.poll.attempts {
                tokio::time::sleep(self.poll.interval).await;
            }
        }

        tracing::warn!(%tx_id, attempts = self.poll.attempts, "submitted tx is not indexed by the explorer yet");
        Confirmation::Unconfirmed { attempts: self.poll.attempts }
    }
}

/// Verifies every record and places its signature at its signer's slot.
///
/// Returns one entry per descriptor slot, empty where no signature belongs.
fn signature_slots(
    tx_id: &TxId,
    signers: &[SelectedSigner],
    slot_count: usize,
    records: &[SignatureRecord],
) -> Result<Vec<String>, SubmitError> {
    let mut slots = vec![String::new(); slot_count];

    for record in records {
        let signer = check_signature(tx_id, record.signer_name(), record.signature(), signers)?;
        let slot = slots
            .get_mut(usize::from(signer.slot_index()))
            .ok_or(SubmitError::UnlockScriptMismatch)?;

        if !slot.is_empty() {
            return Err(SubmitError::DuplicateSignature {
                signer: signer.label().to_owned(),
                slot_index: signer.slot_index(),
            });
        }
        *slot = record.signature().to_string();
    }

    Ok(slots)
}
