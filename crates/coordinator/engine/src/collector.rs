use std::collections::BTreeMap;

use alephium_multisig_coordinator_codec::match_descriptor;
use alephium_multisig_coordinator_domain::{
    descriptor::MultisigDescriptor,
    key::Signature,
    tx::{SignatureRecord, UnsignedTransaction},
};

use crate::{
    error::CollectorError,
    signer::{SelectedSigner, check_signature, signers_of_script},
};

/// Progress of a signature collection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum CollectorState {
    /// No unsigned transaction loaded.
    Empty,
    /// Fewer signatures than the threshold have been accepted.
    AwaitingSignatures,
    /// Exactly the threshold many signatures have been accepted.
    Complete,
}

/// Collects signatures for one unsigned transaction.
///
/// Signers are taken from the transaction's unlock script. When the script matches a known
/// descriptor they are labelled by name, otherwise by hex public key. Every signature is
/// verified on arrival and a slot, once filled, is never overwritten.
#[derive(Debug, Default)]
pub struct SignatureCollector {
    session: Option<Session>,
}

#[derive(Debug)]
struct Session {
    tx: UnsignedTransaction,
    descriptor_name: Option<String>,
    signers: Vec<SelectedSigner>,
    slot_count: usize,
    accepted: BTreeMap<u8, SignatureRecord>,
}

impl Session {
    fn threshold(&self) -> usize {
        self.signers.len()
    }

    fn state(&self) -> CollectorState {
        if self.accepted.len() == self.threshold() {
            CollectorState::Complete
        } else {
            CollectorState::AwaitingSignatures
        }
    }
}

/// The signatures of a complete session, detached from the collector.
#[derive(Debug, Clone)]
pub struct CollectedSignatures {
    pub(crate) tx: UnsignedTransaction,
    pub(crate) signers: Vec<SelectedSigner>,
    pub(crate) slot_count: usize,
    pub(crate) records: Vec<SignatureRecord>,
}

impl CollectedSignatures {
    pub fn tx(&self) -> &UnsignedTransaction {
        &self.tx
    }

    pub fn records(&self) -> &[SignatureRecord] {
        &self.records
    }
}

impl SignatureCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts collecting signatures for `tx`.
    ///
    /// An unlock script matching none of `known` is accepted with a warning.
    ///
    /// # Errors
    ///
    /// [`CollectorError::AlreadyLoaded`] unless the collector is empty,
    /// [`CollectorError::NoSigners`] for an empty unlock script, and
    /// [`CollectorError::Ambiguous`] when several known descriptors match.
    #[tracing::instrument(skip_all, fields(tx_id = %tx.tx_id()))]
    pub fn load_unsigned_tx<AUX>(
        &mut self,
        tx: UnsignedTransaction,
        known: &[MultisigDescriptor<AUX>],
    ) -> Result<CollectorState, CollectorError> {
        if self.session.is_some() {
            return Err(CollectorError::AlreadyLoaded);
        }
        if tx.unlock_script().is_empty() {
            return Err(CollectorError::NoSigners);
        }

        let descriptor = match_descriptor(tx.unlock_script(), known)?;
        let signers = signers_of_script(tx.unlock_script(), descriptor);

        let slot_count = match descriptor {
            Some(descriptor) => descriptor.signer_count(),
            None => {
                tracing::warn!("unlock script matches no known multisig, signers are labelled by public key");
                signers.iter().map(|s| usize::from(s.slot_index()) + 1).max().unwrap_or_default()
            },
        };

        let session = Session {
            tx,
            descriptor_name: descriptor.map(|d| d.name().to_owned()),
            signers,
            slot_count,
            accepted: BTreeMap::new(),
        };
        let state = session.state();
        self.session = Some(session);

        Ok(state)
    }

    /// Verifies and accepts the signature of the signer labelled `signer`.
    ///
    /// # Errors
    ///
    /// [`CollectorError::Signature`] when the signature is not `signer`'s, and
    /// [`CollectorError::DuplicateSignature`] when the signer's slot is already filled.
    #[tracing::instrument(skip_all, fields(signer = %signer))]
    pub fn submit_signature(&mut self, signer: &str, signature: Signature) -> Result<CollectorState, CollectorError> {
        let session = self.session.as_mut().ok_or(CollectorError::NotLoaded)?;

        let accepted = check_signature(&session.tx.tx_id(), signer, &signature, &session.signers)?;
        let slot_index = accepted.slot_index();

        if session.accepted.contains_key(&slot_index) {
            return Err(CollectorError::DuplicateSignature { signer: accepted.label().to_owned(), slot_index });
        }

        let record = SignatureRecord::builder().signer_name(accepted.label()).signature(signature).build();
        session.accepted.insert(slot_index, record);

        let state = session.state();
        tracing::info!(slot_index, %state, "accepted signature");
        Ok(state)
    }

    /// Discards the transaction and every collected signature.
    pub fn reset(&mut self) {
        self.session = None;
    }

    pub fn state(&self) -> CollectorState {
        self.session.as_ref().map_or(CollectorState::Empty, Session::state)
    }

    pub fn tx(&self) -> Option<&UnsignedTransaction> {
        self.session.as_ref().map(|s| &s.tx)
    }

    /// The name of the matched descriptor, `None` when unknown or nothing is loaded.
    pub fn descriptor_name(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.descriptor_name.as_deref())
    }

    /// The signers expected to sign, in slot order.
    pub fn signers(&self) -> &[SelectedSigner] {
        self.session.as_ref().map_or(&[][..], |s| s.signers.as_slice())
    }

    /// The accepted signatures, in slot order.
    pub fn records(&self) -> Vec<SignatureRecord> {
        self.session.as_ref().map(|s| s.accepted.values().cloned().collect()).unwrap_or_default()
    }

    /// Returns whether the signer labelled `signer` has an accepted signature.
    pub fn has_signed(&self, signer: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.accepted.values().any(|r| r.signer_name() == signer))
    }

    /// Detaches the signatures of a complete session for submission.
    ///
    /// # Errors
    ///
    /// [`CollectorError::NotLoaded`] or [`CollectorError::Incomplete`].
    pub fn collected(&self) -> Result<CollectedSignatures, CollectorError> {
        let session = self.session.as_ref().ok_or(CollectorError::NotLoaded)?;

        if session.state() != CollectorState::Complete {
            return Err(CollectorError::Incomplete {
                accepted: session.accepted.len(),
                required: session.threshold(),
            });
        }

        Ok(CollectedSignatures {
            tx: session.tx.clone(),
            signers: session.signers.clone(),
            slot_count: session.slot_count,
            records: session.accepted.values().cloned().collect(),
        })
    }
}
