//! Persistence layer for the multisig coordinator.
//!
//! This crate stores multisig descriptors and work-in-progress drafts on top of a small
//! key-value abstraction, and converts descriptors to and from shareable export tokens.
//!
//! # Main Components
//!
//! - [`ConfigStore`] - The primary interface for descriptor storage
//! - [`KvStore`] - The backend trait, with [`MemoryKvStore`] and [`FileKvStore`]
//! - [`MultisigStoreError`] - Error types for store operations
//!
//! # Usage
//!
//! ```ignore
//! let store = ConfigStore::new(FileKvStore::open(data_dir)?);
//!
//! let descriptor = store.create(descriptor)?;
//! let token = store.export(&descriptor)?;
//! let imported = other_store.import_and_create(&token)?;
//! ```

mod draft;
mod error;
mod export;
mod kv;
mod record;

pub use self::{
    draft::{DescriptorDraft, DraftDestination, DraftSignature, DraftSigner, TxDraft},
    error::{MultisigStoreError, ValidationReason},
    kv::{FileKvStore, KvError, KvStore, MemoryKvStore},
    record::{ConfigRecord, SignerRecord},
};

use std::sync::{Mutex, MutexGuard};

use alephium_multisig_coordinator_domain::{Timestamps, descriptor::MultisigDescriptor};
use serde::{Serialize, de::DeserializeOwned};

use self::{
    error::Result,
    export::{decode_token, encode_token},
    record::{DescriptorRecord, make_descriptor},
};

/// Key holding every committed descriptor.
pub const ALL_MULTISIG_KEY: &str = "multisig-all";

/// Key holding the descriptor creation draft.
pub const MULTISIG_DRAFT_KEY: &str = "multisig-wip";

/// Key holding the transaction build draft.
pub const MULTISIG_TX_DRAFT_KEY: &str = "multisig-tx-wip";

/// Descriptor and draft storage.
///
/// Reads go straight to the backend. Writes to the descriptor list are serialized behind a
/// single writer lock, so a name check and the write that follows it see the same state.
pub struct ConfigStore<S> {
    kv: S,
    writer: Mutex<()>,
}

impl<S> ConfigStore<S> {
    /// Creates a new `ConfigStore` over the given backend.
    pub fn new(kv: S) -> Self {
        ConfigStore { kv, writer: Mutex::new(()) }
    }
}

impl<S: KvStore> ConfigStore<S> {
    /// Persists a new descriptor.
    ///
    /// # Returns
    ///
    /// The stored descriptor with its creation timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A descriptor with the same name already exists
    /// - The backend fails
    #[tracing::instrument(
        skip_all,
        fields(
            name = descriptor.name(),
            threshold = descriptor.threshold().get(),
            signer_count = descriptor.signer_count(),
        ),
    )]
    pub fn create(&self, descriptor: MultisigDescriptor<()>) -> Result<MultisigDescriptor> {
        let _guard = self.lock_writer()?;

        let mut records: Vec<DescriptorRecord> = self.read_json(ALL_MULTISIG_KEY)?.unwrap_or_default();
        if records.iter().any(|record| record.name() == descriptor.name()) {
            return Err(ValidationReason::AlreadyExists(descriptor.name().to_owned()).into());
        }

        let (descriptor, ()) = descriptor.with_aux(Timestamps::now());
        records.push(DescriptorRecord::new(&descriptor));
        self.write_json(ALL_MULTISIG_KEY, &records)?;

        tracing::info!("multisig created");

        Ok(descriptor)
    }

    /// Returns every stored descriptor in insertion order.
    pub fn list(&self) -> Result<Vec<MultisigDescriptor>> {
        self.read_json::<Vec<DescriptorRecord>>(ALL_MULTISIG_KEY)?
            .unwrap_or_default()
            .into_iter()
            .map(make_descriptor)
            .collect()
    }

    /// Returns the descriptor with the given name.
    pub fn find_by_name(&self, name: &str) -> Result<Option<MultisigDescriptor>> {
        self.read_json::<Vec<DescriptorRecord>>(ALL_MULTISIG_KEY)?
            .unwrap_or_default()
            .into_iter()
            .find(|record| record.name() == name)
            .map(make_descriptor)
            .transpose()
    }

    /// Removes the descriptor with the given name.
    ///
    /// Removing a missing name is not an error.
    ///
    /// # Returns
    ///
    /// Whether a descriptor was removed.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, name: &str) -> Result<bool> {
        let _guard = self.lock_writer()?;

        let mut records: Vec<DescriptorRecord> = self.read_json(ALL_MULTISIG_KEY)?.unwrap_or_default();
        let before = records.len();
        records.retain(|record| record.name() != name);

        if records.len() == before {
            return Ok(false);
        }

        self.write_json(ALL_MULTISIG_KEY, &records)?;
        tracing::info!("multisig removed");

        Ok(true)
    }

    /// Encodes a descriptor as a shareable token.
    ///
    /// The token carries the name, signers and threshold; the address is re-derived on import.
    pub fn export<AUX>(&self, descriptor: &MultisigDescriptor<AUX>) -> Result<String> {
        encode_token(&ConfigRecord::from(descriptor))
    }

    /// Decodes and validates a token produced by [`export`](Self::export).
    ///
    /// Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The token is corrupted ([`MultisigStoreError::Integrity`])
    /// - The configuration is invalid or its name is already stored
    ///   ([`MultisigStoreError::Validation`])
    #[tracing::instrument(skip_all)]
    pub fn import(&self, token: &str) -> Result<MultisigDescriptor<()>> {
        let descriptor = decode_token(token)?
            .into_descriptor(())
            .inspect_err(|e| tracing::warn!(reason = %e, "rejected multisig import"))?;

        if self.find_by_name(descriptor.name())?.is_some() {
            return Err(ValidationReason::AlreadyExists(descriptor.name().to_owned()).into());
        }

        Ok(descriptor)
    }

    /// Imports a token and persists the resulting descriptor.
    pub fn import_and_create(&self, token: &str) -> Result<MultisigDescriptor> {
        self.import(token).and_then(|descriptor| self.create(descriptor))
    }

    /// Returns the descriptor creation draft, if any.
    pub fn load_descriptor_draft(&self) -> Result<Option<DescriptorDraft>> {
        self.read_json(MULTISIG_DRAFT_KEY)
    }

    /// Replaces the descriptor creation draft.
    pub fn save_descriptor_draft(&self, draft: &DescriptorDraft) -> Result<()> {
        self.write_json(MULTISIG_DRAFT_KEY, draft)
    }

    /// Discards the descriptor creation draft.
    pub fn clear_descriptor_draft(&self) -> Result<()> {
        self.kv.delete(MULTISIG_DRAFT_KEY).map_err(From::from)
    }

    /// Returns the transaction build draft, if any.
    pub fn load_tx_draft(&self) -> Result<Option<TxDraft>> {
        self.read_json(MULTISIG_TX_DRAFT_KEY)
    }

    /// Replaces the transaction build draft.
    pub fn save_tx_draft(&self, draft: &TxDraft) -> Result<()> {
        self.write_json(MULTISIG_TX_DRAFT_KEY, draft)
    }

    /// Discards the transaction build draft.
    pub fn clear_tx_draft(&self) -> Result<()> {
        self.kv.delete(MULTISIG_TX_DRAFT_KEY).map_err(From::from)
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, ()>> {
        self.writer.lock().map_err(|_| KvError::Poisoned.into())
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.kv
            .get(key)?
            .map(|value| {
                serde_json::from_str(&value).map_err(|e| {
                    MultisigStoreError::serialization(format!("corrupted value under {key}: {e}"))
                })
            })
            .transpose()
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_string(value)
            .map_err(|e| MultisigStoreError::serialization(e.to_string()))?;

        self.kv.set(key, &value).map_err(From::from)
    }
}

#[cfg(test)]
mod tests;
