use core::str::FromStr;

use alephium_multisig_coordinator_codec::descriptor_address;
use alephium_multisig_coordinator_domain::{
    Timestamps, descriptor::MultisigDescriptor, key::PublicKey,
};
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use serde::{Deserialize, Serialize};

use crate::error::{MultisigStoreError, Result, ValidationReason};

/// A signer as it appears in configuration JSON.
#[derive(Debug, Clone, Serialize, Deserialize, Dissolve)]
pub struct SignerRecord {
    name: String,
    pubkey: String,
}

/// The shareable configuration of a descriptor, without the derived address.
///
/// Field order is part of the export checksum and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, Dissolve)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    name: String,
    pubkeys: Vec<SignerRecord>,
    m_of_n: u32,
}

/// A persisted descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, Dissolve)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorRecord {
    #[serde(flatten)]
    config: ConfigRecord,
    address: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<AUX> From<&MultisigDescriptor<AUX>> for ConfigRecord {
    fn from(descriptor: &MultisigDescriptor<AUX>) -> Self {
        Self {
            name: descriptor.name().to_owned(),
            pubkeys: descriptor
                .slots()
                .iter()
                .map(|slot| SignerRecord {
                    name: slot.name().to_owned(),
                    pubkey: slot.public_key().to_string(),
                })
                .collect(),
            m_of_n: descriptor.threshold().get(),
        }
    }
}

impl ConfigRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates the record into a descriptor carrying `aux`.
    pub fn into_descriptor<AUX>(self, aux: AUX) -> Result<MultisigDescriptor<AUX>, ValidationReason> {
        let ConfigRecordDissolved { name, pubkeys, m_of_n } = self.dissolve();

        let signers = pubkeys
            .into_iter()
            .map(|signer| {
                let SignerRecordDissolved { name, pubkey } = signer.dissolve();
                match PublicKey::from_str(&pubkey) {
                    Ok(key) => Ok((name, key)),
                    Err(e) => Err(ValidationReason::InvalidPublicKey { signer: name, reason: e.to_string() }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        MultisigDescriptor::builder()
            .name(name)
            .signers(signers)
            .threshold(m_of_n)
            .aux(aux)
            .build()
            .map_err(From::from)
    }
}

impl DescriptorRecord {
    pub fn new(descriptor: &MultisigDescriptor) -> Self {
        Self {
            config: descriptor.into(),
            address: descriptor_address(descriptor),
            created_at: descriptor.aux().created_at(),
            updated_at: descriptor.aux().updated_at(),
        }
    }

    pub fn name(&self) -> &str {
        self.config.name()
    }
}

/// Rebuilds a stored descriptor, checking that the stored address still matches.
pub fn make_descriptor(record: DescriptorRecord) -> Result<MultisigDescriptor> {
    let DescriptorRecordDissolved { config, address, created_at, updated_at } = record.dissolve();
    let name = config.name().to_owned();

    let timestamps = Timestamps::builder().created_at(created_at).updated_at(updated_at).build();
    let descriptor = config.into_descriptor(timestamps).map_err(|e| {
        MultisigStoreError::serialization(format!("stored multisig {name} is invalid: {e}"))
    })?;

    if descriptor_address(&descriptor) != address {
        return Err(MultisigStoreError::serialization(format!(
            "stored multisig {name} does not derive its recorded address"
        )));
    }

    Ok(descriptor)
}
