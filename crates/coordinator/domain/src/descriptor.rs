//! Multisig descriptor domain models.

use core::num::NonZeroU32;
use std::collections::HashSet;

use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Timestamps, key::PublicKey, tx::UnlockScript};

/// The maximum number of signers a descriptor may hold, so that a slot index fits in one byte.
pub const MAX_SIGNERS: usize = 256;

/// A named signer bound to a fixed position within a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct SignerSlot {
    /// The human readable signer name, unique within the descriptor.
    name: String,

    /// The signer's compressed public key, unique within the descriptor.
    public_key: PublicKey,

    /// The position of the signer in the descriptor.
    slot_index: u8,
}

impl SignerSlot {
    /// Returns the signer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the signer public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns the slot index of the signer.
    pub fn slot_index(&self) -> u8 {
        self.slot_index
    }
}

/// An M-of-N multisig wallet definition.
///
/// The ordered signer slots and the threshold fully determine the on-chain address, so a
/// descriptor is never mutated once built. Reordering the signers yields a different wallet.
///
/// # Type Parameters
///
/// * `AUX` - Auxiliary data type, defaults to [`Timestamps`] for tracking metadata.
///
/// # Examples
///
/// ```ignore
/// let descriptor = MultisigDescriptor::builder()
///     .name("treasury")
///     .signers(vec![("alice".into(), alice), ("bob".into(), bob)])
///     .threshold(2)
///     .aux(())
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigDescriptor<AUX = Timestamps> {
    /// The wallet name, unique within a store.
    name: String,

    /// The signers, in slot order.
    slots: Vec<SignerSlot>,

    /// The minimum number of signatures required to spend.
    threshold: NonZeroU32,

    /// Auxiliary metadata associated with this descriptor.
    aux: AUX,
}

#[bon::bon]
impl<AUX> MultisigDescriptor<AUX> {
    /// Creates a validated descriptor.
    ///
    /// Slot indices are assigned from the order of `signers`.
    ///
    /// # Errors
    ///
    /// Returns the first [`DescriptorError`] found, checked in this order: name, signer count,
    /// signer names, duplicate keys, threshold.
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        signers: Vec<(String, PublicKey)>,
        threshold: u32,
        aux: AUX,
    ) -> Result<Self, DescriptorError> {
        if name.trim().is_empty() {
            return Err(DescriptorError::EmptyName);
        }

        if signers.is_empty() {
            return Err(DescriptorError::NoSigners);
        }

        if signers.len() > MAX_SIGNERS {
            return Err(DescriptorError::TooManySigners { count: signers.len() });
        }

        let mut names = HashSet::with_capacity(signers.len());
        let mut keys = HashSet::with_capacity(signers.len());
        for (index, (signer, key)) in signers.iter().enumerate() {
            if signer.trim().is_empty() {
                return Err(DescriptorError::EmptySignerName { index });
            }

            if !names.insert(signer.as_str()) {
                return Err(DescriptorError::DuplicateSignerName(signer.clone()));
            }

            if !keys.insert(*key) {
                return Err(DescriptorError::DuplicatePublicKey(key.to_string()));
            }
        }

        let signer_count = signers.len();
        let threshold = NonZeroU32::new(threshold)
            .filter(|m| m.get() as usize <= signer_count)
            .ok_or(DescriptorError::ThresholdOutOfRange { threshold, signers: signer_count })?;

        let slots = signers
            .into_iter()
            .zip(0u8..=u8::MAX)
            .map(|((name, public_key), slot_index)| SignerSlot { name, public_key, slot_index })
            .collect();

        Ok(Self { name, slots, threshold, aux })
    }
}

impl<AUX1> MultisigDescriptor<AUX1> {
    /// Replaces the auxiliary data with a new value, returning both the updated descriptor
    /// and the old auxiliary data.
    pub fn with_aux<AUX2>(self, aux: AUX2) -> (MultisigDescriptor<AUX2>, AUX1) {
        let descriptor = MultisigDescriptor {
            name: self.name,
            slots: self.slots,
            threshold: self.threshold,
            aux,
        };

        (descriptor, self.aux)
    }
}

impl<AUX> MultisigDescriptor<AUX> {
    /// Returns the descriptor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the signer slots in slot order.
    pub fn slots(&self) -> &[SignerSlot] {
        &self.slots
    }

    /// Returns the signature threshold `M`.
    pub fn threshold(&self) -> NonZeroU32 {
        self.threshold
    }

    /// Returns the number of signers `N`.
    pub fn signer_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot of the signer with the given name.
    pub fn slot_by_name(&self, name: &str) -> Option<&SignerSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    /// Returns the public keys in slot order.
    pub fn public_keys(&self) -> impl ExactSizeIterator<Item = &PublicKey> {
        self.slots.iter().map(SignerSlot::public_key)
    }

    /// Returns a reference to the auxiliary metadata.
    pub fn aux(&self) -> &AUX {
        &self.aux
    }

    /// Returns whether this descriptor could have produced the given unlock script.
    ///
    /// The script must carry exactly `M` keys, each naming an existing slot whose public key
    /// matches the key in the script.
    pub fn matches_unlock_script(&self, script: &UnlockScript) -> bool {
        script.len() == self.threshold.get() as usize
            && script.keys().iter().all(|key| {
                self.slots
                    .get(usize::from(key.slot_index()))
                    .is_some_and(|slot| slot.public_key == *key.public_key())
            })
    }
}

/// The reason a descriptor could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// The descriptor name is empty.
    #[error("multisig name is empty")]
    EmptyName,

    /// No signers were supplied.
    #[error("at least one signer is required")]
    NoSigners,

    /// More than [`MAX_SIGNERS`] signers were supplied.
    #[error("{count} signers exceed the maximum of {MAX_SIGNERS}")]
    TooManySigners {
        /// The number of signers supplied.
        count: usize,
    },

    /// A signer has an empty name.
    #[error("signer #{index} has an empty name")]
    EmptySignerName {
        /// The position of the offending signer.
        index: usize,
    },

    /// Two signers share a name.
    #[error("duplicate signer name: {0}")]
    DuplicateSignerName(String),

    /// Two signers share a public key.
    #[error("duplicate public key: {0}")]
    DuplicatePublicKey(String),

    /// The threshold is zero or exceeds the signer count.
    #[error("threshold {threshold} is out of range for {signers} signers")]
    ThresholdOutOfRange {
        /// The requested threshold.
        threshold: u32,
        /// The number of signers.
        signers: usize,
    },
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use super::*;
    use crate::tx::UnlockKey;

    fn key(hex: &str) -> PublicKey {
        PublicKey::from_str(hex).unwrap()
    }

    fn keys() -> [PublicKey; 3] {
        [
            key("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"),
            key("02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"),
            key("02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9"),
        ]
    }

    fn descriptor(threshold: u32) -> Result<MultisigDescriptor<()>, DescriptorError> {
        let [a, b, c] = keys();
        MultisigDescriptor::builder()
            .name("treasury")
            .signers(vec![("alice".into(), a), ("bob".into(), b), ("carol".into(), c)])
            .threshold(threshold)
            .aux(())
            .build()
    }

    #[test]
    fn slots_follow_signer_order() {
        let descriptor = descriptor(2).unwrap();
        let names: Vec<_> = descriptor.slots().iter().map(|s| (s.name(), s.slot_index())).collect();
        assert_eq!(names, [("alice", 0), ("bob", 1), ("carol", 2)]);
        assert_eq!(descriptor.slot_by_name("bob").map(SignerSlot::slot_index), Some(1));
    }

    #[test]
    fn threshold_bounds_are_enforced() {
        assert!(matches!(
            descriptor(0),
            Err(DescriptorError::ThresholdOutOfRange { threshold: 0, signers: 3 })
        ));
        assert!(matches!(
            descriptor(4),
            Err(DescriptorError::ThresholdOutOfRange { threshold: 4, signers: 3 })
        ));
        assert!(descriptor(3).is_ok());
    }

    #[test]
    fn rejects_duplicates_and_empty_names() {
        let [a, b, _] = keys();
        let build = |signers: Vec<(String, PublicKey)>| {
            MultisigDescriptor::builder()
                .name("w")
                .signers(signers)
                .threshold(1)
                .aux(())
                .build()
        };

        assert_eq!(
            build(vec![("x".into(), a), ("x".into(), b)]),
            Err(DescriptorError::DuplicateSignerName("x".into()))
        );
        assert_eq!(
            build(vec![("x".into(), a), ("y".into(), a)]),
            Err(DescriptorError::DuplicatePublicKey(a.to_string()))
        );
        assert_eq!(
            build(vec![("x".into(), a), (" ".into(), b)]),
            Err(DescriptorError::EmptySignerName { index: 1 })
        );
        assert_eq!(build(vec![]), Err(DescriptorError::NoSigners));
    }

    #[test]
    fn unlock_script_match_requires_threshold_keys_in_slot() {
        let descriptor = descriptor(2).unwrap();
        let [a, b, c] = keys();

        let script = UnlockScript::new(vec![UnlockKey::new(a, 0), UnlockKey::new(c, 2)]).unwrap();
        assert!(descriptor.matches_unlock_script(&script));

        let wrong_slot =
            UnlockScript::new(vec![UnlockKey::new(a, 0), UnlockKey::new(b, 2)]).unwrap();
        assert!(!descriptor.matches_unlock_script(&wrong_slot));

        let out_of_range =
            UnlockScript::new(vec![UnlockKey::new(a, 0), UnlockKey::new(b, 7)]).unwrap();
        assert!(!descriptor.matches_unlock_script(&out_of_range));

        let too_few = UnlockScript::new(vec![UnlockKey::new(a, 0)]).unwrap();
        assert!(!descriptor.matches_unlock_script(&too_few));
    }
}
