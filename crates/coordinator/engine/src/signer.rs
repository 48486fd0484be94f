use alephium_multisig_coordinator_codec::verify_signature;
use alephium_multisig_coordinator_domain::{
    descriptor::MultisigDescriptor,
    key::{PublicKey, Signature},
    tx::{TxId, UnlockKey, UnlockScript},
};

use crate::error::{SelectionError, SignatureError};

/// A signer chosen to co-sign a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedSigner {
    label: String,
    public_key: PublicKey,
    slot_index: u8,
}

impl SelectedSigner {
    pub(crate) fn new(label: String, public_key: PublicKey, slot_index: u8) -> Self {
        Self { label, public_key, slot_index }
    }

    /// The signer name, or the hex public key when the descriptor is unknown.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn slot_index(&self) -> u8 {
        self.slot_index
    }
}

/// Resolves `names` to descriptor slots, ordered by slot index.
pub fn select_signers<AUX, S>(
    descriptor: &MultisigDescriptor<AUX>,
    names: &[S],
) -> Result<Vec<SelectedSigner>, SelectionError>
where
    S: AsRef<str>,
{
    let expected = descriptor.threshold().get() as usize;
    if names.len() != expected {
        return Err(SelectionError::WrongSignerCount { expected, actual: names.len() });
    }

    let mut selected = Vec::with_capacity(names.len());
    for name in names.iter().map(AsRef::as_ref) {
        let slot = descriptor
            .slot_by_name(name)
            .ok_or_else(|| SelectionError::UnknownSigner(name.to_owned()))?;

        if selected.iter().any(|s: &SelectedSigner| s.slot_index == slot.slot_index()) {
            return Err(SelectionError::DuplicateSigner(name.to_owned()));
        }

        selected.push(SelectedSigner::new(slot.name().to_owned(), *slot.public_key(), slot.slot_index()));
    }

    selected.sort_by_key(SelectedSigner::slot_index);
    Ok(selected)
}

/// Labels the signers of an unlock script, using descriptor names when one is known.
pub(crate) fn signers_of_script<AUX>(
    script: &UnlockScript,
    descriptor: Option<&MultisigDescriptor<AUX>>,
) -> Vec<SelectedSigner> {
    script
        .keys()
        .iter()
        .map(|key| {
            let label = descriptor
                .and_then(|d| d.slots().get(usize::from(key.slot_index())))
                .map_or_else(|| key.public_key().to_string(), |slot| slot.name().to_owned());
            SelectedSigner::new(label, *key.public_key(), key.slot_index())
        })
        .collect()
}

/// Returns the unlock script the node derives for `signers`.
pub(crate) fn expected_unlock_keys(signers: &[SelectedSigner]) -> Vec<UnlockKey> {
    signers.iter().map(|s| UnlockKey::new(s.public_key, s.slot_index)).collect()
}

/// Verifies `signature` over `tx_id` against the signer labelled `claimed`.
///
/// When the claimed signer's key does not verify, every other selected signer is tried so a
/// signature from the wrong person is told apart from garbage.
pub(crate) fn check_signature<'a>(
    tx_id: &TxId,
    claimed: &str,
    signature: &Signature,
    signers: &'a [SelectedSigner],
) -> Result<&'a SelectedSigner, SignatureError> {
    let expected = signers.iter().find(|s| s.label == claimed);

    if let Some(signer) = expected.filter(|s| verify_signature(tx_id, &s.public_key, signature)) {
        return Ok(signer);
    }

    let actual = signers
        .iter()
        .filter(|s| s.label != claimed)
        .find(|s| verify_signature(tx_id, &s.public_key, signature));

    match (actual, expected) {
        (Some(actual), _) => Err(SignatureError::MisattributedSignature {
            claimed: claimed.to_owned(),
            actual: actual.label.clone(),
        }),
        (None, Some(_)) => Err(SignatureError::InvalidSignature { signer: claimed.to_owned() }),
        (None, None) => Err(SignatureError::UnknownSigner(claimed.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use alephium_multisig_test_utils::{TestSigner, descriptor};

    use super::*;

    fn tx_id() -> TxId {
        TxId::from([7; 32])
    }

    #[test]
    fn selection_is_ordered_by_slot() {
        let d = descriptor("treasury", &["alice", "bob", "carol"], 2);

        let selected = select_signers(&d, &["carol", "alice"]).unwrap();

        let labels: Vec<_> = selected.iter().map(SelectedSigner::label).collect();
        assert_eq!(labels, ["alice", "carol"]);
        assert_eq!(selected[1].slot_index(), 2);
    }

    #[test]
    fn selection_errors() {
        let d = descriptor("treasury", &["alice", "bob", "carol"], 2);

        assert_eq!(
            select_signers(&d, &["alice"]),
            Err(SelectionError::WrongSignerCount { expected: 2, actual: 1 })
        );
        assert_eq!(
            select_signers(&d, &["alice", "dave"]),
            Err(SelectionError::UnknownSigner("dave".into()))
        );
        assert_eq!(
            select_signers(&d, &["bob", "bob"]),
            Err(SelectionError::DuplicateSigner("bob".into()))
        );
    }

    #[test]
    fn signature_checks_tell_misattribution_from_garbage() {
        let d = descriptor("treasury", &["alice", "bob", "carol"], 2);
        let selected = select_signers(&d, &["alice", "bob"]).unwrap();
        let [alice, bob, carol] = TestSigner::fixtures::<3>();

        let accepted = check_signature(&tx_id(), "alice", &alice.sign(&tx_id()), &selected).unwrap();
        assert_eq!(accepted.slot_index(), 0);

        assert_eq!(
            check_signature(&tx_id(), "alice", &bob.sign(&tx_id()), &selected),
            Err(SignatureError::MisattributedSignature { claimed: "alice".into(), actual: "bob".into() })
        );
        assert_eq!(
            check_signature(&tx_id(), "alice", &carol.sign(&tx_id()), &selected),
            Err(SignatureError::InvalidSignature { signer: "alice".into() })
        );
        assert_eq!(
            check_signature(&tx_id(), "carol", &carol.sign(&tx_id()), &selected),
            Err(SignatureError::UnknownSigner("carol".into()))
        );
        assert_eq!(
            check_signature(&tx_id(), "carol", &bob.sign(&tx_id()), &selected),
            Err(SignatureError::MisattributedSignature { claimed: "carol".into(), actual: "bob".into() })
        );
    }

    #[test]
    fn unknown_descriptor_labels_by_public_key() {
        let [alice, bob] = TestSigner::fixtures::<2>();
        let script = UnlockScript::new(vec![
            UnlockKey::new(alice.public_key(), 0),
            UnlockKey::new(bob.public_key(), 1),
        ])
        .unwrap();

        let signers = signers_of_script::<()>(&script, None);

        assert_eq!(signers[1].label(), bob.public_key().to_string());
        assert_eq!(signers[1].slot_index(), 1);
    }
}
