use alephium_multisig_coordinator_codec::descriptor_address;
use alephium_multisig_coordinator_domain::descriptor::DescriptorError;
use alephium_multisig_test_utils::{TestSigner, descriptor};
use base64::{Engine, engine::general_purpose::STANDARD};

use super::*;

fn store() -> ConfigStore<MemoryKvStore> {
    ConfigStore::new(MemoryKvStore::new())
}

fn treasury() -> MultisigDescriptor<()> {
    descriptor("treasury", &["alice", "bob", "carol"], 2)
}

#[test]
fn create_then_list_in_insertion_order() {
    let store = store();

    store.create(treasury()).unwrap();
    store.create(descriptor("ops", &["dave", "erin"], 1)).unwrap();

    let names: Vec<_> = store.list().unwrap().iter().map(|d| d.name().to_owned()).collect();
    assert_eq!(names, ["treasury", "ops"]);

    let found = store.find_by_name("treasury").unwrap().unwrap();
    assert_eq!(descriptor_address(&found), descriptor_address(&treasury()));
    assert_eq!(found.slots(), treasury().slots());
    assert!(store.find_by_name("missing").unwrap().is_none());
}

#[test]
fn duplicate_name_is_rejected() {
    let store = store();
    store.create(treasury()).unwrap();

    let err = store.create(descriptor("treasury", &["x"], 1)).unwrap_err();
    assert!(matches!(
        err,
        MultisigStoreError::Validation(ValidationReason::AlreadyExists(name)) if name == "treasury"
    ));
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn remove_is_idempotent() {
    let store = store();
    store.create(treasury()).unwrap();

    assert!(store.remove("treasury").unwrap());
    assert!(!store.remove("treasury").unwrap());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn concurrent_creates_of_one_name_store_it_once() {
    let store = store();

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2).map(|_| scope.spawn(|| store.create(treasury()))).collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| matches!(
                outcome,
                Err(MultisigStoreError::Validation(ValidationReason::AlreadyExists(_)))
            ))
            .count(),
        1
    );
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn export_import_preserves_address() {
    let source = store();
    let created = source.create(treasury()).unwrap();
    let token = source.export(&created).unwrap();

    let target = store();
    assert_eq!(target.import(&token).unwrap(), treasury());

    let imported = target.import_and_create(&token).unwrap();
    assert_eq!(descriptor_address(&imported), descriptor_address(&created));
    assert_eq!(imported.slots(), created.slots());
    assert_eq!(imported.threshold(), created.threshold());
}

#[test]
fn exported_json_has_canonical_shape() {
    let token = store().export(&treasury()).unwrap();
    let payload = String::from_utf8(STANDARD.decode(token).unwrap()).unwrap();
    let json = &payload[..payload.len() - 64];

    let keys: Vec<_> = TestSigner::fixtures::<3>().iter().map(|s| s.public_key().to_string()).collect();
    assert_eq!(
        json,
        format!(
            r#"{{"name":"treasury","pubkeys":[{{"name":"alice","pubkey":"{}"}},{{"name":"bob","pubkey":"{}"}},{{"name":"carol","pubkey":"{}"}}],"mOfN":2}}"#,
            keys[0], keys[1], keys[2]
        )
    );
}

#[test]
fn flipped_character_fails_integrity() {
    let token = store().export(&treasury()).unwrap();
    let mut payload = STANDARD.decode(&token).unwrap();

    // "treasury" -> "treasurz"
    let at = payload.windows(8).position(|w| w == b"treasury").unwrap() + 7;
    payload[at] = b'z';
    let tampered = STANDARD.encode(payload);

    assert!(matches!(store().import(&tampered), Err(MultisigStoreError::Integrity(_))));
    assert!(matches!(store().import("%%%"), Err(MultisigStoreError::Integrity(_))));
    assert!(matches!(store().import(&STANDARD.encode("short")), Err(MultisigStoreError::Integrity(_))));
}

fn token_for(json: &str) -> String {
    let checksum = hex::encode(alephium_multisig_coordinator_codec::blake2b256(json.as_bytes()));
    STANDARD.encode(format!("{json}{checksum}"))
}

#[test]
fn schema_violations_name_the_reason() {
    let store = store();
    let key = TestSigner::from_seed(1).public_key().to_string();

    let reason = |json: String| match store.import(&token_for(&json)) {
        Err(MultisigStoreError::Validation(reason)) => reason,
        other => panic!("expected validation failure, got {other:?}"),
    };

    assert!(matches!(reason("{\"name\":1}".into()), ValidationReason::MalformedJson(_)));
    assert_eq!(
        reason(format!(r#"{{"name":"","pubkeys":[{{"name":"a","pubkey":"{key}"}}],"mOfN":1}}"#)),
        ValidationReason::Descriptor(DescriptorError::EmptyName)
    );
    assert_eq!(
        reason(r#"{"name":"w","pubkeys":[],"mOfN":1}"#.into()),
        ValidationReason::Descriptor(DescriptorError::NoSigners)
    );
    assert!(matches!(
        reason(r#"{"name":"w","pubkeys":[{"name":"a","pubkey":"02zz"}],"mOfN":1}"#.into()),
        ValidationReason::InvalidPublicKey { signer, .. } if signer == "a"
    ));
    assert_eq!(
        reason(format!(
            r#"{{"name":"w","pubkeys":[{{"name":"a","pubkey":"{key}"}},{{"name":"b","pubkey":"{key}"}}],"mOfN":1}}"#
        )),
        ValidationReason::Descriptor(DescriptorError::DuplicatePublicKey(key.clone()))
    );
    assert_eq!(
        reason(format!(r#"{{"name":"w","pubkeys":[{{"name":"a","pubkey":"{key}"}}],"mOfN":2}}"#)),
        ValidationReason::Descriptor(DescriptorError::ThresholdOutOfRange { threshold: 2, signers: 1 })
    );

    store.create(descriptor("w", &["a"], 1)).unwrap();
    assert_eq!(
        reason(format!(r#"{{"name":"w","pubkeys":[{{"name":"a","pubkey":"{key}"}}],"mOfN":1}}"#)),
        ValidationReason::AlreadyExists("w".into())
    );
}

#[test]
fn drafts_are_replaced_wholesale() {
    let store = store();
    assert_eq!(store.load_descriptor_draft().unwrap(), None);

    let draft = DescriptorDraft::builder()
        .name("half done")
        .pubkeys(vec![DraftSigner::builder().name("alice").build()])
        .build();
    store.save_descriptor_draft(&draft).unwrap();
    assert_eq!(store.load_descriptor_draft().unwrap(), Some(draft));

    let replacement = DescriptorDraft::builder().name("other").build();
    store.save_descriptor_draft(&replacement).unwrap();
    assert_eq!(store.load_descriptor_draft().unwrap(), Some(replacement));

    store.clear_descriptor_draft().unwrap();
    assert_eq!(store.load_descriptor_draft().unwrap(), None);

    let tx_draft = TxDraft::builder()
        .multisig_name("treasury")
        .signers(vec!["alice".into(), "bob".into()])
        .sweep(true)
        .sweep_to("recipient".to_owned())
        .unsigned_tx("00ab".to_owned())
        .signatures(vec![
            DraftSignature::builder().signer("alice").signature("11".repeat(64)).build(),
            DraftSignature::builder().signer("bob").build(),
        ])
        .step(2)
        .build();
    store.save_tx_draft(&tx_draft).unwrap();
    assert_eq!(store.load_tx_draft().unwrap(), Some(tx_draft));

    let restarted = TxDraft::builder().multisig_name("treasury").build();
    store.save_tx_draft(&restarted).unwrap();
    assert_eq!(store.load_tx_draft().unwrap(), Some(restarted));
    store.clear_tx_draft().unwrap();
    assert_eq!(store.load_tx_draft().unwrap(), None);
}

#[test]
fn file_backend_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    ConfigStore::new(FileKvStore::open(dir.path()).unwrap()).create(treasury()).unwrap();

    let reopened = ConfigStore::new(FileKvStore::open(dir.path()).unwrap());
    assert_eq!(reopened.list().unwrap().len(), 1);
}

#[test]
fn corrupted_list_is_a_serialization_error() {
    let kv = MemoryKvStore::new();
    kv.set(ALL_MULTISIG_KEY, "not json").unwrap();

    assert!(matches!(ConfigStore::new(kv).list(), Err(MultisigStoreError::Serialization(_))));
}
