use core::num::NonZeroU32;
use std::time::Duration;

use alephium_multisig_client::api::{Balance, Token};
use alephium_multisig_coordinator_codec::{
    AddressKind, decode_address, descriptor_address, encode_multisig_address, encode_unlock_script,
};
use alephium_multisig_coordinator_domain::{
    descriptor::MultisigDescriptor,
    network::NetworkId,
    tx::{Confirmation, DUST_AMOUNT, Destination, SignatureRecord, TokenId, UnlockKey, UnlockScript, UnsignedTransaction},
};
use alephium_multisig_coordinator_engine::{
    BuildError, CollectorError, CollectorState, MultisigEngine, MultisigEngineError, PollConfig,
    SignatureCollector, SignatureError, SubmitError, request::BuildTxRequest,
};
use alephium_multisig_test_utils::{MockExplorer, MockNode, NodeCall, TestSigner, descriptor, p2pkh_address};
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::Mutex;

const ALPH: u128 = 1_000_000_000_000_000_000;

fn engine(node: &MockNode, explorer: &MockExplorer) -> MultisigEngine<MockNode, MockExplorer> {
    MultisigEngine::builder()
        .network_id(NetworkId::Devnet)
        .node(node.clone())
        .explorer(explorer.clone())
        .poll(PollConfig::builder().attempts(3).interval(Duration::from_millis(5)).build())
        .build()
}

fn treasury() -> MultisigDescriptor<()> {
    descriptor("treasury", &["alice", "bob", "carol"], 2)
}

fn funded(d: &MultisigDescriptor<()>, alph: u128) -> MockNode {
    let node = MockNode::new();
    node.set_balance(&descriptor_address(d), Balance { balance: alph * ALPH, ..Default::default() });
    node
}

fn pay(amount: &str) -> Destination {
    Destination::builder().address(p2pkh_address(42)).amount(amount).build()
}

fn record(name: &str, signer: &TestSigner, tx: &UnsignedTransaction) -> SignatureRecord {
    SignatureRecord::builder().signer_name(name).signature(signer.sign(&tx.tx_id())).build()
}

async fn build_for_alice_and_bob(node: &MockNode, d: &MultisigDescriptor<()>) -> UnsignedTransaction {
    engine(node, &MockExplorer::indexed_after(1))
        .tx_builder()
        .build(d, &["alice", "bob"], &[pay("1.5")])
        .await
        .unwrap()
}

#[tokio::test]
async fn two_of_three_transfer_is_collected_out_of_order_and_submitted_once() {
    let d = treasury();
    let node = funded(&d, 10);
    let explorer = MockExplorer::indexed_after(2);
    let engine = engine(&node, &explorer);
    let [alice, bob, carol] = TestSigner::fixtures::<3>();

    let tx = engine.tx_builder().build(&d, &["bob", "alice"], &[pay("1.5")]).await.unwrap();

    let build = node
        .calls()
        .into_iter()
        .find_map(|call| match call {
            NodeCall::BuildMultisigTx(request) => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(build.from_address, descriptor_address(&d));
    assert_eq!(build.from_public_keys, [alice.public_key().to_string(), bob.public_key().to_string()]);
    assert_eq!(build.destinations[0].atto_alph_amount, 1_500_000_000_000_000_000);
    assert!(tx.unlock_script().keys().iter().all(|k| k.public_key() != &carol.public_key()));

    let mut collector = SignatureCollector::new();
    collector.load_unsigned_tx(tx.clone(), core::slice::from_ref(&d)).unwrap();
    assert_eq!(collector.submit_signature("bob", bob.sign(&tx.tx_id())).unwrap(), CollectorState::AwaitingSignatures);
    assert_eq!(collector.submit_signature("alice", alice.sign(&tx.tx_id())).unwrap(), CollectorState::Complete);

    let result = engine.tx_submitter().submit(&d, &["alice", "bob"], &tx, &collector.records()).await.unwrap();

    assert_eq!(result.tx_id(), tx.tx_id());
    assert_eq!(result.confirmation(), Confirmation::Indexed { attempts: 2 });
    assert_eq!(explorer.polls(&tx.tx_id().to_string()), 2);

    let submissions = node.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].unsigned_tx, tx.to_hex());
    assert_eq!(submissions[0].signatures, [
        alice.sign(&tx.tx_id()).to_string(),
        bob.sign(&tx.tx_id()).to_string()
    ]);
}

#[tokio::test]
async fn signature_from_the_wrong_signer_is_reported_as_misattributed() {
    let d = treasury();
    let node = funded(&d, 10);
    let tx = build_for_alice_and_bob(&node, &d).await;
    let [_, bob] = TestSigner::fixtures::<2>();

    let mut collector = SignatureCollector::new();
    collector.load_unsigned_tx(tx.clone(), core::slice::from_ref(&d)).unwrap();

    let err = collector.submit_signature("alice", bob.sign(&tx.tx_id())).unwrap_err();

    assert_eq!(
        err,
        CollectorError::Signature(SignatureError::MisattributedSignature {
            claimed: "alice".into(),
            actual: "bob".into()
        })
    );
    assert!(collector.records().is_empty());
}

#[tokio::test]
async fn unselected_signer_is_never_accepted() {
    let d = treasury();
    let node = funded(&d, 10);
    let explorer = MockExplorer::indexed_after(1);
    let tx = build_for_alice_and_bob(&node, &d).await;
    let [alice, _, carol] = TestSigner::fixtures::<3>();

    let mut collector = SignatureCollector::new();
    collector.load_unsigned_tx(tx.clone(), core::slice::from_ref(&d)).unwrap();
    assert_eq!(
        collector.submit_signature("carol", carol.sign(&tx.tx_id())),
        Err(SignatureError::UnknownSigner("carol".into()).into())
    );

    let records = [record("alice", &alice, &tx), record("carol", &carol, &tx)];
    let err = engine(&node, &explorer).tx_submitter().submit(&d, &["alice", "bob"], &tx, &records).await.unwrap_err();

    assert!(matches!(err, SubmitError::Signature(SignatureError::UnknownSigner(name)) if name == "carol"));
    assert!(node.submissions().is_empty());
}

#[tokio::test]
async fn single_signature_is_rejected_before_any_node_call() {
    let d = treasury();
    let node = funded(&d, 10);
    let tx = build_for_alice_and_bob(&node, &d).await;
    let calls = node.calls().len();
    let [alice] = TestSigner::fixtures::<1>();

    let err = engine(&node, &MockExplorer::indexed_after(1))
        .tx_submitter()
        .submit(&d, &["alice", "bob"], &tx, &[record("alice", &alice, &tx)])
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::WrongSignatureCount { expected: 2, actual: 1 }));
    assert_eq!(node.calls().len(), calls);
}

#[tokio::test]
async fn insufficient_balance_stops_before_building() {
    let d = treasury();
    let node = MockNode::new();
    node.set_balance(&descriptor_address(&d), Balance {
        balance: 2 * ALPH,
        locked_balance: ALPH,
        ..Default::default()
    });

    let err = engine(&node, &MockExplorer::indexed_after(1))
        .tx_builder()
        .build(&d, &["alice", "bob"], &[pay("1.5")])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::InsufficientBalance { ref asset, required, available }
            if asset == "ALPH" && required == 1_500_000_000_000_000_000 && available == ALPH
    ));
    assert!(!node.calls().iter().any(|call| matches!(call, NodeCall::BuildMultisigTx(_))));
}

#[tokio::test]
async fn token_transfers_carry_dust_and_use_token_decimals() {
    let d = treasury();
    let token = TokenId::from([0xab; 32]);
    let node = MockNode::new();
    node.set_token_decimals(&token.to_string(), 2);
    node.set_balance(&descriptor_address(&d), Balance {
        balance: DUST_AMOUNT,
        token_balances: vec![Token { id: token.to_string(), amount: 100 }],
        ..Default::default()
    });
    let engine = engine(&node, &MockExplorer::indexed_after(1));

    let send = Destination::builder().address(p2pkh_address(7)).token_id(token).amount("0.5").build();
    engine.tx_builder().build(&d, &["alice", "carol"], &[send]).await.unwrap();

    let build = node
        .calls()
        .into_iter()
        .find_map(|call| match call {
            NodeCall::BuildMultisigTx(request) => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(build.destinations[0].atto_alph_amount, DUST_AMOUNT);
    assert_eq!(build.destinations[0].tokens, [Token { id: token.to_string(), amount: 50 }]);

    let twice = [
        Destination::builder().address(p2pkh_address(7)).token_id(token).amount("0.5").build(),
        Destination::builder().address(p2pkh_address(8)).token_id(token).amount("0.5").build(),
    ];
    let err = engine.tx_builder().build(&d, &["alice", "carol"], &twice).await.unwrap_err();
    assert!(matches!(err, BuildError::InsufficientBalance { ref asset, .. } if asset == "ALPH"));
}

#[tokio::test]
async fn invalid_input_never_reaches_the_node() {
    let d = treasury();
    let node = funded(&d, 10);
    let builder_engine = engine(&node, &MockExplorer::indexed_after(1));
    let builder = builder_engine.tx_builder();

    let bad_recipient = Destination::builder().address("not-an-address").amount("1").build();
    assert!(matches!(
        builder.build(&d, &["alice", "bob"], &[bad_recipient]).await,
        Err(BuildError::Validation(_))
    ));
    assert!(matches!(builder.build(&d, &["alice", "bob"], &[pay("0")]).await, Err(BuildError::Validation(_))));
    assert!(matches!(builder.build(&d, &["alice"], &[pay("1")]).await, Err(BuildError::Selection(_))));
    assert!(matches!(builder.build(&d, &["alice", "dave"], &[pay("1")]).await, Err(BuildError::Selection(_))));

    assert!(!node.calls().iter().any(|call| matches!(call, NodeCall::BuildMultisigTx(_))));
}

#[tokio::test]
async fn sweep_requires_a_single_transaction() {
    let d = treasury();
    let node = funded(&d, 10);
    let engine = engine(&node, &MockExplorer::indexed_after(1));

    let tx = engine.tx_builder().build_sweep(&d, &["alice", "bob"], &p2pkh_address(9)).await.unwrap();
    assert_eq!(tx.unlock_script().len(), 2);

    node.set_sweep_batches(2);
    let err = engine.tx_builder().build_sweep(&d, &["alice", "bob"], &p2pkh_address(9)).await.unwrap_err();

    assert!(matches!(err, BuildError::UnsupportedSweep { transactions: 2 }));
}

#[tokio::test]
async fn load_rejects_transactions_spending_from_several_scripts() {
    let node = MockNode::new();
    let builder_engine = engine(&node, &MockExplorer::indexed_after(1));
    let builder = builder_engine.tx_builder();
    let [alice, bob, carol] = TestSigner::fixtures::<3>();

    let script = |keys: &[(&TestSigner, u8)]| {
        let keys = keys.iter().map(|(s, slot)| UnlockKey::new(s.public_key(), *slot)).collect();
        hex::encode(encode_unlock_script(&UnlockScript::new(keys).unwrap()))
    };
    let ab = script(&[(&alice, 0), (&bob, 1)]);
    let ac = script(&[(&alice, 0), (&carol, 2)]);

    let mixed = node.craft_unsigned_tx(&[ab.clone(), ac], vec![]);
    assert!(matches!(builder.load(&mixed).await, Err(BuildError::MalformedScript(_))));

    let empty = node.craft_unsigned_tx(&[], vec![]);
    assert!(matches!(builder.load(&empty).await, Err(BuildError::MalformedScript(_))));

    let p2pkh_input = node.craft_unsigned_tx(&["00".repeat(34)], vec![]);
    assert!(matches!(builder.load(&p2pkh_input).await, Err(BuildError::MalformedScript(_))));

    assert!(matches!(builder.load("zz").await, Err(BuildError::Validation(_))));
    assert!(matches!(builder.load("abcd").await, Err(BuildError::Node(_))));

    let same = node.craft_unsigned_tx(&[ab, "03".into()], vec![]);
    let loaded = builder.load(&same).await.unwrap();
    assert_eq!(loaded.tx().unlock_script().len(), 2);
    assert_eq!(loaded.summary().recipient(), None);
}

#[tokio::test]
async fn summary_describes_the_first_output() {
    let d = treasury();
    let node = funded(&d, 10);
    let engine = engine(&node, &MockExplorer::indexed_after(1));
    let tx = build_for_alice_and_bob(&node, &d).await;

    let (loaded, amounts) = engine.describe_tx(&tx.to_hex()).await.unwrap();

    assert_eq!(loaded.tx(), &tx);
    assert_eq!(loaded.summary().recipient(), Some(p2pkh_address(42).as_str()));
    assert_eq!(loaded.summary().fee(), 2_000_000_000_000_000);
    assert_eq!(amounts.len(), 1);
    assert_eq!(amounts[0].symbol(), "ALPH");
    assert_eq!(amounts[0].amount(), "1.5");
}

#[tokio::test]
async fn unindexed_submission_is_a_warning_not_an_error() {
    let d = treasury();
    let node = funded(&d, 10);
    let explorer = MockExplorer::never_indexed();
    let tx = build_for_alice_and_bob(&node, &d).await;
    let [alice, bob] = TestSigner::fixtures::<2>();

    let records = [record("alice", &alice, &tx), record("bob", &bob, &tx)];
    let result = engine(&node, &explorer).tx_submitter().submit(&d, &["alice", "bob"], &tx, &records).await.unwrap();

    assert_eq!(result.confirmation(), Confirmation::Unconfirmed { attempts: 3 });
    assert!(!result.is_confirmed());
    assert_eq!(explorer.polls(&tx.tx_id().to_string()), 3);
    assert_eq!(node.submissions().len(), 1);
}

#[tokio::test]
async fn explorer_outage_does_not_fail_submission() {
    let d = treasury();
    let node = funded(&d, 10);
    let explorer = MockExplorer::failing();
    let tx = build_for_alice_and_bob(&node, &d).await;
    let [alice, bob] = TestSigner::fixtures::<2>();

    let records = [record("alice", &alice, &tx), record("bob", &bob, &tx)];
    let result = engine(&node, &explorer).tx_submitter().submit(&d, &["alice", "bob"], &tx, &records).await.unwrap();

    assert_eq!(result.confirmation(), Confirmation::Unconfirmed { attempts: 3 });
}

#[tokio::test]
async fn signatures_for_other_signers_do_not_fit_the_unlock_script() {
    let d = treasury();
    let node = funded(&d, 10);
    let tx = build_for_alice_and_bob(&node, &d).await;
    let [alice, _, carol] = TestSigner::fixtures::<3>();

    let records = [record("alice", &alice, &tx), record("carol", &carol, &tx)];
    let err = engine(&node, &MockExplorer::indexed_after(1))
        .tx_submitter()
        .submit(&d, &["alice", "carol"], &tx, &records)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::UnlockScriptMismatch));
    assert!(node.submissions().is_empty());
}

#[tokio::test]
async fn unknown_descriptor_is_collected_by_public_key_and_submitted() {
    let d = treasury();
    let node = funded(&d, 10);
    let engine = engine(&node, &MockExplorer::indexed_after(1));
    let tx = build_for_alice_and_bob(&node, &d).await;
    let [alice, bob] = TestSigner::fixtures::<2>();

    let mut collector = SignatureCollector::new();
    collector.load_unsigned_tx::<()>(tx.clone(), &[]).unwrap();
    assert_eq!(collector.descriptor_name(), None);

    collector.submit_signature(&bob.public_key().to_string(), bob.sign(&tx.tx_id())).unwrap();
    collector.submit_signature(&alice.public_key().to_string(), alice.sign(&tx.tx_id())).unwrap();

    let result = engine.tx_submitter().submit_collected(&collector).await.unwrap();

    assert!(result.is_confirmed());
    assert_eq!(node.submissions()[0].signatures, [
        alice.sign(&tx.tx_id()).to_string(),
        bob.sign(&tx.tx_id()).to_string()
    ]);
}

#[tokio::test]
async fn failed_submission_keeps_the_session() {
    let d = treasury();
    let node = funded(&d, 10);
    let engine = engine(&node, &MockExplorer::indexed_after(1));
    let tx = build_for_alice_and_bob(&node, &d).await;
    let [alice, bob] = TestSigner::fixtures::<2>();

    let mut collector = SignatureCollector::new();
    collector.load_unsigned_tx(tx.clone(), core::slice::from_ref(&d)).unwrap();
    collector.submit_signature("alice", alice.sign(&tx.tx_id())).unwrap();

    let incomplete = engine.tx_submitter().submit_collected(&collector).await.unwrap_err();
    assert!(matches!(incomplete, SubmitError::Collector(CollectorError::Incomplete { accepted: 1, required: 2 })));

    collector.submit_signature("bob", bob.sign(&tx.tx_id())).unwrap();
    node.fail_next_submit("mempool full");
    let session = Mutex::new(collector);

    let err = engine.submit_session(&session).await.unwrap_err();
    assert!(matches!(err, MultisigEngineError::Submit(SubmitError::Node(_))));
    assert_eq!(session.lock().await.state(), CollectorState::Complete);

    assert!(engine.submit_session(&session).await.unwrap().is_confirmed());
    assert_eq!(session.lock().await.state(), CollectorState::Empty);
    assert_eq!(node.submissions().len(), 2);
}

#[tokio::test]
async fn concurrent_session_submits_reach_the_node_once() {
    let d = treasury();
    let node = funded(&d, 10);
    let engine = engine(&node, &MockExplorer::indexed_after(2));
    let tx = build_for_alice_and_bob(&node, &d).await;
    let [alice, bob] = TestSigner::fixtures::<2>();

    let mut collector = SignatureCollector::new();
    collector.load_unsigned_tx(tx.clone(), core::slice::from_ref(&d)).unwrap();
    collector.submit_signature("alice", alice.sign(&tx.tx_id())).unwrap();
    collector.submit_signature("bob", bob.sign(&tx.tx_id())).unwrap();
    let session = Mutex::new(collector);

    let (first, second) = tokio::join!(engine.submit_session(&session), engine.submit_session(&session));

    assert_eq!(node.submissions().len(), 1);
    assert_eq!([&first, &second].iter().filter(|r| r.is_ok()).count(), 1);
    assert!([first, second].into_iter().any(|r| matches!(
        r,
        Err(MultisigEngineError::Submit(SubmitError::Collector(CollectorError::NotLoaded)))
    )));
    assert_eq!(session.lock().await.state(), CollectorState::Empty);
}

#[test]
fn random_signer_sets_derive_stable_order_sensitive_addresses() {
    let mut rng = StdRng::seed_from_u64(7);

    for n in 2..=6usize {
        let names: Vec<String> = (0..n).map(|i| format!("signer-{i}")).collect();
        let keys: Vec<_> = (0..n).map(|_| TestSigner::random(&mut rng).public_key()).collect();
        let threshold = NonZeroU32::new(n as u32 - 1).unwrap();

        let d = MultisigDescriptor::builder()
            .name("random")
            .signers(names.iter().cloned().zip(keys.iter().copied()).collect())
            .threshold(threshold.get())
            .aux(())
            .build()
            .unwrap();
        let address = descriptor_address(&d);

        assert_eq!(address, encode_multisig_address(&keys, threshold));
        assert_eq!(
            decode_address(&address).unwrap(),
            AddressKind::P2mpkh { signers: n as u32, threshold: threshold.get() }
        );

        let mut reordered = keys.clone();
        reordered.rotate_left(1);
        assert_ne!(encode_multisig_address(&reordered, threshold), address);
    }
}

#[tokio::test]
async fn engine_requests_route_to_the_builder() {
    let d = treasury();
    let node = funded(&d, 1);
    let engine = engine(&node, &MockExplorer::indexed_after(1));

    let request = BuildTxRequest::builder()
        .descriptor(d)
        .signer_names(vec!["alice".into(), "bob".into()])
        .destinations(vec![pay("2")])
        .build();

    let err = engine.build_tx(request).await.unwrap_err();

    assert!(matches!(err, MultisigEngineError::Build(BuildError::InsufficientBalance { .. })));
    assert_eq!(engine.network_id(), NetworkId::Devnet);
}
