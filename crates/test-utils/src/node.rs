use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use alephium_multisig_client::{
    NodeApi, NodeClientError, Result,
    api::{
        AssetInput, Balance, BuildMultisig, BuildSweepMultisig, BuildSweepTxResult,
        BuildTransferTxResult, DecodeUnsignedTxResult, FixedAssetOutput, FungibleTokenMetadata,
        OutputRef, SubmitMultisig, SubmitTxResult, SweepAddressTransaction, UnsignedTxView,
    },
};
use alephium_multisig_coordinator_codec::{
    blake2b256, decode_compact_int, encode_unlock_script, tx_id_of,
};
use alephium_multisig_coordinator_domain::{
    key::PublicKey,
    tx::{UnlockKey, UnlockScript},
};
use async_trait::async_trait;

const GAS_AMOUNT: u64 = 20_000;
const GAS_PRICE: u128 = 100_000_000_000;
const SAME_AS_PREVIOUS: &str = "03";

/// A node call recorded by [`MockNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCall {
    /// `decode_unsigned_tx`.
    DecodeUnsignedTx,
    /// `address_balance` for the address.
    AddressBalance(String),
    /// `build_multisig_tx`.
    BuildMultisigTx(BuildMultisig),
    /// `build_multisig_sweep`.
    BuildMultisigSweep(BuildSweepMultisig),
    /// `submit_multisig_tx`.
    SubmitMultisigTx(SubmitMultisig),
    /// `fungible_token_metadata` for the token ids.
    FungibleTokenMetadata(Vec<String>),
}

/// An in-memory full node.
///
/// Builds produce real unsigned transaction bytes that embed the multisig unlock script the
/// node would derive from the requested public keys, so transaction ids and unlock scripts
/// flow through the coordinator exactly as with a live node. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockNode {
    inner: Arc<Mutex<NodeState>>,
}

#[derive(Debug, Default)]
struct NodeState {
    balances: HashMap<String, Balance>,
    token_metadata: HashMap<String, FungibleTokenMetadata>,
    txs: HashMap<String, DecodeUnsignedTxResult>,
    calls: Vec<NodeCall>,
    sweep_batches: Option<usize>,
    submit_failure: Option<String>,
    nonce: u64,
}

impl MockNode {
    /// Creates a node with no balances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the balance reported for `address`.
    pub fn set_balance(&self, address: &str, balance: Balance) {
        self.state().balances.insert(address.to_owned(), balance);
    }

    /// Registers metadata for a fungible token.
    pub fn set_token_decimals(&self, token_id: &str, decimals: u32) {
        let metadata = FungibleTokenMetadata {
            id: token_id.to_owned(),
            symbol: hex::encode("TKN"),
            name: hex::encode("Token"),
            decimals,
        };
        self.state().token_metadata.insert(token_id.to_owned(), metadata);
    }

    /// Makes sweeps return `batches` transactions instead of one.
    pub fn set_sweep_batches(&self, batches: usize) {
        self.state().sweep_batches = Some(batches);
    }

    /// Makes the next submission fail with `detail`.
    pub fn fail_next_submit(&self, detail: &str) {
        self.state().submit_failure = Some(detail.to_owned());
    }

    /// Returns every recorded call, oldest first.
    pub fn calls(&self) -> Vec<NodeCall> {
        self.state().calls.clone()
    }

    /// Returns every recorded submission, oldest first.
    pub fn submissions(&self) -> Vec<SubmitMultisig> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                NodeCall::SubmitMultisigTx(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Registers a transaction with arbitrary input unlock scripts and returns its hex.
    ///
    /// This lets tests feed unsigned transactions that no well-behaved builder would produce.
    pub fn craft_unsigned_tx(&self, unlock_scripts: &[String], outputs: Vec<FixedAssetOutput>) -> String {
        let mut state = self.state();
        let payload = unlock_scripts.concat();
        let bytes = state.next_tx_bytes(payload.as_bytes());
        state.register(&bytes, unlock_scripts, outputs)
    }

    fn state(&self) -> MutexGuard<'_, NodeState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NodeState {
    fn next_tx_bytes(&mut self, payload: &[u8]) -> Vec<u8> {
        self.nonce += 1;
        let mut bytes = b"mock-unsigned-tx".to_vec();
        bytes.extend_from_slice(&self.nonce.to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn register(&mut self, bytes: &[u8], unlock_scripts: &[String], outputs: Vec<FixedAssetOutput>) -> String {
        let tx_id = tx_id_of(bytes).to_string();
        let inputs = unlock_scripts
            .iter()
            .enumerate()
            .map(|(i, unlock_script)| AssetInput {
                output_ref: OutputRef { hint: 0, key: format!("{tx_id}{i:04}") },
                unlock_script: unlock_script.clone(),
            })
            .collect();

        let decoded = DecodeUnsignedTxResult {
            from_group: 0,
            to_group: 0,
            unsigned_tx: UnsignedTxView {
                tx_id,
                gas_amount: GAS_AMOUNT,
                gas_price: GAS_PRICE,
                inputs,
                fixed_outputs: outputs,
            },
        };

        let raw = hex::encode(bytes);
        self.txs.insert(raw.clone(), decoded);
        raw
    }

    /// Builds a two-input transaction spent by the keys of a multisig address.
    fn build(&mut self, from_address: &str, public_keys: &[String], outputs: Vec<FixedAssetOutput>) -> Result<BuildTransferTxResult> {
        let script = unlock_script_for(from_address, public_keys)?;
        let script_hex = hex::encode(encode_unlock_script(&script));
        let bytes = self.next_tx_bytes(&encode_unlock_script(&script));
        let unsigned_tx = self.register(&bytes, &[script_hex, SAME_AS_PREVIOUS.to_owned()], outputs);

        Ok(BuildTransferTxResult {
            tx_id: tx_id_of(&bytes).to_string(),
            unsigned_tx,
            gas_amount: GAS_AMOUNT,
            gas_price: GAS_PRICE,
            from_group: 0,
            to_group: 0,
        })
    }
}

/// Derives the unlock script the node would attach: each key is placed at the slot whose
/// hash it matches in the address.
fn unlock_script_for(from_address: &str, public_keys: &[String]) -> Result<UnlockScript> {
    let bad_request = |detail: String| NodeClientError::Status {
        operation: format!("build multisig tx from {from_address}").into(),
        status: 400,
        detail,
    };

    let bytes = bs58::decode(from_address)
        .into_vec()
        .map_err(|e| bad_request(format!("invalid address: {e}")))?;
    let payload = match bytes.split_first() {
        Some((0x01, payload)) => payload,
        _ => return Err(bad_request("not a multisig address".into())),
    };
    let (signers, consumed) = decode_compact_int(payload).map_err(|e| bad_request(e.to_string()))?;
    let hashes: Vec<&[u8]> = payload[consumed..].chunks(32).take(signers as usize).collect();

    let keys = public_keys
        .iter()
        .map(|hex_key| {
            let key: PublicKey = hex_key.parse().map_err(|_| bad_request(format!("invalid key {hex_key}")))?;
            let slot = hashes
                .iter()
                .position(|hash| *hash == blake2b256(&key.to_bytes()).as_slice())
                .ok_or_else(|| bad_request(format!("key {hex_key} is not part of {from_address}")))?;
            Ok(UnlockKey::new(key, slot as u8))
        })
        .collect::<Result<Vec<_>>>()?;

    UnlockScript::new(keys).map_err(|e| bad_request(e.to_string()))
}

#[async_trait]
impl NodeApi for MockNode {
    async fn decode_unsigned_tx(&self, unsigned_tx: &str) -> Result<DecodeUnsignedTxResult> {
        let mut state = self.state();
        state.calls.push(NodeCall::DecodeUnsignedTx);

        state.txs.get(unsigned_tx).cloned().ok_or_else(|| NodeClientError::Status {
            operation: "decode unsigned tx".into(),
            status: 400,
            detail: "Cannot decode unsigned tx".into(),
        })
    }

    async fn address_balance(&self, address: &str) -> Result<Balance> {
        let mut state = self.state();
        state.calls.push(NodeCall::AddressBalance(address.to_owned()));

        Ok(state.balances.get(address).cloned().unwrap_or_default())
    }

    async fn build_multisig_tx(&self, request: &BuildMultisig) -> Result<BuildTransferTxResult> {
        let mut state = self.state();
        state.calls.push(NodeCall::BuildMultisigTx(request.clone()));

        let outputs = request
            .destinations
            .iter()
            .map(|d| FixedAssetOutput {
                address: d.address.clone(),
                atto_alph_amount: d.atto_alph_amount,
                tokens: d.tokens.clone(),
            })
            .collect();

        state.build(&request.from_address, &request.from_public_keys, outputs)
    }

    async fn build_multisig_sweep(&self, request: &BuildSweepMultisig) -> Result<BuildSweepTxResult> {
        let mut state = self.state();
        state.calls.push(NodeCall::BuildMultisigSweep(request.clone()));

        let total = state.balances.get(&request.from_address).map(|b| b.balance).unwrap_or_default();
        let batches = state.sweep_batches.unwrap_or(1);

        let unsigned_txs = (0..batches)
            .map(|_| {
                let output = FixedAssetOutput {
                    address: request.to_address.clone(),
                    atto_alph_amount: total / batches as u128,
                    tokens: vec![],
                };
                state
                    .build(&request.from_address, &request.from_public_keys, vec![output])
                    .map(|built| SweepAddressTransaction { tx_id: built.tx_id, unsigned_tx: built.unsigned_tx })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BuildSweepTxResult { unsigned_txs, from_group: 0, to_group: 0 })
    }

    async fn submit_multisig_tx(&self, request: &SubmitMultisig) -> Result<SubmitTxResult> {
        let mut state = self.state();
        state.calls.push(NodeCall::SubmitMultisigTx(request.clone()));

        if let Some(detail) = state.submit_failure.take() {
            return Err(NodeClientError::Status { operation: "submit multisig tx".into(), status: 500, detail });
        }

        let decoded = state.txs.get(&request.unsigned_tx).ok_or_else(|| NodeClientError::Status {
            operation: "submit multisig tx".into(),
            status: 400,
            detail: "unknown unsigned tx".into(),
        })?;

        Ok(SubmitTxResult {
            tx_id: decoded.unsigned_tx.tx_id.clone(),
            from_group: decoded.from_group,
            to_group: decoded.to_group,
        })
    }

    async fn fungible_token_metadata(&self, token_ids: &[String]) -> Result<Vec<FungibleTokenMetadata>> {
        let mut state = self.state();
        state.calls.push(NodeCall::FungibleTokenMetadata(token_ids.to_vec()));

        token_ids
            .iter()
            .map(|id| {
                state.token_metadata.get(id).cloned().ok_or_else(|| NodeClientError::Status {
                    operation: format!("metadata of tokens {id}").into(),
                    status: 404,
                    detail: format!("token {id} not found"),
                })
            })
            .collect()
    }
}
