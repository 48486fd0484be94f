//! Wire types of the full node and explorer REST APIs.
//!
//! Amounts are 256-bit decimal strings on the wire and are read into `u128`, which covers
//! every realistic ALPH and token balance.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// A token amount.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The token id as 64 hex chars.
    pub id: String,
    /// The amount in the token's smallest unit.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u128,
}

/// Reference to the output an input spends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    /// The group hint.
    pub hint: i32,
    /// The output key.
    pub key: String,
}

/// An input of a decoded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInput {
    /// The spent output.
    pub output_ref: OutputRef,
    /// The serialized unlock script as hex.
    pub unlock_script: String,
}

/// A fixed output of a decoded transaction.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedAssetOutput {
    /// The recipient address.
    pub address: String,
    /// The ALPH amount in atto-ALPH.
    #[serde_as(as = "DisplayFromStr")]
    pub atto_alph_amount: u128,
    /// The token amounts.
    #[serde(default)]
    pub tokens: Vec<Token>,
}

/// The body of a decoded unsigned transaction.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTxView {
    /// The transaction id reported by the node.
    pub tx_id: String,
    /// The gas limit.
    pub gas_amount: u64,
    /// The price per gas unit in atto-ALPH.
    #[serde_as(as = "DisplayFromStr")]
    pub gas_price: u128,
    /// The inputs.
    pub inputs: Vec<AssetInput>,
    /// The fixed outputs.
    pub fixed_outputs: Vec<FixedAssetOutput>,
}

/// Request of `POST /transactions/decode-unsigned-tx`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeUnsignedTx {
    /// The unsigned transaction hex.
    pub unsigned_tx: String,
}

/// Response of `POST /transactions/decode-unsigned-tx`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeUnsignedTxResult {
    /// The source group.
    pub from_group: u32,
    /// The destination group.
    pub to_group: u32,
    /// The decoded transaction.
    pub unsigned_tx: UnsignedTxView,
}

/// Response of `GET /addresses/{address}/balance`.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    /// The total ALPH balance.
    #[serde_as(as = "DisplayFromStr")]
    pub balance: u128,
    /// The locked part of the ALPH balance.
    #[serde_as(as = "DisplayFromStr")]
    pub locked_balance: u128,
    /// The total token balances.
    #[serde(default)]
    pub token_balances: Vec<Token>,
    /// The locked token balances.
    #[serde(default)]
    pub locked_token_balances: Vec<Token>,
}

/// A payment in a multisig build request.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// The recipient address.
    pub address: String,
    /// The ALPH amount in atto-ALPH.
    #[serde_as(as = "DisplayFromStr")]
    pub atto_alph_amount: u128,
    /// The token amounts.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tokens: Vec<Token>,
}

/// Request of `POST /multisig/build`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMultisig {
    /// The multisig address.
    pub from_address: String,
    /// The public keys of the selected signers, in slot order.
    pub from_public_keys: Vec<String>,
    /// The payments.
    pub destinations: Vec<Destination>,
}

/// Response of `POST /multisig/build`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTransferTxResult {
    /// The unsigned transaction hex.
    pub unsigned_tx: String,
    /// The gas limit.
    pub gas_amount: u64,
    /// The price per gas unit.
    #[serde_as(as = "DisplayFromStr")]
    pub gas_price: u128,
    /// The transaction id.
    pub tx_id: String,
    /// The source group.
    pub from_group: u32,
    /// The destination group.
    pub to_group: u32,
}

/// Request of `POST /multisig/sweep`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSweepMultisig {
    /// The multisig address.
    pub from_address: String,
    /// The public keys of the selected signers, in slot order.
    pub from_public_keys: Vec<String>,
    /// The recipient of the whole balance.
    pub to_address: String,
}

/// One transaction of a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepAddressTransaction {
    /// The transaction id.
    pub tx_id: String,
    /// The unsigned transaction hex.
    pub unsigned_tx: String,
}

/// Response of `POST /multisig/sweep`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSweepTxResult {
    /// The sweep transactions, one per UTXO batch.
    pub unsigned_txs: Vec<SweepAddressTransaction>,
    /// The source group.
    pub from_group: u32,
    /// The destination group.
    pub to_group: u32,
}

/// Request of `POST /multisig/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMultisig {
    /// The unsigned transaction hex.
    pub unsigned_tx: String,
    /// The signatures as hex, in slot order.
    pub signatures: Vec<String>,
}

/// Response of `POST /multisig/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTxResult {
    /// The accepted transaction id.
    pub tx_id: String,
    /// The source group.
    pub from_group: u32,
    /// The destination group.
    pub to_group: u32,
}

/// Metadata of a fungible token, from `POST /tokens/fungible-metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTokenMetadata {
    /// The token id.
    pub id: String,
    /// The hex encoded symbol.
    pub symbol: String,
    /// The hex encoded name.
    pub name: String,
    /// The number of decimals.
    pub decimals: u32,
}

/// Whether the explorer knows a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// The explorer has indexed the transaction.
    Indexed,
    /// The explorer does not know the transaction yet.
    NotFound,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_reads_string_amounts() {
        let balance: Balance = serde_json::from_value(serde_json::json!({
            "balance": "2000000000000000000",
            "balanceHint": "2 ALPH",
            "lockedBalance": "0",
            "lockedBalanceHint": "0 ALPH",
            "tokenBalances": [{ "id": "ab".repeat(32), "amount": "5" }],
            "utxoNum": 2
        }))
        .unwrap();

        assert_eq!(balance.balance, 2_000_000_000_000_000_000);
        assert_eq!(balance.token_balances[0].amount, 5);
        assert!(balance.locked_token_balances.is_empty());
    }

    #[test]
    fn destination_omits_empty_tokens() {
        let destination = Destination { address: "addr".into(), atto_alph_amount: 10, tokens: vec![] };
        assert_eq!(
            serde_json::to_value(destination).unwrap(),
            serde_json::json!({ "address": "addr", "attoAlphAmount": "10" })
        );
    }
}
