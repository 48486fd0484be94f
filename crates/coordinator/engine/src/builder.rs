use std::collections::{BTreeMap, BTreeSet};

use alephium_multisig_client::{
    NodeApi,
    api::{Balance, BuildMultisig, BuildSweepMultisig, Destination as NodeDestination, Token, UnsignedTxView},
};
use alephium_multisig_coordinator_codec::{
    SAME_AS_PREVIOUS, decode_unlock_script, descriptor_address, is_valid_address, tx_id_of,
};
use alephium_multisig_coordinator_domain::{
    descriptor::MultisigDescriptor,
    tx::{ALPH_DECIMALS, DUST_AMOUNT, Destination, TokenId, TxId, UnsignedTransaction},
};

use crate::{
    amount::{format_amount, parse_amount},
    error::BuildError,
    signer::{SelectedSigner, expected_unlock_keys, select_signers},
    types::response::{AssetAmount, DisplayAmount, LoadedTx, LoadedTxDissolved, TxSummary},
};

/// Builds and loads unsigned multisig transactions through a full node.
#[derive(Debug)]
pub struct TxBuilder<'a, N> {
    node: &'a N,
}

impl<'a, N: NodeApi> TxBuilder<'a, N> {
    pub fn new(node: &'a N) -> Self {
        Self { node }
    }

    /// Builds a transfer from the descriptor address to `destinations`.
    ///
    /// Every input is checked before the first node call that depends on it: the signer
    /// selection, recipient addresses and token ids are validated locally, amounts once token
    /// decimals are known, and the spendable balance before the node is asked to build.
    #[tracing::instrument(skip_all, fields(multisig = descriptor.name(), destinations = destinations.len()))]
    pub async fn build<AUX, S>(
        &self,
        descriptor: &MultisigDescriptor<AUX>,
        signer_names: &[S],
        destinations: &[Destination],
    ) -> Result<UnsignedTransaction, BuildError>
    where
        S: AsRef<str>,
    {
        let signers = select_signers(descriptor, signer_names)?;

        if destinations.is_empty() {
            return Err(BuildError::validation("at least one destination is required"));
        }
        for destination in destinations {
            check_recipient(destination.address())?;
        }

        let tokens: BTreeSet<_> =
            destinations.iter().map(Destination::token_id).filter(|id| !id.is_alph()).collect();
        let decimals = self.token_decimals(&tokens).await?;

        let mut required = BTreeMap::new();
        let mut outputs = Vec::with_capacity(destinations.len());
        for destination in destinations {
            let token_id = destination.token_id();
            let decimals = decimals.get(&token_id).copied().unwrap_or(ALPH_DECIMALS);
            let amount = parse_amount(destination.amount(), decimals)?;

            add_required(&mut required, token_id, amount)?;
            let output = if token_id.is_alph() {
                NodeDestination {
                    address: destination.address().to_owned(),
                    atto_alph_amount: amount,
                    tokens: vec![],
                }
            } else {
                add_required(&mut required, TokenId::ALPH, DUST_AMOUNT)?;
                NodeDestination {
                    address: destination.address().to_owned(),
                    atto_alph_amount: DUST_AMOUNT,
                    tokens: vec![Token { id: token_id.to_string(), amount }],
                }
            };
            outputs.push(output);
        }

        let from_address = descriptor_address(descriptor);
        let balance = self.node.address_balance(&from_address).await?;
        check_balance(&balance, &required)?;

        let request = BuildMultisig {
            from_address,
            from_public_keys: public_keys_hex(&signers),
            destinations: outputs,
        };
        let built = self.node.build_multisig_tx(&request).await?;

        self.confirm_built(&built.unsigned_tx, &built.tx_id, &signers).await
    }

    /// Builds a transaction moving the whole balance of the descriptor address to `to_address`.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnsupportedSweep`] when the node needs more than one transaction.
    #[tracing::instrument(skip_all, fields(multisig = descriptor.name()))]
    pub async fn build_sweep<AUX, S>(
        &self,
        descriptor: &MultisigDescriptor<AUX>,
        signer_names: &[S],
        to_address: &str,
    ) -> Result<UnsignedTransaction, BuildError>
    where
        S: AsRef<str>,
    {
        let signers = select_signers(descriptor, signer_names)?;
        check_recipient(to_address)?;

        let request = BuildSweepMultisig {
            from_address: descriptor_address(descriptor),
            from_public_keys: public_keys_hex(&signers),
            to_address: to_address.to_owned(),
        };
        let built = self.node.build_multisig_sweep(&request).await?;

        let [tx] = built.unsigned_txs.as_slice() else {
            return Err(BuildError::UnsupportedSweep { transactions: built.unsigned_txs.len() });
        };

        self.confirm_built(&tx.unsigned_tx, &tx.tx_id, &signers).await
    }

    /// Decodes an unsigned transaction given as hex.
    ///
    /// All inputs must spend from the first input's multisig unlock script. The transaction id
    /// is computed from the bytes and must agree with the node's.
    #[tracing::instrument(skip_all)]
    pub async fn load(&self, raw_hex: &str) -> Result<LoadedTx, BuildError> {
        let bytes = hex::decode(raw_hex.trim())
            .map_err(|e| BuildError::validation(format!("unsigned tx is not hex: {e}")))?;
        if bytes.is_empty() {
            return Err(BuildError::validation("unsigned tx is empty"));
        }

        let decoded = self.node.decode_unsigned_tx(&hex::encode(&bytes)).await?;
        let view = decoded.unsigned_tx;

        let Some((first, rest)) = view.inputs.split_first() else {
            return Err(BuildError::MalformedScript("the transaction has no inputs".into()));
        };
        let same_source = rest.iter().all(|input| {
            input.unlock_script.eq_ignore_ascii_case(&first.unlock_script)
                || hex::decode(&input.unlock_script).is_ok_and(|script| script == SAME_AS_PREVIOUS)
        });
        if !same_source {
            return Err(BuildError::MalformedScript("inputs spend from different addresses".into()));
        }

        let script = hex::decode(&first.unlock_script)
            .map_err(|_| BuildError::MalformedScript("unlock script is not hex".into()))?;
        let unlock_script = decode_unlock_script(&script)?;

        let tx_id = tx_id_of(&bytes);
        let node_tx_id = parse_tx_id(&view.tx_id)?;
        if tx_id != node_tx_id {
            return Err(BuildError::inconsistent(format!("node reports tx id {node_tx_id}, bytes hash to {tx_id}")));
        }

        let summary = summarize(tx_id, &view)?;
        let tx = UnsignedTransaction::builder().bytes(bytes).tx_id(tx_id).unlock_script(unlock_script).build();

        tracing::debug!(%tx_id, signers = tx.unlock_script().len(), "loaded unsigned tx");

        Ok(LoadedTx::builder().tx(tx).summary(summary).build())
    }

    /// Formats the amounts of `summary` with token symbols and decimals.
    ///
    /// Tokens without metadata are shown by id with zero decimals.
    #[tracing::instrument(skip_all, fields(tx_id = %summary.tx_id()))]
    pub async fn describe(&self, summary: &TxSummary) -> Vec<DisplayAmount> {
        let ids: Vec<String> = summary
            .amounts()
            .iter()
            .filter(|a| !a.token_id.is_alph())
            .map(|a| a.token_id.to_string())
            .collect();

        let metadata = if ids.is_empty() {
            vec![]
        } else {
            self.node.fungible_token_metadata(&ids).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "token metadata unavailable");
                vec![]
            })
        };

        summary
            .amounts()
            .iter()
            .map(|a| {
                let (symbol, decimals) = if a.token_id.is_alph() {
                    ("ALPH".to_owned(), ALPH_DECIMALS)
                } else {
                    metadata
                        .iter()
                        .find(|m| m.id.parse::<TokenId>().is_ok_and(|id| id == a.token_id))
                        .map(|m| (decode_symbol(&m.symbol), m.decimals))
                        .unwrap_or_else(|| (a.token_id.to_string(), 0))
                };

                DisplayAmount::builder()
                    .token_id(a.token_id)
                    .symbol(symbol)
                    .amount(format_amount(a.amount, decimals))
                    .build()
            })
            .collect()
    }

    async fn token_decimals(&self, tokens: &BTreeSet<TokenId>) -> Result<BTreeMap<TokenId, u32>, BuildError> {
        if tokens.is_empty() {
            return Ok(BTreeMap::new());
        }

        let ids: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        let metadata = self.node.fungible_token_metadata(&ids).await?;

        tokens
            .iter()
            .map(|token| {
                metadata
                    .iter()
                    .find(|m| m.id.parse::<TokenId>().is_ok_and(|id| id == *token))
                    .map(|m| (*token, m.decimals))
                    .ok_or_else(|| BuildError::inconsistent(format!("no metadata for token {token}")))
            })
            .collect()
    }

    /// Loads what the node built and checks it is the transaction that was requested.
    async fn confirm_built(
        &self,
        raw_hex: &str,
        node_tx_id: &str,
        signers: &[SelectedSigner],
    ) -> Result<UnsignedTransaction, BuildError> {
        let LoadedTxDissolved { tx, .. } = self.load(raw_hex).await?.dissolve();

        let node_tx_id = parse_tx_id(node_tx_id)?;
        if tx.tx_id() != node_tx_id {
            return Err(BuildError::inconsistent(format!(
                "node built tx {node_tx_id} but its bytes hash to {}",
                tx.tx_id()
            )));
        }
        if tx.unlock_script().keys() != expected_unlock_keys(signers).as_slice() {
            return Err(BuildError::inconsistent("unlock script does not match the selected signers"));
        }

        tracing::info!(tx_id = %tx.tx_id(), "built unsigned tx");
        Ok(tx)
    }
}

fn check_recipient(address: &str) -> Result<(), BuildError> {
    if is_valid_address(address) {
        Ok(())
    } else {
        Err(BuildError::validation(format!("invalid recipient address {address:?}")))
    }
}

fn parse_tx_id(tx_id: &str) -> Result<TxId, BuildError> {
    tx_id
        .parse()
        .map_err(|_| BuildError::inconsistent(format!("node returned malformed tx id {tx_id:?}")))
}

fn public_keys_hex(signers: &[SelectedSigner]) -> Vec<String> {
    signers.iter().map(|s| s.public_key().to_string()).collect()
}

fn add_required(required: &mut BTreeMap<TokenId, u128>, token_id: TokenId, amount: u128) -> Result<(), BuildError> {
    let total = required.entry(token_id).or_default();
    *total = total
        .checked_add(amount)
        .ok_or_else(|| BuildError::validation(format!("total amount of {} overflows", asset_name(token_id))))?;
    Ok(())
}

fn asset_name(token_id: TokenId) -> String {
    if token_id.is_alph() { "ALPH".to_owned() } else { token_id.to_string() }
}

fn check_balance(balance: &Balance, required: &BTreeMap<TokenId, u128>) -> Result<(), BuildError> {
    for (&token_id, &required) in required {
        let available = if token_id.is_alph() {
            balance.balance.saturating_sub(balance.locked_balance)
        } else {
            token_amount(&balance.token_balances, token_id)
                .saturating_sub(token_amount(&balance.locked_token_balances, token_id))
        };

        if required > available {
            return Err(BuildError::InsufficientBalance { asset: asset_name(token_id), required, available });
        }
    }
    Ok(())
}

fn token_amount(tokens: &[Token], token_id: TokenId) -> u128 {
    tokens
        .iter()
        .filter(|t| t.id.parse::<TokenId>().is_ok_and(|id| id == token_id))
        .map(|t| t.amount)
        .sum()
}

fn summarize(tx_id: TxId, view: &UnsignedTxView) -> Result<TxSummary, BuildError> {
    let recipient = view.fixed_outputs.first();

    let mut amounts = Vec::new();
    if let Some(output) = recipient {
        amounts.push(AssetAmount { token_id: TokenId::ALPH, amount: output.atto_alph_amount });
        for token in &output.tokens {
            let token_id = token
                .id
                .parse()
                .map_err(|_| BuildError::inconsistent(format!("node returned malformed token id {:?}", token.id)))?;
            amounts.push(AssetAmount { token_id, amount: token.amount });
        }
    }

    let fee = u128::from(view.gas_amount).saturating_mul(view.gas_price);

    Ok(TxSummary::builder()
        .tx_id(tx_id)
        .maybe_recipient(recipient.map(|o| o.address.clone()))
        .amounts(amounts)
        .fee(fee)
        .build())
}

/// Token symbols are hex-encoded UTF-8 on chain.
fn decode_symbol(symbol: &str) -> String {
    hex::decode(symbol)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| symbol.to_owned())
}

#[cfg(test)]
mod tests {
    use alephium_multisig_client::api::FixedAssetOutput;

    use super::*;

    #[test]
    fn balance_check_subtracts_locked_amounts() {
        let token = TokenId::from([9; 32]);
        let balance = Balance {
            balance: 10,
            locked_balance: 4,
            token_balances: vec![Token { id: token.to_string(), amount: 5 }],
            locked_token_balances: vec![Token { id: token.to_string(), amount: 1 }],
        };

        let fits = BTreeMap::from([(TokenId::ALPH, 6), (token, 4)]);
        assert!(check_balance(&balance, &fits).is_ok());

        let too_much = BTreeMap::from([(TokenId::ALPH, 7)]);
        assert!(matches!(
            check_balance(&balance, &too_much),
            Err(BuildError::InsufficientBalance { asset, required: 7, available: 6 }) if asset == "ALPH"
        ));

        let missing = BTreeMap::from([(TokenId::from([8; 32]), 1)]);
        assert!(matches!(
            check_balance(&balance, &missing),
            Err(BuildError::InsufficientBalance { available: 0, .. })
        ));
    }

    #[test]
    fn summary_reads_first_output_and_fee() {
        let token = TokenId::from([9; 32]);
        let view = UnsignedTxView {
            tx_id: String::new(),
            gas_amount: 20_000,
            gas_price: 100_000_000_000,
            inputs: vec![],
            fixed_outputs: vec![
                FixedAssetOutput {
                    address: "recipient".into(),
                    atto_alph_amount: DUST_AMOUNT,
                    tokens: vec![Token { id: token.to_string(), amount: 3 }],
                },
                FixedAssetOutput { address: "change".into(), atto_alph_amount: 1, tokens: vec![] },
            ],
        };

        let summary = summarize(TxId::from([1; 32]), &view).unwrap();

        assert_eq!(summary.recipient(), Some("recipient"));
        assert_eq!(summary.amounts(), [
            AssetAmount { token_id: TokenId::ALPH, amount: DUST_AMOUNT },
            AssetAmount { token_id: token, amount: 3 },
        ]);
        assert_eq!(summary.fee(), 2_000_000_000_000_000);
    }

    #[test]
    fn symbols_are_hex_decoded() {
        assert_eq!(decode_symbol("55534454"), "USDT");
        assert_eq!(decode_symbol("not hex"), "not hex");
    }
}
