//! Response types for multisig engine operations.

use alephium_multisig_coordinator_domain::tx::{TokenId, TxId, UnsignedTransaction};
use dissolve_derive::Dissolve;

/// An amount of one asset in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetAmount {
    /// The asset, [`TokenId::ALPH`] for the native coin.
    pub token_id: TokenId,
    /// The amount in base units.
    pub amount: u128,
}

/// What an unsigned transaction does, for signers to review before signing.
#[derive(Debug, Clone, PartialEq, Eq, Dissolve)]
pub struct TxSummary {
    /// The digest signers sign over
    tx_id: TxId,

    /// The address of the first output
    recipient: Option<String>,

    /// The ALPH amount then each token sent to the recipient
    amounts: Vec<AssetAmount>,

    /// Gas amount times gas price, in attoALPH
    fee: u128,
}

impl TxSummary {
    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    pub fn amounts(&self) -> &[AssetAmount] {
        &self.amounts
    }

    pub fn fee(&self) -> u128 {
        self.fee
    }
}

/// An unsigned transaction decoded by the node and checked locally.
#[derive(Debug, Clone, Dissolve)]
pub struct LoadedTx {
    /// The transaction with its unlock script
    tx: UnsignedTransaction,

    /// The transaction summary to be reviewed by signers
    summary: TxSummary,
}

impl LoadedTx {
    pub fn tx(&self) -> &UnsignedTransaction {
        &self.tx
    }

    pub fn summary(&self) -> &TxSummary {
        &self.summary
    }
}

/// An amount formatted with its token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Dissolve)]
pub struct DisplayAmount {
    /// The asset
    token_id: TokenId,

    /// The token symbol, or the token id when metadata is unavailable
    symbol: String,

    /// The amount in whole units, e.g. `1.5`
    amount: String,
}

impl DisplayAmount {
    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

#[bon::bon]
impl TxSummary {
    #[builder]
    pub(crate) fn new(tx_id: TxId, recipient: Option<String>, amounts: Vec<AssetAmount>, fee: u128) -> Self {
        Self { tx_id, recipient, amounts, fee }
    }
}

#[bon::bon]
impl LoadedTx {
    #[builder]
    pub(crate) fn new(tx: UnsignedTransaction, summary: TxSummary) -> Self {
        Self { tx, summary }
    }
}

#[bon::bon]
impl DisplayAmount {
    #[builder]
    pub(crate) fn new(token_id: TokenId, symbol: String, amount: String) -> Self {
        Self { token_id, symbol, amount }
    }
}
