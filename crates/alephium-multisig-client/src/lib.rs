//! Clients for the Alephium full node and explorer backend.
//!
//! The coordinator needs a handful of node endpoints (decode, balance, multisig build,
//! sweep and submit, token metadata) and one explorer lookup. Both sides are exposed as
//! traits, [`NodeApi`] and [`ExplorerApi`], so tests can substitute in-memory fakes; the
//! reqwest-backed [`NodeClient`] and [`ExplorerClient`] talk to real services.

pub mod api;

mod error;
mod explorer;
mod http;
mod node;

pub use self::{error::NodeClientError, explorer::ExplorerClient, node::NodeClient};

use async_trait::async_trait;

use self::api::{
    Balance, BuildMultisig, BuildSweepMultisig, BuildSweepTxResult, BuildTransferTxResult,
    DecodeUnsignedTxResult, FungibleTokenMetadata, SubmitMultisig, SubmitTxResult, TxStatus,
};

/// Result type of the node and explorer calls.
pub type Result<T, E = NodeClientError> = core::result::Result<T, E>;

/// The full node endpoints used by the multisig workflow.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Decodes an unsigned transaction given as hex.
    async fn decode_unsigned_tx(&self, unsigned_tx: &str) -> Result<DecodeUnsignedTxResult>;

    /// Returns the balance of an address.
    async fn address_balance(&self, address: &str) -> Result<Balance>;

    /// Builds an unsigned transfer from a multisig address.
    async fn build_multisig_tx(&self, request: &BuildMultisig) -> Result<BuildTransferTxResult>;

    /// Builds unsigned transactions moving the whole balance of a multisig address.
    async fn build_multisig_sweep(&self, request: &BuildSweepMultisig) -> Result<BuildSweepTxResult>;

    /// Submits a multisig transaction with its signatures.
    async fn submit_multisig_tx(&self, request: &SubmitMultisig) -> Result<SubmitTxResult>;

    /// Returns metadata of the given fungible tokens, in request order.
    async fn fungible_token_metadata(&self, token_ids: &[String]) -> Result<Vec<FungibleTokenMetadata>>;
}

/// The explorer backend lookups used after submission.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    /// Returns whether the explorer has indexed the transaction.
    async fn transaction_status(&self, tx_id: &str) -> Result<TxStatus>;
}
