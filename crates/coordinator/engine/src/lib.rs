#![allow(missing_docs)]

mod amount;
mod builder;
mod collector;
mod error;
mod signer;
mod submitter;
mod types;

pub use self::{
    amount::{format_amount, parse_amount},
    builder::TxBuilder,
    collector::{CollectedSignatures, CollectorState, SignatureCollector},
    error::{BuildError, CollectorError, MultisigEngineError, SelectionError, SignatureError, SubmitError},
    signer::{SelectedSigner, select_signers},
    submitter::{PollConfig, TxSubmitter},
    types::{request, response},
};

use alephium_multisig_client::{ExplorerApi, NodeApi};
use alephium_multisig_coordinator_domain::{
    network::NetworkId,
    tx::{SubmissionResult, UnsignedTransaction},
};
use tokio::sync::Mutex;

use self::types::{
    request::{
        BuildSweepTxRequest, BuildSweepTxRequestDissolved, BuildTxRequest, BuildTxRequestDissolved,
        SubmitTxRequest, SubmitTxRequestDissolved,
    },
    response::{DisplayAmount, LoadedTx},
};

/// Drives the multisig transaction lifecycle against one network.
pub struct MultisigEngine<N, E> {
    network_id: NetworkId,
    node: N,
    explorer: E,
    poll: PollConfig,
}

#[bon::bon]
impl<N, E> MultisigEngine<N, E> {
    #[builder]
    pub fn new(network_id: NetworkId, node: N, explorer: E, #[builder(default)] poll: PollConfig) -> Self {
        Self { network_id, node, explorer, poll }
    }
}

impl<N, E> MultisigEngine<N, E> {
    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn explorer(&self) -> &E {
        &self.explorer
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }
}

impl<N: NodeApi, E: ExplorerApi> MultisigEngine<N, E> {
    pub fn tx_builder(&self) -> TxBuilder<'_, N> {
        TxBuilder::new(&self.node)
    }

    pub fn tx_submitter(&self) -> TxSubmitter<'_, N, E> {
        TxSubmitter::new(&self.node, &self.explorer, self.poll)
    }

    pub async fn build_tx<AUX>(&self, request: BuildTxRequest<AUX>) -> Result<UnsignedTransaction, MultisigEngineError> {
        let BuildTxRequestDissolved { descriptor, signer_names, destinations } = request.dissolve();

        self.tx_builder()
            .build(&descriptor, signer_names.as_slice(), &destinations)
            .await
            .map_err(From::from)
    }

    pub async fn build_sweep_tx<AUX>(
        &self,
        request: BuildSweepTxRequest<AUX>,
    ) -> Result<UnsignedTransaction, MultisigEngineError> {
        let BuildSweepTxRequestDissolved { descriptor, signer_names, to_address } = request.dissolve();

        self.tx_builder()
            .build_sweep(&descriptor, signer_names.as_slice(), &to_address)
            .await
            .map_err(From::from)
    }

    pub async fn load_tx(&self, raw_hex: &str) -> Result<LoadedTx, MultisigEngineError> {
        self.tx_builder().load(raw_hex).await.map_err(From::from)
    }

    /// Loads an unsigned transaction and formats its amounts for review.
    pub async fn describe_tx(&self, raw_hex: &str) -> Result<(LoadedTx, Vec<DisplayAmount>), MultisigEngineError> {
        let builder = self.tx_builder();
        let loaded = builder.load(raw_hex).await?;
        let amounts = builder.describe(loaded.summary()).await;

        Ok((loaded, amounts))
    }

    pub async fn submit_tx<AUX>(&self, request: SubmitTxRequest<AUX>) -> Result<SubmissionResult, MultisigEngineError> {
        let SubmitTxRequestDissolved { descriptor, signer_names, unsigned_tx, records } = request.dissolve();

        self.tx_submitter()
            .submit(&descriptor, signer_names.as_slice(), &unsigned_tx, &records)
            .await
            .map_err(From::from)
    }

    /// Submits the signatures collected in `session` and resets it once the node accepts them.
    ///
    /// The session stays locked until the submission finishes, so concurrent calls reach the node
    /// at most once. A failed submission leaves the session untouched for a retry.
    #[tracing::instrument(skip_all)]
    pub async fn submit_session(
        &self,
        session: &Mutex<SignatureCollector>,
    ) -> Result<SubmissionResult, MultisigEngineError> {
        let mut collector = session.lock().await;

        let result = self.tx_submitter().submit_collected(&collector).await?;
        collector.reset();

        Ok(result)
    }
}
