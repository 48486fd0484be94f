use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::{
    NodeApi, Result,
    api::{
        Balance, BuildMultisig, BuildSweepMultisig, BuildSweepTxResult, BuildTransferTxResult,
        DecodeUnsignedTx, DecodeUnsignedTxResult, FungibleTokenMetadata, SubmitMultisig,
        SubmitTxResult,
    },
    http::{build_http_client, endpoint, read_json},
};

/// A [`NodeApi`] implementation over the full node REST API.
#[derive(Debug, Clone)]
pub struct NodeClient {
    base_url: Url,
    http: Client,
}

#[bon::bon]
impl NodeClient {
    /// Creates a client for the node at `base_url`.
    ///
    /// `api_key` is sent as `X-API-KEY` on every request when the node requires one.
    #[builder]
    pub fn new(
        base_url: Url,
        #[builder(default = Duration::from_secs(30))] timeout: Duration,
        api_key: Option<String>,
    ) -> Result<Self> {
        let http = build_http_client(timeout, api_key.as_deref())?;
        Ok(Self { base_url, http })
    }
}

impl NodeClient {
    /// Returns the node base url.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }
}

#[async_trait]
impl NodeApi for NodeClient {
    #[tracing::instrument(skip_all)]
    async fn decode_unsigned_tx(&self, unsigned_tx: &str) -> Result<DecodeUnsignedTxResult> {
        let body = DecodeUnsignedTx { unsigned_tx: unsigned_tx.to_owned() };
        let request = self.http.post(self.url("transactions/decode-unsigned-tx")).json(&body);

        read_json(request, "decode unsigned tx".into()).await
    }

    #[tracing::instrument(skip(self))]
    async fn address_balance(&self, address: &str) -> Result<Balance> {
        let request = self.http.get(self.url(&format!("addresses/{address}/balance")));

        read_json(request, format!("balance of {address}").into()).await
    }

    #[tracing::instrument(skip_all, fields(from_address = %request.from_address))]
    async fn build_multisig_tx(&self, request: &BuildMultisig) -> Result<BuildTransferTxResult> {
        let http_request = self.http.post(self.url("multisig/build")).json(request);

        read_json(http_request, format!("build multisig tx from {}", request.from_address).into())
            .await
    }

    #[tracing::instrument(skip_all, fields(from_address = %request.from_address))]
    async fn build_multisig_sweep(&self, request: &BuildSweepMultisig) -> Result<BuildSweepTxResult> {
        let http_request = self.http.post(self.url("multisig/sweep")).json(request);

        read_json(http_request, format!("build multisig sweep from {}", request.from_address).into())
            .await
    }

    #[tracing::instrument(skip_all, fields(signature_count = request.signatures.len()))]
    async fn submit_multisig_tx(&self, request: &SubmitMultisig) -> Result<SubmitTxResult> {
        let http_request = self.http.post(self.url("multisig/submit")).json(request);

        read_json(http_request, "submit multisig tx".into()).await
    }

    #[tracing::instrument(skip_all, fields(token_count = token_ids.len()))]
    async fn fungible_token_metadata(&self, token_ids: &[String]) -> Result<Vec<FungibleTokenMetadata>> {
        let request = self.http.post(self.url("tokens/fungible-metadata")).json(token_ids);

        read_json(request, format!("metadata of tokens {}", token_ids.join(", ")).into()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path() {
        let client = NodeClient::builder()
            .base_url("https://example.org/node".parse().unwrap())
            .build()
            .unwrap();

        assert_eq!(client.url("multisig/build"), "https://example.org/node/multisig/build");
    }

    #[tokio::test]
    async fn unreachable_node_reports_the_operation() {
        let client = NodeClient::builder()
            .base_url("http://127.0.0.1:9".parse().unwrap())
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();

        let err = client.address_balance("1Addr").await.unwrap_err();
        assert!(err.to_string().starts_with("balance of 1Addr"), "{err}");
    }
}
