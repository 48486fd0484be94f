use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::{
    ExplorerApi, Result,
    api::TxStatus,
    http::{build_http_client, endpoint, error_for_status, send},
};

/// An [`ExplorerApi`] implementation over the explorer backend REST API.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    base_url: Url,
    http: Client,
}

#[bon::bon]
impl ExplorerClient {
    /// Creates a client for the explorer backend at `base_url`.
    #[builder]
    pub fn new(
        base_url: Url,
        #[builder(default = Duration::from_secs(30))] timeout: Duration,
    ) -> Result<Self> {
        let http = build_http_client(timeout, None)?;
        Ok(Self { base_url, http })
    }
}

#[async_trait]
impl ExplorerApi for ExplorerClient {
    #[tracing::instrument(skip(self))]
    async fn transaction_status(&self, tx_id: &str) -> Result<TxStatus> {
        let operation = format!("explorer lookup of tx {tx_id}").into();
        let request = self.http.get(endpoint(&self.base_url, &format!("transactions/{tx_id}")));
        let response = send(request, &operation).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(TxStatus::NotFound),
            status if status.is_success() => Ok(TxStatus::Indexed),
            _ => Err(error_for_status(response, operation).await),
        }
    }
}
