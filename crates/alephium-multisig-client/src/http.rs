use std::{borrow::Cow, time::Duration};

use reqwest::{
    Client, RequestBuilder, Response,
    header::{HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{NodeClientError, Result, api::ErrorBody};

pub(crate) fn build_http_client(timeout: Duration, api_key: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = api_key {
        let value = HeaderValue::from_str(api_key)
            .map_err(|_| NodeClientError::Setup("api key is not a valid header value".into()))?;
        headers.insert("X-API-KEY", value);
    }

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| NodeClientError::Setup(e.to_string().into()))
}

/// Joins `path` onto `base` without dropping a base path that lacks a trailing slash.
pub(crate) fn endpoint(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) async fn send(request: RequestBuilder, operation: &Cow<'static, str>) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|source| NodeClientError::Request { operation: operation.clone(), source })
}

pub(crate) async fn error_for_status(response: Response, operation: Cow<'static, str>) -> NodeClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body).map(|e| e.detail).unwrap_or(body);

    NodeClientError::Status { operation, status, detail }
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    request: RequestBuilder,
    operation: Cow<'static, str>,
) -> Result<T> {
    let response = send(request, &operation).await?;

    if !response.status().is_success() {
        return Err(error_for_status(response, operation).await);
    }

    response
        .json()
        .await
        .map_err(|e| NodeClientError::Decode { operation, reason: e.to_string() })
}
