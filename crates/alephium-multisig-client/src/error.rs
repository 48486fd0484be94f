use std::borrow::Cow;

/// Represents errors that can occur while talking to the full node or the explorer.
///
/// Every variant names the operation that failed, including the address or transaction id
/// involved, so the error can be shown as is.
#[derive(Debug, thiserror::Error)]
pub enum NodeClientError {
    /// The HTTP client could not be constructed.
    #[error("client setup error: {0}")]
    Setup(Cow<'static, str>),

    /// The request could not be sent or timed out.
    #[error("{operation}: request failed: {source}")]
    Request {
        /// The failed operation.
        operation: Cow<'static, str>,
        /// The transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The remote side answered with an error status.
    #[error("{operation}: status {status}: {detail}")]
    Status {
        /// The failed operation.
        operation: Cow<'static, str>,
        /// The HTTP status code.
        status: u16,
        /// The error detail reported by the remote side.
        detail: String,
    },

    /// The response body did not have the expected shape.
    #[error("{operation}: invalid response: {reason}")]
    Decode {
        /// The failed operation.
        operation: Cow<'static, str>,
        /// Why decoding failed.
        reason: String,
    },
}
