use std::borrow::Cow;

use alephium_multisig_coordinator_engine::{
    BuildError, CollectorError, MultisigEngineError, SignatureError, SubmitError,
};
use alephium_multisig_coordinator_store::{MultisigStoreError, ValidationReason};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::task::JoinError;

#[derive(Debug, thiserror::Error)]
pub(crate) enum AppError {
    #[error("multisig store error: {0}")]
    Store(#[from] MultisigStoreError),

    #[error("multisig engine error: {0}")]
    MultisigEngine(Box<MultisigEngineError>),

    #[error("invalid signature: {0}")]
    InvalidSignature(Cow<'static, str>),

    #[error("invalid token id: {0}")]
    InvalidTokenId(Cow<'static, str>),

    #[error("multisig not found: {0}")]
    MultisigNotFound(String),

    #[error("join error: {0}")]
    JoinError(#[from] JoinError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(err) => store_status(err),
            AppError::MultisigEngine(err) => engine_status(err),
            AppError::InvalidSignature(_) | AppError::InvalidTokenId(_) => StatusCode::BAD_REQUEST,
            AppError::MultisigNotFound(_) => StatusCode::NOT_FOUND,
            AppError::JoinError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultisigEngineError> for AppError {
    fn from(err: MultisigEngineError) -> Self {
        Self::MultisigEngine(err.into())
    }
}

impl From<BuildError> for AppError {
    fn from(err: BuildError) -> Self {
        MultisigEngineError::from(err).into()
    }
}

impl From<CollectorError> for AppError {
    fn from(err: CollectorError) -> Self {
        MultisigEngineError::from(err).into()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();

        if code == StatusCode::NOT_FOUND {
            tracing::info!("not found: {self}");
        } else if code.is_client_error() {
            tracing::warn!("client error: {self}");
        } else {
            tracing::error!("server error: {self}");
        }

        (code, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

fn store_status(err: &MultisigStoreError) -> StatusCode {
    match err {
        MultisigStoreError::Validation(ValidationReason::AlreadyExists(_)) => StatusCode::CONFLICT,
        MultisigStoreError::Validation(_) | MultisigStoreError::Integrity(_) => StatusCode::BAD_REQUEST,
        MultisigStoreError::Kv(_) | MultisigStoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn engine_status(err: &MultisigEngineError) -> StatusCode {
    match err {
        MultisigEngineError::Build(err) => build_status(err),
        MultisigEngineError::Collector(err) => collector_status(err),
        MultisigEngineError::Submit(err) => submit_status(err),
    }
}

fn build_status(err: &BuildError) -> StatusCode {
    match err {
        BuildError::Validation(_) | BuildError::Selection(_) | BuildError::MalformedScript(_) => {
            StatusCode::BAD_REQUEST
        },
        BuildError::InsufficientBalance { .. } | BuildError::UnsupportedSweep { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        },
        BuildError::Inconsistent(_) | BuildError::Node(_) => StatusCode::BAD_GATEWAY,
    }
}

fn collector_status(err: &CollectorError) -> StatusCode {
    match err {
        CollectorError::NotLoaded | CollectorError::NoSigners | CollectorError::Incomplete { .. } => {
            StatusCode::BAD_REQUEST
        },
        CollectorError::Signature(err) => signature_status(err),
        CollectorError::AlreadyLoaded
        | CollectorError::Ambiguous(_)
        | CollectorError::DuplicateSignature { .. } => StatusCode::CONFLICT,
    }
}

fn submit_status(err: &SubmitError) -> StatusCode {
    match err {
        SubmitError::WrongSignatureCount { .. }
        | SubmitError::Selection(_)
        | SubmitError::UnlockScriptMismatch => StatusCode::BAD_REQUEST,
        SubmitError::Signature(err) => signature_status(err),
        SubmitError::DuplicateSignature { .. } => StatusCode::CONFLICT,
        SubmitError::Collector(err) => collector_status(err),
        SubmitError::Node(_) => StatusCode::BAD_GATEWAY,
    }
}

fn signature_status(err: &SignatureError) -> StatusCode {
    match err {
        SignatureError::UnknownSigner(_) | SignatureError::InvalidSignature { .. } => StatusCode::BAD_REQUEST,
        SignatureError::MisattributedSignature { .. } => StatusCode::CONFLICT,
    }
}
