use bon::Builder;
use serde::Serialize;

use crate::payload::{MultisigPayload, SessionPayload, SubmissionPayload, SummaryPayload};

#[derive(Debug, Builder, Serialize)]
pub struct MultisigResponsePayload {
    multisig: MultisigPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct ListMultisigResponsePayload {
    multisigs: Vec<MultisigPayload>,
}

#[derive(Debug, Builder, Serialize)]
pub struct RemoveMultisigResponsePayload {
    removed: bool,
}

#[derive(Debug, Builder, Serialize)]
pub struct ExportMultisigResponsePayload {
    token: String,
}

#[derive(Debug, Builder, Serialize)]
pub struct BuildTxResponsePayload {
    unsigned_tx: String,
    session: SessionPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct LoadTxResponsePayload {
    summary: SummaryPayload,
    session: SessionPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct SummaryResponsePayload {
    summary: SummaryPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct SessionResponsePayload {
    session: SessionPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct SubmitResponsePayload {
    submission: SubmissionPayload,
}
