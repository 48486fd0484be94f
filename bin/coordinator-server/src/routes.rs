use std::sync::Arc;

use alephium_multisig_coordinator_domain::{
    descriptor::MultisigDescriptor,
    key::Signature,
    tx::{Destination, TokenId, UnsignedTransaction},
};
use alephium_multisig_coordinator_engine::{
    SignatureCollector,
    request::{BuildSweepTxRequest, BuildTxRequest},
};
use alephium_multisig_coordinator_store::{
    ConfigStore, DescriptorDraft, FileKvStore, MultisigStoreError, TxDraft,
};
use axum::{Json, extract::State, http::StatusCode};
use tokio::{sync::Mutex, task};

use crate::{
    App, AppDissolved,
    error::AppError,
    payload::{
        MultisigPayload, SessionPayload, SubmissionPayload, SummaryPayload,
        request::{
            AddSignatureRequestPayload, AddSignatureRequestPayloadDissolved,
            BuildSweepTxRequestPayload, BuildSweepTxRequestPayloadDissolved, BuildTxRequestPayload,
            BuildTxRequestPayloadDissolved, CreateMultisigRequestPayload,
            CreateMultisigRequestPayloadDissolved, DestinationRequestPayload,
            DestinationRequestPayloadDissolved, ImportMultisigRequestPayload,
            ImportMultisigRequestPayloadDissolved, MultisigNameRequestPayload,
            MultisigNameRequestPayloadDissolved, UnsignedTxRequestPayload,
            UnsignedTxRequestPayloadDissolved,
        },
        response::{
            BuildTxResponsePayload, ExportMultisigResponsePayload, ListMultisigResponsePayload,
            LoadTxResponsePayload, MultisigResponsePayload, RemoveMultisigResponsePayload,
            SessionResponsePayload, SubmitResponsePayload, SummaryResponsePayload,
        },
    },
};

type Store = ConfigStore<FileKvStore>;

#[tracing::instrument]
pub async fn health() -> StatusCode {
    StatusCode::OK
}

#[tracing::instrument(skip_all)]
pub async fn create_multisig(
    State(app): State<App>,
    Json(payload): Json<CreateMultisigRequestPayload>,
) -> Result<Json<MultisigResponsePayload>, AppError> {
    let AppDissolved { store, .. } = app.dissolve();

    let CreateMultisigRequestPayloadDissolved { config } = payload.dissolve();

    let descriptor = config
        .into_descriptor(())
        .map_err(MultisigStoreError::from)
        .inspect_err(|e| tracing::warn!("rejected multisig config: {e}"))?;

    let multisig = with_store(store, move |store| {
        let created = store.create(descriptor)?;
        store.clear_descriptor_draft()?;
        Ok(created)
    })
    .await?;

    let response = MultisigResponsePayload::builder().multisig(multisig.into()).build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn list_multisig(State(app): State<App>) -> Result<Json<ListMultisigResponsePayload>, AppError> {
    let AppDissolved { store, .. } = app.dissolve();

    let multisigs = with_store(store, |store| store.list()).await?;

    let response = ListMultisigResponsePayload::builder()
        .multisigs(multisigs.into_iter().map(From::from).collect())
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn get_multisig_details(
    State(app): State<App>,
    Json(payload): Json<MultisigNameRequestPayload>,
) -> Result<Json<MultisigResponsePayload>, AppError> {
    let AppDissolved { store, .. } = app.dissolve();

    let MultisigNameRequestPayloadDissolved { name } = payload.dissolve();

    let multisig = find_multisig(store, name).await?;

    let response = MultisigResponsePayload::builder().multisig(MultisigPayload::from(multisig)).build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn remove_multisig(
    State(app): State<App>,
    Json(payload): Json<MultisigNameRequestPayload>,
) -> Result<Json<RemoveMultisigResponsePayload>, AppError> {
    let AppDissolved { store, .. } = app.dissolve();

    let MultisigNameRequestPayloadDissolved { name } = payload.dissolve();

    let removed = with_store(store, move |store| store.remove(&name)).await?;

    Ok(Json(RemoveMultisigResponsePayload::builder().removed(removed).build()))
}

#[tracing::instrument(skip_all)]
pub async fn export_multisig(
    State(app): State<App>,
    Json(payload): Json<MultisigNameRequestPayload>,
) -> Result<Json<ExportMultisigResponsePayload>, AppError> {
    let AppDissolved { store, .. } = app.dissolve();

    let MultisigNameRequestPayloadDissolved { name } = payload.dissolve();

    let multisig = find_multisig(store.clone(), name).await?;
    let token = with_store(store, move |store| store.export(&multisig)).await?;

    Ok(Json(ExportMultisigResponsePayload::builder().token(token).build()))
}

#[tracing::instrument(skip_all)]
pub async fn import_multisig(
    State(app): State<App>,
    Json(payload): Json<ImportMultisigRequestPayload>,
) -> Result<Json<MultisigResponsePayload>, AppError> {
    let AppDissolved { store, .. } = app.dissolve();

    let ImportMultisigRequestPayloadDissolved { token } = payload.dissolve();

    let multisig = with_store(store, move |store| store.import_and_create(token.trim())).await?;

    Ok(Json(MultisigResponsePayload::builder().multisig(multisig.into()).build()))
}

/// Builds a transfer and starts collecting signatures for it.
#[tracing::instrument(skip_all)]
pub async fn build_multisig_tx(
    State(app): State<App>,
    Json(payload): Json<BuildTxRequestPayload>,
) -> Result<Json<BuildTxResponsePayload>, AppError> {
    let AppDissolved { engine, store, session } = app.dissolve();

    let BuildTxRequestPayloadDissolved { multisig_name, signers, destinations } = payload.dissolve();

    let destinations = destinations
        .into_iter()
        .map(make_destination)
        .collect::<Result<Vec<_>, _>>()?;

    let descriptor = find_multisig(store.clone(), multisig_name).await?;

    let request = BuildTxRequest::builder()
        .descriptor(descriptor)
        .signer_names(signers)
        .destinations(destinations)
        .build();

    let tx = engine
        .build_tx(request)
        .await
        .inspect_err(|e| tracing::error!("failed to build multisig tx: {e}"))?;

    let unsigned_tx = tx.to_hex();
    let session = start_session(store, &session, tx).await?;

    let response = BuildTxResponsePayload::builder().unsigned_tx(unsigned_tx).session(session).build();

    Ok(Json(response))
}

/// Builds a sweep of the whole multisig balance and starts collecting signatures for it.
#[tracing::instrument(skip_all)]
pub async fn build_sweep_multisig_tx(
    State(app): State<App>,
    Json(payload): Json<BuildSweepTxRequestPayload>,
) -> Result<Json<BuildTxResponsePayload>, AppError> {
    let AppDissolved { engine, store, session } = app.dissolve();

    let BuildSweepTxRequestPayloadDissolved { multisig_name, signers, to_address } = payload.dissolve();

    let descriptor = find_multisig(store.clone(), multisig_name).await?;

    let request = BuildSweepTxRequest::builder()
        .descriptor(descriptor)
        .signer_names(signers)
        .to_address(to_address)
        .build();

    let tx = engine
        .build_sweep_tx(request)
        .await
        .inspect_err(|e| tracing::error!("failed to build multisig sweep: {e}"))?;

    let unsigned_tx = tx.to_hex();
    let session = start_session(store, &session, tx).await?;

    let response = BuildTxResponsePayload::builder().unsigned_tx(unsigned_tx).session(session).build();

    Ok(Json(response))
}

/// Loads an unsigned transaction built elsewhere and starts collecting signatures for it.
#[tracing::instrument(skip_all)]
pub async fn load_multisig_tx(
    State(app): State<App>,
    Json(payload): Json<UnsignedTxRequestPayload>,
) -> Result<Json<LoadTxResponsePayload>, AppError> {
    let AppDissolved { engine, store, session } = app.dissolve();

    let UnsignedTxRequestPayloadDissolved { unsigned_tx } = payload.dissolve();

    let (loaded, amounts) = engine.describe_tx(unsigned_tx.trim()).await?;
    let summary = SummaryPayload::new(loaded.summary(), amounts);
    let session = start_session(store, &session, loaded.tx().clone()).await?;

    let response = LoadTxResponsePayload::builder().summary(summary).session(session).build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn get_tx_summary(
    State(app): State<App>,
    Json(payload): Json<UnsignedTxRequestPayload>,
) -> Result<Json<SummaryResponsePayload>, AppError> {
    let AppDissolved { engine, .. } = app.dissolve();

    let UnsignedTxRequestPayloadDissolved { unsigned_tx } = payload.dissolve();

    let (loaded, amounts) = engine.describe_tx(unsigned_tx.trim()).await?;

    let response = SummaryResponsePayload::builder()
        .summary(SummaryPayload::new(loaded.summary(), amounts))
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all, fields(signer))]
pub async fn add_signature(
    State(app): State<App>,
    Json(payload): Json<AddSignatureRequestPayload>,
) -> Result<Json<SessionResponsePayload>, AppError> {
    let AppDissolved { session, .. } = app.dissolve();

    let AddSignatureRequestPayloadDissolved { signer, signature } = payload.dissolve();
    tracing::Span::current().record("signer", signer.as_str());

    let signature = signature
        .trim()
        .parse::<Signature>()
        .map_err(|e| AppError::InvalidSignature(e.to_string().into()))?;

    let mut session = session.lock().await;
    session.submit_signature(&signer, signature)?;

    Ok(Json(SessionResponsePayload::builder().session(SessionPayload::from(&*session)).build()))
}

#[tracing::instrument(skip_all)]
pub async fn get_session_status(State(app): State<App>) -> Json<SessionResponsePayload> {
    let AppDissolved { session, .. } = app.dissolve();

    let session = session.lock().await;

    Json(SessionResponsePayload::builder().session(SessionPayload::from(&*session)).build())
}

#[tracing::instrument(skip_all)]
pub async fn reset_session(State(app): State<App>) -> Json<SessionResponsePayload> {
    let AppDissolved { session, .. } = app.dissolve();

    let mut session = session.lock().await;
    session.reset();

    Json(SessionResponsePayload::builder().session(SessionPayload::from(&*session)).build())
}

/// Submits the collected signatures.
///
/// The session stays locked until the node and explorer answer, so a second concurrent submit
/// finds the session already cleared.
#[tracing::instrument(skip_all)]
pub async fn submit_session(State(app): State<App>) -> Result<Json<SubmitResponsePayload>, AppError> {
    let AppDissolved { engine, store, session } = app.dissolve();

    let result = engine
        .submit_session(&session)
        .await
        .inspect_err(|e| tracing::error!("failed to submit multisig tx: {e}"))?;

    with_store(store, |store| store.clear_tx_draft()).await?;

    let response = SubmitResponsePayload::builder().submission(SubmissionPayload::from(result)).build();

    Ok(Json(response))
}

/// Returns the multisig creation draft for a `null` body, stores the given draft otherwise.
#[tracing::instrument(skip_all)]
pub async fn multisig_draft(
    State(app): State<App>,
    Json(payload): Json<Option<DescriptorDraft>>,
) -> Result<Json<Option<DescriptorDraft>>, AppError> {
    let AppDissolved { store, .. } = app.dissolve();

    let draft = with_store(store, move |store| match payload {
        Some(draft) => store.save_descriptor_draft(&draft).map(|()| Some(draft)),
        None => store.load_descriptor_draft(),
    })
    .await?;

    Ok(Json(draft))
}

/// Returns the transaction draft for a `null` body, stores the given draft otherwise.
#[tracing::instrument(skip_all)]
pub async fn multisig_tx_draft(
    State(app): State<App>,
    Json(payload): Json<Option<TxDraft>>,
) -> Result<Json<Option<TxDraft>>, AppError> {
    let AppDissolved { store, .. } = app.dissolve();

    let draft = with_store(store, move |store| match payload {
        Some(draft) => store.save_tx_draft(&draft).map(|()| Some(draft)),
        None => store.load_tx_draft(),
    })
    .await?;

    Ok(Json(draft))
}

async fn with_store<T, F>(store: Arc<Store>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> Result<T, MultisigStoreError> + Send + 'static,
{
    task::spawn_blocking(move || f(&store)).await?.map_err(From::from)
}

async fn find_multisig(store: Arc<Store>, name: String) -> Result<MultisigDescriptor, AppError> {
    let found = {
        let name = name.clone();
        with_store(store, move |store| store.find_by_name(&name)).await?
    };

    found.ok_or(AppError::MultisigNotFound(name))
}

/// Replaces the session with a fresh one for `tx`.
///
/// A transaction that cannot be loaded leaves the current session untouched.
async fn start_session(
    store: Arc<Store>,
    session: &Mutex<SignatureCollector>,
    tx: UnsignedTransaction,
) -> Result<SessionPayload, AppError> {
    let known = with_store(store, |store| store.list()).await?;

    let mut fresh = SignatureCollector::new();
    fresh.load_unsigned_tx(tx, known.as_slice())?;

    let mut session = session.lock().await;
    *session = fresh;

    Ok(SessionPayload::from(&*session))
}

fn make_destination(payload: DestinationRequestPayload) -> Result<Destination, AppError> {
    let DestinationRequestPayloadDissolved { address, token_id, amount } = payload.dissolve();

    let token_id = match token_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id
            .parse::<TokenId>()
            .map_err(|e| AppError::InvalidTokenId(e.to_string().into()))?,
        None => TokenId::ALPH,
    };

    Ok(Destination::builder().address(address).token_id(token_id).amount(amount).build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination(token_id: Option<&str>) -> DestinationRequestPayload {
        serde_json::from_value(serde_json::json!({
            "address": "1DrDyTr9RpRsQnDnXo2YRiPzPW4ooHX5LLoqXrqfMrpQH",
            "token_id": token_id,
            "amount": "1.5",
        }))
        .unwrap()
    }

    #[test]
    fn missing_or_blank_token_id_means_alph() {
        assert_eq!(make_destination(destination(None)).unwrap().token_id(), TokenId::ALPH);
        assert_eq!(make_destination(destination(Some(" "))).unwrap().token_id(), TokenId::ALPH);
    }

    #[test]
    fn token_id_must_be_32_bytes_of_hex() {
        let token = "ab".repeat(32);
        assert_eq!(make_destination(destination(Some(token.as_str()))).unwrap().token_id(), TokenId::from([0xab; 32]));

        assert!(matches!(make_destination(destination(Some("abcd"))), Err(AppError::InvalidTokenId(_))));
    }
}
