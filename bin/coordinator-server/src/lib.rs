#![allow(missing_docs)]

pub mod config;

mod error;
mod payload;
mod routes;

use std::sync::Arc;

use alephium_multisig_client::{ExplorerClient, NodeClient};
use alephium_multisig_coordinator_engine::{MultisigEngine, SignatureCollector};
use alephium_multisig_coordinator_store::{ConfigStore, FileKvStore};
use axum::{Router, routing};
use bon::Builder;
use dissolve_derive::Dissolve;
use tokio::sync::Mutex;

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/health", routing::get(routes::health))
        .route("/api/v1/multisig/create", routing::post(routes::create_multisig))
        .route("/api/v1/multisig/list", routing::post(routes::list_multisig))
        .route("/api/v1/multisig/details", routing::post(routes::get_multisig_details))
        .route("/api/v1/multisig/remove", routing::post(routes::remove_multisig))
        .route("/api/v1/multisig/export", routing::post(routes::export_multisig))
        .route("/api/v1/multisig/import", routing::post(routes::import_multisig))
        .route("/api/v1/multisig-tx/build", routing::post(routes::build_multisig_tx))
        .route("/api/v1/multisig-tx/build-sweep", routing::post(routes::build_sweep_multisig_tx))
        .route("/api/v1/multisig-tx/load", routing::post(routes::load_multisig_tx))
        .route("/api/v1/multisig-tx/summary", routing::post(routes::get_tx_summary))
        .route("/api/v1/signature/add", routing::post(routes::add_signature))
        .route("/api/v1/session/status", routing::post(routes::get_session_status))
        .route("/api/v1/session/reset", routing::post(routes::reset_session))
        .route("/api/v1/session/submit", routing::post(routes::submit_session))
        .route("/api/v1/draft/multisig", routing::post(routes::multisig_draft))
        .route("/api/v1/draft/multisig-tx", routing::post(routes::multisig_tx_draft))
        .with_state(app)
}

#[derive(Clone, Builder, Dissolve)]
pub struct App {
    engine: Arc<MultisigEngine<NodeClient, ExplorerClient>>,
    store: Arc<ConfigStore<FileKvStore>>,

    /// The single signature collection session
    #[builder(default)]
    session: Arc<Mutex<SignatureCollector>>,
}
