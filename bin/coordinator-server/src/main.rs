//! # Configuration
//!
//! The server is configured through:
//! - Base configuration file (`base_config.ron`)
//! - Environment variables prefixed with `ALPHMULTISIG_` (override base config)
//!
//! ## Base Configuration
//!
//! The default configuration is loaded from `base_config.ron`:
//!
//! ```ron
//! Config(
//!     app: AppConfig(
//!         listen: "localhost:59060",
//!         cors_allowed_origins: ["*"],
//!     ),
//!     store: StoreConfig(
//!         data_dir: "./multisig-data",
//!     ),
//!     network: NetworkConfig(
//!         network_id: "testnet",
//!         timeout: "30s",
//!         poll_attempts: 10,
//!         poll_interval: "3s",
//!     ),
//! )
//! ```
//!
//! The node and explorer URLs default to the public endpoints of `network_id`.
//!
//! ## Environment Variable Overrides
//!
//! Use double underscores (`__`) to override nested configuration fields:
//!
//! ```bash
//! # Override app config
//! export ALPHMULTISIG_APP__LISTEN="0.0.0.0:59060"
//! export ALPHMULTISIG_APP__CORS_ALLOWED_ORIGINS='["http://localhost:3000"]'
//!
//! # Override store config
//! export ALPHMULTISIG_STORE__DATA_DIR="/var/lib/alephium-multisig"
//!
//! # Override network config
//! export ALPHMULTISIG_NETWORK__NETWORK_ID="devnet"
//! export ALPHMULTISIG_NETWORK__NODE_URL="http://127.0.0.1:22973"
//! export ALPHMULTISIG_NETWORK__EXPLORER_URL="http://127.0.0.1:9090"
//! export ALPHMULTISIG_NETWORK__NODE_API_KEY="..."
//! export ALPHMULTISIG_NETWORK__POLL_ATTEMPTS="20"
//!
//! # Run the server
//! cargo run --bin alephium-multisig-coordinator-server
//! ```
//!
//! ## CORS Configuration
//!
//! The `cors_allowed_origins` field controls cross-origin resource sharing:
//! - **Empty array `[]`**: CORS is disabled
//! - **Specific origins**: Only listed origins are allowed (recommended for production)
//! - **Wildcard `["*"]`**: All origins are allowed (permissive mode, default for development)
//!
//! # Logging
//!
//! Logging is controlled via the `RUST_LOG` environment variable. Defaults to `info` level.
//!
//! The server logs:
//! - **HTTP requests**: Method, path, status code, and duration for all incoming requests
//! - **Client errors (4xx)**: Logged at `WARN` level with error details
//! - **Server errors (5xx)**: Logged at `ERROR` level with error details
//! - **Not found (404)**: Logged at `INFO` level
//!
//! Example log output:
//! ```text
//! INFO server listening at localhost:59060
//! INFO request{method=POST uri=/api/v1/multisig-tx/build}: close time.busy=245ms time.idle=12.4µs
//! WARN client error: multisig engine error: tx build error: signer dave is not part of the multisig
//! ```

use core::str::FromStr;

use alephium_multisig_client::{ExplorerClient, NodeClient};
use alephium_multisig_coordinator_engine::{MultisigEngine, PollConfig};
use alephium_multisig_coordinator_server::{App, config};
use alephium_multisig_coordinator_store::{ConfigStore, FileKvStore};
use axum::http::{HeaderValue, Method, header};
use tokio::{net::TcpListener, task};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Subscriber, subscriber};
use tracing_subscriber::{EnvFilter, Registry, fmt::format::FmtSpan, layer::SubscriberExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = task::spawn_blocking(config::get_configuration).await??;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    subscriber::set_global_default(make_tracing_subscriber(env_filter))?;

    let app = {
        let data_dir = config.store.data_dir.clone();
        let store = task::spawn_blocking(move || FileKvStore::open(data_dir))
            .await?
            .map(ConfigStore::new)?;

        let network = &config.network;
        let node = NodeClient::builder()
            .base_url(network.node_url().parse()?)
            .timeout(network.timeout)
            .maybe_api_key(network.node_api_key.clone())
            .build()?;

        let explorer = ExplorerClient::builder()
            .base_url(network.explorer_url().parse()?)
            .timeout(network.timeout)
            .build()?;

        let poll = PollConfig::builder()
            .attempts(network.poll_attempts)
            .interval(network.poll_interval)
            .build();

        tracing::info!(
            network = %network.network_id,
            node = network.node_url(),
            explorer = network.explorer_url(),
            "connecting to alephium",
        );

        let engine = MultisigEngine::builder()
            .network_id(network.network_id)
            .node(node)
            .explorer(explorer)
            .poll(poll)
            .build();

        App::builder().engine(engine.into()).store(store.into()).build()
    };

    let axum_handle = {
        let router = alephium_multisig_coordinator_server::create_router(app);
        let cors = create_cors_layer(&config.app.cors_allowed_origins)?;
        let router = router.layer(TraceLayer::new_for_http()).layer(cors);

        let listener = TcpListener::bind(&config.app.listen)
            .await
            .inspect(|_| tracing::info!("server listening at {}", config.app.listen))?;

        tokio::spawn(async { axum::serve(listener, router).await })
    };

    axum_handle.await??;

    Ok(())
}

fn create_cors_layer<S>(allowed_origins: &[S]) -> anyhow::Result<CorsLayer>
where
    S: AsRef<str>,
{
    if allowed_origins.iter().map(AsRef::as_ref).any(|s| s == "*") {
        return Ok(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .map(AsRef::as_ref)
        .map(FromStr::from_str)
        .collect::<Result<_, _>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Ok(cors)
}

fn make_tracing_subscriber(env_filter: EnvFilter) -> impl Subscriber {
    Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_line_number(true)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE),
        )
        .with(env_filter)
}
