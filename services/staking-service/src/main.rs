use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use ir_chain_bsc::{RpcChainClient, RpcTransport, bind_and_probe};
use ir_staking_core::{StakingClient, StakingError};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

mod chain_config;
mod config;
mod submit;
mod wallet;

use config::ServiceConfig;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
    kind: &'static str,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);
pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) client: Arc<StakingClient>,
    pub(crate) config: Arc<ServiceConfig>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::from_env()?;
    let rpc = Arc::new(RpcTransport::new(Some(config.rpc_url.clone())).with_receipt_poll_interval(config.poll_interval));
    let chain = Arc::new(RpcChainClient::new(Arc::clone(&rpc)));

    let contracts = match bind_and_probe(Arc::clone(&rpc), &config.contracts).await {
        Ok(contracts) => Some(contracts),
        Err(err) => {
            warn!("contract probe against {} failed, contracts unbound: {}", rpc.endpoint(), err);
            None
        }
    };

    let client = Arc::new(StakingClient::new(chain.clone(), contracts, config.client_config()));
    Arc::clone(&chain).spawn_watcher(config.poll_interval);
    let events = Arc::clone(&client);
    tokio::spawn(async move { events.run_events().await });

    match client.restore_session().await {
        Ok(Some(outcome)) => info!("restored session for {:?}", outcome.session.account),
        Ok(None) => info!("no authorized account, waiting for /wallet/connect"),
        Err(err) => warn!("session restore failed: {}", err),
    }

    let addr = config.listen_addr;
    let state = AppState {
        client,
        config: Arc::new(config),
    };
    let app = router(state);

    info!("staking-service listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/chain/config", get(chain_config::chain_config))
        .route("/contracts/status", get(chain_config::contract_status))
        .route("/wallet/connect", post(wallet::wallet_connect))
        .route("/wallet/session", get(wallet::wallet_session))
        .route("/wallet/data", get(wallet::wallet_data))
        .route("/staking/stake", post(submit::stake))
        .route("/staking/rewards/withdraw", post(submit::withdraw_rewards))
        .route("/gas/burn", post(submit::burn_gas))
        .route("/bgs/recycle", post(submit::recycle_bgs))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "staking-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "staking-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) fn staking_error(err: StakingError) -> ApiError {
    let status = match &err {
        StakingError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        StakingError::NotReady(_) => StatusCode::CONFLICT,
        StakingError::UserRejected { .. }
        | StakingError::InsufficientFunds { .. }
        | StakingError::ApprovalFailed { .. }
        | StakingError::ActionReverted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StakingError::ConfirmationUnknown { .. } | StakingError::DataUnavailable { .. } => StatusCode::BAD_GATEWAY,
        StakingError::NoStake => StatusCode::NOT_FOUND,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            kind: err.kind(),
        }),
    )
}
