use axum::{Json, extract::State};
use ir_api_types::units::abbreviate_address;
use ir_api_types::{ConnectResponse, SessionResponse, WalletDisplay};
use ir_chain_client::SessionState;

use crate::{ApiResult, AppState, staking_error};

pub(crate) fn session_response(state: &AppState, session: SessionState) -> SessionResponse {
    SessionResponse {
        connection: session.connection,
        account: session.account.as_ref().map(abbreviate_address),
        chain_id: session.chain_id,
        expected_chain_id: state.client.config().expected_chain_id,
        pending_operation: state.client.pending_operation(),
    }
}

/// Prompts the provider for account access and loads the first view.
pub(crate) async fn wallet_connect(State(state): State<AppState>) -> ApiResult<ConnectResponse> {
    let outcome = state.client.connect().await.map_err(staking_error)?;
    Ok(Json(ConnectResponse {
        session: session_response(&state, outcome.session),
        wallet: outcome.wallet.map(|view| view.display()),
    }))
}

pub(crate) async fn wallet_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(session_response(&state, state.client.session()))
}

pub(crate) async fn wallet_data(State(state): State<AppState>) -> ApiResult<WalletDisplay> {
    let view = state.client.get_wallet_data().await.map_err(staking_error)?;
    Ok(Json(view.display()))
}
