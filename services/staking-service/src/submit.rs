use axum::{Json, extract::State};
use ir_api_types::{AmountRequest, OperationResponse};
use ir_staking_core::{OperationOutcome, StakingError};

use crate::{ApiResult, AppState, staking_error};

pub(crate) async fn stake(State(state): State<AppState>, Json(request): Json<AmountRequest>) -> ApiResult<OperationResponse> {
    respond(state.client.stake(&request.amount).await)
}

pub(crate) async fn withdraw_rewards(State(state): State<AppState>) -> ApiResult<OperationResponse> {
    respond(state.client.withdraw_rewards().await)
}

pub(crate) async fn burn_gas(State(state): State<AppState>, Json(request): Json<AmountRequest>) -> ApiResult<OperationResponse> {
    respond(state.client.burn_gas(&request.amount).await)
}

pub(crate) async fn recycle_bgs(
    State(state): State<AppState>,
    Json(request): Json<AmountRequest>,
) -> ApiResult<OperationResponse> {
    respond(state.client.recycle_bgs(&request.amount).await)
}

fn respond(result: Result<OperationOutcome, StakingError>) -> ApiResult<OperationResponse> {
    let outcome = result.map_err(staking_error)?;
    let receipt = outcome.receipt;
    let approval_tx = receipt
        .approval
        .as_ref()
        .and_then(|approval| approval.receipt())
        .map(|approval| approval.tx_hash.to_string());

    Ok(Json(OperationResponse {
        operation_id: receipt.operation_id,
        operation: receipt.operation,
        success: receipt.action.success,
        approval_required: approval_tx.is_some(),
        approval_tx,
        action_tx: receipt.action.tx_hash.to_string(),
        wallet: outcome.wallet.map(|view| view.display()),
    }))
}
