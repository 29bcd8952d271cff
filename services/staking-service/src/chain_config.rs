use alloy_primitives::Address;
use axum::{Json, extract::State};
use ir_api_types::units::TOKEN_DECIMALS;
use ir_api_types::{ChainConfigResponse, ContractInfo, ContractStatusResponse};
use ir_chain_bsc::{BSC_TESTNET, BSC_TESTNET_CHAIN_ID};

use crate::AppState;

/// Returns the chain identity and contract addresses the dashboard signs
/// against.
pub(crate) async fn chain_config(State(state): State<AppState>) -> Json<ChainConfigResponse> {
    let contracts = &state.config.contracts;
    let chain_name = if state.config.chain_id == BSC_TESTNET_CHAIN_ID {
        BSC_TESTNET.to_owned()
    } else {
        format!("chain-{}", state.config.chain_id)
    };

    Json(ChainConfigResponse {
        chain_name,
        chain_id: state.config.chain_id,
        token_decimals: TOKEN_DECIMALS,
        contracts: vec![
            contract_info("GAS", contracts.gas_token),
            contract_info("BGS", contracts.bgs_token),
            contract_info("StakingPool", contracts.staking_pool),
        ],
        no_stake_phrase: state.config.no_stake_phrase.clone(),
    })
}

/// Reports whether the bound contracts answer reads.
pub(crate) async fn contract_status(State(state): State<AppState>) -> Json<ContractStatusResponse> {
    Json(state.client.contract_status().await)
}

fn contract_info(name: &str, address: Address) -> ContractInfo {
    ContractInfo {
        name: name.to_owned(),
        address: address.to_string(),
    }
}
