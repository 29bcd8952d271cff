//! BNB Smart Chain bindings for the IRITnomic staking contracts.

use alloy_primitives::{Address, address};
use ir_chain_client::{ChainError, ContractSet};
use std::sync::Arc;
use tracing::info;

mod client;
mod contracts;
mod rpc;

pub use client::RpcChainClient;
pub use contracts::{Erc20Contract, StakingPoolContract};
pub use rpc::{DEFAULT_RECEIPT_POLL_INTERVAL, DEFAULT_RPC_URL, RpcTransport};

pub const BSC_TESTNET: &str = "bsc-testnet";
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;

pub const GAS_TOKEN_ADDRESS: Address = address!("F5Cd132Da2F0EC2150E4C0Ac5a2A9473649DF307");
pub const BGS_TOKEN_ADDRESS: Address = address!("34897515163C21f9eA0600A3d0308E1430404f55");
pub const STAKING_POOL_ADDRESS: Address = address!("c4079F735425002312c3B60A66cff56576A34a44");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub gas_token: Address,
    pub bgs_token: Address,
    pub staking_pool: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            gas_token: GAS_TOKEN_ADDRESS,
            bgs_token: BGS_TOKEN_ADDRESS,
            staking_pool: STAKING_POOL_ADDRESS,
        }
    }
}

pub fn bind_contracts(rpc: Arc<RpcTransport>, addresses: &ContractAddresses) -> ContractSet {
    ContractSet {
        stake_token: Arc::new(Erc20Contract::new(addresses.gas_token, Arc::clone(&rpc))),
        reward_token: Arc::new(Erc20Contract::new(addresses.bgs_token, Arc::clone(&rpc))),
        pool: Arc::new(StakingPoolContract::new(addresses.staking_pool, rpc)),
    }
}

/// Binds the contracts and checks that all three answer a read.
pub async fn bind_and_probe(rpc: Arc<RpcTransport>, addresses: &ContractAddresses) -> Result<ContractSet, ChainError> {
    let contracts = bind_contracts(rpc, addresses);
    let (gas_symbol, bgs_symbol, pool_stake_token) = tokio::try_join!(
        contracts.stake_token.symbol(),
        contracts.reward_token.symbol(),
        contracts.pool.stake_token(),
    )?;
    info!(
        "contracts loaded: {} at {}, {} at {}, pool at {} staking {}",
        gas_symbol,
        addresses.gas_token,
        bgs_symbol,
        addresses.bgs_token,
        addresses.staking_pool,
        pool_stake_token
    );
    Ok(contracts)
}
