use alloy_primitives::Address;
use anyhow::{Context, Result};
use ir_chain_bsc::{BSC_TESTNET_CHAIN_ID, ContractAddresses, DEFAULT_RPC_URL};
use ir_staking_core::{ClientConfig, DEFAULT_NO_STAKE_PHRASE};
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServiceConfig {
    pub(crate) rpc_url: String,
    pub(crate) chain_id: u64,
    pub(crate) listen_addr: SocketAddr,
    pub(crate) poll_interval: Duration,
    pub(crate) no_stake_phrase: String,
    pub(crate) contracts: ContractAddresses,
}

impl ServiceConfig {
    /// Reads `IRITNOMIC_*` variables, falling back to the BSC testnet
    /// deployment defaults.
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty());
        let defaults = ContractAddresses::default();

        let chain_id = match var("IRITNOMIC_CHAIN_ID") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("IRITNOMIC_CHAIN_ID is not a number: {raw}"))?,
            None => BSC_TESTNET_CHAIN_ID,
        };
        let listen_addr = var("IRITNOMIC_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("IRITNOMIC_LISTEN_ADDR is not a socket address: {listen_addr}"))?;
        let poll_interval_ms = match var("IRITNOMIC_POLL_INTERVAL_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("IRITNOMIC_POLL_INTERVAL_MS is not a number: {raw}"))?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };
        if poll_interval_ms == 0 {
            anyhow::bail!("IRITNOMIC_POLL_INTERVAL_MS must be greater than 0");
        }

        Ok(Self {
            rpc_url: var("IRITNOMIC_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_owned()),
            chain_id,
            listen_addr,
            poll_interval: Duration::from_millis(poll_interval_ms),
            no_stake_phrase: var("IRITNOMIC_NO_STAKE_PHRASE").unwrap_or_else(|| DEFAULT_NO_STAKE_PHRASE.to_owned()),
            contracts: ContractAddresses {
                gas_token: address_var(&var, "IRITNOMIC_GAS_TOKEN", defaults.gas_token)?,
                bgs_token: address_var(&var, "IRITNOMIC_BGS_TOKEN", defaults.bgs_token)?,
                staking_pool: address_var(&var, "IRITNOMIC_STAKING_POOL", defaults.staking_pool)?,
            },
        })
    }

    pub(crate) fn client_config(&self) -> ClientConfig {
        ClientConfig {
            expected_chain_id: self.chain_id,
            no_stake_phrase: self.no_stake_phrase.clone(),
        }
    }
}

fn address_var(var: impl Fn(&str) -> Option<String>, key: &str, default: Address) -> Result<Address> {
    match var(key) {
        Some(raw) => raw
            .parse::<Address>()
            .with_context(|| format!("{key} is not a valid address: {raw}")),
        None => Ok(default),
    }
}
