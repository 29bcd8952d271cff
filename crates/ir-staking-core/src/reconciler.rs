//! Rebuilds the wallet view from chain reads.

use alloy_primitives::Address;
use ir_api_types::units::format_amount;
use ir_api_types::{ContractStatusResponse, StakeView, TokenBalances, WalletView};
use ir_chain_client::{ChainError, ContractSet, PoolBinding};
use tracing::{debug, warn};

use crate::error::{NotReady, StakingError};

/// Revert reason the pool returns for an account that never staked.
pub const DEFAULT_NO_STAKE_PHRASE: &str = "User has no stake";

pub struct Reconciler {
    no_stake_phrase: String,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_NO_STAKE_PHRASE)
    }
}

impl Reconciler {
    pub fn new(no_stake_phrase: impl Into<String>) -> Self {
        Self {
            no_stake_phrase: no_stake_phrase.into(),
        }
    }

    /// Stake position of `account`, or `NoStake` when the pool reverts with
    /// the no-stake phrase.
    pub async fn stake_info(&self, pool: &dyn PoolBinding, account: Address) -> Result<StakeView, StakingError> {
        pool.user_stake_info(account).await.map_err(|source| {
            if source.is_revert_with(&self.no_stake_phrase) {
                StakingError::NoStake
            } else {
                StakingError::DataUnavailable { source }
            }
        })
    }

    /// Reads both balances, the stake position and the pool stats
    /// concurrently. Any failure other than `NoStake` fails the whole view.
    pub async fn refresh(&self, contracts: &ContractSet, account: Address) -> Result<WalletView, StakingError> {
        let (gas, bgs, stake, pool) = tokio::join!(
            contracts.stake_token.balance_of(account),
            contracts.reward_token.balance_of(account),
            self.stake_info(&*contracts.pool, account),
            contracts.pool.staking_stats(),
        );

        let unavailable = |source: ChainError| {
            warn!("wallet refresh for {} failed: {}", account, source);
            StakingError::DataUnavailable { source }
        };
        let balances = TokenBalances {
            gas: gas.map_err(unavailable)?,
            bgs: bgs.map_err(unavailable)?,
        };
        let pool = pool.map_err(unavailable)?;
        let (stake, has_stake) = match stake {
            Ok(stake) => (stake, true),
            Err(StakingError::NoStake) => {
                debug!("{} has no stake, showing zeroed position", account);
                (StakeView::default(), false)
            }
            Err(err) => {
                warn!("wallet refresh for {} failed: {}", account, err);
                return Err(err);
            }
        };

        Ok(WalletView {
            account: Some(account),
            balances,
            stake,
            pool,
            has_stake,
        })
    }

    /// Token symbols and pool total, or a not-ready status with a reworded
    /// message.
    pub async fn contract_status(&self, contracts: Option<&ContractSet>) -> ContractStatusResponse {
        let Some(contracts) = contracts else {
            return ContractStatusResponse {
                ready: false,
                gas_symbol: None,
                bgs_symbol: None,
                total_staked: None,
                message: Some(NotReady::ContractsUnbound.to_string()),
            };
        };

        let result = tokio::try_join!(
            contracts.stake_token.symbol(),
            contracts.reward_token.symbol(),
            contracts.pool.total_staked(),
        );
        match result {
            Ok((gas_symbol, bgs_symbol, total_staked)) => ContractStatusResponse {
                ready: true,
                gas_symbol: Some(gas_symbol),
                bgs_symbol: Some(bgs_symbol),
                total_staked: Some(format_amount(total_staked)),
                message: None,
            },
            Err(source) => {
                warn!("contract status check failed: {}", source);
                ContractStatusResponse {
                    ready: false,
                    gas_symbol: None,
                    bgs_symbol: None,
                    total_staked: None,
                    message: Some(StakingError::DataUnavailable { source }.user_message()),
                }
            }
        }
    }
}
