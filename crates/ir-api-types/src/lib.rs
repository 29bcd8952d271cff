use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod units;

use units::{abbreviate_address, format_amount, format_share_bps};

/// Connection lifecycle of one client session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected { chain_valid: bool },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Only a connection on the expected chain may issue transactions.
    pub fn can_transact(&self) -> bool {
        matches!(self, Self::Connected { chain_valid: true })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Stake,
    WithdrawRewards,
    Burn,
    ReturnToPool,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stake => "stake",
            Self::WithdrawRewards => "withdraw_rewards",
            Self::Burn => "burn",
            Self::ReturnToPool => "return_to_pool",
        };
        f.write_str(name)
    }
}

/// Per-account position as reported by `getUserStakeInfo`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StakeView {
    pub staked_amount: U256,
    pub staked_at: u64,
    pub unlock_time: u64,
    pub pending_rewards: U256,
    pub total_earned: U256,
    /// Pool share in basis points.
    pub share_bps: U256,
}

/// Global pool figures as reported by `getStakingStats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub total_staked: U256,
    pub total_stakers: U256,
    pub remaining_reward_pool: U256,
    /// Whole percent, as published by the pool.
    pub current_apy: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TokenBalances {
    pub gas: U256,
    pub bgs: U256,
}

/// Aggregate raw view of one account. The default value is the zeroed view
/// shown while disconnected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WalletView {
    pub account: Option<Address>,
    pub balances: TokenBalances,
    pub stake: StakeView,
    pub pool: PoolStats,
    /// False when the pool reported that the account never staked.
    pub has_stake: bool,
}

impl WalletView {
    pub fn display(&self) -> WalletDisplay {
        WalletDisplay {
            account: self.account.as_ref().map(abbreviate_address),
            gas_balance: format_amount(self.balances.gas),
            bgs_balance: format_amount(self.balances.bgs),
            user_stake: format_amount(self.stake.staked_amount),
            user_share: format_share_bps(self.stake.share_bps),
            pending_rewards: format_amount(self.stake.pending_rewards),
            total_earned: format_amount(self.stake.total_earned),
            unlock_time: self.stake.unlock_time,
            total_staked: format_amount(self.pool.total_staked),
            total_stakers: self.pool.total_stakers.to_string(),
            remaining_reward_pool: format_amount(self.pool.remaining_reward_pool),
            current_apy: self.pool.current_apy.to_string(),
            has_stake: self.has_stake,
        }
    }
}

/// Display-unit rendering of a [`WalletView`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletDisplay {
    pub account: Option<String>,
    pub gas_balance: String,
    pub bgs_balance: String,
    pub user_stake: String,
    pub user_share: String,
    pub pending_rewards: String,
    pub total_earned: String,
    pub unlock_time: u64,
    pub total_staked: String,
    pub total_stakers: String,
    pub remaining_reward_pool: String,
    pub current_apy: String,
    pub has_stake: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationPhase {
    Created,
    Approving,
    Acting,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingOperationInfo {
    pub operation_id: Uuid,
    pub operation: OperationKind,
    pub phase: OperationPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountRequest {
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub connection: ConnectionState,
    pub account: Option<String>,
    pub chain_id: Option<u64>,
    pub expected_chain_id: u64,
    pub pending_operation: Option<PendingOperationInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub session: SessionResponse,
    pub wallet: Option<WalletDisplay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResponse {
    pub operation_id: Uuid,
    pub operation: OperationKind,
    pub success: bool,
    pub approval_required: bool,
    pub approval_tx: Option<String>,
    pub action_tx: String,
    pub wallet: Option<WalletDisplay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractInfo {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfigResponse {
    pub chain_name: String,
    pub chain_id: u64,
    pub token_decimals: usize,
    pub contracts: Vec<ContractInfo>,
    pub no_stake_phrase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractStatusResponse {
    pub ready: bool,
    pub gas_symbol: Option<String>,
    pub bgs_symbol: Option<String>,
    pub total_staked: Option<String>,
    pub message: Option<String>,
}
