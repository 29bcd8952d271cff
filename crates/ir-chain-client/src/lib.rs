use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use ir_api_types::{ConnectionState, PoolStats, StakeView};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

/// Failure reported by the wallet provider or a contract call, already
/// classified from the provider's raw error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("user denied the request")]
    Rejected,
    #[error("insufficient funds for transaction")]
    InsufficientFunds,
    #[error(
        "execution reverted{}",
        .reason.as_ref().map(|reason| format!(": {reason}")).unwrap_or_default()
    )]
    Reverted { reason: Option<String> },
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ChainError {
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Self::Reverted { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// True for a revert whose reason contains `phrase`.
    pub fn is_revert_with(&self, phrase: &str) -> bool {
        self.revert_reason()
            .is_some_and(|reason| reason.contains(phrase))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
}

/// Notifications pushed by the wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Active account, chain and connection state of a session.
///
/// Always replaced as one value so readers never see an account paired with
/// a chain it was not observed on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub connection: ConnectionState,
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
}

#[derive(Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new(SessionState::default())
    }
}

impl SessionHandle {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn replace(&self, next: SessionState) -> SessionState {
        self.tx.send_replace(next)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Accounts already authorized, without prompting the user.
    async fn list_accounts(&self) -> Result<Vec<Address>, ChainError>;
    async fn current_chain_id(&self) -> Result<u64, ChainError>;
    /// Prompts the user to authorize accounts.
    async fn request_account_access(&self) -> Result<Vec<Address>, ChainError>;
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

#[async_trait]
pub trait TokenBinding: Send + Sync {
    fn address(&self) -> Address;
    async fn symbol(&self) -> Result<String, ChainError>;
    async fn balance_of(&self, owner: Address) -> Result<U256, ChainError>;
    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ChainError>;
    async fn approve(&self, spender: Address, amount: U256, from: Address) -> Result<TxReceipt, ChainError>;
    async fn burn(&self, amount: U256, from: Address) -> Result<TxReceipt, ChainError>;
}

#[async_trait]
pub trait PoolBinding: Send + Sync {
    fn address(&self) -> Address;
    /// Address of the stake token the pool was deployed against.
    async fn stake_token(&self) -> Result<Address, ChainError>;
    async fn total_staked(&self) -> Result<U256, ChainError>;
    async fn user_stake_info(&self, user: Address) -> Result<StakeView, ChainError>;
    async fn staking_stats(&self) -> Result<PoolStats, ChainError>;
    async fn stake(&self, amount: U256, from: Address) -> Result<TxReceipt, ChainError>;
    async fn withdraw_rewards(&self, from: Address) -> Result<TxReceipt, ChainError>;
    async fn return_to_pool(&self, amount: U256, from: Address) -> Result<TxReceipt, ChainError>;
}

/// The three bindings the dashboard works against.
#[derive(Clone)]
pub struct ContractSet {
    pub stake_token: Arc<dyn TokenBinding>,
    pub reward_token: Arc<dyn TokenBinding>,
    pub pool: Arc<dyn PoolBinding>,
}
