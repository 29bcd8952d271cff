use alloy_primitives::{Address, U64};
use async_trait::async_trait;
use ir_chain_client::{ChainClient, ChainError, ProviderEvent};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::rpc::RpcTransport;

const EVENT_CAPACITY: usize = 32;

/// Wallet-provider client over JSON-RPC.
///
/// JSON-RPC has no push channel for `accountsChanged`/`chainChanged`, so
/// [`spawn_watcher`](Self::spawn_watcher) polls both and publishes changes.
pub struct RpcChainClient {
    rpc: Arc<RpcTransport>,
    events: broadcast::Sender<ProviderEvent>,
}

impl RpcChainClient {
    pub fn new(rpc: Arc<RpcTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { rpc, events }
    }

    pub fn transport(&self) -> Arc<RpcTransport> {
        Arc::clone(&self.rpc)
    }

    pub fn publish(&self, event: ProviderEvent) {
        if self.events.send(event).is_err() {
            debug!("provider event dropped: no subscribers");
        }
    }

    /// Polls accounts and chain id every `poll_interval`. The first poll only
    /// records a baseline; later differences are published.
    pub fn spawn_watcher(self: Arc<Self>, poll_interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("provider watcher polling {} every {:?}", self.rpc.endpoint(), poll_interval);
            let mut ticker = tokio::time::interval(poll_interval);
            let mut last_accounts: Option<Vec<Address>> = None;
            let mut last_chain: Option<u64> = None;

            loop {
                ticker.tick().await;

                match self.list_accounts().await {
                    Ok(accounts) => {
                        if last_accounts.as_ref().is_some_and(|prev| *prev != accounts) {
                            self.publish(ProviderEvent::AccountsChanged(accounts.clone()));
                        }
                        last_accounts = Some(accounts);
                    }
                    Err(err) => warn!("provider watcher failed to list accounts: {}", err),
                }

                match self.current_chain_id().await {
                    Ok(chain_id) => {
                        if last_chain.is_some_and(|prev| prev != chain_id) {
                            self.publish(ProviderEvent::ChainChanged(chain_id));
                        }
                        last_chain = Some(chain_id);
                    }
                    Err(err) => warn!("provider watcher failed to read chain id: {}", err),
                }
            }
        })
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn list_accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.rpc.request("eth_accounts", json!([])).await
    }

    async fn current_chain_id(&self) -> Result<u64, ChainError> {
        let chain_id: U64 = self.rpc.request("eth_chainId", json!([])).await?;
        Ok(chain_id.to::<u64>())
    }

    async fn request_account_access(&self) -> Result<Vec<Address>, ChainError> {
        match self.rpc.request("eth_requestAccounts", json!([])).await {
            // Plain nodes do not implement the EIP-1102 prompt; their unlocked
            // accounts are already authorized.
            Err(ChainError::Rpc { code: -32601, .. }) => self.list_accounts().await,
            other => other,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
