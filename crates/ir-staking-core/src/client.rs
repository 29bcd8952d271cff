use alloy_primitives::Address;
use ir_api_types::units::parse_amount;
use ir_api_types::{ContractStatusResponse, PendingOperationInfo, WalletView};
use ir_chain_client::{ChainClient, ContractSet, ProviderEvent, SessionHandle, SessionState};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::connection::{RefreshReason, SessionEffect, apply_event, begin_connect, connected};
use crate::error::{NotReady, StakingError, Step};
use crate::orchestrator::{GuardedOperation, OperationReceipt, Orchestrator};
use crate::reconciler::{DEFAULT_NO_STAKE_PHRASE, Reconciler};

pub const DEFAULT_EXPECTED_CHAIN_ID: u64 = 97;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub expected_chain_id: u64,
    pub no_stake_phrase: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            expected_chain_id: DEFAULT_EXPECTED_CHAIN_ID,
            no_stake_phrase: DEFAULT_NO_STAKE_PHRASE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub session: SessionState,
    /// Absent when the first refresh after connecting failed.
    pub wallet: Option<WalletView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub receipt: OperationReceipt,
    /// Absent when the refresh after a confirmed operation failed.
    pub wallet: Option<WalletView>,
}

/// One wallet session against the staking contracts.
pub struct StakingClient {
    chain: Arc<dyn ChainClient>,
    contracts: Option<ContractSet>,
    config: ClientConfig,
    session: SessionHandle,
    orchestrator: Orchestrator,
    reconciler: Reconciler,
    view: watch::Sender<WalletView>,
}

impl StakingClient {
    /// `contracts` is `None` when binding failed; reads and transactions then
    /// report `ContractsUnbound`.
    pub fn new(chain: Arc<dyn ChainClient>, contracts: Option<ContractSet>, config: ClientConfig) -> Self {
        let (view, _) = watch::channel(WalletView::default());
        Self {
            chain,
            contracts,
            reconciler: Reconciler::new(config.no_stake_phrase.clone()),
            config,
            session: SessionHandle::default(),
            orchestrator: Orchestrator::new(),
            view,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> SessionState {
        self.session.current()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn view(&self) -> WalletView {
        self.view.borrow().clone()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<WalletView> {
        self.view.subscribe()
    }

    pub fn pending_operation(&self) -> Option<PendingOperationInfo> {
        self.orchestrator.pending()
    }

    pub fn contracts_bound(&self) -> bool {
        self.contracts.is_some()
    }

    /// Prompts for account access and connects the first account.
    pub async fn connect(&self) -> Result<ConnectOutcome, StakingError> {
        let previous = self.session.current();
        self.session.replace(begin_connect(&previous));
        info!("requesting wallet connection");

        let accounts = match self.chain.request_account_access().await {
            Ok(accounts) => accounts,
            Err(err) => {
                self.session.replace(previous);
                warn!("wallet connection failed: {}", err);
                return Err(StakingError::from_chain(Step::Connect, err));
            }
        };
        let Some(&account) = accounts.first() else {
            self.session.replace(previous);
            return Err(NotReady::NoAccount.into());
        };

        self.establish(account).await.inspect_err(|err| {
            self.session.replace(previous);
            warn!("wallet connection failed: {}", err);
        })
    }

    /// Connects an already-authorized account without prompting. Returns
    /// `None` when the provider lists no accounts.
    pub async fn restore_session(&self) -> Result<Option<ConnectOutcome>, StakingError> {
        let accounts = self
            .chain
            .list_accounts()
            .await
            .map_err(|err| StakingError::from_chain(Step::Connect, err))?;
        match accounts.first() {
            Some(&account) => {
                info!("restoring session for {}", account);
                self.establish(account).await.map(Some)
            }
            None => {
                debug!("no authorized accounts to restore");
                Ok(None)
            }
        }
    }

    async fn establish(&self, account: Address) -> Result<ConnectOutcome, StakingError> {
        let chain_id = self
            .chain
            .current_chain_id()
            .await
            .map_err(|err| StakingError::from_chain(Step::Connect, err))?;
        let session = connected(account, chain_id, self.config.expected_chain_id);
        self.session.replace(session.clone());

        if session.connection.can_transact() {
            info!("connected {} on chain {}", account, chain_id);
        } else {
            warn!(
                "connected {} on chain {}, expected {}; transactions disabled",
                account, chain_id, self.config.expected_chain_id
            );
        }

        let wallet = match self.refresh_published(account).await {
            Ok(view) => Some(view),
            Err(err) => {
                warn!("initial wallet load failed: {}", err);
                None
            }
        };
        Ok(ConnectOutcome { session, wallet })
    }

    /// Current view of the connected account. Allowed on a wrong chain.
    pub async fn get_wallet_data(&self) -> Result<WalletView, StakingError> {
        let account = self.connected_account()?;
        self.refresh_published(account).await
    }

    pub async fn contract_status(&self) -> ContractStatusResponse {
        self.reconciler.contract_status(self.contracts.as_ref()).await
    }

    pub async fn stake(&self, amount: &str) -> Result<OperationOutcome, StakingError> {
        let amount = parse_amount(amount)?;
        self.run(|contracts| GuardedOperation::stake(contracts, amount)).await
    }

    pub async fn withdraw_rewards(&self) -> Result<OperationOutcome, StakingError> {
        self.run(|_| GuardedOperation::withdraw_rewards()).await
    }

    pub async fn burn_gas(&self, amount: &str) -> Result<OperationOutcome, StakingError> {
        let amount = parse_amount(amount)?;
        self.run(|_| GuardedOperation::burn(amount)).await
    }

    pub async fn recycle_bgs(&self, amount: &str) -> Result<OperationOutcome, StakingError> {
        let amount = parse_amount(amount)?;
        self.run(|contracts| GuardedOperation::recycle_pool(contracts, amount)).await
    }

    async fn run(&self, build: impl FnOnce(&ContractSet) -> GuardedOperation) -> Result<OperationOutcome, StakingError> {
        let (account, contracts) = self.transaction_ready()?;
        let receipt = self
            .orchestrator
            .execute(contracts, account, build(contracts))
            .await?;

        let wallet = match self.refresh_published(account).await {
            Ok(view) => Some(view),
            Err(err) => {
                warn!("refresh after {} failed: {}", receipt.operation, err);
                None
            }
        };
        Ok(OperationOutcome { receipt, wallet })
    }

    fn connected_account(&self) -> Result<Address, NotReady> {
        let session = self.session.current();
        session
            .account
            .filter(|_| session.connection.is_connected())
            .ok_or(NotReady::NoAccount)
    }

    /// Checks, in order: an account, the expected chain, bound contracts.
    fn transaction_ready(&self) -> Result<(Address, &ContractSet), StakingError> {
        let session = self.session.current();
        let account = session
            .account
            .filter(|_| session.connection.is_connected())
            .ok_or(NotReady::NoAccount)?;
        if !session.connection.can_transact() {
            return Err(NotReady::WrongChain {
                expected: self.config.expected_chain_id,
                actual: session.chain_id,
            }
            .into());
        }
        let contracts = self.contracts.as_ref().ok_or(NotReady::ContractsUnbound)?;
        Ok((account, contracts))
    }

    /// Refreshes and publishes the view unless the session moved to another
    /// account while the reads were in flight.
    async fn refresh_published(&self, account: Address) -> Result<WalletView, StakingError> {
        let contracts = self.contracts.as_ref().ok_or(NotReady::ContractsUnbound)?;
        let view = self.reconciler.refresh(contracts, account).await?;
        if self.session.current().account == Some(account) {
            self.view.send_replace(view.clone());
        } else {
            debug!("discarding view of {} after account switch", account);
        }
        Ok(view)
    }

    pub async fn handle_event(&self, event: ProviderEvent) {
        let current = self.session.current();
        let (next, effect) = apply_event(&current, &event, self.config.expected_chain_id);
        debug!("provider event {:?}: {:?}", event, effect);
        if next != current {
            self.session.replace(next.clone());
        }

        match effect {
            SessionEffect::None => {}
            SessionEffect::Reset => {
                info!("wallet disconnected");
                self.view.send_replace(WalletView::default());
            }
            SessionEffect::Refresh(reason) => {
                let Some(account) = next.account else {
                    return;
                };
                if reason == RefreshReason::AccountChanged {
                    info!("active account changed to {}", account);
                    self.view.send_replace(WalletView {
                        account: Some(account),
                        ..WalletView::default()
                    });
                }
                if let Err(err) = self.refresh_published(account).await {
                    warn!("refresh after {:?} failed: {}", reason, err);
                }
            }
            SessionEffect::SilentConnect(account) => {
                if let Err(err) = self.establish(account).await {
                    warn!("silent connect of {} failed: {}", account, err);
                }
            }
        }
    }

    /// Applies provider events until the chain client drops its sender.
    pub async fn run_events(&self) {
        let mut events = self.chain.subscribe();
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(event).await,
                Err(RecvError::Lagged(skipped)) => warn!("skipped {} provider events", skipped),
                Err(RecvError::Closed) => {
                    info!("provider event stream closed");
                    break;
                }
            }
        }
    }
}
