//! Recording fakes for the chain client and contract bindings.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use ir_api_types::{PoolStats, StakeView};
use ir_chain_client::{ChainClient, ChainError, ContractSet, PoolBinding, ProviderEvent, TokenBinding, TxReceipt};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

pub(crate) const NO_STAKE_REVERT: &str = "User has no stake";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub(crate) contract: &'static str,
    pub(crate) method: &'static str,
    pub(crate) amount: Option<U256>,
}

impl Call {
    pub(crate) fn new(contract: &'static str, method: &'static str, amount: Option<U256>) -> Self {
        Self { contract, method, amount }
    }

    fn is_send(&self) -> bool {
        matches!(
            self.method,
            "approve" | "burn" | "stake" | "withdrawRewards" | "returnToPool"
        )
    }
}

/// Shared, ordered log of every binding call.
#[derive(Default)]
pub(crate) struct CallLog {
    calls: Mutex<Vec<Call>>,
    tx_counter: AtomicU8,
}

impl CallLog {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn receipt(&self) -> TxReceipt {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        TxReceipt {
            tx_hash: B256::repeat_byte(n),
            success: true,
            block_number: Some(u64::from(n)),
        }
    }

    fn reverted_receipt(&self) -> TxReceipt {
        TxReceipt {
            success: false,
            ..self.receipt()
        }
    }

    pub(crate) fn all(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn sent(&self) -> Vec<Call> {
        self.all().into_iter().filter(Call::is_send).collect()
    }
}

pub(crate) struct MockToken {
    name: &'static str,
    pub(crate) address: Address,
    log: Arc<CallLog>,
    allowance: Mutex<U256>,
    balance: Mutex<U256>,
    read_error: Mutex<Option<ChainError>>,
    send_error: Mutex<Option<ChainError>>,
    revert_next: Mutex<bool>,
}

impl MockToken {
    fn new(name: &'static str, address: Address, log: Arc<CallLog>) -> Self {
        Self {
            name,
            address,
            log,
            allowance: Mutex::new(U256::ZERO),
            balance: Mutex::new(U256::ZERO),
            read_error: Mutex::new(None),
            send_error: Mutex::new(None),
            revert_next: Mutex::new(false),
        }
    }

    pub(crate) fn set_allowance(&self, value: U256) {
        *self.allowance.lock().unwrap() = value;
    }

    pub(crate) fn current_allowance(&self) -> U256 {
        *self.allowance.lock().unwrap()
    }

    pub(crate) fn set_balance(&self, value: U256) {
        *self.balance.lock().unwrap() = value;
    }

    pub(crate) fn fail_reads(&self, err: ChainError) {
        *self.read_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_next_send(&self, err: ChainError) {
        *self.send_error.lock().unwrap() = Some(err);
    }

    fn read_result(&self) -> Result<(), ChainError> {
        match self.read_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The next send is mined with a failed status instead of erroring.
    pub(crate) fn revert_next_send(&self) {
        *self.revert_next.lock().unwrap() = true;
    }

    fn send_result(&self) -> Result<TxReceipt, ChainError> {
        if let Some(err) = self.send_error.lock().unwrap().take() {
            return Err(err);
        }
        if std::mem::take(&mut *self.revert_next.lock().unwrap()) {
            return Ok(self.log.reverted_receipt());
        }
        Ok(self.log.receipt())
    }
}

#[async_trait]
impl TokenBinding for MockToken {
    fn address(&self) -> Address {
        self.address
    }

    async fn symbol(&self) -> Result<String, ChainError> {
        self.log.record(Call::new(self.name, "symbol", None));
        self.read_result()?;
        Ok(self.name.to_owned())
    }

    async fn balance_of(&self, _owner: Address) -> Result<U256, ChainError> {
        self.log.record(Call::new(self.name, "balanceOf", None));
        self.read_result()?;
        Ok(*self.balance.lock().unwrap())
    }

    async fn allowance(&self, _owner: Address, _spender: Address) -> Result<U256, ChainError> {
        self.log.record(Call::new(self.name, "allowance", None));
        self.read_result()?;
        Ok(self.current_allowance())
    }

    async fn approve(&self, _spender: Address, amount: U256, _from: Address) -> Result<TxReceipt, ChainError> {
        self.log.record(Call::new(self.name, "approve", Some(amount)));
        let receipt = self.send_result()?;
        if receipt.success {
            self.set_allowance(amount);
        }
        Ok(receipt)
    }

    async fn burn(&self, amount: U256, _from: Address) -> Result<TxReceipt, ChainError> {
        self.log.record(Call::new(self.name, "burn", Some(amount)));
        self.send_result()
    }
}

/// Pool fake that, like the real contract, reverts a spend not covered by the
/// token allowance.
pub(crate) struct MockPool {
    pub(crate) address: Address,
    log: Arc<CallLog>,
    gas: Arc<MockToken>,
    bgs: Arc<MockToken>,
    stake_info: Mutex<Result<StakeView, ChainError>>,
    stats: Mutex<Result<PoolStats, ChainError>>,
    send_error: Mutex<Option<ChainError>>,
}

impl MockPool {
    pub(crate) fn set_stake_info(&self, result: Result<StakeView, ChainError>) {
        *self.stake_info.lock().unwrap() = result;
    }

    pub(crate) fn set_stats(&self, result: Result<PoolStats, ChainError>) {
        *self.stats.lock().unwrap() = result;
    }

    pub(crate) fn fail_next_send(&self, err: ChainError) {
        *self.send_error.lock().unwrap() = Some(err);
    }

    fn spend(&self, token: &MockToken, method: &'static str, amount: U256) -> Result<TxReceipt, ChainError> {
        self.log.record(Call::new("POOL", method, Some(amount)));
        if let Some(err) = self.send_error.lock().unwrap().take() {
            return Err(err);
        }
        if token.current_allowance() < amount {
            return Err(ChainError::Reverted {
                reason: Some("ERC20: insufficient allowance".to_owned()),
            });
        }
        token.set_allowance(token.current_allowance() - amount);
        Ok(self.log.receipt())
    }
}

#[async_trait]
impl PoolBinding for MockPool {
    fn address(&self) -> Address {
        self.address
    }

    async fn stake_token(&self) -> Result<Address, ChainError> {
        self.log.record(Call::new("POOL", "GAS_TOKEN", None));
        Ok(self.gas.address)
    }

    async fn total_staked(&self) -> Result<U256, ChainError> {
        self.log.record(Call::new("POOL", "totalStaked", None));
        self.stats.lock().unwrap().clone().map(|stats| stats.total_staked)
    }

    async fn user_stake_info(&self, _user: Address) -> Result<StakeView, ChainError> {
        self.log.record(Call::new("POOL", "getUserStakeInfo", None));
        self.stake_info.lock().unwrap().clone()
    }

    async fn staking_stats(&self) -> Result<PoolStats, ChainError> {
        self.log.record(Call::new("POOL", "getStakingStats", None));
        self.stats.lock().unwrap().clone()
    }

    async fn stake(&self, amount: U256, _from: Address) -> Result<TxReceipt, ChainError> {
        self.spend(&self.gas, "stake", amount)
    }

    async fn withdraw_rewards(&self, _from: Address) -> Result<TxReceipt, ChainError> {
        self.log.record(Call::new("POOL", "withdrawRewards", None));
        match self.send_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(self.log.receipt()),
        }
    }

    async fn return_to_pool(&self, amount: U256, _from: Address) -> Result<TxReceipt, ChainError> {
        self.spend(&self.bgs, "returnToPool", amount)
    }
}

pub(crate) struct MockChain {
    accounts: Mutex<Result<Vec<Address>, ChainError>>,
    chain_id: Mutex<u64>,
    chain_id_error: Mutex<Option<ChainError>>,
    requests: AtomicUsize,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockChain {
    pub(crate) fn set_accounts(&self, result: Result<Vec<Address>, ChainError>) {
        *self.accounts.lock().unwrap() = result;
    }

    pub(crate) fn set_chain_id(&self, chain_id: u64) {
        *self.chain_id.lock().unwrap() = chain_id;
    }

    pub(crate) fn fail_chain_id(&self, err: ChainError) {
        *self.chain_id_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub(crate) fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn list_accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.accounts.lock().unwrap().clone()
    }

    async fn current_chain_id(&self) -> Result<u64, ChainError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.chain_id_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(*self.chain_id.lock().unwrap())
    }

    async fn request_account_access(&self) -> Result<Vec<Address>, ChainError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.accounts.lock().unwrap().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

pub(crate) struct Fixture {
    pub(crate) account: Address,
    pub(crate) log: Arc<CallLog>,
    pub(crate) gas: Arc<MockToken>,
    pub(crate) bgs: Arc<MockToken>,
    pub(crate) pool: Arc<MockPool>,
    pub(crate) chain: Arc<MockChain>,
    pub(crate) contracts: ContractSet,
}

impl Fixture {
    /// One account on chain 97 with a staked position and zero allowances.
    pub(crate) fn new() -> Self {
        let account = Address::repeat_byte(0xaa);
        let log = Arc::new(CallLog::default());
        let gas = Arc::new(MockToken::new("GAS", Address::repeat_byte(0x01), Arc::clone(&log)));
        let bgs = Arc::new(MockToken::new("BGS", Address::repeat_byte(0x02), Arc::clone(&log)));
        let pool = Arc::new(MockPool {
            address: Address::repeat_byte(0x03),
            log: Arc::clone(&log),
            gas: Arc::clone(&gas),
            bgs: Arc::clone(&bgs),
            stake_info: Mutex::new(Ok(StakeView {
                staked_amount: U256::from(500),
                staked_at: 1_700_000_000,
                unlock_time: 1_702_592_000,
                pending_rewards: U256::from(7),
                total_earned: U256::from(21),
                share_bps: U256::from(2500),
            })),
            stats: Mutex::new(Ok(PoolStats {
                total_staked: U256::from(2000),
                total_stakers: U256::from(4),
                remaining_reward_pool: U256::from(1_000_000),
                current_apy: U256::from(120),
            })),
            send_error: Mutex::new(None),
        });
        gas.set_balance(U256::from(1000));
        bgs.set_balance(U256::from(300));

        let (events, _) = broadcast::channel(16);
        let chain = Arc::new(MockChain {
            accounts: Mutex::new(Ok(vec![account])),
            chain_id: Mutex::new(97),
            chain_id_error: Mutex::new(None),
            requests: AtomicUsize::new(0),
            events,
        });

        let contracts = ContractSet {
            stake_token: gas.clone(),
            reward_token: bgs.clone(),
            pool: pool.clone(),
        };

        Self {
            account,
            log,
            gas,
            bgs,
            pool,
            chain,
            contracts,
        }
    }

    pub(crate) fn no_stake_revert() -> ChainError {
        ChainError::Reverted {
            reason: Some(NO_STAKE_REVERT.to_owned()),
        }
    }
}
