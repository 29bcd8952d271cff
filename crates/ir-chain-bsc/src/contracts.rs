use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use ir_api_types::{PoolStats, StakeView};
use ir_chain_client::{ChainError, PoolBinding, TokenBinding, TxReceipt};
use std::sync::Arc;

use crate::rpc::RpcTransport;

sol! {
    interface IBurnableToken {
        function symbol() external view returns (string);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function burn(uint256 value) external returns (bool);
    }

    interface IStakingPool {
        function GAS_TOKEN() external view returns (address);
        function totalStaked() external view returns (uint256);
        function getUserStakeInfo(address user) external view returns (
            uint256 amount,
            uint256 stakedAt,
            uint256 unlockTime,
            uint256 pendingRewards,
            uint256 totalEarned,
            uint256 userShare
        );
        function getStakingStats() external view returns (
            uint256 totalStakedGAS,
            uint256 totalStakersCount,
            uint256 remainingBGS,
            uint256 currentAPY
        );
        function stake(uint256 amount) external;
        function withdrawRewards() external;
        function returnBGSToPool(uint256 amount) external;
    }
}

async fn read<C: SolCall + Send + Sync>(rpc: &RpcTransport, to: Address, call: C) -> Result<C::Return, ChainError> {
    let output = rpc.call(to, call.abi_encode().into()).await?;
    C::abi_decode_returns(&output, true).map_err(|err| ChainError::Decode(err.to_string()))
}

async fn send<C: SolCall + Send + Sync>(
    rpc: &RpcTransport,
    from: Address,
    to: Address,
    call: C,
) -> Result<TxReceipt, ChainError> {
    rpc.send_transaction(from, to, call.abi_encode().into()).await
}

/// ERC20 token with `burn`, used for both GAS and BGS.
pub struct Erc20Contract {
    address: Address,
    rpc: Arc<RpcTransport>,
}

impl Erc20Contract {
    pub fn new(address: Address, rpc: Arc<RpcTransport>) -> Self {
        Self { address, rpc }
    }
}

#[async_trait]
impl TokenBinding for Erc20Contract {
    fn address(&self) -> Address {
        self.address
    }

    async fn symbol(&self) -> Result<String, ChainError> {
        let ret = read(&self.rpc, self.address, IBurnableToken::symbolCall {}).await?;
        Ok(ret._0)
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, ChainError> {
        let ret = read(&self.rpc, self.address, IBurnableToken::balanceOfCall { account: owner }).await?;
        Ok(ret._0)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ChainError> {
        let ret = read(&self.rpc, self.address, IBurnableToken::allowanceCall { owner, spender }).await?;
        Ok(ret._0)
    }

    async fn approve(&self, spender: Address, amount: U256, from: Address) -> Result<TxReceipt, ChainError> {
        send(&self.rpc, from, self.address, IBurnableToken::approveCall { spender, amount }).await
    }

    async fn burn(&self, amount: U256, from: Address) -> Result<TxReceipt, ChainError> {
        send(&self.rpc, from, self.address, IBurnableToken::burnCall { value: amount }).await
    }
}

pub struct StakingPoolContract {
    address: Address,
    rpc: Arc<RpcTransport>,
}

impl StakingPoolContract {
    pub fn new(address: Address, rpc: Arc<RpcTransport>) -> Self {
        Self { address, rpc }
    }
}

#[async_trait]
impl PoolBinding for StakingPoolContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn stake_token(&self) -> Result<Address, ChainError> {
        let ret = read(&self.rpc, self.address, IStakingPool::GAS_TOKENCall {}).await?;
        Ok(ret._0)
    }

    async fn total_staked(&self) -> Result<U256, ChainError> {
        let ret = read(&self.rpc, self.address, IStakingPool::totalStakedCall {}).await?;
        Ok(ret._0)
    }

    async fn user_stake_info(&self, user: Address) -> Result<StakeView, ChainError> {
        let ret = read(&self.rpc, self.address, IStakingPool::getUserStakeInfoCall { user }).await?;
        Ok(StakeView {
            staked_amount: ret.amount,
            staked_at: ret.stakedAt.saturating_to::<u64>(),
            unlock_time: ret.unlockTime.saturating_to::<u64>(),
            pending_rewards: ret.pendingRewards,
            total_earned: ret.totalEarned,
            share_bps: ret.userShare,
        })
    }

    async fn staking_stats(&self) -> Result<PoolStats, ChainError> {
        let ret = read(&self.rpc, self.address, IStakingPool::getStakingStatsCall {}).await?;
        Ok(PoolStats {
            total_staked: ret.totalStakedGAS,
            total_stakers: ret.totalStakersCount,
            remaining_reward_pool: ret.remainingBGS,
            current_apy: ret.currentAPY,
        })
    }

    async fn stake(&self, amount: U256, from: Address) -> Result<TxReceipt, ChainError> {
        send(&self.rpc, from, self.address, IStakingPool::stakeCall { amount }).await
    }

    async fn withdraw_rewards(&self, from: Address) -> Result<TxReceipt, ChainError> {
        send(&self.rpc, from, self.address, IStakingPool::withdrawRewardsCall {}).await
    }

    async fn return_to_pool(&self, amount: U256, from: Address) -> Result<TxReceipt, ChainError> {
        send(&self.rpc, from, self.address, IStakingPool::returnBGSToPoolCall { amount }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;
    use axum::{Json, Router, extract::State, routing::post};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn token_selectors_match_erc20() {
        assert_eq!(IBurnableToken::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(IBurnableToken::allowanceCall::SELECTOR, [0xdd, 0x62, 0xed, 0x3e]);
        assert_eq!(IBurnableToken::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(IBurnableToken::burnCall::SELECTOR, [0x42, 0x96, 0x6c, 0x68]);
    }

    #[test]
    fn pool_selectors_are_distinct() {
        let selectors = [
            IStakingPool::stakeCall::SELECTOR,
            IStakingPool::withdrawRewardsCall::SELECTOR,
            IStakingPool::returnBGSToPoolCall::SELECTOR,
            IStakingPool::getUserStakeInfoCall::SELECTOR,
            IStakingPool::getStakingStatsCall::SELECTOR,
        ];
        for (i, a) in selectors.iter().enumerate() {
            for b in &selectors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(IStakingPool::stakeCall::SELECTOR, [0xa6, 0x94, 0xfc, 0x3a]);
    }

    /// Minimal JSON-RPC node answering the calls these bindings make.
    #[derive(Default)]
    struct MockNode {
        methods: Mutex<Vec<String>>,
        receipt_polls: Mutex<u32>,
    }

    async fn handle(State(node): State<Arc<MockNode>>, Json(request): Json<Value>) -> Json<Value> {
        let method = request["method"].as_str().unwrap_or_default().to_owned();
        node.methods.lock().unwrap().push(method.clone());
        let id = request["id"].clone();

        let reply = match method.as_str() {
            "eth_call" => {
                let data = request["params"][0]["data"].as_str().unwrap_or_default();
                let selector = &data[2..10];
                if selector == "70a08231" {
                    let balance = U256::from(1_250_000_000_000_000_000_u64);
                    json!({ "result": alloy_primitives::Bytes::from(balance.abi_encode()) })
                } else {
                    json!({ "error": { "code": 3, "message": "execution reverted: User has no stake" } })
                }
            }
            "eth_sendTransaction" => json!({ "result": format!("0x{}", "ab".repeat(32)) }),
            "eth_getTransactionReceipt" => {
                let mut polls = node.receipt_polls.lock().unwrap();
                *polls += 1;
                if *polls < 2 {
                    json!({ "result": null })
                } else {
                    json!({ "result": {
                        "transactionHash": format!("0x{}", "ab".repeat(32)),
                        "status": "0x1",
                        "blockNumber": "0x10"
                    } })
                }
            }
            _ => json!({ "error": { "code": -32601, "message": "method not found" } }),
        };

        let mut reply = reply;
        reply["jsonrpc"] = json!("2.0");
        reply["id"] = id;
        Json(reply)
    }

    async fn spawn_node() -> (Arc<MockNode>, Arc<RpcTransport>) {
        let node = Arc::new(MockNode::default());
        let app = Router::new().route("/", post(handle)).with_state(Arc::clone(&node));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let rpc = RpcTransport::new(Some(format!("http://{addr}")))
            .with_receipt_poll_interval(Duration::from_millis(10));
        (node, Arc::new(rpc))
    }

    #[tokio::test]
    async fn reads_balance_through_eth_call() {
        let (_node, rpc) = spawn_node().await;
        let token = Erc20Contract::new(Address::repeat_byte(0x01), rpc);

        let balance = token.balance_of(Address::repeat_byte(0x02)).await.unwrap();
        assert_eq!(balance, U256::from(1_250_000_000_000_000_000_u64));
    }

    #[tokio::test]
    async fn surfaces_no_stake_revert() {
        let (_node, rpc) = spawn_node().await;
        let pool = StakingPoolContract::new(Address::repeat_byte(0x03), rpc);

        let err = pool.user_stake_info(Address::repeat_byte(0x02)).await.unwrap_err();
        assert!(err.is_revert_with("User has no stake"));
    }

    #[tokio::test]
    async fn approve_waits_for_receipt() {
        let (node, rpc) = spawn_node().await;
        let token = Erc20Contract::new(Address::repeat_byte(0x01), rpc);

        let receipt = token
            .approve(Address::repeat_byte(0x03), U256::from(100), Address::repeat_byte(0x02))
            .await
            .unwrap();

        assert!(receipt.success);
        assert_eq!(receipt.block_number, Some(16));
        let methods = node.methods.lock().unwrap().clone();
        assert_eq!(
            methods,
            vec![
                "eth_sendTransaction",
                "eth_getTransactionReceipt",
                "eth_getTransactionReceipt"
            ]
        );
    }
}
