//! Runs an optional allowance step followed by exactly one action, one
//! operation per session at a time.

use alloy_primitives::{Address, U256};
use ir_api_types::units::AmountError;
use ir_api_types::{OperationKind, OperationPhase, PendingOperationInfo};
use ir_chain_client::{ChainError, ContractSet, TokenBinding, TxReceipt};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::allowance::{ApprovalOutcome, ensure_allowance};
use crate::error::{NotReady, StakingError, Step};

pub struct AllowanceStep {
    pub token: Arc<dyn TokenBinding>,
    pub spender: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStep {
    Stake(U256),
    WithdrawRewards,
    Burn(U256),
    ReturnToPool(U256),
}

impl ActionStep {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Stake(_) => OperationKind::Stake,
            Self::WithdrawRewards => OperationKind::WithdrawRewards,
            Self::Burn(_) => OperationKind::Burn,
            Self::ReturnToPool(_) => OperationKind::ReturnToPool,
        }
    }

    pub fn amount(&self) -> Option<U256> {
        match self {
            Self::Stake(amount) | Self::Burn(amount) | Self::ReturnToPool(amount) => Some(*amount),
            Self::WithdrawRewards => None,
        }
    }
}

pub struct GuardedOperation {
    pub allowance: Option<AllowanceStep>,
    pub action: ActionStep,
}

impl GuardedOperation {
    /// GAS allowance for the pool, then `stake`.
    pub fn stake(contracts: &ContractSet, amount: U256) -> Self {
        Self {
            allowance: Some(AllowanceStep {
                token: Arc::clone(&contracts.stake_token),
                spender: contracts.pool.address(),
                amount,
            }),
            action: ActionStep::Stake(amount),
        }
    }

    pub fn withdraw_rewards() -> Self {
        Self {
            allowance: None,
            action: ActionStep::WithdrawRewards,
        }
    }

    /// Burning spends the caller's own balance, so no allowance is involved.
    pub fn burn(amount: U256) -> Self {
        Self {
            allowance: None,
            action: ActionStep::Burn(amount),
        }
    }

    /// BGS allowance for the pool, then `returnToPool`.
    pub fn recycle_pool(contracts: &ContractSet, amount: U256) -> Self {
        Self {
            allowance: Some(AllowanceStep {
                token: Arc::clone(&contracts.reward_token),
                spender: contracts.pool.address(),
                amount,
            }),
            action: ActionStep::ReturnToPool(amount),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.action.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReceipt {
    pub operation_id: Uuid,
    pub operation: OperationKind,
    pub approval: Option<ApprovalOutcome>,
    pub action: TxReceipt,
}

impl OperationReceipt {
    pub fn approval_sent(&self) -> bool {
        self.approval
            .as_ref()
            .is_some_and(|outcome| outcome.receipt().is_some())
    }
}

/// Clears the in-flight slot when the operation finishes, however it ends.
struct PendingGuard<'a> {
    slot: &'a Mutex<Option<PendingOperationInfo>>,
}

impl PendingGuard<'_> {
    fn advance(&self, phase: OperationPhase) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(pending) = slot.as_mut() {
                pending.phase = phase;
            }
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

#[derive(Default)]
pub struct Orchestrator {
    pending: Mutex<Option<PendingOperationInfo>>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<PendingOperationInfo> {
        self.pending.lock().ok().and_then(|slot| slot.clone())
    }

    fn begin(&self, operation: OperationKind) -> Result<(PendingGuard<'_>, Uuid), StakingError> {
        let mut slot = self
            .pending
            .lock()
            .map_err(|_| StakingError::NotReady(NotReady::OperationPending))?;
        if slot.is_some() {
            return Err(NotReady::OperationPending.into());
        }
        let operation_id = Uuid::new_v4();
        *slot = Some(PendingOperationInfo {
            operation_id,
            operation,
            phase: OperationPhase::Created,
        });
        Ok((PendingGuard { slot: &self.pending }, operation_id))
    }

    /// Runs `op` for `account`. The action is sent only after the allowance
    /// step, if any, resolved; any failure aborts without retry.
    pub async fn execute(
        &self,
        contracts: &ContractSet,
        account: Address,
        op: GuardedOperation,
    ) -> Result<OperationReceipt, StakingError> {
        if op.action.amount().is_some_and(|amount| amount.is_zero()) {
            return Err(AmountError::NotPositive.into());
        }

        let operation = op.kind();
        let (pending, operation_id) = self.begin(operation)?;
        info!("operation {} ({}) started for {}", operation_id, operation, account);

        let approval = match &op.allowance {
            Some(step) => {
                pending.advance(OperationPhase::Approving);
                let outcome = ensure_allowance(&*step.token, account, step.spender, step.amount)
                    .await
                    .inspect_err(|err| warn!("operation {} approval step failed: {}", operation_id, err))?;
                if let Some(receipt) = outcome.receipt() {
                    info!("operation {} approval confirmed in {}", operation_id, receipt.tx_hash);
                }
                Some(outcome)
            }
            None => None,
        };

        pending.advance(OperationPhase::Acting);
        let action = send_action(contracts, account, op.action)
            .await
            .and_then(|receipt| {
                if receipt.success {
                    Ok(receipt)
                } else {
                    Err(ChainError::Reverted { reason: None })
                }
            })
            .map_err(|err| StakingError::from_chain(Step::Action(operation), err))
            .inspect_err(|err| warn!("operation {} failed: {}", operation_id, err))?;

        info!("operation {} ({}) confirmed in {}", operation_id, operation, action.tx_hash);
        Ok(OperationReceipt {
            operation_id,
            operation,
            approval,
            action,
        })
    }
}

async fn send_action(contracts: &ContractSet, account: Address, action: ActionStep) -> Result<TxReceipt, ChainError> {
    match action {
        ActionStep::Stake(amount) => contracts.pool.stake(amount, account).await,
        ActionStep::WithdrawRewards => contracts.pool.withdraw_rewards(account).await,
        ActionStep::Burn(amount) => contracts.stake_token.burn(amount, account).await,
        ActionStep::ReturnToPool(amount) => contracts.pool.return_to_pool(amount, account).await,
    }
}
