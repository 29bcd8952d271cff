//! Decides whether an approval must precede a spend.

use alloy_primitives::{Address, U256};
use ir_chain_client::{ChainError, TokenBinding, TxReceipt};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{StakingError, Step};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The existing allowance covers the spend; nothing was sent.
    Sufficient { allowance: U256 },
    /// One approval for exactly the required amount was confirmed.
    Approved(TxReceipt),
}

impl ApprovalOutcome {
    pub fn receipt(&self) -> Option<&TxReceipt> {
        match self {
            Self::Sufficient { .. } => None,
            Self::Approved(receipt) => Some(receipt),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllowanceError {
    #[error("allowance read failed: {0}")]
    Read(ChainError),
    #[error("approval failed: {0}")]
    ApprovalFailed(ChainError),
}

impl From<AllowanceError> for StakingError {
    fn from(err: AllowanceError) -> Self {
        match err {
            AllowanceError::Read(source) => StakingError::DataUnavailable { source },
            AllowanceError::ApprovalFailed(source) => StakingError::from_chain(Step::Approval, source),
        }
    }
}

/// Reads the current allowance fresh and approves `required` only when the
/// allowance is strictly lower. Sends at most one transaction.
pub async fn ensure_allowance(
    token: &dyn TokenBinding,
    owner: Address,
    spender: Address,
    required: U256,
) -> Result<ApprovalOutcome, AllowanceError> {
    let current = token
        .allowance(owner, spender)
        .await
        .map_err(AllowanceError::Read)?;

    if current >= required {
        return Ok(ApprovalOutcome::Sufficient { allowance: current });
    }

    info!(
        "allowance {} of {} for {} below {}, requesting approval",
        current,
        token.address(),
        spender,
        required
    );
    let receipt = token
        .approve(spender, required, owner)
        .await
        .map_err(AllowanceError::ApprovalFailed)?;
    if !receipt.success {
        warn!("approval {} for {} was mined but reverted", receipt.tx_hash, spender);
        return Err(AllowanceError::ApprovalFailed(ChainError::Reverted { reason: None }));
    }
    Ok(ApprovalOutcome::Approved(receipt))
}
