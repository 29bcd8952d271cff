use ir_api_types::OperationKind;
use ir_api_types::units::AmountError;
use ir_chain_client::ChainError;
use std::fmt;
use thiserror::Error;

/// Longest raw provider text shown to a user.
const MAX_MESSAGE_LEN: usize = 100;

/// The point of a multi-step operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    Approval,
    Action(OperationKind),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Approval => f.write_str("approval"),
            Self::Action(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotReady {
    #[error("no account connected")]
    NoAccount,
    #[error(
        "wrong network: expected chain {expected}, connected to {}",
        .actual.map_or_else(|| "unknown".to_owned(), |id| id.to_string())
    )]
    WrongChain { expected: u64, actual: Option<u64> },
    #[error("contracts not ready")]
    ContractsUnbound,
    #[error("another operation is pending")]
    OperationPending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    #[error("not ready: {0}")]
    NotReady(#[from] NotReady),
    #[error("{step} was cancelled in the wallet")]
    UserRejected { step: Step },
    #[error("insufficient funds for {step}")]
    InsufficientFunds { step: Step },
    #[error("approval failed: {source}")]
    ApprovalFailed { source: ChainError },
    #[error(
        "{action} reverted{}",
        .reason.as_ref().map(|reason| format!(": {reason}")).unwrap_or_default()
    )]
    ActionReverted {
        action: OperationKind,
        reason: Option<String>,
    },
    /// The action was submitted but its outcome could not be read back.
    #[error("{action} outcome unknown: {source}")]
    ConfirmationUnknown { action: OperationKind, source: ChainError },
    #[error("data unavailable: {source}")]
    DataUnavailable { source: ChainError },
    #[error("account has no stake")]
    NoStake,
}

impl StakingError {
    /// Translates a failed provider request made during `step`.
    pub fn from_chain(step: Step, err: ChainError) -> Self {
        match (step, err) {
            (step, ChainError::Rejected) => Self::UserRejected { step },
            (step, ChainError::InsufficientFunds) => Self::InsufficientFunds { step },
            (Step::Approval, source) => Self::ApprovalFailed { source },
            (Step::Action(action), ChainError::Reverted { reason }) => Self::ActionReverted { action, reason },
            (Step::Action(action), source @ (ChainError::Transport(_) | ChainError::Decode(_))) => {
                Self::ConfirmationUnknown { action, source }
            }
            (Step::Action(action), other) => Self::ActionReverted {
                action,
                reason: Some(other.to_string()),
            },
            (Step::Connect, source) => Self::DataUnavailable { source },
        }
    }

    /// Stable machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "invalid_amount",
            Self::NotReady(_) => "not_ready",
            Self::UserRejected { .. } => "user_rejected",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::ApprovalFailed { .. } => "approval_failed",
            Self::ActionReverted { .. } => "action_reverted",
            Self::ConfirmationUnknown { .. } => "confirmation_unknown",
            Self::DataUnavailable { .. } => "data_unavailable",
            Self::NoStake => "no_stake",
        }
    }

    pub fn failed_step(&self) -> Option<Step> {
        match self {
            Self::UserRejected { step } | Self::InsufficientFunds { step } => Some(*step),
            Self::ApprovalFailed { .. } => Some(Step::Approval),
            Self::ActionReverted { action, .. } | Self::ConfirmationUnknown { action, .. } => {
                Some(Step::Action(*action))
            }
            _ => None,
        }
    }

    /// Reworded message safe to show a user. Raw provider text is truncated.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAmount(err) => format!("Please enter a valid amount ({err})"),
            Self::NotReady(NotReady::NoAccount) => "Please connect wallet first".to_owned(),
            Self::NotReady(NotReady::WrongChain { expected, .. }) => {
                format!("Please switch to the supported network (chain id {expected})")
            }
            Self::NotReady(NotReady::ContractsUnbound) => "Contracts not ready. Please refresh the page".to_owned(),
            Self::NotReady(NotReady::OperationPending) => {
                "Another transaction is still pending. Please wait for it to finish".to_owned()
            }
            Self::UserRejected { step: Step::Connect } => "User denied connection".to_owned(),
            Self::UserRejected { .. } => "Transaction was cancelled".to_owned(),
            Self::InsufficientFunds { .. } => "Insufficient balance for transaction".to_owned(),
            Self::ApprovalFailed { source } => match source.revert_reason() {
                Some(reason) => format!("Approval failed: {}", truncate(reason)),
                None => format!("Approval failed: {}", truncate(&source.to_string())),
            },
            Self::ActionReverted { reason: Some(reason), .. } => {
                format!("Transaction failed: {}", truncate(reason))
            }
            Self::ActionReverted { reason: None, .. } => "Transaction failed".to_owned(),
            Self::ConfirmationUnknown { source, .. } => format!(
                "Transaction status unknown, check your wallet before retrying: {}",
                truncate(&source.to_string())
            ),
            Self::DataUnavailable { source } => format!("Failed to load data: {}", truncate(&source.to_string())),
            Self::NoStake => "No stake yet".to_owned(),
        }
    }
}

fn truncate(message: &str) -> String {
    if message.chars().count() <= MAX_MESSAGE_LEN {
        return message.to_owned();
    }
    let head: String = message.chars().take(MAX_MESSAGE_LEN).collect();
    format!("{head}...")
}
