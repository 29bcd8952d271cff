//! Staking dashboard logic: allowance-guarded transactions, wallet view
//! reconciliation and session tracking over the chain client traits.

mod allowance;
mod client;
mod connection;
mod error;
mod orchestrator;
mod reconciler;

#[cfg(test)]
pub(crate) mod mock;

pub use allowance::{AllowanceError, ApprovalOutcome, ensure_allowance};
pub use client::{ClientConfig, ConnectOutcome, DEFAULT_EXPECTED_CHAIN_ID, OperationOutcome, StakingClient};
pub use connection::{RefreshReason, SessionEffect, apply_event, begin_connect, connected};
pub use error::{NotReady, StakingError, Step};
pub use orchestrator::{ActionStep, AllowanceStep, GuardedOperation, OperationReceipt, Orchestrator};
pub use reconciler::{DEFAULT_NO_STAKE_PHRASE, Reconciler};
