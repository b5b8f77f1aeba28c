use ethers::types::TxHash;
use thiserror::Error;

use crate::models::TaskId;

/// Failure talking to the task board contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Could not reach the network: {0}")]
    Transport(String),

    #[error("Bounty #{0} not found")]
    NotFound(TaskId),

    #[error("Transaction was rejected: {0}")]
    Rejected(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Transaction {0:?} was dropped before it was mined")]
    Dropped(TxHash),

    #[error("Malformed task record: {0}")]
    Malformed(String),
}

/// Input rejected before anything is sent to the network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a task title")]
    EmptyTitle,

    #[error("Please enter a task description")]
    EmptyDescription,

    #[error("Please enter a reward amount")]
    EmptyReward,

    #[error("Reward must be a whole number of base units, got {0:?}")]
    MalformedReward(String),

    #[error("Reward must be greater than zero")]
    NonPositiveReward,

    #[error("Please enter your proof before submitting.")]
    EmptyProof,

    #[error("Please enter a task ID!")]
    EmptyTaskId,

    #[error("Task ID must be a number, got {0:?}")]
    MalformedTaskId(String),
}

/// Why a user action did not go through. Every message is meant to be shown as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Please connect your wallet first!")]
    NotConnected,

    #[error("A transaction is already in progress")]
    Pending,

    #[error("Bounty is already completed")]
    AlreadyCompleted,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, ActionError>;
