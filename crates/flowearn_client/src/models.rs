use std::fmt;

use ethers::types::{Address, U256};
use flowearn_contract::Task as TaskRecord;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Position of a task on the board, as used by `getTask`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TaskId> for U256 {
    fn from(id: TaskId) -> Self {
        U256::from(id.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Amount in the smallest currency unit
    pub reward: U256,
    /// Account that created the bounty
    pub creator: Address,
    /// Account that accepted the bounty, if any
    pub worker: Option<Address>,
    /// Latest proof submitted by the worker
    pub proof: Option<String>,
    pub completed: bool,
    pub paid: bool,
    /// Seconds since epoch
    pub created_at: u64,
    pub completed_at: Option<u64>,
}

impl Task {
    /// Validate a record returned by the contract.
    ///
    /// Sentinels are resolved here: the zero address becomes an unassigned worker, an empty proof
    /// becomes `None`, and a zero completion time becomes `None`.
    pub fn from_record(id: TaskId, record: TaskRecord) -> Result<Task, LedgerError> {
        let created_at = timestamp(id, "createdAt", record.created_at)?;
        let completed_at = timestamp(id, "completedAt", record.completed_at)?;

        Ok(Task {
            id,
            title: record.title,
            description: record.description,
            reward: record.reward,
            creator: record.creator,
            worker: (!record.worker.is_zero()).then_some(record.worker),
            proof: (!record.proof.is_empty()).then_some(record.proof),
            completed: record.completed,
            paid: record.paid,
            created_at,
            completed_at: (completed_at != 0).then_some(completed_at),
        })
    }

    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            format!("Bounty #{}", self.id)
        } else {
            self.title.clone()
        }
    }

    pub fn display_description(&self) -> &str {
        if self.description.is_empty() {
            "No description provided."
        } else {
            &self.description
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.worker.is_some()
    }
}

fn timestamp(id: TaskId, field: &str, value: U256) -> Result<u64, LedgerError> {
    if value > U256::from(u64::MAX) {
        return Err(LedgerError::Malformed(format!(
            "bounty #{id} has out of range {field} {value}"
        )));
    }
    Ok(value.as_u64())
}

/// First six and last four characters of the checksummed address, e.g. `0x5257...6FE2`
pub fn short_address(address: &Address) -> String {
    let full = ethers::utils::to_checksum(address, None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
