use ethers::types::{TxHash, U256};
use log::info;

use super::PendingFlag;
use crate::{
    error::{Result, ValidationError},
    gateway::LedgerWriter,
    models::TaskId,
    wallet::WalletContext,
};

/// Arguments of a validated `createTask` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub reward: U256,
}

/// Parse a reward typed in base units
pub fn parse_reward(input: &str) -> std::result::Result<U256, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::EmptyReward);
    }
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::MalformedReward(input.to_owned()));
    }
    let reward = U256::from_dec_str(input)
        .map_err(|_| ValidationError::MalformedReward(input.to_owned()))?;
    if reward.is_zero() {
        return Err(ValidationError::NonPositiveReward);
    }
    Ok(reward)
}

pub fn parse_task_id(input: &str) -> std::result::Result<TaskId, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::EmptyTaskId);
    }
    input
        .parse()
        .map(TaskId)
        .map_err(|_| ValidationError::MalformedTaskId(input.to_owned()))
}

#[derive(Debug, Default)]
pub struct CreateTaskForm {
    pub title: String,
    pub description: String,
    pub reward: String,
    last_tx: Option<TxHash>,
    pending: PendingFlag,
}

impl CreateTaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> std::result::Result<CreateTask, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let reward = parse_reward(&self.reward)?;

        Ok(CreateTask {
            title: title.to_owned(),
            description: description.to_owned(),
            reward,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Hash of the last task created from this form
    pub fn last_tx(&self) -> Option<TxHash> {
        self.last_tx
    }

    /// Create the task. The fields are cleared on success and kept on failure.
    pub async fn submit<W: LedgerWriter>(&mut self, wallet: &WalletContext<W>) -> Result<TxHash> {
        let request = self.validate()?;
        let session = wallet.session()?;

        let tx_hash = {
            let _pending = self.pending.begin()?;
            session
                .writer
                .create_task(&request.title, &request.description, request.reward)
                .await?
        };
        info!("Created bounty {:?} in {tx_hash:?}", request.title);

        self.title.clear();
        self.description.clear();
        self.reward.clear();
        self.last_tx = Some(tx_hash);

        Ok(tx_hash)
    }
}

/// Accept a task by typing its id, without opening its detail page
#[derive(Debug, Default)]
pub struct AcceptByIdForm {
    pub task_id: String,
    pending: PendingFlag,
}

impl AcceptByIdForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    pub async fn submit<W: LedgerWriter>(&mut self, wallet: &WalletContext<W>) -> Result<TxHash> {
        let id = parse_task_id(&self.task_id)?;
        let session = wallet.session()?;

        let tx_hash = {
            let _pending = self.pending.begin()?;
            session.writer.accept_task(id).await?
        };
        info!("Bounty #{id} accepted in {tx_hash:?}");

        self.task_id.clear();
        Ok(tx_hash)
    }
}
