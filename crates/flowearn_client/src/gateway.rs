//! Calls against the task board contract
//!
//! [`LedgerReader`] and [`LedgerWriter`] are the only way the rest of the crate touches the chain.
//! [`ContractGateway`] implements them over the abigen bindings; tests swap in an in-memory ledger.

use ethers::{
    abi::Detokenize,
    contract::{ContractCall, ContractError},
    providers::Middleware,
    types::{Address, TxHash, U256, U64},
};
use flowearn_contract::FlowEarn;
use log::{debug, info};

use crate::{
    error::LedgerError,
    models::{Task, TaskId},
};

/// Side effect free queries
#[allow(async_fn_in_trait)]
pub trait LedgerReader {
    async fn get_task(&self, id: TaskId) -> Result<Task, LedgerError>;

    async fn get_tasks(&self) -> Result<Vec<Task>, LedgerError>;
}

/// State changing commands. Each resolves once the transaction is mined.
#[allow(async_fn_in_trait)]
pub trait LedgerWriter {
    async fn create_task(
        &self,
        title: &str,
        description: &str,
        reward: U256,
    ) -> Result<TxHash, LedgerError>;

    async fn accept_task(&self, id: TaskId) -> Result<TxHash, LedgerError>;

    async fn submit_proof(&self, id: TaskId, proof: &str) -> Result<TxHash, LedgerError>;
}

impl<T: LedgerReader> LedgerReader for &T {
    async fn get_task(&self, id: TaskId) -> Result<Task, LedgerError> {
        (**self).get_task(id).await
    }

    async fn get_tasks(&self) -> Result<Vec<Task>, LedgerError> {
        (**self).get_tasks().await
    }
}

impl<T: LedgerWriter> LedgerWriter for &T {
    async fn create_task(
        &self,
        title: &str,
        description: &str,
        reward: U256,
    ) -> Result<TxHash, LedgerError> {
        (**self).create_task(title, description, reward).await
    }

    async fn accept_task(&self, id: TaskId) -> Result<TxHash, LedgerError> {
        (**self).accept_task(id).await
    }

    async fn submit_proof(&self, id: TaskId, proof: &str) -> Result<TxHash, LedgerError> {
        (**self).submit_proof(id, proof).await
    }
}

pub struct ContractGateway<M> {
    contract: FlowEarn<M>,
}

impl<M: Middleware + 'static> ContractGateway<M> {
    pub fn new(contract: FlowEarn<M>) -> Self {
        ContractGateway { contract }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }
}

impl<M: Middleware + 'static> LedgerReader for ContractGateway<M> {
    async fn get_task(&self, id: TaskId) -> Result<Task, LedgerError> {
        debug!("getTask({id})");

        let record = self
            .contract
            .get_task(id.into())
            .call()
            .await
            .map_err(|err| {
                // the contract reverts on ids past the end of the board
                if err.is_revert() {
                    LedgerError::NotFound(id)
                } else {
                    read_error(err)
                }
            })?;

        Task::from_record(id, record)
    }

    async fn get_tasks(&self) -> Result<Vec<Task>, LedgerError> {
        debug!("getTasks()");

        let records = self
            .contract
            .get_tasks()
            .call()
            .await
            .map_err(read_error)?;

        debug!("got {} tasks", records.len());

        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| Task::from_record(TaskId(i as u64), record))
            .collect()
    }
}

impl<M: Middleware + 'static> LedgerWriter for ContractGateway<M> {
    async fn create_task(
        &self,
        title: &str,
        description: &str,
        reward: U256,
    ) -> Result<TxHash, LedgerError> {
        debug!("createTask({title:?}, {reward})");

        let call = self
            .contract
            .create_task(title.to_owned(), description.to_owned(), reward);
        confirm(call).await
    }

    async fn accept_task(&self, id: TaskId) -> Result<TxHash, LedgerError> {
        debug!("acceptTask({id})");

        confirm(self.contract.accept_task(id.into())).await
    }

    async fn submit_proof(&self, id: TaskId, proof: &str) -> Result<TxHash, LedgerError> {
        debug!("submitProof({id}, {proof:?})");

        confirm(self.contract.submit_proof(id.into(), proof.to_owned())).await
    }
}

/// Send the transaction and wait for its receipt
async fn confirm<M: Middleware + 'static, D: Detokenize>(
    call: ContractCall<M, D>,
) -> Result<TxHash, LedgerError> {
    let pending = call.send().await.map_err(write_error)?;
    let tx_hash = pending.tx_hash();

    debug!("sent transaction {tx_hash:?}");

    let receipt = pending
        .await
        .map_err(|err| LedgerError::Transport(err.to_string()))?;

    match receipt {
        Some(receipt) if receipt.status == Some(U64::from(1)) => {
            info!("transaction {tx_hash:?} mined in block {:?}", receipt.block_number);
            Ok(tx_hash)
        },
        Some(_) => Err(LedgerError::Reverted(format!(
            "transaction {tx_hash:?} failed on chain"
        ))),
        None => Err(LedgerError::Dropped(tx_hash)),
    }
}

fn read_error<M: Middleware>(err: ContractError<M>) -> LedgerError {
    match err {
        ContractError::DecodingError(_)
        | ContractError::AbiError(_)
        | ContractError::DetokenizationError(_) => LedgerError::Malformed(err.to_string()),
        _ => LedgerError::Transport(err.to_string()),
    }
}

fn write_error<M: Middleware>(err: ContractError<M>) -> LedgerError {
    if err.is_revert() {
        return LedgerError::Reverted(err.to_string());
    }
    match err {
        ContractError::ProviderError { .. } => LedgerError::Transport(err.to_string()),
        // signer refused, gas estimation failed, insufficient funds, ...
        _ => LedgerError::Rejected(err.to_string()),
    }
}
