//! In-memory stand-in for the task board contract

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use ethers::types::{Address, TxHash, U256};
use log::LevelFilter;
use tokio::sync::Notify;

use crate::{
    error::LedgerError,
    gateway::{LedgerReader, LedgerWriter},
    models::{Task, TaskId},
};

pub const NOW: u64 = 1_700_000_000;

pub fn init() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

#[derive(Default)]
pub struct MemoryLedger {
    caller: Address,
    tasks: Mutex<Vec<Task>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: Mutex<Option<LedgerError>>,
    /// When set, the next write waits here after being counted and before applying
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryLedger {
    pub fn new(caller: Address) -> Self {
        MemoryLedger {
            caller,
            ..Default::default()
        }
    }

    pub fn with_tasks(caller: Address, tasks: Vec<Task>) -> Self {
        let ledger = Self::new(caller);
        *ledger.tasks.lock().unwrap() = tasks;
        ledger
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn task(&self, id: u64) -> Task {
        self.tasks.lock().unwrap()[id as usize].clone()
    }

    pub fn update(&self, id: u64, f: impl FnOnce(&mut Task)) {
        f(&mut self.tasks.lock().unwrap()[id as usize]);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, err: Option<LedgerError>) {
        *self.fail_writes.lock().unwrap() = err;
    }

    /// Hold the next write until the returned handle is notified
    pub fn hold_writes(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    async fn begin_write(&self) -> Result<TxHash, LedgerError> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(err) = self.fail_writes.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(TxHash::from_low_u64_be(n as u64))
    }

    fn with_task<T>(
        &self,
        id: TaskId,
        f: impl FnOnce(&mut Task) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(id.0 as usize)
            .ok_or_else(|| LedgerError::Reverted("Invalid task".into()))?;
        f(task)
    }
}

impl LedgerReader for MemoryLedger {
    async fn get_task(&self, id: TaskId) -> Result<Task, LedgerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("connection refused".into()));
        }
        self.tasks
            .lock()
            .unwrap()
            .get(id.0 as usize)
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }

    async fn get_tasks(&self) -> Result<Vec<Task>, LedgerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("connection refused".into()));
        }
        Ok(self.tasks.lock().unwrap().clone())
    }
}

impl LedgerWriter for MemoryLedger {
    async fn create_task(
        &self,
        title: &str,
        description: &str,
        reward: U256,
    ) -> Result<TxHash, LedgerError> {
        let tx = self.begin_write().await?;
        let mut tasks = self.tasks.lock().unwrap();
        let id = TaskId(tasks.len() as u64);
        tasks.push(Task {
            id,
            title: title.into(),
            description: description.into(),
            reward,
            creator: self.caller,
            worker: None,
            proof: None,
            completed: false,
            paid: false,
            created_at: NOW,
            completed_at: None,
        });
        Ok(tx)
    }

    async fn accept_task(&self, id: TaskId) -> Result<TxHash, LedgerError> {
        let tx = self.begin_write().await?;
        self.with_task(id, |task| {
            if task.completed {
                return Err(LedgerError::Reverted("Task already completed".into()));
            }
            if task.worker.is_some() {
                return Err(LedgerError::Reverted("Task already taken".into()));
            }
            task.worker = Some(self.caller);
            Ok(tx)
        })
    }

    async fn submit_proof(&self, id: TaskId, proof: &str) -> Result<TxHash, LedgerError> {
        let tx = self.begin_write().await?;
        self.with_task(id, |task| {
            if task.worker != Some(self.caller) {
                return Err(LedgerError::Reverted("Not assigned worker".into()));
            }
            task.proof = Some(proof.into());
            Ok(tx)
        })
    }
}
