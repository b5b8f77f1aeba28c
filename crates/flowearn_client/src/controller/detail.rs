use ethers::types::TxHash;
use log::{info, warn};
use tokio::sync::RwLock;

use super::PendingFlag;
use crate::{
    error::{ActionError, LedgerError, Result, ValidationError},
    gateway::{LedgerReader, LedgerWriter},
    models::{Task, TaskId},
    wallet::WalletContext,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Loading,
    Failed(LedgerError),
    NotFound(TaskId),
    Ready {
        task: Task,
        /// A write is in flight; the action controls should be disabled
        pending: bool,
        stale: Option<LedgerError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    pub tx_hash: TxHash,
    /// The task was re-read after the transaction was mined
    pub refreshed: bool,
}

/// Detail page of a single bounty
#[derive(Debug)]
pub struct TaskDetail {
    id: TaskId,
    task: RwLock<Option<Task>>,
    last_error: RwLock<Option<LedgerError>>,
    pending: PendingFlag,
}

impl TaskDetail {
    pub fn new(id: TaskId) -> Self {
        TaskDetail {
            id,
            task: RwLock::new(None),
            last_error: RwLock::new(None),
            pending: PendingFlag::default(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    pub async fn snapshot(&self) -> Option<Task> {
        self.task.read().await.clone()
    }

    /// Read the task. On failure the previous snapshot is kept, unless the task does not exist.
    pub async fn load<R: LedgerReader>(&self, reader: &R) -> std::result::Result<Task, LedgerError> {
        let res = reader.get_task(self.id).await;
        match &res {
            Ok(task) => {
                *self.task.write().await = Some(task.clone());
                *self.last_error.write().await = None;
            },
            Err(err) => {
                warn!("Failed to load bounty #{}: {err}", self.id);
                if matches!(err, LedgerError::NotFound(_)) {
                    *self.task.write().await = None;
                }
                *self.last_error.write().await = Some(err.clone());
            },
        }
        res
    }

    pub async fn view(&self) -> DetailView {
        let stale = self.last_error.read().await.clone();
        match (self.snapshot().await, stale) {
            (Some(task), stale) => DetailView::Ready {
                task,
                pending: self.is_pending(),
                stale,
            },
            (None, Some(LedgerError::NotFound(id))) => DetailView::NotFound(id),
            (None, Some(err)) => DetailView::Failed(err),
            (None, None) => DetailView::Loading,
        }
    }

    /// Take the task as the connected account
    pub async fn accept<R: LedgerReader, W: LedgerWriter>(
        &self,
        reader: &R,
        wallet: &WalletContext<W>,
    ) -> Result<ActionOutcome> {
        let session = wallet.session()?;
        let _pending = self.pending.begin()?;

        let task = match self.snapshot().await {
            Some(task) => task,
            None => self.load(reader).await?,
        };
        if task.completed {
            return Err(ActionError::AlreadyCompleted);
        }

        let tx_hash = session.writer.accept_task(self.id).await?;
        info!("Bounty #{} accepted by {:?} in {tx_hash:?}", self.id, session.account);

        let refreshed = self.reload_after_write(reader).await;
        Ok(ActionOutcome { tx_hash, refreshed })
    }

    /// Attach proof of work. Later submissions replace earlier ones.
    pub async fn submit_proof<R: LedgerReader, W: LedgerWriter>(
        &self,
        reader: &R,
        wallet: &WalletContext<W>,
        proof: &str,
    ) -> Result<ActionOutcome> {
        if proof.trim().is_empty() {
            return Err(ValidationError::EmptyProof.into());
        }

        let session = wallet.session()?;
        let _pending = self.pending.begin()?;

        let tx_hash = session.writer.submit_proof(self.id, proof).await?;
        info!("Proof submitted for bounty #{} in {tx_hash:?}", self.id);

        let refreshed = self.reload_after_write(reader).await;
        Ok(ActionOutcome { tx_hash, refreshed })
    }

    async fn reload_after_write<R: LedgerReader>(&self, reader: &R) -> bool {
        self.load(reader).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::Address;

    use super::*;
    use crate::{
        models::fixtures::{task, worker},
        testing::{init, MemoryLedger},
    };

    fn board() -> MemoryLedger {
        MemoryLedger::with_tasks(worker(), (0..3).map(|i| task(i, 100)).collect())
    }

    #[tokio::test]
    async fn test_load_and_view() {
        init();

        let ledger = board();
        let detail = TaskDetail::new(TaskId(1));
        assert_eq!(detail.view().await, DetailView::Loading);

        detail.load(&ledger).await.unwrap();
        let DetailView::Ready { task, pending, stale } = detail.view().await else {
            panic!("expected ready view");
        };
        assert_eq!(task.id, TaskId(1));
        assert!(!pending);
        assert_eq!(stale, None);

        let missing = TaskDetail::new(TaskId(9));
        assert!(missing.load(&ledger).await.is_err());
        assert_eq!(missing.view().await, DetailView::NotFound(TaskId(9)));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_snapshot() {
        init();

        let ledger = board();
        let detail = TaskDetail::new(TaskId(0));
        detail.load(&ledger).await.unwrap();

        ledger.fail_reads(true);
        assert!(detail.load(&ledger).await.is_err());
        let DetailView::Ready { task, stale, .. } = detail.view().await else {
            panic!("expected stale task");
        };
        assert_eq!(task.id, TaskId(0));
        assert!(matches!(stale, Some(LedgerError::Transport(_))));

        let fresh = TaskDetail::new(TaskId(0));
        assert!(fresh.load(&ledger).await.is_err());
        assert!(matches!(fresh.view().await, DetailView::Failed(_)));
    }

    #[tokio::test]
    async fn test_accept_rereads() {
        init();

        let ledger = board();
        let wallet = WalletContext::connected(worker(), &ledger);
        let detail = TaskDetail::new(TaskId(2));

        let outcome = detail.accept(&ledger, &wallet).await.unwrap();
        assert!(outcome.refreshed);
        assert_eq!(ledger.writes(), 1);
        assert_eq!(detail.snapshot().await.unwrap().worker, Some(worker()));
        assert!(!detail.is_pending());
    }

    #[tokio::test]
    async fn test_accept_requires_wallet() {
        init();

        let ledger = board();
        let wallet = WalletContext::<&MemoryLedger>::disconnected();
        let detail = TaskDetail::new(TaskId(0));

        let err = detail.accept(&ledger, &wallet).await.unwrap_err();
        assert_eq!(err, ActionError::NotConnected);
        assert_eq!(err.to_string(), "Please connect your wallet first!");
        assert_eq!(ledger.writes(), 0);
    }

    #[tokio::test]
    async fn test_accept_completed() {
        init();

        let ledger = board();
        ledger.update(0, |task| task.completed = true);
        let wallet = WalletContext::connected(worker(), &ledger);
        let detail = TaskDetail::new(TaskId(0));

        let err = detail.accept(&ledger, &wallet).await.unwrap_err();
        assert_eq!(err, ActionError::AlreadyCompleted);
        assert_eq!(ledger.writes(), 0);
        // released so a later action can go through
        assert!(!detail.is_pending());
    }

    #[tokio::test]
    async fn test_accept_while_pending() {
        init();

        let ledger = board();
        let wallet = WalletContext::connected(worker(), &ledger);
        let detail = TaskDetail::new(TaskId(0));
        detail.load(&ledger).await.unwrap();

        let gate = ledger.hold_writes();
        let first = detail.accept(&ledger, &wallet);
        let second = async {
            // let the first accept reach the held write
            while !detail.is_pending() {
                tokio::task::yield_now().await;
            }
            let dup_accept = detail.accept(&ledger, &wallet).await;
            let dup_proof = detail.submit_proof(&ledger, &wallet, "https://proof").await;
            gate.notify_one();
            (dup_accept, dup_proof)
        };

        let (first, (dup_accept, dup_proof)) = tokio::join!(first, second);
        assert!(first.is_ok());
        assert_eq!(dup_accept.unwrap_err(), ActionError::Pending);
        assert_eq!(dup_proof.unwrap_err(), ActionError::Pending);
        assert_eq!(ledger.writes(), 1);
        assert!(!detail.is_pending());
    }

    #[tokio::test]
    async fn test_rejected_write_reenables() {
        init();

        let ledger = board();
        let wallet = WalletContext::connected(worker(), &ledger);
        let detail = TaskDetail::new(TaskId(0));

        ledger.fail_writes(Some(LedgerError::Rejected("user denied signature".into())));
        let err = detail.accept(&ledger, &wallet).await.unwrap_err();
        assert!(matches!(err, ActionError::Ledger(LedgerError::Rejected(_))));
        assert!(!detail.is_pending());

        ledger.fail_writes(None);
        assert!(detail.accept(&ledger, &wallet).await.is_ok());
        assert_eq!(ledger.writes(), 2);
    }

    #[tokio::test]
    async fn test_empty_proof_makes_no_calls() {
        init();

        let ledger = board();
        let wallet = WalletContext::connected(worker(), &ledger);
        let detail = TaskDetail::new(TaskId(0));

        for proof in ["", "   ", "\n"] {
            let err = detail.submit_proof(&ledger, &wallet, proof).await.unwrap_err();
            assert_eq!(err, ActionError::Validation(ValidationError::EmptyProof));
            assert_eq!(err.to_string(), "Please enter your proof before submitting.");
        }

        assert_eq!(ledger.reads(), 0);
        assert_eq!(ledger.writes(), 0);
        assert_eq!(detail.view().await, DetailView::Loading);
    }

    #[tokio::test]
    async fn test_submit_proof() {
        init();

        let ledger = board();
        let wallet = WalletContext::connected(worker(), &ledger);
        let detail = TaskDetail::new(TaskId(1));
        detail.accept(&ledger, &wallet).await.unwrap();

        detail
            .submit_proof(&ledger, &wallet, "https://github.com/flow/pr/1")
            .await
            .unwrap();
        detail
            .submit_proof(&ledger, &wallet, "https://github.com/flow/pr/2")
            .await
            .unwrap();

        // last write wins
        let task = detail.snapshot().await.unwrap();
        assert_eq!(task.proof.as_deref(), Some("https://github.com/flow/pr/2"));
    }

    #[tokio::test]
    async fn test_proof_sent_as_typed() {
        init();

        let ledger = board();
        let wallet = WalletContext::connected(worker(), &ledger);
        let detail = TaskDetail::new(TaskId(1));
        detail.accept(&ledger, &wallet).await.unwrap();

        detail
            .submit_proof(&ledger, &wallet, "  see PR #12\n")
            .await
            .unwrap();
        let task = detail.snapshot().await.unwrap();
        assert_eq!(task.proof.as_deref(), Some("  see PR #12\n"));
    }

    #[tokio::test]
    async fn test_ledger_rejects_other_worker() {
        init();

        let ledger = board();
        ledger.update(0, |task| task.worker = Some(Address::repeat_byte(0x11)));
        let wallet = WalletContext::connected(worker(), &ledger);
        let detail = TaskDetail::new(TaskId(0));

        let err = detail
            .submit_proof(&ledger, &wallet, "my work")
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Ledger(LedgerError::Reverted(_))));
        assert!(!detail.is_pending());
    }

    #[tokio::test]
    async fn test_failed_reread_after_write() {
        init();

        let ledger = board();
        let wallet = WalletContext::connected(worker(), &ledger);
        let detail = TaskDetail::new(TaskId(0));
        detail.load(&ledger).await.unwrap();

        ledger.fail_reads(true);
        let outcome = detail.accept(&ledger, &wallet).await.unwrap();
        assert!(!outcome.refreshed);
        // still the pre-write snapshot
        assert_eq!(detail.snapshot().await.unwrap().worker, None);
    }
}
