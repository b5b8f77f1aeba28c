//! Stateful wrappers the views drive
//!
//! Controllers hold UI-local state only. Ledger access and the wallet are passed in on every call.

pub mod create;
pub mod detail;
pub mod list;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ActionError;

/// Set while a write is in flight, so the triggering control stays disabled
#[derive(Debug, Default)]
pub struct PendingFlag(AtomicBool);

impl PendingFlag {
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Claim the flag, or fail if another write already holds it
    pub fn begin(&self) -> Result<PendingGuard<'_>, ActionError> {
        if self.0.swap(true, Ordering::AcqRel) {
            return Err(ActionError::Pending);
        }
        Ok(PendingGuard(&self.0))
    }
}

/// Clears the flag on drop, whether the write succeeded, failed or was abandoned
#[derive(Debug)]
pub struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
