use std::sync::Arc;

use log::{debug, warn};

use crate::{
    error::LedgerError,
    gateway::LedgerReader,
    models::Task,
    projection::{Projection, ProjectionCache},
};

/// Tasks revealed per "load more"
pub const PAGE_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    /// No read has finished yet
    Loading,
    /// The read failed and there is nothing to fall back on
    Failed(LedgerError),
    Empty {
        stale: Option<LedgerError>,
    },
    Ready {
        projection: Arc<Projection>,
        /// Set when the newest read failed and an older list is shown
        stale: Option<LedgerError>,
    },
}

/// The bounty board: the latest list read from the ledger and how much of it is shown
#[derive(Debug)]
pub struct BountyList {
    visible_count: usize,
    tasks: Option<Arc<[Task]>>,
    last_error: Option<LedgerError>,
    cache: ProjectionCache,
    decimals: u32,
}

impl BountyList {
    pub fn new(decimals: u32) -> Self {
        BountyList {
            visible_count: PAGE_SIZE,
            tasks: None,
            last_error: None,
            cache: ProjectionCache::default(),
            decimals,
        }
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Size of the latest successful read
    pub fn total_count(&self) -> usize {
        self.tasks.as_ref().map_or(0, |tasks| tasks.len())
    }

    /// How many cards the list shows right now
    pub fn shown_count(&self) -> usize {
        self.visible_count.min(self.total_count())
    }

    pub fn can_load_more(&self) -> bool {
        self.visible_count < self.total_count()
    }

    /// Reveal the next page. Returns false once everything is visible, which includes the time
    /// before the first read.
    pub fn load_more(&mut self) -> bool {
        let total = self.total_count();
        if self.visible_count >= total {
            return false;
        }
        self.visible_count = (self.visible_count + PAGE_SIZE).min(total).max(PAGE_SIZE);
        true
    }

    /// Re-read the whole list. A failed read keeps whatever was shown before.
    pub async fn refresh<R: LedgerReader>(&mut self, reader: &R) -> Result<(), LedgerError> {
        match reader.get_tasks().await {
            Ok(tasks) => {
                debug!("Bounty list refreshed with {} tasks", tasks.len());
                self.tasks = Some(tasks.into());
                self.last_error = None;
                Ok(())
            },
            Err(err) => {
                warn!("Failed to refresh bounty list: {err}");
                self.last_error = Some(err.clone());
                Err(err)
            },
        }
    }

    pub fn view(&mut self, now: u64) -> ListView {
        let stale = self.last_error.clone();
        let Some(tasks) = &self.tasks else {
            return match stale {
                Some(err) => ListView::Failed(err),
                None => ListView::Loading,
            };
        };

        if tasks.is_empty() {
            return ListView::Empty { stale };
        }

        let projection = self
            .cache
            .get(tasks, now, self.visible_count, self.decimals);
        ListView::Ready { projection, stale }
    }
}
