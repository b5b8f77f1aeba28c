//! Display fields derived from the task list
//!
//! Everything here is a pure function of the tasks and a timestamp. [`ProjectionCache`] keeps the
//! last result around so re-rendering an unchanged list does not recompute it.

use std::{fmt, sync::Arc};

use ethers::types::U256;
use log::warn;
use serde::Serialize;

use crate::models::{Task, TaskId};

const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_DAY: u64 = 86400;

/// Decimals of the native currency on Flow EVM
pub const DEFAULT_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    Active,
    InProgress,
    Completed,
    CompletedAndPaid,
}

impl TaskStatus {
    pub fn of(task: &Task) -> TaskStatus {
        match (task.completed, task.paid) {
            (true, true) => TaskStatus::CompletedAndPaid,
            (true, false) => TaskStatus::Completed,
            (false, _) if task.is_assigned() => TaskStatus::InProgress,
            (false, _) => TaskStatus::Active,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Active => "Active",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::CompletedAndPaid => "Completed & Paid",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How long ago a task was created, in whole days or else whole hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgeBucket {
    Days(u64),
    Hours(u64),
}

impl AgeBucket {
    pub fn since(created_at: u64, now: u64) -> AgeBucket {
        // clock skew can put created_at slightly ahead of now
        let elapsed = now.saturating_sub(created_at);
        let days = elapsed / SECS_PER_DAY;
        if days >= 1 {
            AgeBucket::Days(days)
        } else {
            AgeBucket::Hours(elapsed / SECS_PER_HOUR)
        }
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeBucket::Days(days) => write!(f, "{days}d ago"),
            AgeBucket::Hours(hours) => write!(f, "{hours}h ago"),
        }
    }
}

/// Render a base unit amount as a decimal, keeping at least one fractional digit
pub fn format_reward(amount: U256, decimals: u32) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return format!("{digits}.0");
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

/// A task prepared for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskCard {
    /// 1-based position in the list
    pub position: usize,
    pub task: Task,
    pub status: TaskStatus,
    pub age: AgeBucket,
    pub reward_display: String,
    /// Completion time has been recorded
    pub finished: bool,
}

impl TaskCard {
    pub fn new(position: usize, task: &Task, now: u64, decimals: u32) -> TaskCard {
        TaskCard {
            position,
            task: task.clone(),
            status: TaskStatus::of(task),
            age: AgeBucket::since(task.created_at, now),
            reward_display: format_reward(task.reward, decimals),
            finished: task.completed_at.is_some(),
        }
    }
}

/// A reward left out of the total because it could not be added safely
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardSkip {
    pub task: TaskId,
    pub reward: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub items: Vec<TaskCard>,
    /// Tasks not yet completed, over the whole list
    pub active_count: usize,
    pub total_tasks: usize,
    /// Sum of every reward that fit, in base units
    pub total_rewards: u128,
    pub skipped: Vec<RewardSkip>,
}

impl Projection {
    /// Tasks hidden behind "load more"
    pub fn remaining(&self) -> usize {
        self.total_tasks - self.items.len()
    }

    pub fn total_rewards_display(&self, decimals: u32) -> String {
        format_reward(U256::from(self.total_rewards), decimals)
    }
}

pub fn project(tasks: &[Task], now: u64, visible_count: usize, decimals: u32) -> Projection {
    let items = tasks
        .iter()
        .take(visible_count)
        .enumerate()
        .map(|(i, task)| TaskCard::new(i + 1, task, now, decimals))
        .collect();

    let active_count = tasks.iter().filter(|task| !task.completed).count();
    let (total_rewards, skipped) = sum_rewards(tasks);

    Projection {
        items,
        active_count,
        total_tasks: tasks.len(),
        total_rewards,
        skipped,
    }
}

/// Sum rewards in 128 bits. Rewards that do not fit, or that would overflow the running total,
/// are reported instead of wrapping.
pub fn sum_rewards(tasks: &[Task]) -> (u128, Vec<RewardSkip>) {
    let mut total: u128 = 0;
    let mut skipped = vec![];

    for task in tasks {
        let next = u128::try_from(task.reward)
            .ok()
            .and_then(|reward| total.checked_add(reward));
        match next {
            Some(sum) => total = sum,
            None => {
                warn!(
                    "Skipping reward {} of bounty #{} in total",
                    task.reward, task.id
                );
                skipped.push(RewardSkip {
                    task: task.id,
                    reward: task.reward,
                });
            },
        }
    }

    (total, skipped)
}

/// Remembers the last projection, keyed on the identity of the task list
#[derive(Debug, Default)]
pub struct ProjectionCache {
    last: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    tasks: Arc<[Task]>,
    now: u64,
    visible_count: usize,
    decimals: u32,
    projection: Arc<Projection>,
}

impl ProjectionCache {
    pub fn get(
        &mut self,
        tasks: &Arc<[Task]>,
        now: u64,
        visible_count: usize,
        decimals: u32,
    ) -> Arc<Projection> {
        if let Some(entry) = &self.last {
            if Arc::ptr_eq(&entry.tasks, tasks)
                && entry.now == now
                && entry.visible_count == visible_count
                && entry.decimals == decimals
            {
                return entry.projection.clone();
            }
        }

        let projection = Arc::new(project(tasks, now, visible_count, decimals));
        self.last = Some(CacheEntry {
            tasks: tasks.clone(),
            now,
            visible_count,
            decimals,
            projection: projection.clone(),
        });
        projection
    }
}
