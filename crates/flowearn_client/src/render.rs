//! Plain text views for the terminal

use std::fmt;

use chrono::{DateTime, Utc};
use flowearn_client::{
    config::Config,
    controller::{detail::DetailView, list::ListView},
    models::{short_address, Task},
    projection::{format_reward, Projection, TaskCard, TaskStatus},
};

pub struct ListPage<'a> {
    pub view: &'a ListView,
    pub config: &'a Config,
    /// Pages currently loaded, used for the "load more" hint
    pub pages: usize,
}

impl fmt::Display for ListPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.view {
            ListView::Loading => writeln!(f, "Loading bounty data from blockchain..."),
            ListView::Failed(err) => {
                writeln!(f, "Error loading bounties")?;
                writeln!(f, "{err}")
            },
            ListView::Empty { stale } => {
                stale_warning(f, stale.as_ref().map(|err| err.to_string()))?;
                writeln!(f, "No bounties available at the moment")?;
                writeln!(f, "Check back later for new opportunities")
            },
            ListView::Ready { projection, stale } => {
                stale_warning(f, stale.as_ref().map(|err| err.to_string()))?;
                self.ready(f, projection)
            },
        }
    }
}

impl ListPage<'_> {
    fn ready(&self, f: &mut fmt::Formatter<'_>, projection: &Projection) -> fmt::Result {
        let config = self.config;

        writeln!(f, "Browse Opportunities")?;
        writeln!(f)?;
        writeln!(
            f,
            "Active Bounties: {}  |  Total Rewards ({}): {}  |  Total Tasks: {}",
            projection.active_count,
            config.symbol,
            projection.total_rewards_display(config.decimals),
            projection.total_tasks
        )?;
        if !projection.skipped.is_empty() {
            writeln!(
                f,
                "({} rewards too large to include in the total)",
                projection.skipped.len()
            )?;
        }
        writeln!(f)?;

        for card in projection.items.iter() {
            write!(f, "{}", Card { card, config })?;
            writeln!(f)?;
        }

        if projection.remaining() > 0 {
            writeln!(
                f,
                "Load More ({} remaining): rerun with --pages {}",
                projection.remaining(),
                self.pages + 1
            )?;
        }
        writeln!(
            f,
            "Showing {} of {} bounties",
            projection.items.len(),
            projection.total_tasks
        )
    }
}

struct Card<'a> {
    card: &'a TaskCard,
    config: &'a Config,
}

impl fmt::Display for Card<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let TaskCard {
            position,
            task,
            status,
            age,
            reward_display,
            finished,
        } = self.card;

        writeln!(f, "#{position} [{status}] {}", task.display_title())?;
        writeln!(f, "    id: {}  creator: {}", task.id, short_address(&task.creator))?;
        if let Some(worker) = &task.worker {
            writeln!(f, "    worker: {}", short_address(worker))?;
        }
        writeln!(f, "    {}", task.display_description())?;
        write!(f, "    Created {age}")?;
        if *finished {
            write!(f, "  |  Finished")?;
        }
        writeln!(f)?;
        writeln!(f, "    Reward: {reward_display} {}", self.config.symbol)
    }
}

pub struct DetailPage<'a> {
    pub view: &'a DetailView,
    pub config: &'a Config,
}

impl fmt::Display for DetailPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.view {
            DetailView::Loading => writeln!(f, "Loading bounty details..."),
            DetailView::Failed(err) => writeln!(f, "Error loading bounty: {err}"),
            DetailView::NotFound(_) => writeln!(f, "Bounty not found."),
            DetailView::Ready {
                task,
                pending,
                stale,
            } => {
                stale_warning(f, stale.as_ref().map(|err| err.to_string()))?;
                self.ready(f, task, *pending)
            },
        }
    }
}

impl DetailPage<'_> {
    fn ready(&self, f: &mut fmt::Formatter<'_>, task: &Task, pending: bool) -> fmt::Result {
        let config = self.config;

        writeln!(f, "{}", task.display_title())?;
        writeln!(f)?;
        writeln!(f, "{}", task.display_description())?;
        writeln!(f)?;
        writeln!(
            f,
            "Reward:  {} {} ({} base units)",
            format_reward(task.reward, config.decimals),
            config.symbol,
            task.reward
        )?;
        writeln!(f, "Status:  {}", TaskStatus::of(task))?;
        writeln!(f, "Creator: {}", ethers::utils::to_checksum(&task.creator, None))?;
        if let Some(worker) = &task.worker {
            writeln!(f, "Worker:  {}", ethers::utils::to_checksum(worker, None))?;
        }
        writeln!(f, "Created: {}", timestamp(task.created_at))?;
        if let Some(completed_at) = task.completed_at {
            writeln!(f, "Completed: {}", timestamp(completed_at))?;
        }
        if let Some(proof) = &task.proof {
            writeln!(f, "Proof:   {proof}")?;
        }
        writeln!(f)?;

        if pending {
            writeln!(f, "Processing...")
        } else if task.completed {
            writeln!(f, "Already Completed")
        } else {
            writeln!(f, "Accept Task:  flowearn accept {}", task.id)?;
            writeln!(f, "Submit Proof: flowearn submit-proof {} <PROOF>", task.id)
        }
    }
}

fn stale_warning(f: &mut fmt::Formatter<'_>, err: Option<String>) -> fmt::Result {
    match err {
        Some(err) => writeln!(f, "warning: refresh failed, showing last known data ({err})"),
        None => Ok(()),
    }
}

fn timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}
