//! Completing and failing tasks: the point where reward, ledger and
//! statistics meet.
//!
//! Inputs are borrowed snapshots; the result carries the new values for the
//! caller to persist. Nothing is written back in place.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::character::Character;
use crate::error::Result;
use crate::reward::Reward;
use crate::stats::UserStats;
use crate::task::Task;
use crate::time::local_date;

#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub task: Task,
    pub character: Character,
    pub stats: UserStats,
    /// Zero for failures.
    pub reward: Reward,
    pub levels_gained: u32,
}

/// Complete a task (or check in a habit) and credit its reward.
///
/// The daily streak is counted on the calendar day in `tz`, the same zone
/// report windows use.
///
/// Fails with `IllegalTransition` if the task is already done or failed; in
/// that case nothing is credited.
pub fn complete_task(
    task: &Task,
    character: &Character,
    stats: &UserStats,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<TaskOutcome> {
    let mut task = task.clone();
    task.mark_done(now)?;

    let reward = Reward::for_task(&task);
    let next = character
        .add_experience(reward.experience as u64)
        .change_energy(reward.energy as i64);

    let mut stats = stats.clone();
    stats.record_completion(task.category, local_date(now, tz));

    tracing::debug!(
        task = %task.id,
        experience = reward.experience,
        energy = reward.energy,
        "task completed"
    );

    Ok(TaskOutcome {
        levels_gained: next.level - character.level,
        task,
        character: next,
        stats,
        reward,
    })
}

/// Fail a task (or break a habit streak). No reward is granted.
pub fn fail_task(
    task: &Task,
    character: &Character,
    stats: &UserStats,
    now: DateTime<Utc>,
) -> Result<TaskOutcome> {
    let mut task = task.clone();
    task.mark_failed(now)?;

    let mut stats = stats.clone();
    stats.record_failure(task.category);

    tracing::debug!(task = %task.id, "task failed");

    Ok(TaskOutcome {
        task,
        character: character.clone(),
        stats,
        reward: Reward::default(),
        levels_gained: 0,
    })
}
