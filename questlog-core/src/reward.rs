//! Reward calculator: experience and energy deltas for a finished task.
//!
//! Multipliers are kept as exact fractions so the results never drift from
//! the floor of the real product:
//!
//! | difficulty | experience | energy |
//! |------------|-----------:|-------:|
//! | very-easy  | 0.5        | 1.25   |
//! | easy       | 0.75       | 1.0    |
//! | medium     | 1.0        | 0.75   |
//! | hard       | 1.5        | 0.5    |
//! | very-hard  | 2.0        | 0.25   |
//!
//! Boss tasks then get x2.5 experience and x1.5 energy. Each stage is floored.

use crate::task::{Difficulty, Task, TaskType};

/// Experience multiplier in quarters.
fn experience_quarters(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::VeryEasy => 2,
        Difficulty::Easy => 3,
        Difficulty::Medium => 4,
        Difficulty::Hard => 6,
        Difficulty::VeryHard => 8,
    }
}

/// Energy multiplier in quarters.
fn energy_quarters(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::VeryEasy => 5,
        Difficulty::Easy => 4,
        Difficulty::Medium => 3,
        Difficulty::Hard => 2,
        Difficulty::VeryHard => 1,
    }
}

/// floor(value * num / den) for den > 0, rounding toward negative infinity.
fn floor_scale(value: i64, num: i64, den: i64) -> i64 {
    (value * num).div_euclid(den)
}

pub fn compute_experience(base_experience: u32, difficulty: Difficulty, task_type: TaskType) -> u32 {
    let scaled = floor_scale(base_experience as i64, experience_quarters(difficulty), 4);
    let scaled = match task_type {
        TaskType::Boss => floor_scale(scaled, 5, 2),
        _ => scaled,
    };
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

pub fn compute_energy_delta(base_energy_delta: i32, difficulty: Difficulty, task_type: TaskType) -> i32 {
    let scaled = floor_scale(base_energy_delta as i64, energy_quarters(difficulty), 4);
    let scaled = match task_type {
        TaskType::Boss => floor_scale(scaled, 3, 2),
        _ => scaled,
    };
    scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Experience and energy granted for completing a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reward {
    pub experience: u32,
    pub energy: i32,
}

impl Reward {
    pub fn for_task(task: &Task) -> Self {
        Self {
            experience: compute_experience(task.base_experience, task.difficulty, task.task_type),
            energy: compute_energy_delta(task.base_energy_delta, task.difficulty, task.task_type),
        }
    }
}
