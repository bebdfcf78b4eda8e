//! Per-user statistics read by the achievement evaluator.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Category;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub completed: u64,
    pub failed: u64,
}

impl CategoryTally {
    pub fn total(&self) -> u64 {
        self.completed + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    /// Consecutive calendar days with at least one completion.
    pub streak_days: u64,
    pub last_active: Option<NaiveDate>,
    #[serde(default)]
    pub categories: BTreeMap<Category, CategoryTally>,
    pub registered_at: DateTime<Utc>,
}

impl UserStats {
    pub fn new(registered_at: DateTime<Utc>) -> Self {
        Self {
            tasks_completed: 0,
            tasks_failed: 0,
            streak_days: 0,
            last_active: None,
            categories: BTreeMap::new(),
            registered_at,
        }
    }

    pub fn category(&self, category: Category) -> CategoryTally {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    pub fn record_completion(&mut self, category: Category, today: NaiveDate) {
        self.tasks_completed += 1;
        self.categories.entry(category).or_default().completed += 1;
        self.touch_streak(today);
    }

    pub fn record_failure(&mut self, category: Category) {
        self.tasks_failed += 1;
        self.categories.entry(category).or_default().failed += 1;
    }

    /// Same day keeps the streak, the next day extends it, any gap restarts at 1.
    fn touch_streak(&mut self, today: NaiveDate) {
        self.streak_days = match self.last_active {
            Some(last) if last == today => self.streak_days.max(1),
            Some(last) if last + Duration::days(1) == today => self.streak_days + 1,
            // Clock went backwards: keep what we have.
            Some(last) if last > today => self.streak_days,
            _ => 1,
        };
        if self.last_active.is_none_or(|last| last < today) {
            self.last_active = Some(today);
        }
    }

    /// Whole days since registration, rounded up.
    pub fn days_since_registration(&self, now: DateTime<Utc>) -> u64 {
        let ms = (now - self.registered_at).num_milliseconds().unsigned_abs();
        ms.div_ceil(Duration::days(1).num_milliseconds() as u64)
    }
}
