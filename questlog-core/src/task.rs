//! Task ("quest") model and status lifecycle.
//!
//! Tasks are plain serializable values. Status changes are explicit method
//! calls; nothing here recomputes rewards as a side effect of storing a task.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ordered from easiest to hardest; `Ord` follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::VeryEasy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::VeryEasy => "very-easy",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::VeryHard => "very-hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    Daily,
    LongTerm,
    Habit,
    Boss,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Daily,
        TaskType::LongTerm,
        TaskType::Habit,
        TaskType::Boss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Daily => "daily",
            TaskType::LongTerm => "long-term",
            TaskType::Habit => "habit",
            TaskType::Boss => "boss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Planned,
    InProgress,
    Done,
    Postponed,
    Failed,
}

impl TaskStatus {
    /// Done and failed are final: no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Planned => "planned",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
            TaskStatus::Postponed => "postponed",
            TaskStatus::Failed => "failed",
        }
    }
}

/// Life area a task belongs to. Reports and `taskCategory` achievements
/// tally by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    PersonalGrowth,
    Work,
    Relationships,
    Health,
    Creativity,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::PersonalGrowth,
        Category::Work,
        Category::Relationships,
        Category::Health,
        Category::Creativity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PersonalGrowth => "personal-growth",
            Category::Work => "work",
            Category::Relationships => "relationships",
            Category::Health => "health",
            Category::Creativity => "creativity",
        }
    }
}

/// Lowercase and fold spaces/underscores into dashes so "Personal growth"
/// and "personal_growth" both parse.
fn normalize_key(s: &str) -> String {
    s.trim()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = normalize_key(s);
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == key)
            .ok_or_else(|| Error::invalid_enum("difficulty", s))
    }
}

impl FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = normalize_key(s);
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| Error::invalid_enum("task type", s))
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = normalize_key(s);
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| Error::invalid_enum("category", s))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Core task type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,

    pub category: Category,
    pub difficulty: Difficulty,
    pub task_type: TaskType,

    /// Experience before difficulty/type multipliers.
    pub base_experience: u32,
    /// Energy change before multipliers; may be negative.
    pub base_energy_delta: i32,

    pub status: TaskStatus,

    /// Habit check-ins in a row. Zero for every other type.
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub max_streak: u32,

    /// Skills trained by this task, tallied in reports.
    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,

    /// Set on the terminal transition, or on the latest habit check-in.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            category: Category::PersonalGrowth,
            difficulty: Difficulty::Medium,
            task_type: TaskType::Daily,
            base_experience: 10,
            base_energy_delta: 0,
            status: TaskStatus::Planned,
            streak: 0,
            max_streak: 0,
            skills: Vec::new(),
            deadline: None,
            completed_at: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn with_experience(mut self, base_experience: u32) -> Self {
        self.base_experience = base_experience;
        self
    }

    pub fn with_energy(mut self, base_energy_delta: i32) -> Self {
        self.base_energy_delta = base_energy_delta;
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_habit(&self) -> bool {
        self.task_type == TaskType::Habit
    }

    fn transition(&mut self, to: TaskStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::IllegalTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(TaskStatus::InProgress)
    }

    pub fn postpone(&mut self) -> Result<()> {
        self.transition(TaskStatus::Postponed)
    }

    /// Mark the task done.
    ///
    /// Habits never terminate here: a completion is a check-in that bumps the
    /// streak and leaves the habit in progress.
    pub fn mark_done(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.is_habit() {
            self.transition(TaskStatus::InProgress)?;
            self.streak += 1;
            self.max_streak = self.max_streak.max(self.streak);
        } else {
            self.transition(TaskStatus::Done)?;
        }
        self.completed_at = Some(now);
        Ok(())
    }

    /// Mark the task failed. A failed habit only loses its streak.
    pub fn mark_failed(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.is_habit() {
            self.transition(TaskStatus::InProgress)?;
            self.streak = 0;
        } else {
            self.transition(TaskStatus::Failed)?;
            self.completed_at = Some(now);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_order() {
        assert!(Difficulty::VeryEasy < Difficulty::Easy);
        assert!(Difficulty::Hard < Difficulty::VeryHard);
        let mut sorted = Difficulty::ALL;
        sorted.sort();
        assert_eq!(sorted, Difficulty::ALL);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("very-hard".parse::<Difficulty>().unwrap(), Difficulty::VeryHard);
        assert_eq!("Very Easy".parse::<Difficulty>().unwrap(), Difficulty::VeryEasy);
        assert_eq!("long_term".parse::<TaskType>().unwrap(), TaskType::LongTerm);
        assert_eq!(
            "personal growth".parse::<Category>().unwrap(),
            Category::PersonalGrowth
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "legendary".parse::<Difficulty>().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidEnum {
                kind: "difficulty",
                value: "legendary".to_string()
            }
        );
        assert!("raid".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for d in Difficulty::ALL {
            let json = serde_json::to_string(&d).unwrap();
            assert_eq!(json, format!("\"{}\"", d.as_str()));
        }
        for t in TaskType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        let status: TaskStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, TaskStatus::InProgress);
    }

    #[test]
    fn test_terminal_is_final() {
        let now = Utc::now();
        let mut t = Task::new("t1", "write report");
        t.start().unwrap();
        t.mark_done(now).unwrap();
        assert_eq!(t.status, TaskStatus::Done);
        assert_eq!(t.completed_at, Some(now));

        let err = t.postpone().unwrap_err();
        assert_eq!(
            err,
            Error::IllegalTransition {
                from: TaskStatus::Done,
                to: TaskStatus::Postponed
            }
        );
        assert!(t.mark_failed(now).is_err());
        assert_eq!(t.status, TaskStatus::Done);
    }

    #[test]
    fn test_postponed_can_resume() {
        let mut t = Task::new("t1", "stretch");
        t.postpone().unwrap();
        t.start().unwrap();
        assert_eq!(t.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_habit_streak() {
        let now = Utc::now();
        let mut h = Task::new("h1", "meditate").with_type(TaskType::Habit);
        h.mark_done(now).unwrap();
        h.mark_done(now).unwrap();
        h.mark_done(now).unwrap();
        assert_eq!(h.streak, 3);
        assert_eq!(h.max_streak, 3);
        assert_eq!(h.status, TaskStatus::InProgress);

        h.mark_failed(now).unwrap();
        assert_eq!(h.streak, 0);
        assert_eq!(h.max_streak, 3);
        assert!(!h.status.is_terminal());

        h.mark_done(now).unwrap();
        assert_eq!(h.streak, 1);
        assert_eq!(h.max_streak, 3);
    }

    #[test]
    fn test_task_deserialize_defaults() {
        let json = r#"{
            "id": "t9",
            "title": "boss fight",
            "category": "work",
            "difficulty": "hard",
            "task_type": "boss",
            "base_experience": 20,
            "base_energy_delta": -10,
            "status": "planned"
        }"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert_eq!(t.task_type, TaskType::Boss);
        assert_eq!(t.streak, 0);
        assert!(t.skills.is_empty());
        assert!(t.completed_at.is_none());
    }
}
