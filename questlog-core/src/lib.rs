//! questlog-core: rule layer for the Questlog task tracker.
//!
//! Rewards, levelling, achievements, reports and mentor tips as pure functions over
//! plain serializable records. Storage is the caller's job.

pub mod achievements;
pub mod analytics;
pub mod character;
pub mod error;
pub mod lifecycle;
pub mod mentor;
pub mod report;
pub mod reward;
pub mod stats;
pub mod task;
pub mod time;

pub use achievements::{
    apply_awards, catalog_view, check_achievements, default_catalog, evaluate, AchievementAward,
    AchievementCategory, AchievementDefinition, AchievementReward, AchievementView, AwardOutcome,
    Condition, ConditionExtra, ConditionParameter, EvalContext, Operator, Rarity, ReflectionSource,
};
pub use analytics::{
    analytics, AnalyticsPeriod, AnalyticsWindow, CategoryPerformance, ReportAnalytics, TrendPoint,
};
pub use character::{Character, Mood, WorldElement};
pub use error::{Error, Result};
pub use lifecycle::{complete_task, fail_task, TaskOutcome};
pub use mentor::{default_tips, select_tips, MentorTip, ReportTip, TipCategory};
pub use report::{
    build_report, filter_reports, merge_strengths, merge_weaknesses, CategoryStats,
    MentorSituation, PeriodGoal, Reflection, Report, ReportInput, ReportPeriod, SkillProgress,
    Strength, TaskStats, Weakness,
};
pub use reward::{compute_energy_delta, compute_experience, Reward};
pub use stats::{CategoryTally, UserStats};
pub use task::{Category, Difficulty, Task, TaskStatus, TaskType};
