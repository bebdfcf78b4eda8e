//! Achievement catalog, condition evaluation, and award bookkeeping.
//!
//! Evaluation is a pure function over a statistics snapshot. Anything that has
//! to be counted elsewhere (reports written) comes in through
//! [`ReflectionSource`].

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::character::{Character, WorldElement};
use crate::error::{Error, Result};
use crate::stats::UserStats;
use crate::task::Category;

/// Statistic a condition compares against.
///
/// Catalog entries are data, so a parameter this build does not know about
/// deserializes to `Unknown` instead of failing the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionParameter {
    TasksCompleted,
    StreakDays,
    Level,
    TaskCategory,
    LoginDays,
    Reflections,
    Unknown(String),
}

impl ConditionParameter {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionParameter::TasksCompleted => "tasksCompleted",
            ConditionParameter::StreakDays => "streakDays",
            ConditionParameter::Level => "level",
            ConditionParameter::TaskCategory => "taskCategory",
            ConditionParameter::LoginDays => "loginDays",
            ConditionParameter::Reflections => "reflections",
            ConditionParameter::Unknown(name) => name,
        }
    }
}

impl From<String> for ConditionParameter {
    fn from(s: String) -> Self {
        match s.as_str() {
            "tasksCompleted" => ConditionParameter::TasksCompleted,
            "streakDays" => ConditionParameter::StreakDays,
            "level" => ConditionParameter::Level,
            "taskCategory" => ConditionParameter::TaskCategory,
            "loginDays" => ConditionParameter::LoginDays,
            "reflections" => ConditionParameter::Reflections,
            _ => ConditionParameter::Unknown(s),
        }
    }
}

impl From<ConditionParameter> for String {
    fn from(p: ConditionParameter) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for ConditionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[default]
    #[serde(rename = ">=")]
    Gte,
}

impl Operator {
    pub fn apply(&self, user_value: i64, target: i64) -> bool {
        match self {
            Operator::Eq => user_value == target,
            Operator::Gt => user_value > target,
            Operator::Gte => user_value >= target,
        }
    }
}

impl std::str::FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "=" | "==" => Ok(Operator::Eq),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            other => Err(Error::invalid_enum("operator", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionExtra {
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub parameter: ConditionParameter,
    #[serde(default)]
    pub operator: Operator,
    pub value: i64,
    #[serde(default)]
    pub extra: Option<ConditionExtra>,
}

impl Condition {
    pub fn new(parameter: ConditionParameter, operator: Operator, value: i64) -> Self {
        Self {
            parameter,
            operator,
            value,
            extra: None,
        }
    }

    pub fn for_category(mut self, category: Category) -> Self {
        self.extra = Some(ConditionExtra {
            category: Some(category),
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementReward {
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub energy: i64,
    #[serde(default)]
    pub world_element: Option<WorldElement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AchievementCategory {
    PersonalGrowth,
    Work,
    Relationships,
    Health,
    Creativity,
    System,
    #[default]
    General,
}

fn default_true() -> bool {
    true
}

/// A catalog entry. Not owned per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: AchievementCategory,
    pub condition: Condition,
    #[serde(default)]
    pub reward: AchievementReward,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl AchievementDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>, condition: Condition) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: AchievementCategory::General,
            condition,
            reward: AchievementReward {
                experience: 50,
                energy: 10,
                world_element: None,
            },
            hidden: false,
            rarity: Rarity::Common,
            active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reward(mut self, reward: AchievementReward) -> Self {
        self.reward = reward;
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_category(mut self, category: AchievementCategory) -> Self {
        self.category = category;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Record appended to a user's profile once a definition is earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementAward {
    pub achievement_id: String,
    pub title: String,
    pub earned_at: DateTime<Utc>,
}

/// Count of reflective reports a user has written, owned by whatever stores reports.
pub trait ReflectionSource {
    fn reflection_count(&self) -> u64;
}

impl ReflectionSource for u64 {
    fn reflection_count(&self) -> u64 {
        *self
    }
}

impl<T> ReflectionSource for Vec<T> {
    fn reflection_count(&self) -> u64 {
        self.len() as u64
    }
}

/// Everything a condition can be resolved against.
pub struct EvalContext<'a> {
    pub stats: &'a UserStats,
    pub character: &'a Character,
    pub reflections: &'a dyn ReflectionSource,
    pub now: DateTime<Utc>,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        stats: &'a UserStats,
        character: &'a Character,
        reflections: &'a dyn ReflectionSource,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            stats,
            character,
            reflections,
            now,
        }
    }

    /// Look up the user's current value for a condition.
    ///
    /// `Ok(None)` means the condition is well-formed but cannot be met
    /// (e.g. `taskCategory` without a category).
    pub fn resolve(&self, condition: &Condition) -> Result<Option<i64>> {
        let value = match &condition.parameter {
            ConditionParameter::TasksCompleted => self.stats.tasks_completed,
            ConditionParameter::StreakDays => self.stats.streak_days,
            ConditionParameter::Level => self.character.level as u64,
            ConditionParameter::LoginDays => self.stats.days_since_registration(self.now),
            ConditionParameter::TaskCategory => {
                let Some(category) = condition.extra.as_ref().and_then(|e| e.category) else {
                    return Ok(None);
                };
                self.stats.category(category).completed
            }
            ConditionParameter::Reflections => self.reflections.reflection_count(),
            ConditionParameter::Unknown(name) => return Err(Error::UnknownParameter(name.clone())),
        };
        Ok(Some(i64::try_from(value).unwrap_or(i64::MAX)))
    }

    pub fn is_satisfied(&self, condition: &Condition) -> Result<bool> {
        // A zero target is treated as "no condition set".
        if condition.value == 0 {
            return Ok(false);
        }
        Ok(self
            .resolve(condition)?
            .is_some_and(|v| condition.operator.apply(v, condition.value)))
    }
}

/// Return the active definitions the user has newly earned, in catalog order.
///
/// Definitions already in `already_earned` are never returned. A definition
/// with an unknown parameter is logged and skipped; the rest of the catalog
/// is still evaluated.
pub fn evaluate<'c>(
    ctx: &EvalContext<'_>,
    catalog: &'c [AchievementDefinition],
    already_earned: &HashSet<String>,
) -> Vec<&'c AchievementDefinition> {
    let mut earned = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for def in catalog {
        if !def.active || already_earned.contains(&def.id) || !seen.insert(def.id.as_str()) {
            continue;
        }

        match ctx.is_satisfied(&def.condition) {
            Ok(true) => {
                tracing::debug!(achievement = %def.id, "achievement condition met");
                earned.push(def);
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(achievement = %def.id, error = %err, "skipping achievement");
            }
        }
    }

    earned
}

/// Character and awards after crediting newly earned achievements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardOutcome {
    pub character: Character,
    pub awards: Vec<AchievementAward>,
}

/// Credit each definition's reward and produce the award records to store.
///
/// Definitions whose id already appears in `existing` are ignored, so the
/// same definition is never awarded twice.
pub fn apply_awards(
    character: &Character,
    existing: &[AchievementAward],
    earned: &[&AchievementDefinition],
    now: DateTime<Utc>,
) -> AwardOutcome {
    let mut held: HashSet<&str> = existing.iter().map(|a| a.achievement_id.as_str()).collect();
    let mut character = character.clone();
    let mut awards = Vec::new();

    for def in earned {
        if !held.insert(def.id.as_str()) {
            continue;
        }

        character = character
            .add_experience(def.reward.experience)
            .change_energy(def.reward.energy);
        if let Some(element) = def.reward.world_element {
            character = character.unlock(element);
        }

        tracing::info!(achievement = %def.id, experience = def.reward.experience, "achievement awarded");
        awards.push(AchievementAward {
            achievement_id: def.id.clone(),
            title: def.title.clone(),
            earned_at: now,
        });
    }

    AwardOutcome { character, awards }
}

/// Evaluate and award until nothing new is earned.
///
/// Rewards are credited between rounds, so a `level` achievement reached
/// through another achievement's experience is awarded in the same call.
/// Each round adds at least one new id, so this ends after at most
/// `catalog.len()` rounds.
pub fn check_achievements(
    ctx: &EvalContext<'_>,
    catalog: &[AchievementDefinition],
    existing: &[AchievementAward],
) -> AwardOutcome {
    let mut held = existing.to_vec();
    let mut character = ctx.character.clone();
    let mut awards = Vec::new();

    loop {
        let already: HashSet<String> = held.iter().map(|a| a.achievement_id.clone()).collect();
        let round = EvalContext::new(ctx.stats, &character, ctx.reflections, ctx.now);
        let earned = evaluate(&round, catalog, &already);
        let outcome = apply_awards(&character, &held, &earned, ctx.now);
        if outcome.awards.is_empty() {
            break;
        }
        character = outcome.character;
        held.extend(outcome.awards.iter().cloned());
        awards.extend(outcome.awards);
    }

    AwardOutcome { character, awards }
}

pub const HIDDEN_TITLE: &str = "???";
pub const HIDDEN_DESCRIPTION: &str = "This achievement is still hidden";

/// A catalog entry as shown to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub rarity: Rarity,
    pub hidden: bool,
    pub is_earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
    /// Withheld for hidden achievements the user has not earned.
    pub condition: Option<Condition>,
    pub reward: Option<AchievementReward>,
}

/// List active catalog entries with the user's earned status.
///
/// Hidden entries the user has not earned are redacted, or dropped entirely
/// unless `include_hidden` is set.
pub fn catalog_view(
    catalog: &[AchievementDefinition],
    awards: &[AchievementAward],
    include_hidden: bool,
) -> Vec<AchievementView> {
    catalog
        .iter()
        .filter(|def| def.active)
        .filter_map(|def| {
            let award = awards.iter().find(|a| a.achievement_id == def.id);
            let is_earned = award.is_some();

            if def.hidden && !is_earned {
                if !include_hidden {
                    return None;
                }
                return Some(AchievementView {
                    id: def.id.clone(),
                    title: HIDDEN_TITLE.to_string(),
                    description: HIDDEN_DESCRIPTION.to_string(),
                    rarity: def.rarity,
                    hidden: true,
                    is_earned: false,
                    earned_at: None,
                    condition: None,
                    reward: None,
                });
            }

            Some(AchievementView {
                id: def.id.clone(),
                title: def.title.clone(),
                description: def.description.clone(),
                rarity: def.rarity,
                hidden: def.hidden,
                is_earned,
                earned_at: award.map(|a| a.earned_at),
                condition: Some(def.condition.clone()),
                reward: Some(def.reward.clone()),
            })
        })
        .collect()
}

/// Catalog seeded into a fresh profile.
pub fn default_catalog() -> Vec<AchievementDefinition> {
    use ConditionParameter::*;

    vec![
        AchievementDefinition::new("first-quest", "First Quest", Condition::new(TasksCompleted, Operator::Gte, 1))
            .with_description("Complete your first task")
            .with_reward(AchievementReward {
                experience: 20,
                energy: 5,
                world_element: Some(WorldElement::Flower),
            }),
        AchievementDefinition::new("ten-quests", "Adventurer", Condition::new(TasksCompleted, Operator::Gte, 10))
            .with_description("Complete 10 tasks")
            .with_rarity(Rarity::Uncommon),
        AchievementDefinition::new("hundred-quests", "Hero of the Realm", Condition::new(TasksCompleted, Operator::Gte, 100))
            .with_description("Complete 100 tasks")
            .with_rarity(Rarity::Epic)
            .with_reward(AchievementReward {
                experience: 500,
                energy: 25,
                world_element: Some(WorldElement::House),
            }),
        AchievementDefinition::new("week-streak", "Unbroken Week", Condition::new(StreakDays, Operator::Gte, 7))
            .with_description("Complete tasks seven days in a row")
            .with_rarity(Rarity::Rare)
            .with_reward(AchievementReward {
                experience: 150,
                energy: 15,
                world_element: Some(WorldElement::Tree),
            }),
        AchievementDefinition::new("level-five", "Seasoned", Condition::new(Level, Operator::Gte, 5))
            .with_description("Reach level 5")
            .with_category(AchievementCategory::System),
        AchievementDefinition::new(
            "health-ten",
            "Body and Soul",
            Condition::new(TaskCategory, Operator::Gte, 10).for_category(Category::Health),
        )
        .with_description("Complete 10 health tasks")
        .with_category(AchievementCategory::Health)
        .with_rarity(Rarity::Uncommon),
        AchievementDefinition::new("first-reflection", "Looking Back", Condition::new(Reflections, Operator::Gte, 1))
            .with_description("Write your first report")
            .with_reward(AchievementReward {
                experience: 30,
                energy: 10,
                world_element: Some(WorldElement::Water),
            }),
        AchievementDefinition::new("one-month", "Regular", Condition::new(LoginDays, Operator::Gte, 30))
            .with_description("Stay with it for a month")
            .with_category(AchievementCategory::System)
            .with_rarity(Rarity::Rare)
            .hidden(),
    ]
}
