use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use questlog_core::{
    check_achievements, time::parse_timezone, AchievementAward, AchievementDefinition, Character,
    EvalContext, MentorTip, Report, Strength, Task, UserStats, Weakness,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{load_config, Config};

/// `$QUESTLOG_HOME`, or `~/.questlog`.
pub fn questlog_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("QUESTLOG_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".questlog"))
}

pub fn ensure_questlog_home() -> Result<PathBuf> {
    let dir = questlog_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Everything about the user that is not a task or report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub created_at_utc: DateTime<Utc>,
    pub character: Character,
    pub stats: UserStats,
    #[serde(default)]
    pub achievements: Vec<AchievementAward>,
    #[serde(default)]
    pub next_task_id: u64,
    #[serde(default)]
    pub strengths: Vec<Strength>,
    #[serde(default)]
    pub weaknesses: Vec<Weakness>,
}

impl Profile {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at_utc: now,
            character: Character::new(),
            stats: UserStats::new(now),
            achievements: Vec::new(),
            next_task_id: 1,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        }
    }
}

pub fn profile_path() -> Result<PathBuf> {
    Ok(ensure_questlog_home()?.join("profile.json"))
}

pub fn tasks_path() -> Result<PathBuf> {
    Ok(ensure_questlog_home()?.join("tasks.json"))
}

pub fn reports_path() -> Result<PathBuf> {
    Ok(ensure_questlog_home()?.join("reports.json"))
}

pub fn tips_path() -> Result<PathBuf> {
    Ok(ensure_questlog_home()?.join("tips.json"))
}

pub fn catalog_path(cfg: &Config) -> Result<PathBuf> {
    match &cfg.achievements.catalog_file {
        Some(p) => Ok(PathBuf::from(p)),
        None => Ok(ensure_questlog_home()?.join("catalog.json")),
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// Like `read_json`, but a missing file yields `T::default()`.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_json(path)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Loaded state for one command invocation.
pub struct Session {
    pub config: Config,
    pub profile: Profile,
    pub tasks: Vec<Task>,
    pub reports: Vec<Report>,
    pub catalog: Vec<AchievementDefinition>,
    pub tips: Vec<MentorTip>,
}

impl Session {
    pub fn load() -> Result<Self> {
        let config = load_config()?;
        let pp = profile_path()?;
        if !pp.exists() {
            bail!("No profile found at {}. Run: questlog init", pp.display());
        }
        let profile: Profile = read_json(&pp)?;
        let tasks = read_json_or_default(&tasks_path()?)?;
        let reports = read_json_or_default(&reports_path()?)?;
        let catalog = read_json_or_default(&catalog_path(&config)?)?;
        let tips = read_json_or_default(&tips_path()?)?;

        Ok(Self {
            config,
            profile,
            tasks,
            reports,
            catalog,
            tips,
        })
    }

    /// The configured profile timezone.
    pub fn timezone(&self) -> Result<Tz> {
        let tz = &self.config.profile.timezone;
        parse_timezone(tz).with_context(|| format!("profile.timezone in config.toml ({tz})"))
    }

    pub fn save(&self) -> Result<()> {
        write_json(&profile_path()?, &self.profile)?;
        write_json(&tasks_path()?, &self.tasks)?;
        write_json(&reports_path()?, &self.reports)?;
        Ok(())
    }

    pub fn task_index(&self, id: &str) -> Result<usize> {
        match self.tasks.iter().position(|t| t.id == id) {
            Some(i) => Ok(i),
            None => bail!("no task with id {id} (see: questlog task list)"),
        }
    }

    pub fn next_task_id(&mut self) -> String {
        let n = self.profile.next_task_id.max(1);
        self.profile.next_task_id = n + 1;
        format!("q{n}")
    }

    /// Evaluate the catalog and credit anything newly earned.
    pub fn award_achievements(&mut self, now: DateTime<Utc>) -> Vec<AchievementAward> {
        let ctx = EvalContext::new(
            &self.profile.stats,
            &self.profile.character,
            &self.reports,
            now,
        );
        let outcome = check_achievements(&ctx, &self.catalog, &self.profile.achievements);
        self.profile.character = outcome.character;
        self.profile.achievements.extend(outcome.awards.iter().cloned());
        outcome.awards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_json_round_trip() {
        let now = Utc::now();
        let p = Profile::new(now);
        let json = serde_json::to_string(&p).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.character, p.character);
        assert_eq!(back.stats, p.stats);
        assert_eq!(back.next_task_id, 1);
    }

    #[test]
    fn test_read_json_or_default_missing_file() {
        let missing = std::env::temp_dir().join("questlog-definitely-missing.json");
        let tasks: Vec<Task> = read_json_or_default(&missing).unwrap();
        assert!(tasks.is_empty());
    }
}
