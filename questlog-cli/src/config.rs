use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_questlog_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileSection,
    #[serde(default)]
    pub achievements: AchievementsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSection {
    /// IANA timezone used for report windows and deadlines.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AchievementsSection {
    /// Catalog to evaluate. Defaults to `catalog.json` in the questlog home.
    pub catalog_file: Option<String>,
    /// Show redacted hidden achievements in listings.
    #[serde(default)]
    pub show_hidden: bool,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_questlog_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Write a default config unless one exists. Returns whether a file was written.
pub fn init_config(timezone: Option<String>) -> Result<bool> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(false);
    }
    let mut cfg = Config::default();
    if let Some(tz) = timezone {
        questlog_core::time::parse_timezone(&tz)?;
        cfg.profile.timezone = tz;
    }
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(true)
}
