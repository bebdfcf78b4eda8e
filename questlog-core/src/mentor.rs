//! Mentor tips: short pieces of advice attached to reports.
//!
//! The catalog is plain data. A report picks tips by the situation it was
//! classified into.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::report::MentorSituation;

/// Tips attached to a single report.
pub const MAX_REPORT_TIPS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TipCategory {
    Motivation,
    Productivity,
    Emotions,
    Growth,
    Daily,
    Habits,
    #[default]
    General,
}

impl TipCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipCategory::Motivation => "motivation",
            TipCategory::Productivity => "productivity",
            TipCategory::Emotions => "emotions",
            TipCategory::Growth => "growth",
            TipCategory::Daily => "daily",
            TipCategory::Habits => "habits",
            TipCategory::General => "general",
        }
    }
}

impl fmt::Display for TipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorTip {
    pub text: String,
    #[serde(default)]
    pub category: TipCategory,
    #[serde(default)]
    pub situation: MentorSituation,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl MentorTip {
    pub fn new(text: impl Into<String>, situation: MentorSituation) -> Self {
        Self {
            text: text.into(),
            category: TipCategory::General,
            situation,
            active: true,
        }
    }

    pub fn with_category(mut self, category: TipCategory) -> Self {
        self.category = category;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A tip as stored on a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTip {
    pub tip: String,
    pub category: TipCategory,
}

/// The first `limit` active tips for `situation`, in catalog order.
pub fn select_tips(catalog: &[MentorTip], situation: MentorSituation, limit: usize) -> Vec<ReportTip> {
    catalog
        .iter()
        .filter(|t| t.active && t.situation == situation)
        .take(limit)
        .map(|t| ReportTip {
            tip: t.text.clone(),
            category: t.category,
        })
        .collect()
}

/// Tip catalog seeded into a fresh profile.
pub fn default_tips() -> Vec<MentorTip> {
    use MentorSituation::*;

    vec![
        MentorTip::new("Rough stretch. Pick one small quest for tomorrow and start there.", LowMotivation)
            .with_category(TipCategory::Motivation),
        MentorTip::new("Low days happen. Rest counts as progress when it is chosen.", LowMotivation)
            .with_category(TipCategory::Emotions),
        MentorTip::new("Write down one thing that went right, however small.", LowMotivation)
            .with_category(TipCategory::Emotions),
        MentorTip::new("Great run. Keep the momentum, but leave room to rest.", TaskStreak)
            .with_category(TipCategory::Productivity),
        MentorTip::new("A streak is a habit forming. Note what made these days work.", TaskStreak)
            .with_category(TipCategory::Habits),
        MentorTip::new("More misses than wins. Try splitting big quests into smaller ones.", TaskFailed)
            .with_category(TipCategory::Productivity),
        MentorTip::new("A failed quest is information. What got in the way?", TaskFailed)
            .with_category(TipCategory::Growth),
        MentorTip::new("Steady progress. Keep showing up.", General),
        MentorTip::new("Plan tomorrow's first quest tonight.", General).with_category(TipCategory::Daily),
    ]
}
