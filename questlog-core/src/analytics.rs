//! Trends and totals across many reports.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::character::Mood;
use crate::error::{Error, Result};
use crate::report::{completion_rate, Report, SkillProgress, MAX_SKILL_PROGRESS};
use crate::task::Category;

/// Look-back periods for analytics, counted back from now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyticsPeriod {
    Week,
    Month,
    Year,
    #[default]
    Last30Days,
}

impl AnalyticsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsPeriod::Week => "week",
            AnalyticsPeriod::Month => "month",
            AnalyticsPeriod::Year => "year",
            AnalyticsPeriod::Last30Days => "30d",
        }
    }

    /// Earliest report date included when looking back from `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let thirty_days = now - Duration::days(30);
        match self {
            AnalyticsPeriod::Week => now - Duration::days(7),
            AnalyticsPeriod::Month => now.checked_sub_months(Months::new(1)).unwrap_or(thirty_days),
            AnalyticsPeriod::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or(now - Duration::days(365)),
            AnalyticsPeriod::Last30Days => thirty_days,
        }
    }
}

impl FromStr for AnalyticsPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(AnalyticsPeriod::Week),
            "month" => Ok(AnalyticsPeriod::Month),
            "year" => Ok(AnalyticsPeriod::Year),
            "30d" | "last-30-days" => Ok(AnalyticsPeriod::Last30Days),
            _ => Err(Error::invalid_enum("analytics period", s)),
        }
    }
}

/// Reports dated within `[from, to]`; `to` may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsWindow {
    pub from: DateTime<Utc>,
    pub to: Option<DateTime<Utc>>,
}

impl AnalyticsWindow {
    pub fn last(period: AnalyticsPeriod, now: DateTime<Utc>) -> Self {
        Self {
            from: period.since(now),
            to: None,
        }
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to: Some(to) }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && self.to.is_none_or(|t| at <= t)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint<T> {
    pub date: DateTime<Utc>,
    pub value: T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub completed: u32,
    pub failed: u32,
    pub total: u32,
    /// floor(completed / total * 100), 0 when total is 0.
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportAnalytics {
    pub report_count: usize,
    pub mood_trend: Vec<TrendPoint<Mood>>,
    pub energy_trend: Vec<TrendPoint<u8>>,
    pub rating_trend: Vec<TrendPoint<u8>>,
    pub task_completion_rate: u32,
    pub category_performance: BTreeMap<Category, CategoryPerformance>,
    /// Average per-report progress, highest first.
    pub skills_progress: Vec<SkillProgress>,
}

/// Aggregate the reports dated inside `window`.
///
/// Trends are oldest first. With no matching reports every total is zero
/// and every list is empty.
pub fn analytics(reports: &[Report], window: AnalyticsWindow) -> ReportAnalytics {
    let mut selected: Vec<&Report> = reports.iter().filter(|r| window.contains(r.date)).collect();
    if selected.is_empty() {
        return ReportAnalytics::default();
    }
    selected.sort_by_key(|r| r.date);

    let mut out = ReportAnalytics {
        report_count: selected.len(),
        ..ReportAnalytics::default()
    };
    let mut completed = 0usize;
    let mut failed = 0usize;
    let mut skills: BTreeMap<&str, u32> = BTreeMap::new();

    for r in &selected {
        out.mood_trend.push(TrendPoint { date: r.date, value: r.mood });
        out.energy_trend.push(TrendPoint { date: r.date, value: r.energy_level });
        out.rating_trend.push(TrendPoint { date: r.date, value: r.rating });

        completed += r.task_stats.completed_count;
        failed += r.task_stats.failed_count;

        for (category, s) in &r.category_stats {
            let perf = out.category_performance.entry(*category).or_default();
            perf.completed += s.completed;
            perf.failed += s.failed;
            perf.total += s.total;
        }
        for sp in &r.skills_progress {
            *skills.entry(sp.skill.as_str()).or_default() += sp.progress;
        }
    }

    out.task_completion_rate = completion_rate(completed, failed);
    for perf in out.category_performance.values_mut() {
        if perf.total > 0 {
            perf.completion_rate = perf.completed * 100 / perf.total;
        }
    }

    let n = selected.len() as u32;
    out.skills_progress = skills
        .into_iter()
        .map(|(skill, sum)| SkillProgress {
            skill: skill.to_string(),
            progress: (sum / n).min(MAX_SKILL_PROGRESS),
        })
        .collect();
    // Stable: equal progress stays alphabetical.
    out.skills_progress.sort_by(|a, b| b.progress.cmp(&a.progress));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{build_report, ReportInput, ReportPeriod};
    use crate::task::Task;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, 21, 0, 0).unwrap()
    }

    fn done(id: &str, category: Category, when: DateTime<Utc>, skills: &[&str]) -> Task {
        let mut t = Task::new(id, id).with_category(category).with_skills(skills.iter().copied());
        t.mark_done(when).unwrap();
        t
    }

    fn failed(id: &str, category: Category, when: DateTime<Utc>) -> Task {
        let mut t = Task::new(id, id).with_category(category);
        t.mark_failed(when).unwrap();
        t
    }

    fn report(id: &str, day: u32, rating: u8, mood: Mood, energy: u8, tasks: &[Task]) -> Report {
        let input = ReportInput::new(ReportPeriod::Daily, rating, mood, energy);
        build_report(id, input, tasks, at(day), "UTC").unwrap()
    }

    fn sample() -> Vec<Report> {
        let day10 = [
            done("a", Category::Work, at(10), &["focus", "focus-2"]),
            done("b", Category::Work, at(10), &["focus"]),
            failed("c", Category::Health, at(10)),
        ];
        let day12 = [
            done("d", Category::Health, at(12), &["focus", "grit"]),
            failed("e", Category::Work, at(12)),
        ];
        // Stored newest first to check the trend ordering.
        vec![
            report("r2", 12, 4, Mood::Bad, 30, &day12),
            report("r1", 10, 8, Mood::Good, 70, &day10),
        ]
    }

    #[test]
    fn test_empty_reports_give_zeros() {
        let a = analytics(&[], AnalyticsWindow::last(AnalyticsPeriod::Week, at(15)));
        assert_eq!(a, ReportAnalytics::default());
        assert_eq!(a.task_completion_rate, 0);
        assert!(a.mood_trend.is_empty() && a.skills_progress.is_empty());
        assert!(a.category_performance.is_empty());
    }

    #[test]
    fn test_aggregates_reports_in_window() {
        let a = analytics(&sample(), AnalyticsWindow::last(AnalyticsPeriod::Week, at(15)));

        assert_eq!(a.report_count, 2);
        let moods: Vec<Mood> = a.mood_trend.iter().map(|p| p.value).collect();
        assert_eq!(moods, vec![Mood::Good, Mood::Bad]);
        let energy: Vec<u8> = a.energy_trend.iter().map(|p| p.value).collect();
        assert_eq!(energy, vec![70, 30]);
        assert_eq!(a.rating_trend[1].value, 4);

        // 3 completed, 2 failed
        assert_eq!(a.task_completion_rate, 60);

        let work = a.category_performance[&Category::Work];
        assert_eq!((work.completed, work.failed, work.total), (2, 1, 3));
        assert_eq!(work.completion_rate, 66);
        assert_eq!(a.category_performance[&Category::Health].completion_rate, 50);
        assert_eq!(a.category_performance[&Category::Creativity], CategoryPerformance::default());

        // focus: (2 + 1) / 2 = 1; focus-2 and grit: 1 / 2 = 0
        assert_eq!(a.skills_progress[0], SkillProgress { skill: "focus".into(), progress: 1 });
        let rest: Vec<&str> = a.skills_progress[1..].iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(rest, vec!["focus-2", "grit"]);
    }

    #[test]
    fn test_window_excludes_old_reports() {
        let a = analytics(&sample(), AnalyticsWindow::between(at(11), at(20)));
        assert_eq!(a.report_count, 1);
        assert_eq!(a.task_completion_rate, 50);

        let none = analytics(&sample(), AnalyticsWindow::last(AnalyticsPeriod::Week, at(30)));
        assert_eq!(none.report_count, 0);
    }

    #[test]
    fn test_skill_average_capped() {
        let tasks: Vec<Task> = (0..12)
            .map(|i| done(&format!("t{i}"), Category::Work, at(10), &["grit"]))
            .collect();
        let reports = vec![report("r", 10, 7, Mood::Good, 50, &tasks)];
        let a = analytics(&reports, AnalyticsWindow::last(AnalyticsPeriod::Year, at(11)));
        assert_eq!(a.skills_progress[0].progress, MAX_SKILL_PROGRESS);
    }

    #[test]
    fn test_period_since() {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(AnalyticsPeriod::Week.since(now), Utc.with_ymd_and_hms(2026, 3, 24, 12, 0, 0).unwrap());
        // March 31 minus a month clamps to the end of February.
        assert_eq!(AnalyticsPeriod::Month.since(now), Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap());
        assert_eq!(AnalyticsPeriod::Year.since(now), Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap());
        assert_eq!("30d".parse::<AnalyticsPeriod>().unwrap(), AnalyticsPeriod::Last30Days);
        assert!("fortnight".parse::<AnalyticsPeriod>().is_err());
    }
}
