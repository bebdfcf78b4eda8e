//! Periodic reflective reports and the task statistics they aggregate.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::character::Mood;
use crate::error::{Error, Result};
use crate::mentor::{select_tips, MentorTip, ReportTip, MAX_REPORT_TIPS};
use crate::task::{Category, Task, TaskStatus};
use crate::time::{local_date, local_start_of_day, parse_timezone};

/// Skill progress is capped per report.
pub const MAX_SKILL_PROGRESS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
        }
    }

    /// Half-open UTC window `[start, end)` covered by a report written at `now`.
    ///
    /// Daily starts at local midnight, weekly on Monday, monthly on the 1st.
    /// All windows end at the next local midnight.
    pub fn window(&self, now: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = local_date(now, tz);
        let first = match self {
            ReportPeriod::Daily => today,
            ReportPeriod::Weekly => today - Days::new(today.weekday().num_days_from_monday() as u64),
            ReportPeriod::Monthly => today.with_day(1).unwrap_or(today),
        };
        let end = local_start_of_day(today + Days::new(1), tz);
        (local_start_of_day(first, tz), end)
    }
}

impl FromStr for ReportPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ReportPeriod::Daily),
            "weekly" => Ok(ReportPeriod::Weekly),
            "monthly" => Ok(ReportPeriod::Monthly),
            _ => Err(Error::invalid_enum("report period", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    #[serde(default)]
    pub positive: String,
    #[serde(default)]
    pub negative: String,
    #[serde(default)]
    pub lessons: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodGoal {
    pub title: String,
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strength {
    pub title: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weakness {
    pub title: String,
    #[serde(default)]
    pub details: String,
    /// `None` in a report leaves the profile's flag as it was.
    #[serde(default)]
    pub working_on: Option<bool>,
}

/// Fold reported strengths into the profile's list, matching by title.
///
/// Known titles get their details replaced when new details are given;
/// unknown titles are appended.
pub fn merge_strengths(known: &mut Vec<Strength>, reported: &[Strength]) {
    for s in reported {
        match known.iter_mut().find(|k| k.title == s.title) {
            Some(k) => {
                if !s.details.is_empty() {
                    k.details = s.details.clone();
                }
            }
            None => known.push(s.clone()),
        }
    }
}

/// Same as [`merge_strengths`], also carrying the `working_on` flag.
pub fn merge_weaknesses(known: &mut Vec<Weakness>, reported: &[Weakness]) {
    for w in reported {
        match known.iter_mut().find(|k| k.title == w.title) {
            Some(k) => {
                if !w.details.is_empty() {
                    k.details = w.details.clone();
                }
                if w.working_on.is_some() {
                    k.working_on = w.working_on;
                }
            }
            None => known.push(Weakness {
                working_on: Some(w.working_on.unwrap_or(false)),
                ..w.clone()
            }),
        }
    }
}

/// What the user fills in; everything else is derived from their tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInput {
    pub period: ReportPeriod,
    /// 1..=10
    pub rating: u8,
    pub mood: Mood,
    /// 0..=100
    pub energy_level: u8,
    #[serde(default)]
    pub reflection: Reflection,
    #[serde(default)]
    pub next_period_goals: Vec<PeriodGoal>,
    #[serde(default)]
    pub strengths: Vec<Strength>,
    #[serde(default)]
    pub weaknesses: Vec<Weakness>,
}

impl ReportInput {
    pub fn new(period: ReportPeriod, rating: u8, mood: Mood, energy_level: u8) -> Self {
        Self {
            period,
            rating,
            mood,
            energy_level,
            reflection: Reflection::default(),
            next_period_goals: Vec::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.rating) {
            return Err(Error::OutOfRange {
                field: "rating",
                value: self.rating as i64,
                min: 1,
                max: 10,
            });
        }
        if self.energy_level > 100 {
            return Err(Error::OutOfRange {
                field: "energy_level",
                value: self.energy_level as i64,
                min: 0,
                max: 100,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    pub in_progress: Vec<String>,
    pub completed_count: usize,
    pub failed_count: usize,
    pub in_progress_count: usize,
    /// floor(completed / (completed + failed) * 100), 0 when nothing finished.
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub completed: u32,
    pub failed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProgress {
    pub skill: String,
    pub progress: u32,
}

/// Which kind of mentor advice fits the period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MentorSituation {
    LowMotivation,
    TaskStreak,
    TaskFailed,
    #[default]
    General,
}

impl MentorSituation {
    pub fn classify(rating: u8, completed: usize, failed: usize) -> Self {
        if rating <= 4 {
            MentorSituation::LowMotivation
        } else if completed >= 3 {
            MentorSituation::TaskStreak
        } else if failed > completed {
            MentorSituation::TaskFailed
        } else {
            MentorSituation::General
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub period: ReportPeriod,
    pub date: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub rating: u8,
    pub mood: Mood,
    pub energy_level: u8,
    pub task_stats: TaskStats,
    pub category_stats: BTreeMap<Category, CategoryStats>,
    #[serde(default)]
    pub reflection: Reflection,
    #[serde(default)]
    pub next_period_goals: Vec<PeriodGoal>,
    #[serde(default)]
    pub strengths: Vec<Strength>,
    #[serde(default)]
    pub weaknesses: Vec<Weakness>,
    #[serde(default)]
    pub skills_progress: Vec<SkillProgress>,
    /// 70% completion rate, 30% self rating.
    pub overall_progress: u32,
    pub mentor_situation: MentorSituation,
    #[serde(default)]
    pub mentor_tips: Vec<ReportTip>,
}

impl Report {
    /// Attach up to three active tips for this report's situation.
    pub fn with_mentor_tips(mut self, catalog: &[MentorTip]) -> Self {
        self.mentor_tips = select_tips(catalog, self.mentor_situation, MAX_REPORT_TIPS);
        self
    }
}

pub fn completion_rate(completed: usize, failed: usize) -> u32 {
    let total = completed + failed;
    if total == 0 {
        return 0;
    }
    (completed * 100 / total) as u32
}

pub fn overall_progress(completion_rate: u32, rating: u8) -> u32 {
    (completion_rate * 7 + rating as u32 * 30) / 10
}

/// Build a report for the period ending at `now` in timezone `tz`.
///
/// Done/failed tasks count when their `completed_at` lies in the window; a
/// habit counts as completed when its latest check-in does. Tasks currently
/// in progress count regardless of time.
pub fn build_report(
    id: impl Into<String>,
    input: ReportInput,
    tasks: &[Task],
    now: DateTime<Utc>,
    tz: &str,
) -> Result<Report> {
    input.validate()?;
    let zone = parse_timezone(tz)?;
    let (window_start, window_end) = input.period.window(now, zone);
    let in_window = |t: &Task| {
        t.completed_at
            .is_some_and(|at| at >= window_start && at < window_end)
    };

    let mut stats = TaskStats::default();
    let mut category_stats: BTreeMap<Category, CategoryStats> =
        Category::ALL.iter().map(|c| (*c, CategoryStats::default())).collect();
    let mut skills: BTreeMap<&str, u32> = BTreeMap::new();

    for task in tasks {
        let checked_in = task.is_habit() && in_window(task);
        match task.status {
            TaskStatus::Done if in_window(task) => {
                stats.completed.push(task.id.clone());
                category_stats.entry(task.category).or_default().completed += 1;
            }
            TaskStatus::Failed if in_window(task) => {
                stats.failed.push(task.id.clone());
                category_stats.entry(task.category).or_default().failed += 1;
            }
            TaskStatus::InProgress if checked_in => {
                stats.completed.push(task.id.clone());
                category_stats.entry(task.category).or_default().completed += 1;
            }
            TaskStatus::InProgress => {
                stats.in_progress.push(task.id.clone());
                continue;
            }
            _ => continue,
        }

        if task.status == TaskStatus::Failed {
            continue;
        }
        for skill in &task.skills {
            *skills.entry(skill.as_str()).or_default() += 1;
        }
    }

    for cat in category_stats.values_mut() {
        cat.total = cat.completed + cat.failed;
    }

    stats.completed_count = stats.completed.len();
    stats.failed_count = stats.failed.len();
    stats.in_progress_count = stats.in_progress.len();
    stats.completion_rate = completion_rate(stats.completed_count, stats.failed_count);

    let skills_progress = skills
        .into_iter()
        .map(|(skill, count)| SkillProgress {
            skill: skill.to_string(),
            progress: count.min(MAX_SKILL_PROGRESS),
        })
        .collect();

    let mentor_situation =
        MentorSituation::classify(input.rating, stats.completed_count, stats.failed_count);

    Ok(Report {
        id: id.into(),
        period: input.period,
        date: now,
        window_start,
        window_end,
        rating: input.rating,
        mood: input.mood,
        energy_level: input.energy_level,
        overall_progress: overall_progress(stats.completion_rate, input.rating),
        task_stats: stats,
        category_stats,
        reflection: input.reflection,
        next_period_goals: input.next_period_goals,
        strengths: input.strengths,
        weaknesses: input.weaknesses,
        skills_progress,
        mentor_situation,
        mentor_tips: Vec::new(),
    })
}

/// Reports matching an optional period and date range, newest first.
pub fn filter_reports<'a>(
    reports: &'a [Report],
    period: Option<ReportPeriod>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Vec<&'a Report> {
    let mut out: Vec<&Report> = reports
        .iter()
        .filter(|r| period.is_none_or(|p| r.period == p))
        .filter(|r| from.is_none_or(|f| r.date >= f))
        .filter(|r| to.is_none_or(|t| r.date <= t))
        .collect();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskType;
    use chrono::TimeZone;

    const TZ: &str = "UTC";

    // Wednesday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 15, 20, 0, 0).unwrap()
    }

    fn done(id: &str, category: Category, at: DateTime<Utc>) -> Task {
        let mut t = Task::new(id, id).with_category(category);
        t.mark_done(at).unwrap();
        t
    }

    fn failed(id: &str, category: Category, at: DateTime<Utc>) -> Task {
        let mut t = Task::new(id, id).with_category(category);
        t.mark_failed(at).unwrap();
        t
    }

    #[test]
    fn test_windows() {
        let tz = parse_timezone(TZ).unwrap();
        let (s, e) = ReportPeriod::Daily.window(now(), tz);
        assert_eq!(s, Utc.with_ymd_and_hms(2026, 4, 15, 0, 0, 0).unwrap());
        assert_eq!(e, Utc.with_ymd_and_hms(2026, 4, 16, 0, 0, 0).unwrap());

        let (s, _) = ReportPeriod::Weekly.window(now(), tz);
        assert_eq!(s, Utc.with_ymd_and_hms(2026, 4, 13, 0, 0, 0).unwrap());

        let (s, _) = ReportPeriod::Monthly.window(now(), tz);
        assert_eq!(s, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_weekly_window_on_sunday_starts_monday() {
        let tz = parse_timezone(TZ).unwrap();
        let sunday = Utc.with_ymd_and_hms(2026, 4, 19, 10, 0, 0).unwrap();
        let (s, _) = ReportPeriod::Weekly.window(sunday, tz);
        assert_eq!(s, Utc.with_ymd_and_hms(2026, 4, 13, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_daily_window_in_local_time() {
        let tz = parse_timezone("Asia/Tokyo").unwrap();
        // 2026-04-15 20:00 UTC is 2026-04-16 05:00 JST
        let (s, e) = ReportPeriod::Daily.window(now(), tz);
        assert_eq!(s, Utc.with_ymd_and_hms(2026, 4, 15, 15, 0, 0).unwrap());
        assert_eq!(e, Utc.with_ymd_and_hms(2026, 4, 16, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_build_daily_report() {
        let today = Utc.with_ymd_and_hms(2026, 4, 15, 9, 0, 0).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2026, 4, 14, 9, 0, 0).unwrap();

        let mut wip = Task::new("w1", "novel").with_category(Category::Creativity);
        wip.start().unwrap();

        let tasks = vec![
            done("d1", Category::Work, today).with_skills(["focus"]),
            done("d2", Category::Work, today).with_skills(["focus", "discipline"]),
            done("d3", Category::Health, today),
            failed("f1", Category::Health, today).with_skills(["discipline"]),
            done("old", Category::Work, yesterday),
            wip,
        ];

        let input = ReportInput::new(ReportPeriod::Daily, 8, Mood::Good, 60);
        let r = build_report("r1", input, &tasks, now(), TZ).unwrap();

        assert_eq!(r.task_stats.completed, vec!["d1", "d2", "d3"]);
        assert_eq!(r.task_stats.failed_count, 1);
        assert_eq!(r.task_stats.in_progress, vec!["w1"]);
        assert_eq!(r.task_stats.completion_rate, 75);
        // floor(75 * 0.7 + 8 * 10 * 0.3) = floor(52.5 + 24) = 76
        assert_eq!(r.overall_progress, 76);
        assert_eq!(r.category_stats[&Category::Work], CategoryStats { completed: 2, failed: 0, total: 2 });
        assert_eq!(r.category_stats[&Category::Health].total, 2);
        assert_eq!(r.category_stats[&Category::Relationships].total, 0);
        assert_eq!(
            r.skills_progress,
            vec![
                SkillProgress { skill: "discipline".into(), progress: 1 },
                SkillProgress { skill: "focus".into(), progress: 2 },
            ]
        );
        assert_eq!(r.mentor_situation, MentorSituation::TaskStreak);
    }

    #[test]
    fn test_habit_check_in_counts_as_completed() {
        let today = Utc.with_ymd_and_hms(2026, 4, 15, 7, 0, 0).unwrap();
        let mut habit = Task::new("h1", "meditate").with_type(TaskType::Habit);
        habit.mark_done(today).unwrap();
        let mut idle = Task::new("h2", "floss").with_type(TaskType::Habit);
        idle.start().unwrap();

        let input = ReportInput::new(ReportPeriod::Daily, 6, Mood::Neutral, 50);
        let r = build_report("r", input, &[habit, idle], now(), TZ).unwrap();
        assert_eq!(r.task_stats.completed, vec!["h1"]);
        assert_eq!(r.task_stats.in_progress, vec!["h2"]);
    }

    #[test]
    fn test_empty_report() {
        let input = ReportInput::new(ReportPeriod::Monthly, 10, Mood::Excellent, 100);
        let r = build_report("r", input, &[], now(), TZ).unwrap();
        assert_eq!(r.task_stats.completion_rate, 0);
        assert_eq!(r.overall_progress, 30);
        assert_eq!(r.mentor_situation, MentorSituation::General);
        assert_eq!(r.category_stats.len(), Category::ALL.len());
    }

    #[test]
    fn test_skill_progress_capped() {
        let today = Utc.with_ymd_and_hms(2026, 4, 15, 9, 0, 0).unwrap();
        let tasks: Vec<Task> = (0..12)
            .map(|i| done(&format!("t{i}"), Category::Work, today).with_skills(["grit"]))
            .collect();
        let input = ReportInput::new(ReportPeriod::Daily, 7, Mood::Good, 40);
        let r = build_report("r", input, &tasks, now(), TZ).unwrap();
        assert_eq!(r.skills_progress[0].progress, MAX_SKILL_PROGRESS);
    }

    #[test]
    fn test_mentor_situation() {
        assert_eq!(MentorSituation::classify(4, 10, 0), MentorSituation::LowMotivation);
        assert_eq!(MentorSituation::classify(5, 3, 9), MentorSituation::TaskStreak);
        assert_eq!(MentorSituation::classify(5, 1, 2), MentorSituation::TaskFailed);
        assert_eq!(MentorSituation::classify(9, 1, 1), MentorSituation::General);
    }

    #[test]
    fn test_validation() {
        let bad_rating = ReportInput::new(ReportPeriod::Daily, 0, Mood::Bad, 10);
        assert!(matches!(
            build_report("r", bad_rating, &[], now(), TZ),
            Err(Error::OutOfRange { field: "rating", .. })
        ));
        let bad_energy = ReportInput::new(ReportPeriod::Daily, 5, Mood::Bad, 101);
        assert!(matches!(bad_energy.validate(), Err(Error::OutOfRange { field: "energy_level", .. })));
        let ok = ReportInput::new(ReportPeriod::Daily, 5, Mood::Bad, 10);
        assert!(matches!(build_report("r", ok, &[], now(), "Nowhere/City"), Err(Error::InvalidTimezone(_))));
    }

    #[test]
    fn test_report_carries_strengths_and_tips() {
        let mut input = ReportInput::new(ReportPeriod::Daily, 3, Mood::Bad, 20);
        input.strengths = vec![Strength { title: "focus".into(), details: String::new() }];
        input.weaknesses = vec![Weakness {
            title: "sleep".into(),
            details: "late nights".into(),
            working_on: Some(true),
        }];
        let r = build_report("r", input, &[], now(), TZ)
            .unwrap()
            .with_mentor_tips(&crate::mentor::default_tips());

        assert_eq!(r.strengths[0].title, "focus");
        assert_eq!(r.weaknesses[0].working_on, Some(true));
        assert_eq!(r.mentor_situation, MentorSituation::LowMotivation);
        assert!(!r.mentor_tips.is_empty());
        assert!(r.mentor_tips.len() <= MAX_REPORT_TIPS);
    }

    #[test]
    fn test_merge_strengths_and_weaknesses() {
        let mut strengths = vec![Strength { title: "focus".into(), details: "mornings".into() }];
        merge_strengths(
            &mut strengths,
            &[
                Strength { title: "focus".into(), details: String::new() },
                Strength { title: "patience".into(), details: "with kids".into() },
            ],
        );
        assert_eq!(strengths.len(), 2);
        assert_eq!(strengths[0].details, "mornings");
        assert_eq!(strengths[1].title, "patience");

        let mut weaknesses = vec![Weakness {
            title: "sleep".into(),
            details: String::new(),
            working_on: Some(true),
        }];
        merge_weaknesses(
            &mut weaknesses,
            &[
                Weakness { title: "sleep".into(), details: "too late".into(), working_on: None },
                Weakness { title: "sugar".into(), details: String::new(), working_on: None },
            ],
        );
        assert_eq!(weaknesses[0].details, "too late");
        assert_eq!(weaknesses[0].working_on, Some(true));
        assert_eq!(weaknesses[1].working_on, Some(false));
    }

    #[test]
    fn test_filter_reports_newest_first() {
        let mk = |id: &str, period, day| {
            let input = ReportInput::new(period, 5, Mood::Neutral, 50);
            let at = Utc.with_ymd_and_hms(2026, 4, day, 21, 0, 0).unwrap();
            build_report(id, input, &[], at, TZ).unwrap()
        };
        let reports = vec![
            mk("a", ReportPeriod::Daily, 1),
            mk("b", ReportPeriod::Weekly, 5),
            mk("c", ReportPeriod::Daily, 9),
        ];

        let daily = filter_reports(&reports, Some(ReportPeriod::Daily), None, None);
        assert_eq!(daily.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["c", "a"]);

        let since = Utc.with_ymd_and_hms(2026, 4, 4, 0, 0, 0).unwrap();
        let recent = filter_reports(&reports, None, Some(since), None);
        assert_eq!(recent.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["c", "b"]);
    }
}
