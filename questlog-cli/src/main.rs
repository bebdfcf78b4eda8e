use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use questlog_core::time::local_date_range;
use questlog_core::{
    analytics, build_report, catalog_view, complete_task, default_catalog, default_tips, fail_task,
    filter_reports, merge_strengths, merge_weaknesses, AchievementAward, AnalyticsPeriod,
    AnalyticsWindow, Category, Difficulty, Mood, PeriodGoal, Reflection, ReportAnalytics,
    ReportInput, ReportPeriod, Strength, Task, TaskOutcome, TaskStatus, TaskType, Weakness,
};

mod config;
mod state;

use state::{Profile, Session};

#[derive(Parser, Debug)]
#[command(
    name = "questlog",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("QUESTLOG_BUILD_SHA"), ")"),
    about = "Turn your tasks into quests"
)]
struct Cli {
    /// Enable debug logging (overridden by QUESTLOG_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create ~/.questlog with a fresh character and the default achievement and tip catalogs
    Init {
        /// IANA timezone for reports (default: UTC)
        #[arg(long)]
        timezone: Option<String>,

        /// Overwrite an existing profile and catalogs
        #[arg(long)]
        force: bool,
    },

    /// Show character level, experience, energy and statistics
    Status,

    /// Task commands
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// List achievements and whether you have earned them
    Achievements {
        /// Include hidden achievements (redacted until earned)
        #[arg(long)]
        hidden: bool,
    },

    /// Evaluate the achievement catalog now
    Check,

    /// Reflective reports
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Add a new task
    Add {
        title: String,

        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,

        #[arg(long = "type", default_value = "daily")]
        task_type: TaskType,

        #[arg(long, default_value = "personal-growth")]
        category: Category,

        /// Base experience before multipliers
        #[arg(long, default_value_t = 10)]
        xp: u32,

        /// Base energy change before multipliers (may be negative)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        energy: i32,

        /// Skill trained by this task (repeatable)
        #[arg(long = "skill")]
        skills: Vec<String>,

        /// Local deadline "YYYY-MM-DD HH:MM" in the configured timezone
        #[arg(long)]
        deadline: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List tasks (open ones unless --all)
    List {
        #[arg(long)]
        all: bool,
    },

    /// Mark a task in progress
    Start { id: String },

    /// Postpone a task
    Postpone { id: String },

    /// Complete a task (or check in a habit) and collect the reward
    Complete { id: String },

    /// Fail a task (or break a habit streak)
    Fail { id: String },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Write a report for the current period
    Create {
        #[arg(long, default_value = "daily")]
        period: ReportPeriod,

        /// How the period went, 1-10
        #[arg(long)]
        rating: u8,

        #[arg(long)]
        mood: Mood,

        /// Energy at the end of the period, 0-100
        #[arg(long)]
        energy: u8,

        #[arg(long, default_value = "")]
        positive: String,

        #[arg(long, default_value = "")]
        negative: String,

        #[arg(long, default_value = "")]
        lessons: String,

        /// Goal for the next period (repeatable)
        #[arg(long = "goal")]
        goals: Vec<String>,

        /// Something that went well, as "title" or "title: details" (repeatable)
        #[arg(long = "strength")]
        strengths: Vec<String>,

        /// Something to improve, as "title" or "title: details" (repeatable)
        #[arg(long = "weakness")]
        weaknesses: Vec<String>,

        /// Mark the given weaknesses as being worked on
        #[arg(long)]
        working_on: bool,
    },

    /// List past reports, newest first
    List {
        #[arg(long)]
        period: Option<ReportPeriod>,

        /// Only reports on or after this local date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only reports on or before this local date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Trends and totals over recent reports
    Analytics {
        /// week, month, year or 30d
        #[arg(long, default_value = "30d")]
        period: AnalyticsPeriod,

        /// Start of an explicit range (local date); needs --to
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// End of an explicit range (local date); needs --from
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let now = Utc::now();

    match cli.command {
        Command::Init { timezone, force } => init(timezone, force, now)?,
        Command::Status => {
            let session = Session::load()?;
            print_status(&session.profile);
        }
        Command::Task { command } => run_task(command, now)?,
        Command::Achievements { hidden } => {
            let session = Session::load()?;
            let include_hidden = hidden || session.config.achievements.show_hidden;
            let views = catalog_view(&session.catalog, &session.profile.achievements, include_hidden);
            if views.is_empty() {
                println!("No achievements in catalog.");
            }
            for v in views {
                let mark = if v.is_earned { "x" } else { " " };
                println!("[{mark}] {:<12} {} - {}", format!("{:?}", v.rarity), v.title, v.description);
            }
        }
        Command::Check => {
            let mut session = Session::load()?;
            let awards = session.award_achievements(now);
            print_awards(&awards);
            if awards.is_empty() {
                println!("No new achievements.");
            }
            session.save()?;
        }
        Command::Report { command } => run_report(command, now)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("QUESTLOG_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn init(timezone: Option<String>, force: bool, now: DateTime<Utc>) -> Result<()> {
    config::init_config(timezone)?;
    let cfg = config::load_config()?;

    let pp = state::profile_path()?;
    if pp.exists() && !force {
        println!("Profile already exists: {} (pass --force to start over)", pp.display());
    } else {
        state::write_json(&pp, &Profile::new(now))?;
        state::write_json(&state::tasks_path()?, &Vec::<Task>::new())?;
        state::write_json(&state::reports_path()?, &Vec::<questlog_core::Report>::new())?;
        println!("Wrote {}", pp.display());
    }

    let cp = state::catalog_path(&cfg)?;
    if cp.exists() && !force {
        println!("Catalog already exists: {}", cp.display());
    } else {
        state::write_json(&cp, &default_catalog())?;
        println!("Wrote {}", cp.display());
    }

    let tp = state::tips_path()?;
    if tp.exists() && !force {
        println!("Tips already exist: {}", tp.display());
    } else {
        state::write_json(&tp, &default_tips())?;
        println!("Wrote {}", tp.display());
    }

    let home = state::questlog_home()?;
    tracing::info!(home = %home.display(), "initialized");
    println!("\nNext: questlog task add \"My first quest\" --difficulty easy");
    Ok(())
}

fn run_task(command: TaskCommand, now: DateTime<Utc>) -> Result<()> {
    let mut session = Session::load()?;

    match command {
        TaskCommand::Add {
            title,
            difficulty,
            task_type,
            category,
            xp,
            energy,
            skills,
            deadline,
            description,
        } => {
            let id = session.next_task_id();
            let mut task = Task::new(id, title)
                .with_difficulty(difficulty)
                .with_type(task_type)
                .with_category(category)
                .with_experience(xp)
                .with_energy(energy)
                .with_skills(skills);
            task.description = description;
            if let Some(local) = deadline {
                let tz = &session.config.profile.timezone;
                let due = questlog_core::time::parse_local_deadline_to_utc(&local, tz)
                    .with_context(|| format!("parsing deadline {local}"))?;
                task = task.with_deadline(due);
            }

            let reward = questlog_core::Reward::for_task(&task);
            println!(
                "Added {} \"{}\" [{} {} {}] reward: {} xp, {:+} energy",
                task.id, task.title, task.difficulty, task.task_type, task.category,
                reward.experience, reward.energy
            );
            session.tasks.push(task);
        }

        TaskCommand::List { all } => {
            let shown: Vec<&Task> = session
                .tasks
                .iter()
                .filter(|t| all || !t.status.is_terminal())
                .collect();
            if shown.is_empty() {
                println!("No tasks. Add one: questlog task add \"<title>\"");
            }
            for t in shown {
                print_task(t);
            }
            return Ok(());
        }

        TaskCommand::Start { id } => {
            let idx = session.task_index(&id)?;
            session.tasks[idx].start()?;
            println!("{} is now {}", id, TaskStatus::InProgress);
        }

        TaskCommand::Postpone { id } => {
            let idx = session.task_index(&id)?;
            session.tasks[idx].postpone()?;
            println!("{} postponed", id);
        }

        TaskCommand::Complete { id } => {
            let idx = session.task_index(&id)?;
            let tz = session.timezone()?;
            let out = complete_task(
                &session.tasks[idx],
                &session.profile.character,
                &session.profile.stats,
                now,
                tz,
            )?;
            print_outcome(&out);
            apply_outcome(&mut session, idx, out);
            print_awards(&session.award_achievements(now));
        }

        TaskCommand::Fail { id } => {
            let idx = session.task_index(&id)?;
            let out = fail_task(
                &session.tasks[idx],
                &session.profile.character,
                &session.profile.stats,
                now,
            )?;
            print_outcome(&out);
            apply_outcome(&mut session, idx, out);
        }
    }

    session.save()
}

fn apply_outcome(session: &mut Session, idx: usize, out: TaskOutcome) {
    session.tasks[idx] = out.task;
    session.profile.character = out.character;
    session.profile.stats = out.stats;
}

fn run_report(command: ReportCommand, now: DateTime<Utc>) -> Result<()> {
    let mut session = Session::load()?;

    match command {
        ReportCommand::Create {
            period,
            rating,
            mood,
            energy,
            positive,
            negative,
            lessons,
            goals,
            strengths,
            weaknesses,
            working_on,
        } => {
            let mut input = ReportInput::new(period, rating, mood, energy);
            input.reflection = Reflection {
                positive,
                negative,
                lessons,
            };
            input.next_period_goals = goals
                .into_iter()
                .map(|title| PeriodGoal {
                    title,
                    category: None,
                })
                .collect();
            input.strengths = strengths
                .iter()
                .map(|s| {
                    let (title, details) = split_note(s);
                    Strength { title, details }
                })
                .collect();
            input.weaknesses = weaknesses
                .iter()
                .map(|s| {
                    let (title, details) = split_note(s);
                    Weakness {
                        title,
                        details,
                        working_on: working_on.then_some(true),
                    }
                })
                .collect();

            let id = format!("r{}", session.reports.len() + 1);
            let report = build_report(
                id,
                input,
                &session.tasks,
                now,
                &session.config.profile.timezone,
            )?
            .with_mentor_tips(&session.tips);

            println!("# {} report\n", report.period.as_str());
            println!(
                "Completed {} | failed {} | in progress {} | completion {}% | overall progress {}%",
                report.task_stats.completed_count,
                report.task_stats.failed_count,
                report.task_stats.in_progress_count,
                report.task_stats.completion_rate,
                report.overall_progress
            );
            for (cat, s) in report.category_stats.iter().filter(|(_, s)| s.total > 0) {
                println!("- {cat}: {}/{} done", s.completed, s.total);
            }
            for sp in &report.skills_progress {
                println!("- skill {}: +{}", sp.skill, sp.progress);
            }
            for tip in &report.mentor_tips {
                println!("Mentor ({}): {}", tip.category, tip.tip);
            }

            merge_strengths(&mut session.profile.strengths, &report.strengths);
            merge_weaknesses(&mut session.profile.weaknesses, &report.weaknesses);
            session.profile.character = session.profile.character.with_mood(report.mood);
            session.reports.push(report);
            print_awards(&session.award_achievements(now));
        }

        ReportCommand::List { period, from, to } => {
            let (from, to) = local_date_range(from, to, session.timezone()?);
            let reports = filter_reports(&session.reports, period, from, to);
            if reports.is_empty() {
                println!("No reports.");
            }
            for r in reports {
                println!(
                    "{} {} {:<8} rating={} mood={} progress={}%",
                    r.id,
                    r.date.format("%Y-%m-%d"),
                    r.period.as_str(),
                    r.rating,
                    r.mood.as_str(),
                    r.overall_progress
                );
            }
            return Ok(());
        }

        ReportCommand::Analytics { period, from, to } => {
            let window = match local_date_range(from, to, session.timezone()?) {
                (Some(from), Some(to)) => AnalyticsWindow::between(from, to),
                _ => AnalyticsWindow::last(period, now),
            };
            print_analytics(&analytics(&session.reports, window));
            return Ok(());
        }
    }

    session.save()
}

/// Split "title: details" into its parts; details may be empty.
fn split_note(raw: &str) -> (String, String) {
    match raw.split_once(':') {
        Some((title, details)) => (title.trim().to_string(), details.trim().to_string()),
        None => (raw.trim().to_string(), String::new()),
    }
}

fn print_analytics(a: &ReportAnalytics) {
    if a.report_count == 0 {
        println!("No reports in this period.");
        return;
    }
    println!("{} report(s) | task completion {}%", a.report_count, a.task_completion_rate);
    for ((mood, energy), rating) in a.mood_trend.iter().zip(&a.energy_trend).zip(&a.rating_trend) {
        println!(
            "  {} mood={:<9} energy={:>3} rating={}",
            mood.date.format("%Y-%m-%d"),
            mood.value.as_str(),
            energy.value,
            rating.value
        );
    }
    for (cat, perf) in a.category_performance.iter().filter(|(_, p)| p.total > 0) {
        println!("- {cat}: {}/{} done ({}%)", perf.completed, perf.total, perf.completion_rate);
    }
    for sp in &a.skills_progress {
        println!("- skill {}: {}/10", sp.skill, sp.progress);
    }
}

fn print_status(profile: &Profile) {
    let c = &profile.character;
    let s = &profile.stats;
    println!("Level {} - {}/{} xp", c.level, c.experience, c.experience_to_next_level);
    println!("Energy {}/100 | mood {}", c.energy, c.mood.as_str());
    println!(
        "Quests completed {} | failed {} | streak {} day(s)",
        s.tasks_completed, s.tasks_failed, s.streak_days
    );
    println!("Achievements earned: {}", profile.achievements.len());
    if !c.world_elements.is_empty() {
        println!("World: {:?}", c.world_elements);
    }
}

fn print_task(t: &Task) {
    let streak = if t.task_type == TaskType::Habit {
        format!(" streak={} (best {})", t.streak, t.max_streak)
    } else {
        String::new()
    };
    println!(
        "{:<5} [{:<11}] {} ({} {} {}){}",
        t.id, t.status, t.title, t.difficulty, t.task_type, t.category, streak
    );
}

fn print_outcome(out: &TaskOutcome) {
    let t = &out.task;
    if out.reward.experience > 0 || out.reward.energy != 0 {
        println!(
            "{} \"{}\": +{} xp, {:+} energy",
            t.id, t.title, out.reward.experience, out.reward.energy
        );
    } else {
        println!("{} \"{}\" is now {}", t.id, t.title, t.status);
    }
    if out.levels_gained > 0 {
        println!("Level up! You are now level {}.", out.character.level);
    }
}

fn print_awards(awards: &[AchievementAward]) {
    for a in awards {
        println!("Achievement unlocked: {}", a.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_note() {
        assert_eq!(split_note("focus"), ("focus".to_string(), String::new()));
        assert_eq!(
            split_note(" sleep : late nights: again"),
            ("sleep".to_string(), "late nights: again".to_string())
        );
    }

    #[test]
    fn test_analytics_args_parse() {
        let cli = Cli::try_parse_from(["questlog", "report", "analytics", "--period", "week"]).unwrap();
        match cli.command {
            Command::Report {
                command: ReportCommand::Analytics { period, from, to },
            } => {
                assert_eq!(period, AnalyticsPeriod::Week);
                assert!(from.is_none() && to.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["questlog", "report", "analytics", "--from", "2026-01-01"]).is_err());
    }
}
