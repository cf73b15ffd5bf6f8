use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use log::{info, warn};
use std::path::PathBuf;

use crate::calendar::AcademicSpan;
use crate::config::EngineConfig;
use crate::data::{DemandRow, PriorSlot, RawGrid, SchedulingInput, SchedulingOutput, Subject};
use crate::error::{Result, ScheduleError};
use crate::{report, solver};

#[derive(Debug, Parser)]
#[command(name = "lesson_scheduler", about = "Winter-term tutoring timetable builder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
    /// Build a timetable from an input document.
    Solve(SolveArgs),
    /// Write a starter input document.
    Template(TemplateArgs),
}

#[derive(Debug, Args)]
pub struct SolveArgs {
    /// Scheduling input as JSON.
    #[arg(long)]
    pub input: PathBuf,
    /// Previously written timetable to extend.
    #[arg(long)]
    pub prior: Option<PathBuf>,
    /// Engine configuration as JSON; a `config` object in the input wins.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, default_value = "schedule.xlsx")]
    pub output: PathBuf,
    /// Also write the result summary as JSON.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Student names, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub students: Vec<String>,
    #[arg(long, default_value_t = 2025)]
    pub year: i32,
    #[arg(long, default_value = "")]
    pub teacher: String,
    #[arg(long, default_value = "input.json")]
    pub output: PathBuf,
}

pub fn load_input(args: &SolveArgs) -> Result<SchedulingInput> {
    let text = std::fs::read_to_string(&args.input)?;
    let mut input: SchedulingInput = serde_json::from_str(&text)?;
    if input.config.is_none() {
        if let Some(path) = &args.config {
            input.config = Some(EngineConfig::from_file(path)?);
        }
    }

    if let Some(path) = &args.prior {
        let year = input.config.clone().unwrap_or_default().academic_year;
        match report::read_prior_schedule_file(path, AcademicSpan::new(year)) {
            Ok(prior) => {
                info!("Extending {} occupied slots from {}", prior.len(), path.display());
                // workbook contents replace any prior slots given inline
                input.prior_schedule.retain(|s| !prior.contains_key(&s.key()));
                input
                    .prior_schedule
                    .extend(prior.into_iter().map(|(key, entries)| PriorSlot {
                        date: key.date,
                        period: key.period,
                        entries,
                    }));
            }
            Err(e) => warn!(
                "Could not read prior schedule {}: {e}; starting from an empty schedule",
                path.display()
            ),
        }
    }
    Ok(input)
}

pub fn run_solve(args: &SolveArgs) -> Result<SchedulingOutput> {
    let input = load_input(args)?;
    let output = solver::solve(&input)?;

    report::write_workbook_file(&output, &args.output)?;
    info!("Timetable written to {}", args.output.display());
    if let Some(path) = &args.json {
        std::fs::write(path, serde_json::to_string_pretty(&output)?)?;
    }
    if !output.unscheduled.is_empty() {
        warn!(
            "{} requests left unscheduled: {}",
            output.unscheduled.len(),
            output.unscheduled.iter().join("; ")
        );
    }
    Ok(output)
}

/// Open periods "〇", closed ones "×", zero demand for every student.
pub fn template(students: &[String], teacher_name: &str, year: i32) -> Result<SchedulingInput> {
    let names: Vec<String> = students
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        return Err(ScheduleError::InvalidInput(
            "at least one student name is required".to_string(),
        ));
    }

    let dates: Vec<_> = AcademicSpan::new(year).dates().collect();
    let grid = RawGrid::template(&dates);
    let demand = names
        .iter()
        .map(|name| DemandRow {
            name: name.clone(),
            counts: Subject::ALL
                .into_iter()
                .map(|s| (s.label().to_string(), serde_json::Value::from(0)))
                .collect(),
        })
        .collect();

    Ok(SchedulingInput {
        teacher_name: teacher_name.to_string(),
        teacher: grid.clone(),
        demand,
        student_grids: names.into_iter().map(|n| (n, grid.clone())).collect(),
        prior_schedule: Vec::new(),
        config: Some(EngineConfig {
            academic_year: year,
            ..EngineConfig::default()
        }),
    })
}

pub fn run_template(args: &TemplateArgs) -> Result<()> {
    let input = template(&args.students, &args.teacher, args.year)?;
    std::fs::write(&args.output, serde_json::to_string_pretty(&input)?)?;
    info!("Template written to {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Termination;

    fn solve_args(dir: &std::path::Path) -> SolveArgs {
        SolveArgs {
            input: dir.join("input.json"),
            prior: None,
            config: None,
            output: dir.join("out.xlsx"),
            json: Some(dir.join("out.json")),
        }
    }

    #[test]
    fn cli_parses_solve_arguments() {
        let cli = Cli::try_parse_from([
            "lesson_scheduler",
            "solve",
            "--input",
            "in.json",
            "--prior",
            "old.xlsx",
        ])
        .unwrap();
        match cli.command {
            Command::Solve(args) => {
                assert_eq!(args.input, PathBuf::from("in.json"));
                assert_eq!(args.prior, Some(PathBuf::from("old.xlsx")));
                assert_eq!(args.output, PathBuf::from("schedule.xlsx"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn template_covers_the_whole_span() {
        let input = template(&["a".into(), " ".into(), "b".into()], "佐藤", 2025).unwrap();
        assert_eq!(input.teacher.columns.len(), 62);
        assert_eq!(input.student_grids.len(), 2);
        assert_eq!(input.demand.len(), 2);
        assert_eq!(input.demand[0].counts.len(), 5);
        assert!(template(&[], "", 2025).is_err());
    }

    #[test]
    fn template_input_solves_to_nothing() {
        let input = template(&["a".into()], "", 2025).unwrap();
        let output = solver::solve(&input).unwrap();
        assert_eq!(output.assignments_made, 0);
        assert!(output.unscheduled.is_empty());
        assert_eq!(output.termination, Termination::Exhausted);
    }

    #[test]
    fn solve_extends_a_prior_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = template(&["a".into(), "b".into()], "", 2025).unwrap();
        input.demand[0]
            .counts
            .insert("数学".into(), serde_json::Value::from(2));
        std::fs::write(dir.path().join("input.json"), serde_json::to_string(&input).unwrap())
            .unwrap();

        let args = solve_args(dir.path());
        let first = run_solve(&args).unwrap();
        assert_eq!(first.assignments_made, 2);
        assert!(dir.path().join("out.json").exists());

        // second run: b now wants a lesson, a's lessons stay where they were
        input.demand[0]
            .counts
            .insert("数学".into(), serde_json::Value::from(0));
        input.demand[1]
            .counts
            .insert("英語".into(), serde_json::Value::from(1));
        std::fs::write(dir.path().join("input.json"), serde_json::to_string(&input).unwrap())
            .unwrap();
        std::fs::rename(dir.path().join("out.xlsx"), dir.path().join("prior.xlsx")).unwrap();

        let args = SolveArgs {
            prior: Some(dir.path().join("prior.xlsx")),
            ..solve_args(dir.path())
        };
        let second = run_solve(&args).unwrap();
        assert_eq!(second.seeded_entries, 2);
        assert_eq!(second.assignments_made, 1);
        let total: usize = second.slots.iter().map(|s| s.entries.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn unreadable_prior_falls_back_to_empty_seed() {
        let dir = tempfile::tempdir().unwrap();
        let input = template(&["a".into()], "", 2025).unwrap();
        std::fs::write(dir.path().join("input.json"), serde_json::to_string(&input).unwrap())
            .unwrap();
        std::fs::write(dir.path().join("broken.xlsx"), b"garbage").unwrap();

        let args = SolveArgs {
            prior: Some(dir.path().join("broken.xlsx")),
            ..solve_args(dir.path())
        };
        let loaded = load_input(&args).unwrap();
        assert!(loaded.prior_schedule.is_empty());
    }
}
