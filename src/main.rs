use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use trip_planner::config::TripConfig;
use trip_planner::encoder::{ProblemSpec, encode};
use trip_planner::error::{PlannerError, TripError};
use trip_planner::pddl;
use trip_planner::plan::{PLAN_FILE_PREFIX, Plan, latest_plan_artifact};
use trip_planner::schedule::{Interpreter, Schedule, plan_trip};
use trip_planner::time_grid::TimeGrid;

#[derive(Parser)]
#[command(name = "trip-planner")]
#[command(about = "Plan a multi-day sightseeing trip with an external PDDL planner")]
struct Args {
    /// Trip configuration (TOML). Built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start weekday, e.g. "wednesday".
    #[arg(long)]
    weekday: Option<String>,

    /// Trip length in days.
    #[arg(long)]
    days: Option<i64>,

    /// Location the traveler starts at.
    #[arg(long)]
    start_location: Option<String>,

    /// Start hour, 0-23.
    #[arg(long)]
    start_slot: Option<i64>,

    /// Write domain.pddl and problem.pddl into this directory and stop.
    #[arg(long, value_name = "DIR", conflicts_with = "plan")]
    emit: Option<PathBuf>,

    /// Reconstruct an existing plan instead of calling the planner. A
    /// directory selects its newest sas_plan* file.
    #[arg(long, value_name = "PATH")]
    plan: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(TripError::Planner(PlannerError::MissingPlanArtifact(dir))) => {
            warn!(dir = %dir.display(), "no plan found, skipping schedule reconstruction");
            eprintln!("No sas_plan found in {}.", dir.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "trip planning failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), TripError> {
    let mut config = match &args.config {
        Some(path) => TripConfig::load(path)?,
        None => TripConfig::default(),
    };
    if let Some(weekday) = args.weekday {
        config.start_weekday = weekday;
    }
    if let Some(days) = args.days {
        config.days = days;
    }
    if let Some(location) = args.start_location {
        config.start_location = location;
    }
    if let Some(slot) = args.start_slot {
        config.start_slot = slot;
    }

    let catalog = config.load_catalog()?;
    let request = config.request(&catalog)?;
    let spec = encode(&catalog, TimeGrid::default(), request)?;

    if let Some(dir) = args.emit {
        fs::create_dir_all(&dir).map_err(PlannerError::from)?;
        fs::write(dir.join("domain.pddl"), pddl::domain_pddl()).map_err(PlannerError::from)?;
        fs::write(dir.join("problem.pddl"), pddl::problem_pddl(&spec)).map_err(PlannerError::from)?;
        println!("Wrote domain.pddl and problem.pddl to {}", dir.display());
        return Ok(());
    }

    let (plan, schedule) = match args.plan {
        Some(path) => {
            let file = if path.is_dir() {
                latest_plan_artifact(&path, PLAN_FILE_PREFIX)?
            } else {
                path
            };
            println!("Using plan: {}\n", file.display());
            let plan = Plan::load(file)?;
            let schedule = Interpreter::new(&spec).reconstruct(&plan)?;
            (plan, schedule)
        }
        None => {
            let planner = config.planner.build()?;
            plan_trip(&spec, &*planner)?
        }
    };

    report(&spec, &plan, &schedule)?;
    Ok(())
}

fn report(spec: &ProblemSpec<'_>, plan: &Plan, schedule: &Schedule) -> Result<(), TripError> {
    for line in schedule.lines() {
        println!("{line}");
    }
    println!("\n=== End of schedule ===");

    let evaluation = spec.evaluate(plan)?;
    println!(
        "Total cost: {} min, elapsed: {} min",
        evaluation.total_cost,
        schedule.elapsed().num_minutes()
    );
    if !evaluation.goal_satisfied {
        let missing: Vec<_> = spec
            .goal()
            .iter()
            .filter(|location| !evaluation.visited.contains(&location.id))
            .map(|location| location.id.as_str())
            .collect();
        warn!(?missing, "plan does not visit every location");
    }

    if !schedule.decode_errors.is_empty() {
        println!("\n{} plan line(s) could not be decoded:", schedule.decode_errors.len());
        for err in &schedule.decode_errors {
            println!("  {err}");
        }
    }
    Ok(())
}
