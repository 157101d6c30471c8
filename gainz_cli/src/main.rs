use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use gainz_core::analytics::LoggedSet;
use gainz_core::catalog::validate_catalog;
use gainz_core::view_model::{ExerciseIntent, Sheet};
use gainz_core::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gainz")]
#[command(about = "Strength training planner and workout log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the exercise catalog
    Catalog,

    /// Generate a first training plan
    Plan {
        /// Training days per week (2-7)
        #[arg(long)]
        frequency: u8,

        /// A barbell is available
        #[arg(long)]
        barbell: bool,

        /// Training experience (novice, intermediate, advanced)
        #[arg(long, default_value = "intermediate")]
        experience: String,

        /// Fixed seed for a reproducible plan
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Periodize weekly volume over a mesocycle
    Periodize {
        /// Mesocycle length in weeks (4-6)
        #[arg(long)]
        weeks: u8,

        /// Peak weekly sets per muscle, e.g. chest=12
        #[arg(long = "volume", required = true)]
        volume: Vec<String>,

        /// Catalog name of a primary lift
        #[arg(long = "exercise")]
        exercises: Vec<String>,

        /// Training goal (hypertrophy, strength, peaking, deload)
        #[arg(long, default_value = "hypertrophy")]
        goal: String,
    },

    /// Log a finished workout for one exercise
    Log {
        /// Catalog id of the exercise
        #[arg(long)]
        exercise: String,

        /// A set as WEIGHTxREPS, optionally suffixed with @rirN or @rpeN
        #[arg(long = "set", required = true)]
        sets: Vec<String>,
    },

    /// Summarize recent training
    Summary {
        /// Look-back window in days (1-36500)
        #[arg(long, default_value_t = 28, value_parser = clap::value_parser!(i64).range(1..=36500))]
        days: i64,
    },

    /// Export every logged set to CSV, replacing the output file
    Export {
        #[arg(long)]
        output: PathBuf,

        /// Append rows to an existing CSV instead of replacing it
        #[arg(long)]
        append: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    gainz_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let store = Arc::new(FileStore::open(data_dir)?);
    store.seed_default_catalog()?;

    match cli.command {
        Commands::Catalog => cmd_catalog(&store).await,
        Commands::Plan {
            frequency,
            barbell,
            experience,
            seed,
        } => cmd_plan(&store, &config, frequency, barbell, &experience, seed).await,
        Commands::Periodize {
            weeks,
            volume,
            exercises,
            goal,
        } => cmd_periodize(&store, &config, weeks, &volume, exercises, &goal).await,
        Commands::Log { exercise, sets } => cmd_log(&store, &config, &exercise, &sets).await,
        Commands::Summary { days } => cmd_summary(&store, days).await,
        Commands::Export { output, append } => cmd_export(&store, output, append),
    }
}

async fn cmd_catalog(store: &Arc<FileStore>) -> Result<()> {
    let catalog = store.fetch_all().await?;

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    for exercise in &catalog {
        let muscles: Vec<_> = exercise.primary_muscles.iter().map(|m| m.name()).collect();
        println!(
            "{:<28} {:<32} {:<11} {}",
            exercise.id.as_str(),
            exercise.name,
            format!("{:?}", exercise.equipment).to_lowercase(),
            muscles.join(", ")
        );
    }
    println!("\n{} exercises", catalog.len());
    Ok(())
}

async fn cmd_plan(
    store: &Arc<FileStore>,
    config: &Config,
    frequency: u8,
    barbell: bool,
    experience: &str,
    seed: Option<u64>,
) -> Result<()> {
    let request = InitialPlanRequest {
        weekly_frequency: frequency,
        owns_barbell: barbell,
        experience: experience.parse()?,
        random_seed: seed,
    };

    let plan = GenerateInitialPlanUseCase::new(store.clone(), config.planning.clone())
        .execute(&request)
        .await?;
    store.save_plan(&plan).await?;

    let catalog = store.fetch_all().await?;
    let name_of = |id: &ExerciseId| {
        catalog
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    println!("Plan {} ({:?}, {} weeks)", plan.id, plan.objective, plan.weeks);
    for workout in &plan.workouts {
        println!("\nDay {}: {:?}", workout.day_index + 1, workout.focus);
        for prescription in &workout.exercises {
            let effort = match prescription.effort {
                EffortTarget::Rir(rir) => format!("RIR {}", rir),
                EffortTarget::PercentOneRm(pct) => format!("{:.0}% 1RM", pct * 100.0),
            };
            println!(
                "  - {} {} x {}-{} @ {}",
                name_of(&prescription.exercise_id),
                prescription.target_sets,
                prescription.rep_range.low,
                prescription.rep_range.high,
                effort
            );
        }
    }
    Ok(())
}

async fn cmd_periodize(
    store: &Arc<FileStore>,
    config: &Config,
    weeks: u8,
    volume: &[String],
    exercises: Vec<String>,
    goal: &str,
) -> Result<()> {
    let mut weekly_volume = BTreeMap::new();
    for entry in volume {
        let (muscle, sets) = entry
            .split_once('=')
            .ok_or_else(|| Error::Other(format!("volume must look like muscle=sets, got '{}'", entry)))?;
        let sets = sets
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::Other(format!("invalid set count in '{}'", entry)))?;
        weekly_volume.insert(muscle.trim().parse::<MuscleGroup>()?, sets);
    }

    let template = MesocycleTemplate {
        primary_exercise_names: exercises,
        weekly_volume,
        weeks,
        goal: goal.parse()?,
    };
    let strategy = Box::new(LinearPeriodization::new(&config.periodization));
    let mesocycle = PlanMesocycleUseCase::new(store.clone(), strategy)
        .execute(&template)
        .await?;

    println!("{:?} mesocycle", mesocycle.goal);
    if !mesocycle.primary_exercise_ids.is_empty() {
        let ids: Vec<_> = mesocycle.primary_exercise_ids.iter().map(|id| id.as_str()).collect();
        println!("Primary lifts: {}", ids.join(", "));
    }
    for summary in mesocycle.weekly_summaries() {
        let volume: Vec<_> = summary
            .volume
            .iter()
            .map(|(muscle, sets)| format!("{} {}", muscle.name(), sets))
            .collect();
        println!("Week {} ({}): {}", summary.week_index + 1, summary.notes, volume.join(", "));
    }
    Ok(())
}

async fn cmd_log(store: &Arc<FileStore>, config: &Config, exercise_id: &str, sets: &[String]) -> Result<()> {
    let exercise = store
        .fetch(&ExerciseId::new(exercise_id))
        .await?
        .ok_or_else(|| Error::Other(format!("unknown exercise '{}'", exercise_id)))?;

    let plan_id = store
        .latest_plan()
        .await?
        .and_then(|plan| {
            plan.workouts
                .iter()
                .find(|w| w.exercises.iter().any(|p| p.exercise_id == exercise.id))
                .map(|w| w.id)
        });

    let session = WorkoutSession::draft(Utc::now(), plan_id);
    let mut vm = WorkoutViewModel::new(session, store.clone(), &config.logging);

    vm.send(Action::AddExerciseTapped).await;
    vm.send(Action::ExercisePicked(exercise.clone())).await;
    let log_id = vm.state().session.exercise_logs()[vm.state().active_exercise_index].id;

    for raw in sets {
        vm.send(Action::ExerciseIntent {
            log_id,
            intent: ExerciseIntent::AddSetTapped,
        })
        .await;
        vm.send(Action::SetEdited {
            log_id,
            set: parse_set(raw)?,
        })
        .await;
        check_alert(&vm)?;
        vm.send(Action::SkipRest).await;
    }

    vm.send(Action::FinishTapped).await;
    check_alert(&vm)?;

    let saved = match &vm.presentation().sheet {
        Some(Sheet::Summary(saved)) => saved.clone(),
        _ => vm.state().session.clone(),
    };
    for logged in LoggedSet::from_session(&saved) {
        store.record(logged).await?;
    }

    println!("✓ Session {} logged", saved.id());
    println!(
        "  {}: {} sets, {:.1} total tonnage",
        exercise.name,
        saved.total_sets(),
        saved.tonnage()
    );
    Ok(())
}

async fn cmd_summary(store: &Arc<FileStore>, days: i64) -> Result<()> {
    let since = Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| Error::Other(format!("look-back window of {} days is out of range", days)))?;
    let summary = CalculateAnalyticsUseCase::new(store.clone(), store.clone())
        .execute(since)
        .await?;

    println!("Last {} days", days);
    println!("  Sessions: {}", summary.total_sessions);
    println!("  Sets: {}", summary.total_sets);
    println!("  Tonnage: {:.1}", summary.total_tonnage);

    if !summary.weekly_volume.is_empty() {
        println!("\nWeekly volume");
        for week in &summary.weekly_volume {
            println!("  {}: {} sets, {:.1}", week.week_start, week.sets, week.tonnage);
        }
    }
    if !summary.personal_records.is_empty() {
        println!("\nPersonal records");
        for record in &summary.personal_records {
            println!(
                "  {}: {} x {} (e1RM {:.1})",
                record.exercise_id, record.weight, record.reps, record.estimated_one_rep_max
            );
        }
    }
    Ok(())
}

fn cmd_export(store: &Arc<FileStore>, output: PathBuf, append: bool) -> Result<()> {
    let sessions = store.all_sessions()?;
    if sessions.is_empty() {
        println!("No sessions logged - nothing to export.");
        return Ok(());
    }

    if !append && output.exists() {
        tracing::debug!("Replacing existing export {:?}", output);
        std::fs::remove_file(&output)?;
    }

    let rows = gainz_core::export::sessions_to_csv(&sessions, &output)?;
    println!("✓ Exported {} sets from {} sessions", rows, sessions.len());
    println!("  CSV: {}", output.display());
    Ok(())
}

fn check_alert(vm: &WorkoutViewModel) -> Result<()> {
    match &vm.presentation().alert {
        Some(alert) => Err(Error::Other(format!("{}: {}", alert.title, alert.message))),
        None => Ok(()),
    }
}

/// Parse `WEIGHTxREPS[@rirN|@rpeN]`
fn parse_set(raw: &str) -> Result<SetRecord> {
    let invalid = || Error::InvalidSet(format!("expected WEIGHTxREPS[@rirN|@rpeN], got '{}'", raw));

    let (load, effort) = match raw.split_once('@') {
        Some((load, effort)) => (load, Some(effort.to_lowercase())),
        None => (raw, None),
    };
    let (weight, reps) = load.split_once(['x', 'X']).ok_or_else(invalid)?;
    let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
    let reps: u32 = reps.trim().parse().map_err(|_| invalid())?;

    let effort = match effort.as_deref() {
        None => None,
        Some(e) if e.starts_with("rir") => Some(Effort::Rir(e[3..].parse().map_err(|_| invalid())?)),
        Some(e) if e.starts_with("rpe") => Some(Effort::Rpe(e[3..].parse().map_err(|_| invalid())?)),
        Some(_) => return Err(invalid()),
    };

    SetRecord::new(weight, reps, effort, None)
}
