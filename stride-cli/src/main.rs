use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use log::debug;
use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use stride::config::{GeneratorKind, StrideConfig};
use stride::{Difficulty, PlanRequest, SetUpdate, WorkoutPlan, WorkoutSession, WorkoutStore};

#[derive(Parser, Debug)]
#[command(version, about = "Stride - Workout Session CLI", long_about = None)]
struct Args {
    /// Sqlite file holding plans and history (overrides STRIDE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,
    /// Plan generator backend (overrides STRIDE_GENERATOR)
    #[arg(short, long, global = true)]
    generator: Option<GeneratorType>,
    /// Model name for LLM generators (overrides STRIDE_LLM_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum GeneratorType {
    Catalog,
    Ollama,
    #[value(name = "openai")]
    OpenAI,
}

impl fmt::Display for GeneratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorType::Catalog => write!(f, "catalog"),
            GeneratorType::Ollama => write!(f, "ollama"),
            GeneratorType::OpenAI => write!(f, "openai"),
        }
    }
}

impl From<GeneratorType> for GeneratorKind {
    fn from(g: GeneratorType) -> Self {
        match g {
            GeneratorType::Catalog => GeneratorKind::Catalog,
            GeneratorType::Ollama => GeneratorKind::Ollama,
            GeneratorType::OpenAI => GeneratorKind::OpenAi,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a plan and make it the active plan
    Generate {
        #[arg(long, value_delimiter = ',', default_value = "general fitness")]
        goals: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        equipment: Vec<String>,
        #[arg(short, long, default_value_t = 30)]
        duration: u32,
        #[arg(long, default_value_t = Difficulty::Beginner)]
        difficulty: Difficulty,
    },
    /// List generated plans
    Plans {
        #[arg(short, long)]
        verbose: bool,
    },
    /// Make a stored plan the active plan
    Select { plan_id: String },
    /// List finished workouts, most recent first
    History {
        #[arg(short, long)]
        verbose: bool,
    },
    /// Run a workout interactively from the active plan (or the given plan)
    Run {
        #[arg(short, long)]
        plan: Option<String>,
    },
}

#[derive(Debug, PartialEq)]
enum SessionCommand {
    Set {
        set_number: u32,
        update: SetUpdate,
        complete: bool,
    },
    Done,
    Next,
    Prev,
    Notes(Option<String>),
    Status,
    End,
    Abandon,
    Help,
}

const SESSION_HELP: &str = "\
set <n> <reps> [kg]     complete set n of the current exercise
time <n> <seconds>      complete a timed set
edit <n> <reps> [kg]    change set n without completing it
done                    mark the current exercise completed
next | prev             move between exercises
notes [text]            set or clear workout notes
status                  show progress
end                     finish and save to history
abandon                 discard the workout";

fn parse_number<T: std::str::FromStr>(token: Option<&str>, what: &str) -> Result<T> {
    let token = token.ok_or_else(|| anyhow!("missing {}", what))?;
    token
        .parse()
        .map_err(|_| anyhow!("invalid {}: {}", what, token))
}

impl SessionCommand {
    fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next().map(str::to_lowercase) else {
            bail!("empty command");
        };
        let cmd = match verb.as_str() {
            "set" | "s" | "edit" | "e" => {
                let set_number = parse_number(parts.next(), "set number")?;
                let reps = parse_number(parts.next(), "reps")?;
                let weight = parts.next().map(|w| parse_number(Some(w), "weight")).transpose()?;
                let update = SetUpdate {
                    reps: Some(reps),
                    weight,
                    ..Default::default()
                };
                update.validate()?;
                SessionCommand::Set {
                    set_number,
                    update,
                    complete: matches!(verb.as_str(), "set" | "s"),
                }
            }
            "time" | "t" => SessionCommand::Set {
                set_number: parse_number(parts.next(), "set number")?,
                update: SetUpdate {
                    duration: Some(parse_number(parts.next(), "seconds")?),
                    ..Default::default()
                },
                complete: true,
            },
            "done" | "d" => SessionCommand::Done,
            "next" | "n" => SessionCommand::Next,
            "prev" | "p" => SessionCommand::Prev,
            "notes" => {
                let text = parts.collect::<Vec<_>>().join(" ");
                SessionCommand::Notes((!text.is_empty()).then_some(text))
            }
            "status" => SessionCommand::Status,
            "end" | "finish" => SessionCommand::End,
            "abandon" | "quit" | "q" => SessionCommand::Abandon,
            "help" | "?" => SessionCommand::Help,
            other => bail!("unknown command '{}', try 'help'", other),
        };
        Ok(cmd)
    }
}

fn print_plan(plan: &WorkoutPlan, active: bool, verbose: bool) {
    println!(
        "{} {} - {} ({}, ~{} min, {} exercises)",
        if active { "*" } else { " " },
        plan.id,
        plan.name,
        plan.difficulty,
        plan.estimated_duration,
        plan.exercises.len()
    );
    if verbose {
        for e in &plan.exercises {
            println!("      {} x {} ({}s rest)  {}", e.sets, e.reps, e.rest_time, e.name);
            if !e.alternatives.is_empty() {
                let alts: Vec<&str> = e.alternatives.iter().map(|a| a.name.as_str()).collect();
                println!("        alternatives: {}", alts.join(", "));
            }
        }
    }
}

fn print_session(session: &WorkoutSession, verbose: bool) {
    let done: usize = session
        .exercises
        .iter()
        .map(|e| e.sets.iter().filter(|s| s.completed).count())
        .sum();
    println!(
        "{}  {} min  {} kcal  {} sets{}",
        session.start_time.format("%Y-%m-%d %H:%M"),
        session.duration,
        session.calories_burned,
        done,
        session
            .notes
            .as_ref()
            .map(|n| format!("  \"{}\"", n))
            .unwrap_or_default()
    );
    if verbose {
        for e in &session.exercises {
            let sets: Vec<String> = e
                .sets
                .iter()
                .filter(|s| s.completed)
                .map(|s| match (s.duration, s.weight) {
                    (Some(d), _) => format!("{}s", d),
                    (None, Some(w)) if w > 0.0 => format!("{}x{}kg", s.reps, w),
                    _ => s.reps.to_string(),
                })
                .collect();
            println!("    {}: {}", e.name, sets.join(", "));
        }
    }
}

async fn print_status(store: &WorkoutStore) {
    let Some(exercise) = store.current_exercise().await else {
        println!("No active workout");
        return;
    };
    let index = store.current_exercise_index().await;
    let total = store
        .current_workout()
        .await
        .map_or(0, |w| w.exercises.len());
    let target = store
        .active_plan()
        .await
        .and_then(|p| p.exercises.into_iter().find(|e| e.id == exercise.exercise_id))
        .map(|e| e.rep_target().to_string())
        .unwrap_or_default();
    println!(
        "[{}/{}] {}{}  target {}",
        index + 1,
        total,
        exercise.name,
        if exercise.completed { " (done)" } else { "" },
        target
    );
    for set in &exercise.sets {
        println!(
            "  set {}: {} reps{}{}{}",
            set.set_number,
            set.reps,
            set.weight
                .filter(|w| *w > 0.0)
                .map(|w| format!(" @ {}kg", w))
                .unwrap_or_default(),
            set.duration.map(|d| format!(" {}s", d)).unwrap_or_default(),
            if set.completed { " ✓" } else { "" }
        );
    }
    if let Some(p) = store.progress().await {
        println!(
            "  {}/{} sets, {}/{} exercises, {:.1} kg volume",
            p.completed_sets, p.total_sets, p.completed_exercises, p.total_exercises, p.total_volume_kg
        );
    }
}

async fn run_session(store: &WorkoutStore) -> Result<()> {
    println!("Workout started. Type 'help' for commands.");
    print_status(store).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            store.clear_workout().await?;
            println!("\nInput closed, workout discarded");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match SessionCommand::parse(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        debug!("session command: {:?}", cmd);

        match cmd {
            SessionCommand::Set {
                set_number,
                update,
                complete,
            } => {
                let Some(exercise) = store.current_exercise().await else {
                    println!("No active workout");
                    continue;
                };
                let applied = if complete {
                    store
                        .complete_set(&exercise.exercise_id, set_number, update)
                        .await
                } else {
                    store
                        .update_set(&exercise.exercise_id, set_number, update)
                        .await
                };
                if !applied {
                    println!("{} has no set {}", exercise.name, set_number);
                    continue;
                }
                print_status(store).await;
            }
            SessionCommand::Done => {
                if let Some(exercise) = store.current_exercise().await {
                    store.complete_exercise(&exercise.exercise_id).await;
                    if !store.next_exercise().await {
                        println!("Last exercise done. Type 'end' to finish.");
                    }
                }
                print_status(store).await;
            }
            SessionCommand::Next => {
                if !store.next_exercise().await {
                    println!("Already at the last exercise");
                }
                print_status(store).await;
            }
            SessionCommand::Prev => {
                if !store.previous_exercise().await {
                    println!("Already at the first exercise");
                }
                print_status(store).await;
            }
            SessionCommand::Notes(notes) => {
                store.set_workout_notes(notes).await;
            }
            SessionCommand::Status => print_status(store).await,
            SessionCommand::Help => println!("{}", SESSION_HELP),
            SessionCommand::End => {
                if let Some(finished) = store.end_workout().await? {
                    print!("Saved: ");
                    print_session(&finished, true);
                }
                return Ok(());
            }
            SessionCommand::Abandon => {
                store.clear_workout().await?;
                println!("Workout discarded");
                return Ok(());
            }
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = StrideConfig::from_env()?;
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(generator) = args.generator {
        config.generator = generator.into();
    }
    if args.model.is_some() {
        config.llm_model = args.model;
    }
    let store = WorkoutStore::open(
        config.build_storage()?,
        config.build_generator()?,
        config.store.clone(),
    )?;

    match args.command {
        Commands::Generate {
            goals,
            equipment,
            duration,
            difficulty,
        } => {
            println!("Generating plan...");
            let plan = store
                .generate_plan(PlanRequest {
                    goals,
                    equipment,
                    duration_minutes: duration,
                    difficulty,
                })
                .await?;
            print_plan(&plan, true, true);
            Ok(())
        }
        Commands::Plans { verbose } => {
            let active = store.active_plan().await.map(|p| p.id);
            let plans = store.plans().await;
            if plans.is_empty() {
                println!("No plans yet. Run 'stride-cli generate' to create one.");
            }
            for plan in &plans {
                print_plan(plan, active.as_deref() == Some(plan.id.as_str()), verbose);
            }
            Ok(())
        }
        Commands::Select { plan_id } => {
            if !store.select_plan(&plan_id).await? {
                bail!("no plan with id {}", plan_id);
            }
            println!("Active plan is now {}", plan_id);
            Ok(())
        }
        Commands::History { verbose } => {
            let history = store.history().await;
            if history.is_empty() {
                println!("No finished workouts");
            }
            for session in &history {
                print_session(session, verbose);
            }
            Ok(())
        }
        Commands::Run { plan } => {
            match plan {
                Some(plan_id) => {
                    let plan = store
                        .plans()
                        .await
                        .into_iter()
                        .find(|p| p.id == plan_id)
                        .with_context(|| format!("no plan with id {}", plan_id))?;
                    store.start_workout(plan).await?;
                }
                None => store.start_active_plan().await?,
            }
            run_session(&store).await
        }
    }
}
