//! CoachVoice - Voice-Guided Workout Playback
//!
//! Command-line entry point: inspect a workout document or rehearse it
//! through the console narrator.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use coachvoice::audio::tts::text_utils;
use coachvoice::audio::{ConsoleSynthesizer, SimulatedOutput};
use coachvoice::config::{self, AppConfig};
use coachvoice::workouts::{Exercise, ParserOptions, Phase, WorkoutParseError, WorkoutParser};
use coachvoice::{PlaybackSession, Workout};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How long a rehearsal lingers on an exercise without a duration
const REP_EXERCISE_SECONDS: u64 = 5;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(
    name = "coachvoice",
    version,
    about = "Voice-guided workout playback",
    long_about = "Parse voice-annotated workout documents and play them back as spoken coaching cues"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a workout document and print its structure
    Inspect {
        /// Workout document
        file: PathBuf,

        /// Tolerate missing front matter
        #[arg(long)]
        permissive: bool,

        /// Print the parsed tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a workout through the console narrator
    Rehearse {
        /// Workout document
        file: PathBuf,

        /// Seed for motivation selection
        #[arg(long)]
        seed: Option<u64>,

        /// Playback speed multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },

    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match config::load_config().context("Failed to load configuration") {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            match e.downcast_ref::<WorkoutParseError>() {
                Some(WorkoutParseError::MissingFrontMatter) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Inspect {
            file,
            permissive,
            json,
        } => {
            let options = if permissive {
                ParserOptions::compatibility()
            } else {
                config.parser.options()
            };
            let workout = load_workout(&file, options)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&workout)?);
            } else {
                print_summary(&workout);
            }
            Ok(())
        }
        Command::Rehearse { file, seed, speed } => {
            rehearse(&file, seed, speed, config).await
        }
        Command::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_workout(path: &Path, options: ParserOptions) -> Result<Workout> {
    WorkoutParser::new(options)
        .parse_file(path)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_summary(workout: &Workout) {
    match workout.duration {
        Some(minutes) => println!("{} ({} min)", workout.display_title(), minutes),
        None => println!("{}", workout.display_title()),
    }

    for phase in &workout.phases {
        print_phase(phase);
    }

    println!(
        "{} phases, {} exercises",
        workout.phases.len(),
        workout.exercise_count()
    );
}

fn print_phase(phase: &Phase) {
    match phase.duration {
        Some(minutes) => println!("# {} ({} min)", phase.name, minutes),
        None => println!("# {}", phase.name),
    }

    if phase.is_main_workout() {
        for circuit in phase.circuits() {
            let rounds = circuit
                .rounds
                .map(|r| format!(" x{}", r))
                .unwrap_or_default();
            println!("  ## {}{}", circuit.name, rounds);
            for exercise in &circuit.exercises {
                println!("    ### {}{}", exercise.name, exercise_details(exercise));
            }
        }
    } else {
        for exercise in phase.exercises() {
            println!("  ### {}{}", exercise.name, exercise_details(exercise));
        }
    }
}

fn exercise_details(exercise: &Exercise) -> String {
    let mut details = Vec::new();
    match (exercise.sets, exercise.rep_target()) {
        (Some(sets), Some(reps)) => details.push(format!("{} x {}", sets, reps)),
        (None, Some(reps)) => details.push(format!("{} reps", reps)),
        (Some(sets), None) => details.push(format!("{} sets", sets)),
        (None, None) => {}
    }
    if let Some(seconds) = exercise.timed_duration() {
        details.push(text_utils::format_duration(seconds));
    }

    if details.is_empty() {
        String::new()
    } else {
        format!(" ({})", details.join(", "))
    }
}

async fn rehearse(file: &Path, seed: Option<u64>, speed: f64, mut config: AppConfig) -> Result<()> {
    if !speed.is_finite() || speed <= 0.0 {
        bail!("Speed must be a positive number, got {}", speed);
    }

    let workout = load_workout(file, config.parser.options())?;
    if workout.exercise_count() == 0 {
        bail!("{} has no exercises", file.display());
    }

    config.playback.time_scale /= speed;
    if seed.is_some() {
        config.playback.motivation_seed = seed;
    }

    let session = PlaybackSession::spawn(
        Arc::new(workout),
        ConsoleSynthesizer,
        SimulatedOutput::new().with_speed(speed),
        &config,
    );
    session.start();

    let rep_pause = Duration::from_secs(REP_EXERCISE_SECONDS).div_f64(speed);
    let mut last_exercise = None;

    while !session.is_finished() {
        let position = session.position();
        if position.exercise_name != last_exercise {
            if let Some(name) = &position.exercise_name {
                tracing::info!(
                    "[{}/{}] {}: {}",
                    position.phase_index + 1,
                    position.total_phases,
                    position.phase_name.as_deref().unwrap_or(""),
                    name
                );
            }
            last_exercise = position.exercise_name;
        }

        if session.is_waiting_for_user() {
            tokio::time::sleep(rep_pause).await;
            if session.is_waiting_for_user() {
                session.next_exercise();
            }
            continue;
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }

    tracing::info!("Rehearsal complete");
    Ok(())
}
