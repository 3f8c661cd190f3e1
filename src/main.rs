//! liftlog - Personal strength training log

use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use liftlog::catalog::Catalog;
use liftlog::config::{Backend, Settings};
use liftlog::db::{TIME_FORMAT, open_store};
use liftlog::logbook::{Logbook, SetInput};
use liftlog::mirror::GitHubMirror;
use liftlog::stats::estimator::TOTAL_RANGE;
use liftlog::tui::App;
use liftlog::view::{self, HISTORY_COLUMNS, Panel};

const TUI_LOG_FILE: &str = "liftlog.log";

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(author, version, about = "Personal strength training log with 5-rep-max estimates")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Log a set
    Log {
        /// Workout (a column of the split)
        #[arg(short, long)]
        workout: Option<String>,

        /// Exercise within the workout
        #[arg(short, long)]
        exercise: Option<String>,

        #[arg(short, long)]
        reps: Option<String>,

        #[arg(short = 'k', long)]
        weight: Option<String>,

        /// Form score 0-10
        #[arg(short, long)]
        form: Option<String>,

        /// Reps in reserve
        #[arg(long)]
        rir: Option<String>,

        #[arg(short, long)]
        comments: Option<String>,
    },

    /// Recent sets of an exercise, best set marked with *
    History {
        exercise: String,

        /// Print the panel as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimated 5-rep max over time
    Progress {
        exercise: String,

        #[arg(long)]
        json: bool,
    },

    /// Estimate a 5-rep max without saving
    Estimate {
        reps: String,
        weight: String,
        rir: Option<String>,
    },

    /// List workouts and their exercises
    Workouts,
}

fn init_logging(tui: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO);
    if tui {
        // stderr would draw over the dashboard
        let file = File::create(TUI_LOG_FILE)
            .with_context(|| format!("cannot create {}", TUI_LOG_FILE))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

fn open_logbook(settings: &Settings) -> Result<Logbook> {
    let catalog = Catalog::load(&settings.catalog)?;
    let store = open_store(settings.backend, &settings.log_path())?;
    let mut logbook = Logbook::new(store, catalog, settings.rules());

    if let Some(mirror) = GitHubMirror::from_settings(&settings.mirror)? {
        if settings.backend == Backend::Csv {
            logbook = logbook.with_mirror(Box::new(mirror));
        } else {
            warn!("Mirror is only supported for the csv backend, ignoring");
        }
    }
    Ok(logbook)
}

fn print_panel(panel: &Panel, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(panel)?);
        return Ok(());
    }
    match panel {
        Panel::NoData { message } => println!("{}", message),
        Panel::Table(table) => {
            println!("Exercise History: {}", table.exercise);
            println!(
                "  {:<19} | {:<16} | {:>4} | {:>7} | {:>3} | {:>4} | {:>7}",
                HISTORY_COLUMNS[0],
                HISTORY_COLUMNS[1],
                HISTORY_COLUMNS[2],
                HISTORY_COLUMNS[3],
                HISTORY_COLUMNS[4],
                HISTORY_COLUMNS[5],
                HISTORY_COLUMNS[6]
            );
            println!("{:-<84}", "");
            for row in &table.rows {
                let c = row.cells();
                let marker = if row.highlighted { "*" } else { " " };
                println!(
                    "{} {:<19} | {:<16} | {:>4} | {:>7} | {:>3} | {:>4} | {:>7}",
                    marker,
                    c[0],
                    c[1],
                    c[2],
                    c[3],
                    c[4],
                    c[5],
                    c[6]
                );
            }
        }
        Panel::Chart(series) => {
            println!("{}", series.title);
            println!("{:-<40}", "");
            for (time, max5) in &series.points {
                println!("{} | {:>8.2}", time.format(TIME_FORMAT), max5);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let tui = matches!(cli.command, None | Some(Commands::Tui));
    init_logging(tui)?;

    let mut logbook = open_logbook(&cli.settings)?;

    match cli.command {
        Some(Commands::Log { workout, exercise, reps, weight, form, rir, comments }) => {
            let input = SetInput { workout, exercise, reps, weight, form, rir, comments };
            let set = logbook.save(&input)?;
            println!("Data saved successfully.");
            println!(
                "{} | {} | {} x {} | 5Max {:.2}",
                set.time.format(TIME_FORMAT),
                set.exercise,
                set.reps,
                set.weight,
                set.max5
            );
        }

        Some(Commands::History { exercise, json }) => {
            let history = logbook.history(&exercise)?;
            print_panel(&view::history_panel(&exercise, &history), json)?;
        }

        Some(Commands::Progress { exercise, json }) => {
            let sets = logbook.series(&exercise)?;
            print_panel(&view::chart_panel(&exercise, &sets), json)?;
        }

        Some(Commands::Estimate { reps, weight, rir }) => {
            match logbook.estimate(&reps, &weight, rir.as_deref())? {
                Some(max5) => println!("Estimated 5Max: {:.2} ({:?})", max5, logbook.rules().formula),
                None => println!(
                    "Not computable: total reps must be between {} and {}",
                    TOTAL_RANGE.start(),
                    TOTAL_RANGE.end()
                ),
            }
        }

        Some(Commands::Workouts) => {
            for workout in logbook.catalog().workouts() {
                println!("{}", workout.name);
                for exercise in &workout.exercises {
                    println!("  - {}", exercise);
                }
            }
        }

        Some(Commands::Tui) | None => {
            let mut app = App::new(logbook);
            app.run()?;
        }
    }

    Ok(())
}
