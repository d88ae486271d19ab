#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand};
use devatlas_core::AtlasError;
use devatlas_core::config;
use output::{CliError, OutputMode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "atlas: track lesson progress and search the DevAtlas curriculum",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides `--json`, `FORMAT`, and config).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Treat this date (YYYY-MM-DD) as today instead of the local date.
    #[arg(long, global = true, value_name = "DATE")]
    today: Option<String>,

    /// Directory holding the progress state file.
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Catalog file (TOML, YAML, or JSON) replacing the built-in curriculum.
    #[arg(long, global = true, value_name = "FILE")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// The calendar day used for activity and streaks.
    fn today(&self) -> Result<NaiveDate, AtlasError> {
        self.today.as_deref().map_or_else(
            || Ok(Local::now().date_naive()),
            |raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|_| AtlasError::InvalidDate(raw.to_string()))
            },
        )
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Browse",
        about = "List tracks with completion",
        long_about = "List every track in the catalog with its completion percentage.",
        after_help = "EXAMPLES:\n    # List tracks\n    atlas tracks\n\n    # Emit machine-readable output\n    atlas tracks --json"
    )]
    Tracks,

    #[command(
        next_help_heading = "Browse",
        about = "Show one track",
        long_about = "Show the modules and lessons of a track with per-lesson completion.",
        after_help = "EXAMPLES:\n    # Show the React track\n    atlas show react\n\n    # Emit machine-readable output\n    atlas show react --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Browse",
        about = "Search the curriculum",
        long_about = "Filter tracks, modules, and lessons by a case-insensitive title match.\nThe active track is re-pointed into the results.",
        after_help = "EXAMPLES:\n    # Find everything about the work loop\n    atlas search \"work loop\"\n\n    # Emit machine-readable output\n    atlas search hooks --json"
    )]
    Search(cmd::search::SearchArgs),

    #[command(
        next_help_heading = "Browse",
        about = "Set the active track",
        long_about = "Make a track (or the track of a lesson) the active selection.",
        after_help = "EXAMPLES:\n    # Activate a track\n    atlas select systems\n\n    # Focus a lesson and its track\n    atlas select --lesson dist-raft"
    )]
    Select(cmd::select::SelectArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Toggle lesson completion",
        long_about = "Mark a lesson complete, or incomplete if it already is.\nMarking complete counts toward today's activity.",
        after_help = "EXAMPLES:\n    # Complete a lesson\n    atlas toggle react-work-loop\n\n    # Backfill yesterday\n    atlas toggle react-work-loop --today 2024-01-11"
    )]
    Toggle(cmd::toggle::ToggleArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Show whether a lesson is complete",
        long_about = "Show completion status and location of one lesson.",
        after_help = "EXAMPLES:\n    # Check a lesson\n    atlas status react-work-loop"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Show completion progress",
        long_about = "Show overall progress, or module progress for one track.",
        after_help = "EXAMPLES:\n    # Overall dashboard\n    atlas progress\n\n    # One track broken down by module\n    atlas progress react"
    )]
    Progress(cmd::progress::ProgressArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Show the activity streak",
        long_about = "Show the current streak and the last seven days of activity.",
        after_help = "EXAMPLES:\n    # Current streak\n    atlas streak\n\n    # Emit machine-readable output\n    atlas streak --json"
    )]
    Streak,

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        long_about = "Generate shell completion scripts for atlas.",
        after_help = "EXAMPLES:\n    # Bash\n    atlas completions bash > ~/.local/share/bash-completion/completions/atlas\n\n    # Zsh\n    atlas completions zsh > ~/.zfunc/_atlas"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DEVATLAS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "devatlas=debug,info"
        } else {
            "devatlas=info,warn"
        })
    });

    let format = env::var("DEVATLAS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: &mut OutputMode) -> anyhow::Result<()> {
    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let config = config::load_user_config()?;
    *output = output::resolve_output_mode(cli.format, cli.json, config.output.as_deref());
    let today = cli.today()?;

    let sources = cmd::Sources {
        state_dir: cli.state_dir.as_deref(),
        catalog: cli.catalog.as_deref(),
    };
    let mut atlas = cmd::open_atlas(&sources, &config)?;
    let output = *output;

    match &cli.command {
        Commands::Tracks => cmd::tracks::run_tracks(&atlas, output),
        Commands::Show(args) => cmd::show::run_show(args, &atlas, output),
        Commands::Search(args) => cmd::search::run_search(args, &mut atlas, output),
        Commands::Select(args) => cmd::select::run_select(args, &mut atlas, output),
        Commands::Toggle(args) => cmd::toggle::run_toggle(args, &mut atlas, today, output),
        Commands::Status(args) => cmd::status::run_status(args, &atlas, output),
        Commands::Progress(args) => cmd::progress::run_progress(args, &atlas, today, output),
        Commands::Streak => cmd::streak::run_streak(&atlas, today, output),
        Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mut output = output::resolve_output_mode(cli.format, cli.json, None);
    match run(&cli, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_error = err
                .downcast_ref::<AtlasError>()
                .map_or_else(|| CliError::new(format!("{err:#}")), CliError::from);
            if output::render_error(output, &cli_error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
