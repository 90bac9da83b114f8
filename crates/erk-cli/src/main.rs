mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, objective::ObjectiveSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "erk",
    about = "Objective roadmaps: parse, update, and validate phase/step tables in issue bodies",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .erk/ or .git/)
    #[arg(long, global = true, env = "ERK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize erk in the current project
    Init,

    /// Inspect and update objective roadmaps
    Objective {
        #[command(subcommand)]
        subcommand: ObjectiveSubcommand,
    },

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for command output and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Objective { subcommand } => cmd::objective::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
