//! coursevault: mirror Canvas courses into a local note vault.
//!
//! # Usage
//!
//! ```text
//! coursevault init [--canvas-url <url>] [--vault <path>]
//! coursevault config get|set|list
//! coursevault token set <token> | token status
//! coursevault courses [--json]
//! coursevault select <course-id>... | select --clear
//! coursevault sync [--json]
//! coursevault status [--json]
//! coursevault diff <kind> <id>
//! coursevault todo [--path]
//! coursevault forget <kind> <id>
//! coursevault daemon start|run|stop|status|sync|logs
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigCommand, courses::CoursesArgs, daemon::DaemonCommand, diff::DiffArgs,
    forget::ForgetArgs, init::InitArgs, select::SelectArgs, status::StatusArgs, sync::SyncArgs,
    todo::TodoArgs, token::TokenCommand,
};

#[derive(Parser, Debug)]
#[command(
    name = "coursevault",
    version,
    about = "Mirror Canvas course material into a local note vault",
    long_about = None,
)]
struct Cli {
    /// Show sync progress on stderr (`RUST_LOG` overrides).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the settings file and the vault directory.
    Init(InitArgs),

    /// Read or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Manage the Canvas API token.
    Token {
        #[command(subcommand)]
        command: TokenCommand,
    },

    /// List active Canvas courses.
    Courses(CoursesArgs),

    /// Choose which courses to mirror.
    Select(SelectArgs),

    /// Run one sync now, in the foreground.
    Sync(SyncArgs),

    /// Show artifact state and the last sync report.
    Status(StatusArgs),

    /// Show what a refresh would change in one artifact.
    Diff(DiffArgs),

    /// Print the generated task list.
    Todo(TodoArgs),

    /// Drop the sync record of one item so the next sync rewrites it.
    Forget(ForgetArgs),

    /// Manage the background daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // The daemon installs its own subscriber.
    if !matches!(
        cli.command,
        Commands::Daemon {
            command: DaemonCommand::Run(_)
        }
    ) {
        init_tracing(cli.verbose);
    }

    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
        Commands::Token { command } => commands::token::run(command),
        Commands::Courses(args) => args.run(),
        Commands::Select(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Todo(args) => args.run(),
        Commands::Forget(args) => args.run(),
        Commands::Daemon { command } => commands::daemon::run(command),
    }
}
