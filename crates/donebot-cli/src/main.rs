use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "donebot", version, about = "Nightly task reminder bot")]
struct Cli {
    /// Config file (defaults to $DONEBOT_CONFIG, then ~/.config/donebot/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the chat once, apply commands, reply or remind
    Run {
        /// Pretend the current time is this RFC 3339 timestamp
        #[arg(long)]
        at: Option<String>,
    },
    /// Task registry management
    Tasks {
        #[command(subcommand)]
        action: commands::tasks::TasksAction,
    },
    /// Show tonight's progress without contacting the chat
    Status {
        /// Evaluate at this RFC 3339 timestamp instead of now
        #[arg(long)]
        at: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Bot token management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("donebot=info,donebot_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = commands::config_path(cli.config).and_then(|path| match cli.command {
        Commands::Run { at } => commands::run::run(&path, at.as_deref()),
        Commands::Tasks { action } => commands::tasks::run(&path, action),
        Commands::Status { at } => commands::status::run(&path, at.as_deref()),
        Commands::Config { action } => commands::config::run(&path, action),
        Commands::Auth { action } => commands::auth::run(&path, action),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
