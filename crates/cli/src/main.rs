//! ncwork CLI - NC work management tracker.

mod session;

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::io::{BufReader, BufWriter};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ncwork_core::Role;
use ncwork_work::{FixedClock, WorkConfig, WorkTracker};
use session::Session;

#[derive(Parser)]
#[command(name = "ncwork")]
#[command(about = "NC task, daily log and leave tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file (roster, leave allowance, log policy)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured users
    Roster {
        /// Only users with this role (field | management)
        #[arg(long)]
        role: Option<Role>,
    },
    /// Print the effective configuration as JSON
    Config,
    /// Serve JSON requests from stdin, one per line
    Session {
        /// Treat this date (YYYY-MM-DD) as today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn init_logging() {
    // stdout carries session responses; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<WorkConfig> {
    match path {
        Some(path) => WorkConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(WorkConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Roster { role } => {
            let users: Vec<_> = config
                .roster
                .users()
                .iter()
                .filter(|u| role.map_or(true, |r| u.role == r))
                .collect();

            println!("Users ({})", users.len());
            for user in users {
                println!("  {:<12} {}", user.name, user.role);
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Session { today } => {
            let mut tracker = WorkTracker::in_memory(config).await?;
            if let Some(today) = today {
                info!(%today, "using fixed date");
                tracker = tracker.with_clock(Arc::new(FixedClock(today)));
            }

            let session = Session::new(tracker);
            let stdin = BufReader::new(tokio::io::stdin());
            let stdout = BufWriter::new(tokio::io::stdout());
            session.run(stdin, stdout).await?;
        }
    }

    Ok(())
}
