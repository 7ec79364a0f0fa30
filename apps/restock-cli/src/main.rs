//! # restock
//!
//! Operator terminal for the market stall: enter last market's sales, get the
//! surplus and the stock to prepare for the next one.
//!
//! ## Commands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  restock run [--json]          One pipeline run from the keyboard      │
//! │  restock show <table> [--last] Print stored rows                       │
//! │  restock status                Health, migrations and row counts       │
//! │                                                                         │
//! │  Global: --config PATH  --db PATH  --log-level LEVEL                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logs go to stderr. Prompts and results go to stdout.

mod config;
mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use restock_core::{Pipeline, PipelineError, Table};
use restock_db::{Database, DbConfig, StoredRow};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{CliOverrides, RestockConfig};
use crate::console::{Channel, ConsoleEvents, StdinSource};

/// Exit code for an operator cancel (128 + SIGINT).
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(
    name = "restock",
    version,
    about = "Sales, surplus and restock tracking for a market stall"
)]
struct Cli {
    /// Config file (default: platform config dir / restock.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "restock_core=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enter last market's sales and compute surplus and restock levels
    Run {
        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the rows of a table
    Show {
        /// sales, stock or surplus
        table: Table,

        /// Only the last N rows
        #[arg(long)]
        last: Option<u32>,
    },

    /// Show database health, migration status and row counts
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        db_path: cli.db,
        log_level: cli.log_level,
    };
    let config = RestockConfig::load(cli.config.as_deref(), overrides)
        .context("Failed to load configuration")?;

    init_logging(&config.logging.level);
    debug!(?config, "Configuration loaded");

    let db = open_database(&config).await?;

    let outcome = match cli.command {
        Command::Run { json } => run(&db, &config, json).await,
        Command::Show { table, last } => show(&db, &config, table, last).await,
        Command::Status => status(&db, &config).await,
    };

    db.close().await;
    outcome
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_database(config: &RestockConfig) -> Result<Database> {
    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let db_config = DbConfig::new(path)
        .max_connections(config.database.max_connections)
        .connect_timeout(Duration::from_secs(config.database.connect_timeout_secs));
    Database::open(db_config)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))
}

// =============================================================================
// Commands
// =============================================================================

async fn run(db: &Database, config: &RestockConfig, json: bool) -> Result<()> {
    let channel = if json { Channel::Stderr } else { Channel::Stdout };

    let pipeline = Pipeline::new(Arc::new(db.tables()), config.pipeline.clone())?
        .with_events(Arc::new(ConsoleEvents::new(channel)));
    let mut input = StdinSource::new(channel);

    if !json {
        println!("Welcome to Restock Data Automation\n");
    }

    match pipeline.run(&mut input).await {
        Ok(summary) => {
            info!(forecast = %summary.forecast, "Run finished");
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Ok(())
        }
        Err(PipelineError::Cancelled) => {
            eprintln!("Cancelled. Nothing was saved.");
            db.close().await;
            std::process::exit(EXIT_CANCELLED);
        }
        Err(err) => {
            let stage = err.stage();
            Err(anyhow::Error::new(err).context(match stage {
                Some(stage) => format!("Run stopped while {}", stage),
                None => "Run did not start".to_string(),
            }))
        }
    }
}

async fn show(
    db: &Database,
    config: &RestockConfig,
    table: Table,
    last: Option<u32>,
) -> Result<()> {
    let tables = db.tables();
    let rows = match last {
        Some(n) => tables.last_rows(table, n).await?,
        None => tables.all(table).await?,
    };

    println!("{} ({} rows)", table, rows.len());
    print_rows(&config.pipeline.items, &rows);
    Ok(())
}

fn print_rows(items: &[String], rows: &[StoredRow]) {
    let width = items.iter().map(|i| i.len()).max().unwrap_or(0).max(6);

    let mut header = format!("{:>5}  {:<20}", "#", "recorded");
    for item in items {
        header.push_str(&format!("  {:>width$}", item, width = width));
    }
    println!("{}", header);

    for row in rows {
        let mut line = format!(
            "{:>5}  {:<20}",
            row.seq,
            row.recorded_at.format("%Y-%m-%d %H:%M:%S")
        );
        for cell in &row.cells {
            line.push_str(&format!("  {:>width$}", cell, width = width));
        }
        println!("{}", line);
    }
}

async fn status(db: &Database, config: &RestockConfig) -> Result<()> {
    let healthy = db.health_check().await;
    println!("Database:   {}", config.database.path.display());
    println!("Health:     {}", if healthy { "ok" } else { "unreachable" });
    if !healthy {
        anyhow::bail!("Database {} is not answering", config.database.path.display());
    }

    let tables = db.tables();
    let (total, applied) = db.migration_status().await?;
    println!("Migrations: {}/{} applied", applied, total);
    println!("Items:      {}", config.pipeline.items.join(", "));
    println!(
        "Forecast:   last {} periods + {}%",
        config.pipeline.window,
        config.pipeline.uplift().percentage()
    );
    println!();
    for table in Table::ALL {
        println!("  {:<8} {:>6} rows", table, tables.count(table).await?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_show_parses_table_name() {
        let cli = Cli::try_parse_from(["restock", "--db", "x.db", "show", "Stock", "--last", "3"])
            .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        assert!(matches!(
            cli.command,
            Command::Show {
                table: Table::Stock,
                last: Some(3)
            }
        ));

        assert!(Cli::try_parse_from(["restock", "show", "orders"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["restock", "run", "--json", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Run { json: true }));
    }
}
