//! # Seed Data Generator
//!
//! Bootstraps a development database: one opening stock row, then a number
//! of synthetic market periods pushed through the real pipeline.
//!
//! ## Usage
//! ```bash
//! # Opening stock + 8 periods (default)
//! cargo run -p restock-db --bin seed
//!
//! # Custom number of periods
//! cargo run -p restock-db --bin seed -- --periods 20
//!
//! # Specify database path
//! cargo run -p restock-db --bin seed -- --db ./data/restock.db
//! ```
//!
//! Sales values are derived from the period and column index, so two seeds
//! of the same size produce the same tables.

use async_trait::async_trait;
use restock_core::{InputSource, Pipeline, PipelineConfig, Table};
use restock_db::{Database, DbConfig};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Base sales per item column before the per-period wobble.
const BASE_SALES: &[i64] = &[12, 20, 30, 8, 15, 10];

/// Feeds one generated sales line per pipeline run.
struct GeneratedSales {
    period: usize,
    columns: usize,
    served: bool,
}

#[async_trait]
impl InputSource for GeneratedSales {
    async fn next_line(&mut self, _prompt: &str) -> std::io::Result<Option<String>> {
        if self.served {
            return Ok(None);
        }
        self.served = true;
        Ok(Some(sales_line(self.period, self.columns)))
    }
}

fn sales_line(period: usize, columns: usize) -> String {
    (0..columns)
        .map(|col| {
            let base = BASE_SALES[col % BASE_SALES.len()];
            let wobble = ((period * 7 + col * 3) % 9) as i64 - 4;
            (base + wobble).max(0).to_string()
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
enum SeedArgs {
    Seed { periods: usize, db_path: String },
    Help,
}

/// Parses `--periods`, `--db` and `--help`. `args` excludes the program name.
fn parse_args<I>(args: I) -> Result<SeedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut periods: usize = 8;
    let mut db_path = String::from("./restock_dev.db");

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--periods" | "-p" => {
                let raw = args.next().ok_or("--periods needs a value")?;
                periods = raw
                    .parse()
                    .map_err(|_| format!("Invalid --periods value '{}': expected a count", raw))?;
            }
            "--db" | "-d" => {
                db_path = args.next().ok_or("--db needs a path")?;
            }
            "--help" | "-h" => return Ok(SeedArgs::Help),
            other => return Err(format!("Unknown argument '{}'", other)),
        }
    }

    Ok(SeedArgs::Seed { periods, db_path })
}

fn print_help() {
    println!("Restock Seed Data Generator");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -p, --periods <N>  Market periods to generate (default: 8)");
    println!("  -d, --db <PATH>    Database file path (default: ./restock_dev.db)");
    println!("  -h, --help         Show this help message");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (periods, db_path) = match parse_args(env::args().skip(1)) {
        Ok(SeedArgs::Seed { periods, db_path }) => (periods, db_path),
        Ok(SeedArgs::Help) => {
            print_help();
            return Ok(());
        }
        Err(message) => {
            eprintln!("error: {}", message);
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    let config = PipelineConfig::default();

    println!("🌱 Restock Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Periods:  {}", periods);
    println!("Items:    {}", config.items.join(", "));
    println!();

    let db = Database::open(DbConfig::new(&db_path)).await?;
    let tables = db.tables();

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = tables.count(Table::Sales).await? + tables.count(Table::Stock).await?;
    if existing > 0 {
        println!("⚠ Database already has {} sales/stock rows", existing);
        println!("  Skipping seed to avoid mixing histories.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Opening stock: a little above the base sales
    let opening: Vec<i64> = (0..config.item_count())
        .map(|col| BASE_SALES[col % BASE_SALES.len()] + 5)
        .collect();
    tables.append(Table::Stock, &opening).await?;
    println!("✓ Opening stock: {:?}", opening);

    let columns = config.item_count();
    let pipeline = Pipeline::new(Arc::new(tables.clone()), config)?;

    println!();
    println!("Running periods...");
    let start = std::time::Instant::now();

    for period in 1..=periods {
        let mut input = GeneratedSales {
            period,
            columns,
            served: false,
        };
        let summary = pipeline.run(&mut input).await?;
        println!(
            "  Period {:>3}: sales {}  surplus {}  next stock {}",
            period, summary.sales, summary.surplus, summary.forecast
        );
    }

    println!();
    println!("✓ Generated {} periods in {:?}", periods, start.elapsed());
    for table in Table::ALL {
        println!("  {:<8} {} rows", table, tables.count(table).await?);
    }

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
