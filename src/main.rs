use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};

use sales_report::config::{StoreArgs, DEFAULT_DB_PATH};
use sales_report::{
    category_distribution, clear_records, insert_records, list_records, load_records,
    monthly_statistics, price_histogram, setup_database, telemetry, verify_count, ListParams,
};

#[derive(Debug, Parser)]
#[command(name = "sales-report", version, about = "Query and aggregate retail sale records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a JSON/CSV dump into the SQLite database
    Import {
        file: PathBuf,

        #[arg(long, env = "SALES_DB", default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Delete existing records before importing
        #[arg(long)]
        replace: bool,
    },
    /// Paginated search over records
    List {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        per_page: Option<String>,
    },
    /// Revenue and item totals for a YYYY-MM month
    Statistics {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        month: Option<String>,
    },
    /// Price-range histogram of sold items
    Histogram {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        year: Option<String>,
    },
    /// Item counts per category for a calendar month, all years
    Categories {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        month: Option<String>,
    },
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Import { file, db, replace } => run_import(&file, &db, replace),
        Command::List {
            store,
            month,
            search,
            page,
            per_page,
        } => {
            let store = store.open()?;
            let params = ListParams {
                month: month.as_deref(),
                search: search.as_deref(),
                page: page.as_deref(),
                per_page: per_page.as_deref(),
            };
            print_json(&list_records(store.as_ref(), &params)?)
        }
        Command::Statistics { store, month } => {
            let store = store.open()?;
            print_json(&monthly_statistics(store.as_ref(), month.as_deref())?)
        }
        Command::Histogram { store, month, year } => {
            let store = store.open()?;
            print_json(&price_histogram(
                store.as_ref(),
                month.as_deref(),
                year.as_deref(),
            )?)
        }
        Command::Categories { store, month } => {
            let store = store.open()?;
            print_json(&category_distribution(store.as_ref(), month.as_deref())?)
        }
    }
}

fn run_import(file: &Path, db: &Path, replace: bool) -> Result<()> {
    println!("🗄️  Sale Records Import - JSON/CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load file
    println!("\n📂 Loading {}...", file.display());
    let records = load_records(file)?;
    println!("✓ Loaded {} records", records.len());

    // 2. Setup database
    let mut conn = Connection::open(db)
        .with_context(|| format!("Failed to open database {}", db.display()))?;
    setup_database(&conn)?;

    if replace {
        let removed = clear_records(&conn)?;
        println!("✓ Cleared {} existing records", removed);
    }

    // 3. Insert
    println!("\n💾 Inserting records...");
    let summary = insert_records(&mut conn, &records)?;
    println!("✓ Inserted: {} records", summary.inserted);
    println!("✓ Skipped duplicates: {}", summary.duplicates);

    // 4. Verify
    let count = verify_count(&conn)?;
    println!("\n✅ Database {} contains {} records", db.display(), count);

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
