// ⚙️ Runtime Configuration
// Command-line flags with environment fallbacks, shared by both binaries.

use crate::db::load_records;
use crate::store::{MemoryStore, RecordStore, SqliteStore};
use anyhow::{Context, Result};
use clap::{Args, Parser};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "sales.db";
pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";

/// Where report commands read records from
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// SQLite database populated by `import`
    #[arg(long, env = "SALES_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Read a JSON/CSV file directly instead of the database
    #[arg(long)]
    pub input: Option<PathBuf>,
}

impl StoreArgs {
    pub fn open(&self) -> Result<Box<dyn RecordStore>> {
        match &self.input {
            Some(path) => {
                let records = load_records(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                tracing::info!(records = records.len(), path = %path.display(), "loaded records into memory");
                Ok(Box::new(MemoryStore::new(records)))
            }
            None => {
                let store = SqliteStore::open(&self.db)
                    .with_context(|| format!("Failed to open database {}", self.db.display()))?;
                Ok(Box::new(store))
            }
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Parser)]
#[command(name = "sales-server", version, about = "Sales report HTTP API")]
pub struct ServerConfig {
    /// SQLite database populated by `sales-report import`
    #[arg(long, env = "SALES_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Listen address
    #[arg(long, env = "SALES_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,
}
