// Sales Report - Core Library
// Exposes the query and aggregation modules for the CLI, the API server, and tests

pub mod config;
pub mod db;
pub mod distribution;
pub mod error;
pub mod filter;
pub mod histogram;
pub mod listing;
pub mod pagination;
pub mod period;
pub mod statistics;
pub mod store;
pub mod telemetry;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use db::{
    SaleRecord, ImportSummary,
    load_records, load_json, load_csv, setup_database, insert_records,
    clear_records, verify_count,
};
pub use distribution::{category_distribution, CategoryCount};
pub use error::{ReportError, ReportResult, StoreError, ValidationError};
pub use filter::FilterSpec;
pub use histogram::{price_histogram, BucketCount, PriceBucket, PRICE_BUCKETS};
pub use listing::{all_records, list_records, ListParams};
pub use pagination::{Page, Paginated};
pub use period::{CalendarMonth, MonthRange};
pub use statistics::{monthly_statistics, MonthlyStatistics};
pub use store::{MemoryStore, RangeTotals, RecordStore, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
