// 🗄️ Record Store
// The queryable collection the report layer reads from.
// Two backends: an in-process Vec (tests, ad-hoc files) and SQLite.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::db::SaleRecord;
use crate::distribution::CategoryCount;
use crate::error::StoreError;
use crate::filter::FilterSpec;
use crate::histogram::PriceBucket;
use crate::pagination::Page;
use crate::period::{CalendarMonth, MonthRange};
use chrono::{DateTime, Utc};

/// Revenue and item count over a date range
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeTotals {
    pub revenue: f64,
    pub items: u64,
}

/// Read-only queries over sale records.
///
/// Implementations must agree on semantics; every query is a single
/// bounded read, safe to call from several threads at once.
pub trait RecordStore: Send + Sync {
    /// One page of records matching `filter`, in store order.
    fn find(&self, filter: &FilterSpec, page: Page) -> Result<Vec<SaleRecord>, StoreError>;

    /// Number of records matching `filter`.
    fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError>;

    /// Every record, in store order.
    fn all(&self) -> Result<Vec<SaleRecord>, StoreError>;

    /// Sum of price and count of records dated in `[range.start, range.end)`.
    fn revenue_in_range(&self, range: &MonthRange) -> Result<RangeTotals, StoreError>;

    /// Records with `price == 0` dated strictly before `instant`.
    fn count_unsold_before(&self, instant: &DateTime<Utc>) -> Result<u64, StoreError>;

    /// Sold records dated in `range` whose price falls in `bucket`.
    fn count_sold_in_bucket(
        &self,
        range: &MonthRange,
        bucket: &PriceBucket,
    ) -> Result<u64, StoreError>;

    /// Records dated in `month` of any year, grouped by category as stored.
    fn count_by_category(&self, month: CalendarMonth) -> Result<Vec<CategoryCount>, StoreError>;
}
