// 🥧 Category Distribution
// Item counts per category for a calendar month, across every year.

use crate::error::ReportResult;
use crate::period::CalendarMonth;
use crate::store::RecordStore;
use serde::Serialize;

/// `category == None` is its own group, serialized as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub count: u64,
}

/// Group records dated in `month` (1-12, any year) by category.
/// Order of the returned groups is unspecified.
pub fn category_distribution<S>(store: &S, month: Option<&str>) -> ReportResult<Vec<CategoryCount>>
where
    S: RecordStore + ?Sized,
{
    let month = CalendarMonth::parse(month)?;
    tracing::debug!(month = month.number(), "grouping records by category");

    Ok(store.count_by_category(month)?)
}
