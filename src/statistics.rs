// 📈 Statistics Aggregator
// Monthly revenue, item count and the unsold backlog.

use crate::error::ReportResult;
use crate::period::MonthRange;
use crate::store::RecordStore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatistics {
    pub total_sales: f64,
    pub total_sold_items: u64,
    pub total_not_sold_items: u64,
}

/// Statistics for a `YYYY-MM` month.
///
/// - `total_sales`: sum of price over records dated in the month (0 when none).
/// - `total_sold_items`: every record dated in the month, zero-price included.
/// - `total_not_sold_items`: zero-price records dated strictly BEFORE the
///   month, not within it. Downstream dashboards read this number as-is.
pub fn monthly_statistics<S>(store: &S, month: Option<&str>) -> ReportResult<MonthlyStatistics>
where
    S: RecordStore + ?Sized,
{
    let range = MonthRange::parse_year_month(month)?;
    tracing::debug!(start = %range.start, end = %range.end, "computing monthly statistics");

    let totals = store.revenue_in_range(&range)?;
    let not_sold = store.count_unsold_before(&range.start)?;

    Ok(MonthlyStatistics {
        total_sales: totals.revenue,
        total_sold_items: totals.items,
        total_not_sold_items: not_sold,
    })
}
