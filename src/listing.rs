// 📋 Record Listing
// Paginated search over sale records, plus the unfiltered dump.

use crate::db::SaleRecord;
use crate::error::ReportResult;
use crate::filter::FilterSpec;
use crate::pagination::{Page, Paginated};
use crate::store::RecordStore;

/// Raw list parameters as received from a request
#[derive(Debug, Clone, Default)]
pub struct ListParams<'a> {
    pub month: Option<&'a str>,
    pub search: Option<&'a str>,
    pub page: Option<&'a str>,
    pub per_page: Option<&'a str>,
}

/// List records matching the month token and search term, one page at a time.
///
/// Never fails validation: bad or missing parameters fall back to defaults.
/// `total` counts the same filter as the page.
pub fn list_records<S>(store: &S, params: &ListParams<'_>) -> ReportResult<Paginated<SaleRecord>>
where
    S: RecordStore + ?Sized,
{
    let filter = FilterSpec::new(params.month, params.search);
    let page = Page::from_params(params.page, params.per_page);
    tracing::debug!(?filter, page = page.number(), per_page = page.per_page(), "listing records");

    let transactions = store.find(&filter, page)?;
    let total = store.count(&filter)?;

    Ok(Paginated {
        transactions,
        total,
    })
}

/// Every record in store order
pub fn all_records<S>(store: &S) -> ReportResult<Vec<SaleRecord>>
where
    S: RecordStore + ?Sized,
{
    Ok(store.all()?)
}
