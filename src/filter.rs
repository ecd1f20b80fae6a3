// 🔎 Filter Builder
// Turns the list endpoint's optional month/search parameters into a predicate.
//
// The month token is a plain substring test against the date text, NOT a
// calendar range. Statistics and histogram use MonthRange instead, so the two
// paths disagree: month "3" here matches any date text containing a 3.

use crate::db::SaleRecord;

/// Filter for the list operation.
/// Absent fields impose no restriction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub month_token: Option<String>,
    pub search: Option<String>,
}

impl FilterSpec {
    /// Build from raw request parameters; blank values count as absent.
    pub fn new(month: Option<&str>, search: Option<&str>) -> Self {
        FilterSpec {
            month_token: normalize(month),
            search: normalize(search),
        }
    }

    /// Search term read as a price, for the price-equality clause
    pub fn search_price(&self) -> Option<f64> {
        self.search
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|p| p.is_finite())
    }

    pub fn matches(&self, record: &SaleRecord) -> bool {
        self.matches_month(record) && self.matches_search(record)
    }

    /// Composable predicate over records
    pub fn predicate(&self) -> impl Fn(&SaleRecord) -> bool + '_ {
        move |record| self.matches(record)
    }

    fn matches_month(&self, record: &SaleRecord) -> bool {
        match &self.month_token {
            Some(token) => contains_ignore_case(&record.date_text(), token),
            None => true,
        }
    }

    fn matches_search(&self, record: &SaleRecord) -> bool {
        let Some(term) = &self.search else {
            return true;
        };

        contains_ignore_case(&record.title, term)
            || contains_ignore_case(&record.description, term)
            || self.search_price() == Some(record.price)
    }
}

fn normalize(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Case-insensitive substring test (ASCII folding, matching the SQLite store)
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}
