use super::{RangeTotals, RecordStore};
use crate::db::SaleRecord;
use crate::distribution::CategoryCount;
use crate::error::StoreError;
use crate::filter::FilterSpec;
use crate::histogram::PriceBucket;
use crate::pagination::Page;
use crate::period::{CalendarMonth, MonthRange};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// In-process store over a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<SaleRecord>,
}

impl MemoryStore {
    pub fn new(records: Vec<SaleRecord>) -> Self {
        MemoryStore { records }
    }

    fn in_range<'a>(&'a self, range: &'a MonthRange) -> impl Iterator<Item = &'a SaleRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| range.contains(&r.date_of_sale))
    }
}

impl RecordStore for MemoryStore {
    fn find(&self, filter: &FilterSpec, page: Page) -> Result<Vec<SaleRecord>, StoreError> {
        let matched: Vec<SaleRecord> = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        Ok(page.slice(&matched))
    }

    fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError> {
        Ok(self.records.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    fn all(&self) -> Result<Vec<SaleRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn revenue_in_range(&self, range: &MonthRange) -> Result<RangeTotals, StoreError> {
        Ok(self
            .in_range(range)
            .fold(RangeTotals::default(), |acc, r| RangeTotals {
                revenue: acc.revenue + r.price,
                items: acc.items + 1,
            }))
    }

    fn count_unsold_before(&self, instant: &DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|r| !r.is_sold() && r.date_of_sale < *instant)
            .count() as u64)
    }

    fn count_sold_in_bucket(
        &self,
        range: &MonthRange,
        bucket: &PriceBucket,
    ) -> Result<u64, StoreError> {
        Ok(self
            .in_range(range)
            .filter(|r| r.is_sold() && bucket.contains(r.price))
            .count() as u64)
    }

    fn count_by_category(&self, month: CalendarMonth) -> Result<Vec<CategoryCount>, StoreError> {
        let mut groups: HashMap<Option<String>, u64> = HashMap::new();

        for record in self.records.iter().filter(|r| month.contains(&r.date_of_sale)) {
            *groups.entry(record.category.clone()).or_insert(0) += 1;
        }

        Ok(groups
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect())
    }
}
