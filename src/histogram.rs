// 📊 Histogram Builder
// Price-range distribution of sold items for one month of one year.

use crate::error::ReportResult;
use crate::period::MonthRange;
use crate::store::RecordStore;
use rayon::prelude::*;
use serde::Serialize;

/// One price bucket covering `(lower, upper]`; `upper == None` is unbounded.
///
/// Integer prices land exactly on the labelled pairs (100 → "0 - 100",
/// 101 → "101 - 200"); fractional prices between pairs (100.5) go to the
/// higher bucket instead of being dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBucket {
    pub label: &'static str,
    pub lower: f64,
    pub upper: Option<f64>,
}

impl PriceBucket {
    const fn bounded(label: &'static str, lower: f64, upper: f64) -> Self {
        PriceBucket {
            label,
            lower,
            upper: Some(upper),
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price > self.lower && self.upper.map_or(true, |upper| price <= upper)
    }
}

/// Fixed bucket order; charting depends on it.
pub const PRICE_BUCKETS: [PriceBucket; 10] = [
    PriceBucket::bounded("0 - 100", 0.0, 100.0),
    PriceBucket::bounded("101 - 200", 100.0, 200.0),
    PriceBucket::bounded("201 - 300", 200.0, 300.0),
    PriceBucket::bounded("301 - 400", 300.0, 400.0),
    PriceBucket::bounded("401 - 500", 400.0, 500.0),
    PriceBucket::bounded("501 - 600", 500.0, 600.0),
    PriceBucket::bounded("601 - 700", 600.0, 700.0),
    PriceBucket::bounded("701 - 800", 700.0, 800.0),
    PriceBucket::bounded("801 - 900", 800.0, 900.0),
    PriceBucket {
        label: "901 - above",
        lower: 900.0,
        upper: None,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub label: String,
    pub count: u64,
}

/// Count sold items per price bucket for `month`/`year`.
///
/// The ten counts are independent reads run in parallel; `collect` keeps
/// them in bucket order regardless of completion order. Any store failure
/// fails the whole histogram.
pub fn price_histogram<S>(
    store: &S,
    month: Option<&str>,
    year: Option<&str>,
) -> ReportResult<Vec<BucketCount>>
where
    S: RecordStore + ?Sized,
{
    let range = MonthRange::parse_month_and_year(month, year)?;
    tracing::debug!(start = %range.start, end = %range.end, "building price histogram");

    let counts = PRICE_BUCKETS
        .par_iter()
        .map(|bucket| {
            store
                .count_sold_in_bucket(&range, bucket)
                .map(|count| BucketCount {
                    label: bucket.label.to_string(),
                    count,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(counts)
}
