// 📅 Calendar Periods
// Month boundaries as half-open [start, end) instants, plus sale-date parsing.

use crate::error::ValidationError;
use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::Serializer;

/// Years whose canonical text is exactly four digits
const TEXT_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Canonical text form of a sale date.
///
/// Millisecond precision with a `Z` suffix: lexical order equals
/// chronological order, which the SQLite store relies on.
pub fn date_text(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize a date as its canonical text, so clients see what the filter sees.
pub fn serialize_date_text<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date_text(date))
}

/// Parse a sale date from an import file.
///
/// Accepts RFC 3339 with any offset (normalized to UTC) or a bare
/// `YYYY-MM-DD`, which is taken as midnight UTC.
/// The UTC year must fall in 0000-9999.
pub fn parse_sale_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    let parsed = match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| anyhow!("invalid sale date '{}': {}", raw, e))?;

            let midnight = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| anyhow!("invalid sale date '{}'", raw))?;

            Utc.from_utc_datetime(&midnight)
        }
    };

    if !TEXT_YEARS.contains(&parsed.year()) {
        bail!("sale date '{}' is outside years 0000-9999", raw);
    }

    Ok(parsed)
}

// ============================================================================
// MONTH RANGE
// ============================================================================

/// One calendar month: `start` is its first instant, `end` the first
/// instant of the following month (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthRange {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        let month = CalendarMonth::new(month)?;
        let start = first_of_month(year, month.number())?;

        let (next_year, next_month) = if month.number() == 12 {
            (year.checked_add(1).ok_or(ValidationError::YearOutOfRange(year))?, 1)
        } else {
            (year, month.number() + 1)
        };
        let end = first_of_month(next_year, next_month)?;

        Ok(MonthRange { start, end })
    }

    /// Parse the statistics form `YYYY-MM`.
    pub fn parse_year_month(raw: Option<&str>) -> Result<Self, ValidationError> {
        let raw = non_empty(raw).ok_or(ValidationError::MissingMonth)?;
        let malformed = || ValidationError::MalformedMonth(raw.to_string());

        let (year, month) = raw.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(malformed());
        }
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;

        match MonthRange::new(year, month) {
            Err(ValidationError::MonthOutOfRange) => Err(malformed()),
            other => other,
        }
    }

    /// Parse the histogram form: separate `month` (1-12) and `year`.
    pub fn parse_month_and_year(
        month: Option<&str>,
        year: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let (month, year) = match (non_empty(month), non_empty(year)) {
            (Some(m), Some(y)) => (m, y),
            _ => return Err(ValidationError::MissingMonthOrYear),
        };

        let month = CalendarMonth::parse(Some(month))?;
        let year: i32 = year
            .parse()
            .map_err(|_| ValidationError::MalformedYear(year.to_string()))?;

        MonthRange::new(year, month.number())
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.start <= *instant && *instant < self.end
    }

    pub fn start_text(&self) -> String {
        date_text(&self.start)
    }

    pub fn end_text(&self) -> String {
        date_text(&self.end)
    }
}

fn first_of_month(year: i32, month: u32) -> Result<DateTime<Utc>, ValidationError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or(ValidationError::YearOutOfRange(year))
}

// ============================================================================
// CALENDAR MONTH (year-agnostic)
// ============================================================================

/// A month of the year, 1 through 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarMonth(u32);

impl CalendarMonth {
    pub fn new(month: u32) -> Result<Self, ValidationError> {
        if (1..=12).contains(&month) {
            Ok(CalendarMonth(month))
        } else {
            Err(ValidationError::MonthOutOfRange)
        }
    }

    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        let raw = non_empty(raw).ok_or(ValidationError::MonthOutOfRange)?;
        let month: u32 = raw.parse().map_err(|_| ValidationError::MonthOutOfRange)?;
        CalendarMonth::new(month)
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        instant.month() == self.0
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;

    #[test]
    fn test_month_range_is_one_month_wide() {
        for year in [1999, 2020, 2021, 2022, 2024] {
            for month in 1..=12 {
                let range = MonthRange::new(year, month).unwrap();
                assert_eq!(range.start + Months::new(1), range.end);
                assert_eq!(range.start.day(), 1);
                assert_eq!(range.start.month(), month);
            }
        }
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let range = MonthRange::parse_year_month(Some("2021-12")).unwrap();
        assert_eq!(range.start_text(), "2021-12-01T00:00:00.000Z");
        assert_eq!(range.end_text(), "2022-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_end_is_exclusive() {
        let range = MonthRange::new(2022, 3).unwrap();
        assert!(range.contains(&range.start));
        assert!(!range.contains(&range.end));
        assert!(range.contains(&(range.end - chrono::Duration::milliseconds(1))));
    }

    #[test]
    fn test_parse_year_month_rejects_bad_input() {
        assert_eq!(
            MonthRange::parse_year_month(None),
            Err(ValidationError::MissingMonth)
        );
        assert_eq!(
            MonthRange::parse_year_month(Some("  ")),
            Err(ValidationError::MissingMonth)
        );
        for bad in ["2022", "2022-13", "2022-00", "22-03", "2022-March", "abcd-01"] {
            assert_eq!(
                MonthRange::parse_year_month(Some(bad)),
                Err(ValidationError::MalformedMonth(bad.to_string())),
                "{} should be rejected",
                bad
            );
        }
        assert!(MonthRange::parse_year_month(Some("2022-3")).is_ok());
    }

    #[test]
    fn test_parse_month_and_year() {
        let range = MonthRange::parse_month_and_year(Some("3"), Some("2022")).unwrap();
        assert_eq!(range, MonthRange::new(2022, 3).unwrap());

        assert_eq!(
            MonthRange::parse_month_and_year(Some("3"), None),
            Err(ValidationError::MissingMonthOrYear)
        );
        assert_eq!(
            MonthRange::parse_month_and_year(None, Some("2022")),
            Err(ValidationError::MissingMonthOrYear)
        );
        assert_eq!(
            MonthRange::parse_month_and_year(Some("13"), Some("2022")),
            Err(ValidationError::MonthOutOfRange)
        );
        assert_eq!(
            MonthRange::parse_month_and_year(Some("3"), Some("twenty")),
            Err(ValidationError::MalformedYear("twenty".to_string()))
        );
    }

    #[test]
    fn test_calendar_month_bounds() {
        assert!(CalendarMonth::parse(Some("1")).is_ok());
        assert!(CalendarMonth::parse(Some("12")).is_ok());
        assert_eq!(CalendarMonth::parse(Some("0")), Err(ValidationError::MonthOutOfRange));
        assert_eq!(CalendarMonth::parse(Some("13")), Err(ValidationError::MonthOutOfRange));
        assert_eq!(CalendarMonth::parse(None), Err(ValidationError::MonthOutOfRange));
    }

    #[test]
    fn test_parse_sale_date_formats() {
        let offset = parse_sale_date("2021-11-27T20:29:54+05:30").unwrap();
        assert_eq!(date_text(&offset), "2021-11-27T14:59:54.000Z");

        let bare = parse_sale_date("2022-03-05").unwrap();
        assert_eq!(date_text(&bare), "2022-03-05T00:00:00.000Z");

        assert!(parse_sale_date("05/03/2022").is_err());
    }

    #[test]
    fn test_parse_sale_date_keeps_four_digit_years() {
        let last = parse_sale_date("9999-12-05").unwrap();
        assert_eq!(date_text(&last), "9999-12-05T00:00:00.000Z");

        let first = parse_sale_date("0000-01-01T00:00:00Z").unwrap();
        assert_eq!(date_text(&first), "0000-01-01T00:00:00.000Z");

        for raw in ["+10000-03-05", "-0001-03-05", "0000-01-01T00:30:00+01:00"] {
            let err = parse_sale_date(raw).unwrap_err();
            assert!(err.to_string().contains("0000-9999"), "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_serialized_date_is_canonical_text() {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(serialize_with = "serialize_date_text")]
            at: DateTime<Utc>,
        }

        let at = parse_sale_date("2022-03-05").unwrap();
        let json = serde_json::to_string(&Wrapper { at }).unwrap();
        assert_eq!(json, r#"{"at":"2022-03-05T00:00:00.000Z"}"#);
    }
}
