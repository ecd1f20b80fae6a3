use super::{RangeTotals, RecordStore};
use crate::db::{setup_database, SaleRecord};
use crate::distribution::CategoryCount;
use crate::error::StoreError;
use crate::filter::FilterSpec;
use crate::histogram::PriceBucket;
use crate::pagination::Page;
use crate::period::{date_text, CalendarMonth, MonthRange};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const RECORD_COLUMNS: &str = "record_id, title, description, price, date_of_sale, category";

/// SQLite-backed store.
///
/// Dates live in `date_of_sale` as canonical RFC 3339 text, so range checks
/// are text comparisons and the month token sees the same text as
/// `SaleRecord::date_text`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Raw row before the date column is parsed
type RecordRow = (String, String, String, f64, String, Option<String>);

impl SqliteStore {
    /// Open (creating the schema if needed) the database at `path`.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn query_records(&self, sql: &str, values: Vec<Value>) -> Result<Vec<SaleRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;

        let rows = stmt
            .query_map(params_from_iter(values), |row| -> rusqlite::Result<RecordRow> {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(record_from_row).collect()
    }

    fn count_where(&self, sql: &str, values: Vec<Value>) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(sql, params_from_iter(values), |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn record_from_row(row: RecordRow) -> Result<SaleRecord, StoreError> {
    let (id, title, description, price, date, category) = row;

    let date_of_sale = DateTime::parse_from_rfc3339(&date)
        .map_err(|e| StoreError::Corrupt {
            id: id.clone(),
            reason: format!("bad date_of_sale '{}': {}", date, e),
        })?
        .with_timezone(&Utc);

    Ok(SaleRecord {
        id,
        title,
        description,
        price,
        date_of_sale,
        category,
    })
}

// ============================================================================
// FILTER → SQL
// ============================================================================

/// Render a filter as a `WHERE` clause with positional parameters.
/// `lower()` folds ASCII only, like `filter::contains_ignore_case`.
fn where_clause(filter: &FilterSpec) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(token) = &filter.month_token {
        clauses.push("instr(lower(date_of_sale), lower(?)) > 0".to_string());
        values.push(Value::Text(token.clone()));
    }

    if let Some(term) = &filter.search {
        let mut alternatives = vec![
            "instr(lower(title), lower(?)) > 0",
            "instr(lower(description), lower(?)) > 0",
        ];
        values.push(Value::Text(term.clone()));
        values.push(Value::Text(term.clone()));

        if let Some(price) = filter.search_price() {
            alternatives.push("price = ?");
            values.push(Value::Real(price));
        }

        clauses.push(format!("({})", alternatives.join(" OR ")));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

fn to_sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl RecordStore for SqliteStore {
    fn find(&self, filter: &FilterSpec, page: Page) -> Result<Vec<SaleRecord>, StoreError> {
        let (where_sql, mut values) = where_clause(filter);
        values.push(Value::Integer(to_sql_int(page.per_page())));
        values.push(Value::Integer(to_sql_int(page.offset())));

        let sql = format!(
            "SELECT {} FROM sales {} ORDER BY row_id LIMIT ? OFFSET ?",
            RECORD_COLUMNS, where_sql
        );
        self.query_records(&sql, values)
    }

    fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError> {
        let (where_sql, values) = where_clause(filter);
        self.count_where(&format!("SELECT COUNT(*) FROM sales {}", where_sql), values)
    }

    fn all(&self) -> Result<Vec<SaleRecord>, StoreError> {
        self.query_records(
            &format!("SELECT {} FROM sales ORDER BY row_id", RECORD_COLUMNS),
            Vec::new(),
        )
    }

    fn revenue_in_range(&self, range: &MonthRange) -> Result<RangeTotals, StoreError> {
        let conn = self.conn()?;
        let (revenue, items): (f64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(price), 0.0), COUNT(*)
             FROM sales
             WHERE date_of_sale >= ?1 AND date_of_sale < ?2",
            params![range.start_text(), range.end_text()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(RangeTotals {
            revenue,
            items: items as u64,
        })
    }

    fn count_unsold_before(&self, instant: &DateTime<Utc>) -> Result<u64, StoreError> {
        self.count_where(
            "SELECT COUNT(*) FROM sales WHERE price = 0 AND date_of_sale < ?",
            vec![Value::Text(date_text(instant))],
        )
    }

    fn count_sold_in_bucket(
        &self,
        range: &MonthRange,
        bucket: &PriceBucket,
    ) -> Result<u64, StoreError> {
        let upper = match bucket.upper {
            Some(upper) => Value::Real(upper),
            None => Value::Null,
        };

        self.count_where(
            "SELECT COUNT(*) FROM sales
             WHERE date_of_sale >= ?1 AND date_of_sale < ?2
               AND price > 0
               AND price > ?3
               AND (?4 IS NULL OR price <= ?4)",
            vec![
                Value::Text(range.start_text()),
                Value::Text(range.end_text()),
                Value::Real(bucket.lower),
                upper,
            ],
        )
    }

    fn count_by_category(&self, month: CalendarMonth) -> Result<Vec<CategoryCount>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, COUNT(*)
             FROM sales
             WHERE CAST(substr(date_of_sale, 6, 2) AS INTEGER) = ?1
             GROUP BY category",
        )?;

        let groups = stmt
            .query_map(params![month.number()], |row| {
                let count: i64 = row.get(1)?;
                Ok(CategoryCount {
                    category: row.get(0)?,
                    count: count as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, sqlite_store};

    #[test]
    fn test_unrestricted_filter_has_no_where() {
        let (sql, values) = where_clause(&FilterSpec::default());
        assert!(sql.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn test_price_clause_only_for_numeric_search() {
        let (sql, values) = where_clause(&FilterSpec::new(Some("2022-03"), Some("150")));
        assert!(sql.contains("price = ?"));
        assert_eq!(values.len(), 4);

        let (sql, values) = where_clause(&FilterSpec::new(None, Some("jacket")));
        assert!(!sql.contains("price"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_dates_stored_as_canonical_text() {
        let store = sqlite_store(&fixture());
        let conn = store.conn().unwrap();

        let stored: String = conn
            .query_row(
                "SELECT date_of_sale FROM sales WHERE record_id = '1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, "2022-03-05T00:00:00.000Z");
    }

    #[test]
    fn test_corrupt_date_is_store_error() {
        let store = sqlite_store(&fixture());
        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE sales SET date_of_sale = 'yesterday' WHERE record_id = '2'",
                [],
            )
            .unwrap();

        let err = store.all().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref id, .. } if id == "2"));
    }

    #[test]
    fn test_search_is_case_insensitive_in_sql() {
        let store = sqlite_store(&fixture());

        let found = store
            .find(&FilterSpec::new(None, Some("BACKPACK")), Page::default())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
    }
}
