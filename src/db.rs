use crate::period::{date_text, parse_sale_date, serialize_date_text};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Sale record as served to clients
/// Immutable once imported: the report layer only ever reads it
///
/// `price == 0` is how the dataset encodes "not sold"; there is no flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(serialize_with = "serialize_date_text")]
    pub date_of_sale: DateTime<Utc>,
    pub category: Option<String>,
}

impl SaleRecord {
    /// Text form of `date_of_sale` seen by the month-token filter
    pub fn date_text(&self) -> String {
        date_text(&self.date_of_sale)
    }

    pub fn is_sold(&self) -> bool {
        self.price != 0.0
    }

    /// Compute idempotency hash for duplicate detection on re-import
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}",
            self.id,
            self.title,
            self.price,
            self.date_text()
        ));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// IMPORT FORMAT
// ============================================================================

/// Row as it appears in a JSON dump or CSV export.
/// Extra columns (`sold`, `image`, ...) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSale {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    price: f64,
    date_of_sale: String,
    #[serde(default)]
    category: Option<String>,
}

impl RawSale {
    fn into_record(self, position: usize) -> Result<SaleRecord> {
        if !self.price.is_finite() || self.price < 0.0 {
            bail!("row {}: price must be a non-negative number, got {}", position, self.price);
        }

        let date_of_sale = parse_sale_date(&self.date_of_sale)
            .with_context(|| format!("row {}: bad dateOfSale", position))?;

        let mut record = SaleRecord {
            id: String::new(),
            title: self.title,
            description: self.description,
            price: self.price,
            date_of_sale,
            category: self.category.filter(|c| !c.is_empty()),
        };

        record.id = match self.id {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => content_id(&record),
        };

        Ok(record)
    }
}

/// Stable id for a row that has none, derived from its content.
/// The same row gets the same id on every import.
fn content_id(record: &SaleRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{}|{}|{}|{}",
        record.title,
        record.description,
        record.price,
        record.date_text(),
        record.category.as_deref().unwrap_or("")
    ));
    format!("{:x}", hasher.finalize())
}

/// Load records from a JSON array or a CSV file (chosen by extension)
pub fn load_records(path: &Path) -> Result<Vec<SaleRecord>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        load_csv(path)
    } else {
        load_json(path)
    }
}

pub fn load_json(path: &Path) -> Result<Vec<SaleRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open JSON file {}", path.display()))?;
    let rows: Vec<RawSale> = serde_json::from_reader(std::io::BufReader::new(file))
        .context("Failed to deserialize sale records")?;

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| row.into_record(i + 1))
        .collect()
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<SaleRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut records = Vec::new();

    for (i, result) in rdr.deserialize().enumerate() {
        let row: RawSale = result.context("Failed to deserialize sale record")?;
        records.push(row.into_record(i + 1)?);
    }

    Ok(records)
}

// ============================================================================
// SCHEMA & WRITES (import only)
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // date_of_sale holds canonical RFC 3339 text (see period::date_text)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sales (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            record_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            price REAL NOT NULL CHECK (price >= 0),
            date_of_sale TEXT NOT NULL,
            category TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sales_date ON sales(date_of_sale)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sales_price ON sales(price)",
        [],
    )?;

    Ok(())
}

/// Outcome of a bulk insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
}

pub fn insert_records(conn: &mut Connection, records: &[SaleRecord]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO sales (
                idempotency_hash, record_id, title, description, price, date_of_sale, category
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;

        for record in records {
            let result = stmt.execute(params![
                record.compute_idempotency_hash(),
                record.id,
                record.title,
                record.description,
                record.price,
                record.date_text(),
                record.category,
            ]);

            match result {
                Ok(_) => summary.inserted += 1,
                // Only the idempotency hash is UNIQUE; CHECK/NOT NULL failures propagate
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    summary.duplicates += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    tx.commit()?;

    tracing::info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "sale records imported"
    );

    Ok(summary)
}

/// Remove every record (the bulk load replaces the dataset wholesale)
pub fn clear_records(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM sales", [])?;
    Ok(removed)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sale;
    use std::io::Write;

    #[test]
    fn test_idempotency_import_twice() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let records = vec![
            sale("1", "Backpack", 50.0, "2022-03-05", Some("bags")),
            sale("2", "Jacket", 150.0, "2022-03-10", Some("clothing")),
            sale("3", "Ring", 0.0, "2022-02-20", Some("jewelery")),
        ];

        let first = insert_records(&mut conn, &records).unwrap();
        let second = insert_records(&mut conn, &records).unwrap();

        assert_eq!(first, ImportSummary { inserted: 3, duplicates: 0 });
        assert_eq!(second, ImportSummary { inserted: 0, duplicates: 3 });
        assert_eq!(verify_count(&conn).unwrap(), 3);

        println!("✅ Idempotent import test PASSED");
    }

    #[test]
    fn test_clear_records() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        insert_records(&mut conn, &[sale("1", "Mug", 12.0, "2022-01-01", None)]).unwrap();

        assert_eq!(clear_records(&conn).unwrap(), 1);
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_load_json_dump() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"id": 1, "title": "Fjallraven Backpack", "description": "Fits 15 inch laptops",
                  "price": 329.85, "category": "men's clothing", "sold": false,
                  "image": "https://example.invalid/1.jpg", "dateOfSale": "2021-11-27T20:29:54+05:30"}},
                {{"title": "Unnamed", "price": 0, "dateOfSale": "2022-02-20"}}
            ]"#
        )
        .unwrap();

        let records = load_records(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[0].date_text(), "2021-11-27T14:59:54.000Z");
        assert_eq!(records[0].category.as_deref(), Some("men's clothing"));
        assert!(records[0].is_sold());

        assert_eq!(records[1].id.len(), 64);
        assert_eq!(records[1].category, None);
        assert!(!records[1].is_sold());
    }

    #[test]
    fn test_load_csv_export() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,title,description,price,dateOfSale,category").unwrap();
        writeln!(file, "7,Lamp,Desk lamp,45.5,2022-06-01,home").unwrap();
        writeln!(file, "8,Chair,Office chair,120,2022-06-02,").unwrap();

        let records = load_records(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "7");
        assert_eq!(records[0].price, 45.5);
        assert_eq!(records[1].category, None);
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"id": "x", "title": "Refund", "price": -5, "dateOfSale": "2022-01-01"}}]"#
        )
        .unwrap();

        let err = load_records(file.path()).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_compute_idempotency_hash() {
        let record = sale("1", "Mug", 12.0, "2022-01-01", None);

        let hash1 = record.compute_idempotency_hash();
        let hash2 = record.compute_idempotency_hash();

        assert_eq!(hash1, hash2, "Same record should produce same hash");
        assert_eq!(hash1.len(), 64, "SHA-256 hash should be 64 hex characters");
    }

    #[test]
    fn test_reimport_without_ids_is_idempotent() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"title": "Unnamed", "description": "No id", "price": 20, "dateOfSale": "2022-02-20"}}]"#
        )
        .unwrap();

        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let first = insert_records(&mut conn, &load_records(file.path()).unwrap()).unwrap();
        let second = insert_records(&mut conn, &load_records(file.path()).unwrap()).unwrap();

        assert_eq!(first, ImportSummary { inserted: 1, duplicates: 0 });
        assert_eq!(second, ImportSummary { inserted: 0, duplicates: 1 });
        assert_eq!(verify_count(&conn).unwrap(), 1);

        println!("✅ Re-import without ids test PASSED");
    }

    #[test]
    fn test_rows_without_ids_get_distinct_ids() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"title": "Mug", "price": 12, "dateOfSale": "2022-01-01"}},
                {{"title": "Mug", "price": 12, "dateOfSale": "2022-01-02"}}
            ]"#
        )
        .unwrap();

        let records = load_records(file.path()).unwrap();
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn test_out_of_range_year_rejected_at_import() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,title,description,price,dateOfSale,category").unwrap();
        writeln!(file, "1,Clock,Wall clock,15,9999-12-05,home").unwrap();
        writeln!(file, "2,Clock,Wall clock,15,+10000-03-05,home").unwrap();

        let err = load_records(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("row 2"));
    }

    #[test]
    fn test_check_violation_is_not_a_duplicate() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let refund = sale("r1", "Refund", -5.0, "2022-01-01", None);
        assert!(insert_records(&mut conn, &[refund]).is_err());
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_serialized_date_matches_filter_text() {
        let record = sale("1", "Mug", 12.0, "2022-03-05", None);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["dateOfSale"], serde_json::json!(record.date_text()));
        assert_eq!(json["dateOfSale"], serde_json::json!("2022-03-05T00:00:00.000Z"));
    }
}
