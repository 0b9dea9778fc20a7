//! DuckDB connection wrapper
//!
//! Owns a single DuckDB connection and converts result rows into JSON
//! records.

use crate::error::{Error, Result};
use crate::types::Record;
use duckdb::types::TimeUnit;
use duckdb::Connection;
use serde_json::Value;
use std::path::Path;

/// A column of a table, as reported by `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Column name
    pub name: String,
    /// Declared SQL type (`INTEGER`, `DECIMAL(10,2)`, `TIMESTAMP_MS`, ...)
    pub data_type: String,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Database query engine using DuckDB
pub struct DatabaseEngine {
    /// DuckDB connection
    conn: Connection,
    /// File path or `:memory:` (for logging)
    location: String,
}

impl DatabaseEngine {
    /// Open (or create) a DuckDB database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::database(format!(
                "Failed to open DuckDB database '{}': {e}",
                path.display()
            ))
        })?;

        tracing::debug!(path = %path.display(), "Opened DuckDB database");
        Ok(Self {
            conn,
            location: path.display().to_string(),
        })
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to create DuckDB connection: {e}")))?;

        Ok(Self {
            conn,
            location: ":memory:".to_string(),
        })
    }

    /// Where the database lives
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Run one or more statements that return no rows
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| Error::database(format!("Failed to execute statement: {e}")))
    }

    /// Base tables in the `main` schema
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT table_name FROM information_schema.tables
                 WHERE table_schema = 'main' AND table_type = 'BASE TABLE'
                 ORDER BY table_name",
            )
            .map_err(|e| Error::database(format!("Failed to prepare query: {e}")))?;

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to query tables: {e}")))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(tables)
    }

    /// Columns of `table` in declaration order (empty if the table does not exist)
    pub fn table_columns(&self, table: &str) -> Result<Vec<TableColumn>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT column_name, data_type FROM information_schema.columns
                 WHERE table_schema = 'main' AND table_name = ?
                 ORDER BY ordinal_position",
            )
            .map_err(|e| Error::database(format!("Failed to prepare query: {e}")))?;

        let columns: Vec<TableColumn> = stmt
            .query_map(duckdb::params![table], |row| {
                Ok(TableColumn {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                })
            })
            .map_err(|e| Error::database(format!("Failed to query columns of '{table}': {e}")))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(columns)
    }

    /// Run `sql` and name the selected values after `columns`, by position
    pub fn query_records(&self, sql: &str, columns: &[String]) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| Error::database(format!("Failed to prepare query: {e}")))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| Error::database(format!("Failed to run query: {e}")))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| Error::database(format!("Failed to read row: {e}")))?
        {
            let mut record = Record::new();
            for (idx, column) in columns.iter().enumerate() {
                let value: duckdb::types::Value = row
                    .get(idx)
                    .map_err(|e| Error::database(format!("Failed to read '{column}': {e}")))?;
                record.insert(column.clone(), duckdb_value_to_json(value));
            }
            records.push(record);
        }

        Ok(records)
    }
}

impl std::fmt::Debug for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseEngine")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Convert DuckDB Value to JSON Value
pub(crate) fn duckdb_value_to_json(value: duckdb::types::Value) -> Value {
    match value {
        duckdb::types::Value::Null => Value::Null,
        duckdb::types::Value::Boolean(b) => Value::Bool(b),
        duckdb::types::Value::TinyInt(i) => Value::Number(i.into()),
        duckdb::types::Value::SmallInt(i) => Value::Number(i.into()),
        duckdb::types::Value::Int(i) => Value::Number(i.into()),
        duckdb::types::Value::BigInt(i) => Value::Number(i.into()),
        duckdb::types::Value::HugeInt(i) => Value::String(i.to_string()),
        duckdb::types::Value::UTinyInt(i) => Value::Number(i.into()),
        duckdb::types::Value::USmallInt(i) => Value::Number(i.into()),
        duckdb::types::Value::UInt(i) => Value::Number(i.into()),
        duckdb::types::Value::UBigInt(i) => Value::Number(i.into()),
        duckdb::types::Value::Float(f) => {
            serde_json::Number::from_f64(f64::from(f)).map_or(Value::Null, Value::Number)
        }
        duckdb::types::Value::Double(f) => {
            serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
        }
        duckdb::types::Value::Text(s) => Value::String(s),
        duckdb::types::Value::Blob(b) => Value::String(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            b,
        )),
        duckdb::types::Value::Decimal(d) => Value::String(d.to_string()),
        duckdb::types::Value::Timestamp(unit, i) => timestamp_to_json(unit, i),
        duckdb::types::Value::Date32(d) => {
            // 719163 days from 0001-01-01 to 1970-01-01
            chrono::NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Number(d.into()))
        }
        duckdb::types::Value::Time64(_, t) => {
            // microseconds since midnight
            let secs = t / 1_000_000;
            let micros = t % 1_000_000;
            Value::String(format!(
                "{:02}:{:02}:{:02}.{:06}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60,
                micros
            ))
        }
        _ => Value::String(format!("{value:?}")),
    }
}

/// Render a timestamp at the precision of its unit, so it casts back to the same instant
fn timestamp_to_json(unit: TimeUnit, value: i64) -> Value {
    let (per_sec, format) = match unit {
        TimeUnit::Second => (1, "%Y-%m-%dT%H:%M:%SZ"),
        TimeUnit::Millisecond => (1_000, "%Y-%m-%dT%H:%M:%S%.3fZ"),
        TimeUnit::Microsecond => (1_000_000, "%Y-%m-%dT%H:%M:%S%.6fZ"),
        TimeUnit::Nanosecond => (1_000_000_000, "%Y-%m-%dT%H:%M:%S%.9fZ"),
    };
    let secs = value.div_euclid(per_sec);
    let nanos = (value.rem_euclid(per_sec) * (1_000_000_000 / per_sec)) as u32;
    chrono::DateTime::from_timestamp(secs, nanos)
        .map(|dt| Value::String(dt.format(format).to_string()))
        .unwrap_or(Value::Number(value.into()))
}
