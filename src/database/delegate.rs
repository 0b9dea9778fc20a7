//! Delegate backed by a DuckDB table

use super::engine::DatabaseEngine;
use super::query::build_find_many;
use crate::delegate::{project, Delegate};
use crate::error::{Error, Result};
use crate::pagination::FindManyArgs;
use crate::types::Record;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Engine shared between the delegates of one database
pub type SharedEngine = Arc<Mutex<DatabaseEngine>>;

/// Wrap an engine for sharing across delegates
pub fn shared(engine: DatabaseEngine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

/// `find_many` over one table
#[derive(Debug, Clone)]
pub struct TableDelegate {
    model: String,
    table: String,
    engine: SharedEngine,
}

impl TableDelegate {
    /// Delegate for `model`, reading from `table`
    pub fn new(model: impl Into<String>, table: impl Into<String>, engine: SharedEngine) -> Self {
        Self {
            model: model.into(),
            table: table.into(),
            engine,
        }
    }

    /// Table the delegate reads from
    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl Delegate for TableDelegate {
    fn model(&self) -> &str {
        &self.model
    }

    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>> {
        let engine = Arc::clone(&self.engine);
        let model = self.model.clone();
        let table = self.table.clone();

        tokio::task::spawn_blocking(move || {
            let engine = engine
                .lock()
                .map_err(|_| Error::delegate(&model, "database engine lock poisoned"))?;

            let table_columns = engine.table_columns(&table)?;
            if table_columns.is_empty() {
                return Err(Error::delegate(
                    &model,
                    format!("table '{table}' does not exist"),
                ));
            }

            let sql = build_find_many(&table, &table_columns, &args)?;
            tracing::debug!(model = %model, sql = %sql, "Executing find_many");

            let columns: Vec<String> = table_columns.into_iter().map(|c| c.name).collect();
            let records = engine.query_records(&sql, &columns)?;
            Ok(match args.select() {
                Some(select) => records.into_iter().map(|r| project(r, select)).collect(),
                None => records,
            })
        })
        .await
        .map_err(|e| Error::delegate(&self.model, format!("query task failed: {e}")))?
    }
}
