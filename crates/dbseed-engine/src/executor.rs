use std::collections::HashMap;

use async_trait::async_trait;

use dbseed_core::{Result, Table};

use crate::pool::KeyValue;
use crate::value::ScalarValue;

/// One drafted row, keyed by column name.
pub type Row = HashMap<String, ScalarValue>;

/// A row the executor rejected within an otherwise successful batch.
#[derive(Debug, Clone)]
pub struct InsertFailure {
    /// Index of the row within the submitted batch.
    pub row_index: usize,
    pub message: String,
}

/// Result of one batch insert.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Primary-key values of the successfully inserted rows, in submission
    /// order. Empty when the table has no primary key.
    pub keys: Vec<KeyValue>,
    /// Rows inserted; for keyed tables this equals `keys.len()`.
    pub inserted: u64,
    pub failures: Vec<InsertFailure>,
}

/// Persists drafted rows and reports back the primary keys the database
/// assigned (or accepted).
#[async_trait]
pub trait InsertExecutor: Send + Sync {
    /// Insert a batch of rows. A rejected individual row is reported in
    /// [`BatchOutcome::failures`] and omitted from the keys; it must not
    /// fail the rest of the batch. An `Err` return means the table cannot
    /// be written at all.
    async fn insert_batch(
        &self,
        table: &Table,
        columns: &[String],
        rows: &[Row],
    ) -> Result<BatchOutcome>;
}

/// Executes ad-hoc statements for the probe and wipe paths.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Run a statement that does not return rows; reports rows affected.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Run a query and report how many rows came back.
    async fn fetch_count(&self, sql: &str) -> Result<u64>;
}
