use serde::{Deserialize, Serialize};

use crate::errors::SeedError;

/// Which tables a run covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TableSelection {
    /// Every table the schema facts report.
    All,
    /// An explicit set of table names.
    Named(Vec<String>),
}

/// Options for a seeding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedOptions {
    pub tables: TableSelection,
    /// Rows to generate per table.
    pub rows: u64,
    /// Batch size at which drafted rows are flushed to the executor.
    pub batch_size: usize,
    /// RNG seed; a run with the same seed against the same schema drafts the
    /// same values.
    pub seed: Option<u64>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            tables: TableSelection::All,
            rows: 100,
            batch_size: 10,
            seed: None,
        }
    }
}

impl SeedOptions {
    pub fn validate(&self) -> Result<(), SeedError> {
        if self.rows == 0 {
            return Err(SeedError::InvalidConfig("rows must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(SeedError::InvalidConfig(
                "batch size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Per-table outcome of a seeding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOutcome {
    pub table: String,
    pub rows_requested: u64,
    pub rows_inserted: u64,
    /// Rows dropped because a non-nullable foreign key had no parent keys.
    pub rows_unresolved: u64,
    /// Foreign-key columns written as NULL because their pool was empty.
    pub null_fks: u64,
    /// Rows the executor rejected individually.
    pub insert_failures: u64,
}

/// A table the run gave up on entirely, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedTable {
    pub table: String,
    pub reason: String,
}

/// Summary of one seeding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedReport {
    /// The topological order the run used, for audit.
    pub seeding_order: Vec<String>,
    pub tables: Vec<TableOutcome>,
    pub skipped: Vec<SkippedTable>,
}

impl SeedReport {
    pub fn rows_inserted(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_inserted).sum()
    }

    pub fn fully_succeeded(&self) -> bool {
        self.skipped.is_empty()
            && self
                .tables
                .iter()
                .all(|t| t.rows_inserted == t.rows_requested)
    }
}
