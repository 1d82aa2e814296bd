use std::collections::BTreeMap;

use async_trait::async_trait;

use dbseed_core::{Column, ForeignKeyRef, Result};

/// Source of schema metadata for the tables being seeded.
///
/// Implemented by database adapters; the engine fetches everything it needs
/// up front and works off immutable descriptors from then on.
#[async_trait]
pub trait SchemaFacts: Send + Sync {
    /// All seedable tables the database exposes.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of a table in declaration order.
    async fn describe_columns(&self, table: &str) -> Result<Vec<Column>>;

    /// Primary-key columns in key order; empty when the table has none.
    async fn primary_key_columns(&self, table: &str) -> Result<Vec<String>>;

    /// Foreign-key constraints: local column -> referenced table/column.
    async fn foreign_keys(&self, table: &str) -> Result<BTreeMap<String, ForeignKeyRef>>;
}
