//! Postgres adapter for dbseed.
//!
//! Implements the engine's seams over a `PgPool`: schema facts from the
//! information schema, row inserts with primary-key harvesting, and the
//! statement runner used by the probe and wipe paths.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use dbseed_core::{Column, Error, ForeignKeyRef, Result};
use dbseed_engine::{QueryRunner, SchemaFacts};

mod insert;
mod mapper;
mod queries;

/// Adapter over a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pool: PgPool,
    schema: String,
}

impl PostgresAdapter {
    /// Wrap a pre-configured pool, targeting the `public` schema.
    pub fn new(pool: PgPool) -> Self {
        Self::with_schema(pool, "public")
    }

    pub fn with_schema(pool: PgPool, schema: &str) -> Self {
        Self {
            pool,
            schema: schema.to_string(),
        }
    }

    /// Connect with a small pool sized for sequential seeding.
    pub async fn connect(conn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(conn)
            .await
            .map_err(|err| Error::Db(err.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn engine(&self) -> &'static str {
        "postgres"
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SchemaFacts for PostgresAdapter {
    async fn list_tables(&self) -> Result<Vec<String>> {
        queries::list_tables(&self.pool, &self.schema).await
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<Column>> {
        let raw = queries::list_columns(&self.pool, &self.schema, table).await?;
        Ok(mapper::map_columns(raw))
    }

    async fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        queries::primary_key_columns(&self.pool, &self.schema, table).await
    }

    async fn foreign_keys(&self, table: &str) -> Result<BTreeMap<String, ForeignKeyRef>> {
        let raw = queries::foreign_keys(&self.pool, &self.schema, table).await?;
        Ok(mapper::map_foreign_keys(raw))
    }
}

#[async_trait]
impl QueryRunner for PostgresAdapter {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::Db(err.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn fetch_count(&self, sql: &str) -> Result<u64> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::Db(err.to_string()))?;
        Ok(rows.len() as u64)
    }
}
