use sqlx::{PgPool, Row};

use dbseed_core::{Error, Result};

fn db_err(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

/// Ordinary and partitioned tables in the target schema.
pub async fn list_tables(pool: &PgPool, schema: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        select c.relname::text as name
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relkind in ('r', 'p')
        order by c.relname
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("name").map_err(db_err))
        .collect()
}

pub struct RawColumn {
    pub name: String,
    pub data_type: String,
    pub is_nullable: String,
    pub is_identity: String,
    pub column_default: Option<String>,
}

pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query(
        r#"
        select
          column_name::text as name,
          data_type::text as data_type,
          is_nullable::text as is_nullable,
          is_identity::text as is_identity,
          column_default::text as column_default
        from information_schema.columns
        where table_schema = $1 and table_name = $2
        order by ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    rows.iter()
        .map(|row| {
            Ok(RawColumn {
                name: row.try_get("name").map_err(db_err)?,
                data_type: row.try_get("data_type").map_err(db_err)?,
                is_nullable: row.try_get("is_nullable").map_err(db_err)?,
                is_identity: row.try_get("is_identity").map_err(db_err)?,
                column_default: row.try_get("column_default").map_err(db_err)?,
            })
        })
        .collect()
}

pub async fn primary_key_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        select kcu.column_name::text as name
        from information_schema.table_constraints tc
        join information_schema.key_column_usage kcu
          on kcu.constraint_name = tc.constraint_name
         and kcu.table_schema = tc.table_schema
        where tc.table_schema = $1
          and tc.table_name = $2
          and tc.constraint_type = 'PRIMARY KEY'
        order by kcu.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("name").map_err(db_err))
        .collect()
}

pub struct RawForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

pub async fn foreign_keys(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawForeignKey>> {
    let rows = sqlx::query(
        r#"
        select
          kcu.column_name::text as column_name,
          ccu.table_name::text as referenced_table,
          ccu.column_name::text as referenced_column
        from information_schema.table_constraints tc
        join information_schema.key_column_usage kcu
          on kcu.constraint_name = tc.constraint_name
         and kcu.table_schema = tc.table_schema
        join information_schema.constraint_column_usage ccu
          on ccu.constraint_name = tc.constraint_name
         and ccu.table_schema = tc.table_schema
        where tc.table_schema = $1
          and tc.table_name = $2
          and tc.constraint_type = 'FOREIGN KEY'
        order by kcu.column_name
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    rows.iter()
        .map(|row| {
            Ok(RawForeignKey {
                column: row.try_get("column_name").map_err(db_err)?,
                referenced_table: row.try_get("referenced_table").map_err(db_err)?,
                referenced_column: row.try_get("referenced_column").map_err(db_err)?,
            })
        })
        .collect()
}
