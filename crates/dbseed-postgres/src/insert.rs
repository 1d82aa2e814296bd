use async_trait::async_trait;
use sqlx::Row as _;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;

use dbseed_core::{Error, Result, Table, quote_ident};
use dbseed_engine::{BatchOutcome, InsertExecutor, InsertFailure, KeyValue, Row, ScalarValue};

use crate::PostgresAdapter;

#[async_trait]
impl InsertExecutor for PostgresAdapter {
    async fn insert_batch(
        &self,
        table: &Table,
        columns: &[String],
        rows: &[Row],
    ) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();

        // One statement per row: a rejected row must not take its batch
        // neighbors down with it.
        for (index, row) in rows.iter().enumerate() {
            match self.insert_row(table, columns, row).await {
                Ok(key) => {
                    outcome.inserted += 1;
                    if let Some(key) = key {
                        outcome.keys.push(key);
                    }
                }
                Err(err) => outcome.failures.push(InsertFailure {
                    row_index: index,
                    message: err.to_string(),
                }),
            }
        }

        Ok(outcome)
    }
}

impl PostgresAdapter {
    async fn insert_row(
        &self,
        table: &Table,
        columns: &[String],
        row: &Row,
    ) -> Result<Option<KeyValue>> {
        let (sql, values) = build_insert_sql(table, columns, row);

        let mut query = sqlx::query(&sql);
        for value in values {
            query = bind_value(query, value);
        }

        if table.has_primary_key() {
            let returned = query
                .fetch_one(self.pool())
                .await
                .map_err(|err| Error::Db(err.to_string()))?;
            Ok(Some(decode_key(table, &returned)?))
        } else {
            query
                .execute(self.pool())
                .await
                .map_err(|err| Error::Db(err.to_string()))?;
            Ok(None)
        }
    }
}

/// Build a parameterized insert for one row. NULL drafts become literal
/// NULLs so parameter types stay inferable from the target columns.
fn build_insert_sql<'r>(
    table: &Table,
    columns: &[String],
    row: &'r Row,
) -> (String, Vec<&'r ScalarValue>) {
    let mut placeholders = Vec::with_capacity(columns.len());
    let mut values = Vec::with_capacity(columns.len());

    for column in columns {
        match row.get(column) {
            Some(ScalarValue::Null) | None => placeholders.push("NULL".to_string()),
            Some(value) => {
                values.push(value);
                placeholders.push(format!("${}", values.len()));
            }
        }
    }

    let column_list = columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "INSERT INTO {} ({column_list}) VALUES ({})",
        quote_ident(&table.name),
        placeholders.join(", "),
    );

    if table.has_primary_key() {
        let returning = table
            .primary_key
            .iter()
            .map(|pk| quote_ident(pk))
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(&format!(" RETURNING {returning}"));
    }

    (sql, values)
}

fn bind_value<'q>(
    query: Query<'q, sqlx::Postgres, PgArguments>,
    value: &ScalarValue,
) -> Query<'q, sqlx::Postgres, PgArguments> {
    match value {
        ScalarValue::Null => query,
        ScalarValue::Bool(value) => query.bind(*value),
        ScalarValue::Int(value) => query.bind(*value),
        ScalarValue::Float(value) => query.bind(*value),
        ScalarValue::Text(value) => query.bind(value.clone()),
        ScalarValue::Uuid(value) => match uuid::Uuid::parse_str(value) {
            Ok(parsed) => query.bind(parsed),
            Err(_) => query.bind(value.clone()),
        },
        ScalarValue::Date(value) => query.bind(*value),
        ScalarValue::Time(value) => query.bind(*value),
        ScalarValue::Timestamp(value) => query.bind(*value),
        ScalarValue::Json(value) => query.bind(value.clone()),
    }
}

fn decode_key(table: &Table, row: &PgRow) -> Result<KeyValue> {
    let mut parts = Vec::with_capacity(table.primary_key.len());
    for (index, pk_column) in table.primary_key.iter().enumerate() {
        let data_type = table
            .column(pk_column)
            .map(|column| column.data_type.as_str())
            .unwrap_or("text");
        parts.push(decode_key_part(row, index, data_type)?);
    }

    if parts.len() == 1 {
        Ok(KeyValue::Single(parts.remove(0)))
    } else {
        Ok(KeyValue::Composite(parts))
    }
}

fn decode_key_part(row: &PgRow, index: usize, data_type: &str) -> Result<ScalarValue> {
    let ty = data_type.to_ascii_lowercase();
    let value = if ty.contains("smallint") {
        ScalarValue::Int(i64::from(
            row.try_get::<i16, _>(index)
                .map_err(|err| Error::Db(err.to_string()))?,
        ))
    } else if ty.contains("bigint") {
        ScalarValue::Int(
            row.try_get::<i64, _>(index)
                .map_err(|err| Error::Db(err.to_string()))?,
        )
    } else if ty.contains("int") {
        ScalarValue::Int(i64::from(
            row.try_get::<i32, _>(index)
                .map_err(|err| Error::Db(err.to_string()))?,
        ))
    } else if ty.contains("uuid") {
        ScalarValue::Uuid(
            row.try_get::<uuid::Uuid, _>(index)
                .map_err(|err| Error::Db(err.to_string()))?
                .to_string(),
        )
    } else if ty.contains("char") || ty.contains("text") {
        ScalarValue::Text(
            row.try_get::<String, _>(index)
                .map_err(|err| Error::Db(err.to_string()))?,
        )
    } else {
        return Err(Error::Unsupported(format!(
            "primary-key column type '{data_type}' cannot be harvested"
        )));
    };
    Ok(value)
}
