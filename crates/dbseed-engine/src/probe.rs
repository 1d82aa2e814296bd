use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use dbseed_core::{Table, quote_ident};

use crate::executor::QueryRunner;

/// One generated smoke query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeQuery {
    pub description: String,
    pub sql: String,
}

/// A probe query that failed to execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub description: String,
    pub sql: String,
    pub error: String,
}

/// Outcome of a probe pass over the seeded tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeReport {
    pub passed: u64,
    pub failed: u64,
    pub failures: Vec<ProbeFailure>,
}

impl ProbeReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Smoke queries for one table, cheapest first: row counts and limited
/// selects, then self-joins over the primary key, then numeric aggregates.
pub fn probe_queries(table: &Table) -> Vec<ProbeQuery> {
    let mut queries = count_queries(table);
    queries.extend(join_queries(table));
    queries.extend(aggregate_queries(table));
    queries
}

fn count_queries(table: &Table) -> Vec<ProbeQuery> {
    let name = quote_ident(&table.name);
    vec![
        ProbeQuery {
            description: format!("count records in {}", table.name),
            sql: format!("SELECT COUNT(*) FROM {name}"),
        },
        ProbeQuery {
            description: format!("select from {}", table.name),
            sql: format!("SELECT * FROM {name} LIMIT 5"),
        },
    ]
}

fn join_queries(table: &Table) -> Vec<ProbeQuery> {
    if !table.has_primary_key() {
        return Vec::new();
    }
    let name = quote_ident(&table.name);
    let condition = table
        .primary_key
        .iter()
        .map(|pk| {
            let pk = quote_ident(pk);
            format!("a.{pk} = b.{pk}")
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    vec![
        ProbeQuery {
            description: format!("inner self-join on {} primary key", table.name),
            sql: format!("SELECT a.* FROM {name} a INNER JOIN {name} b ON {condition} LIMIT 5"),
        },
        ProbeQuery {
            description: format!("left self-join on {} primary key", table.name),
            sql: format!("SELECT a.* FROM {name} a LEFT JOIN {name} b ON {condition} LIMIT 5"),
        },
    ]
}

fn aggregate_queries(table: &Table) -> Vec<ProbeQuery> {
    let name = quote_ident(&table.name);
    let mut queries = Vec::new();

    for column in table.columns.iter().filter(|c| is_numeric(&c.data_type)) {
        let quoted = quote_ident(&column.name);
        queries.push(ProbeQuery {
            description: format!("average of {}.{}", table.name, column.name),
            sql: format!("SELECT AVG({quoted}) FROM {name}"),
        });
        queries.push(ProbeQuery {
            description: format!("sum of {}.{}", table.name, column.name),
            sql: format!("SELECT SUM({quoted}) FROM {name}"),
        });
    }

    queries
}

fn is_numeric(data_type: &str) -> bool {
    let ty = data_type.to_ascii_lowercase();
    ty.contains("int")
        || ty.contains("numeric")
        || ty.contains("decimal")
        || ty.contains("real")
        || ty.contains("double")
        || ty.contains("float")
}

/// Execute the probe suite for every table, recovering per query.
pub async fn run_probes(tables: &[Table], runner: &dyn QueryRunner) -> ProbeReport {
    let mut report = ProbeReport::default();

    for table in tables {
        for query in probe_queries(table) {
            match runner.fetch_count(&query.sql).await {
                Ok(rows) => {
                    info!(probe = %query.description, rows, "probe passed");
                    report.passed += 1;
                }
                Err(err) => {
                    warn!(probe = %query.description, error = %err, "probe failed");
                    report.failed += 1;
                    report.failures.push(ProbeFailure {
                        description: query.description,
                        sql: query.sql,
                        error: err.to_string(),
                    });
                }
            }
        }
    }

    report
}
