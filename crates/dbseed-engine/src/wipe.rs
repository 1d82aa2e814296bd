use serde::{Deserialize, Serialize};
use tracing::info;

use dbseed_core::{Table, build_dependency_graph, quote_ident, seeding_order};

use crate::errors::SeedResult;
use crate::executor::QueryRunner;

/// Outcome of a wipe pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WipeReport {
    pub tables_wiped: u64,
    pub rows_deleted: u64,
}

/// Delete all rows from the given tables, children before parents, so no
/// delete ever violates a foreign key. Reuses the same dependency order as
/// seeding, reversed.
pub async fn wipe_tables(tables: &[Table], runner: &dyn QueryRunner) -> SeedResult<WipeReport> {
    let graph = build_dependency_graph(tables)?;
    let order = seeding_order(&graph)?;

    let mut report = WipeReport::default();
    for name in order.iter().rev() {
        let deleted = runner
            .execute(&format!("DELETE FROM {}", quote_ident(name)))
            .await
            .map_err(crate::errors::SeedError::Core)?;
        info!(table = %name, rows = deleted, "wiped table");
        report.tables_wiped += 1;
        report.rows_deleted += deleted;
    }

    Ok(report)
}
