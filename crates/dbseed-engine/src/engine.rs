use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use dbseed_core::{Error as CoreError, Table, build_dependency_graph, seeding_order};

use crate::errors::{SeedError, SeedResult};
use crate::executor::{InsertExecutor, Row};
use crate::facts::SchemaFacts;
use crate::model::{SeedOptions, SeedReport, SkippedTable, TableOutcome, TableSelection};
use crate::pool::KeyPool;
use crate::synth::{SynthRegistry, ValueSynthesizer};
use crate::value::ScalarValue;

/// Orchestrates one seeding run: resolves descriptors, orders tables by
/// their foreign-key dependencies, drafts and batches rows, and harvests
/// generated primary keys for downstream references.
pub struct SeedEngine {
    options: SeedOptions,
    synth: Box<dyn ValueSynthesizer>,
}

enum FkResolution {
    Value(ScalarValue),
    Null,
    Unresolved,
}

impl SeedEngine {
    pub fn new(options: SeedOptions) -> Self {
        Self {
            options,
            synth: Box::new(SynthRegistry::new()),
        }
    }

    pub fn with_synthesizer(mut self, synth: Box<dyn ValueSynthesizer>) -> Self {
        self.synth = synth;
        self
    }

    pub async fn run(
        &self,
        facts: &dyn SchemaFacts,
        executor: &dyn InsertExecutor,
    ) -> SeedResult<SeedReport> {
        self.options.validate()?;

        // Missing facts for a requested table abort the run; a foreign key
        // that cannot be satisfied only skips its table.
        let loaded = resolve_tables(facts, &self.options.tables).await?;
        if loaded.is_empty() {
            return Err(SeedError::InvalidConfig("no tables to seed".into()));
        }

        let mut skip_reasons: BTreeMap<String, String> = BTreeMap::new();
        {
            let index: BTreeMap<&str, &Table> =
                loaded.iter().map(|t| (t.name.as_str(), t)).collect();
            for table in &loaded {
                if let Err(reason) = validate_foreign_keys(table, &index) {
                    skip_reasons.insert(table.name.clone(), reason);
                }
            }
        }

        let mut skipped = Vec::new();
        let tables: Vec<Table> = loaded
            .into_iter()
            .filter(|table| match skip_reasons.remove(&table.name) {
                Some(reason) => {
                    warn!(table = %table.name, %reason, "skipping table");
                    skipped.push(SkippedTable {
                        table: table.name.clone(),
                        reason,
                    });
                    false
                }
                None => true,
            })
            .collect();

        let graph = build_dependency_graph(&tables)?;
        let order = seeding_order(&graph)?;

        let seed = self.options.seed.unwrap_or_else(|| rand::rng().random());
        let tables_by_name: BTreeMap<&str, &Table> =
            tables.iter().map(|t| (t.name.as_str(), t)).collect();
        let mut pool = KeyPool::new();
        let mut outcomes = Vec::new();

        info!(
            tables = order.len(),
            rows = self.options.rows,
            batch_size = self.options.batch_size,
            seed,
            "seeding started"
        );

        for name in &order {
            let Some(table) = tables_by_name.get(name.as_str()).copied() else {
                continue;
            };
            let mut rng = ChaCha8Rng::seed_from_u64(hash_seed(seed, name));
            match self
                .seed_table(table, &tables_by_name, executor, &mut pool, &mut rng)
                .await
            {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    warn!(table = %name, error = %err, "table failed, continuing");
                    skipped.push(SkippedTable {
                        table: name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let report = SeedReport {
            seeding_order: order,
            tables: outcomes,
            skipped,
        };
        info!(
            rows_inserted = report.rows_inserted(),
            tables_skipped = report.skipped.len(),
            "seeding completed"
        );
        Ok(report)
    }

    async fn seed_table(
        &self,
        table: &Table,
        tables: &BTreeMap<&str, &Table>,
        executor: &dyn InsertExecutor,
        pool: &mut KeyPool,
        rng: &mut ChaCha8Rng,
    ) -> dbseed_core::Result<TableOutcome> {
        if table.has_primary_key() {
            pool.register(&table.name);
        }

        let columns: Vec<String> = table
            .columns
            .iter()
            .filter(|column| !column.is_identity)
            .map(|column| column.name.clone())
            .collect();

        let mut outcome = TableOutcome {
            table: table.name.clone(),
            rows_requested: self.options.rows,
            rows_inserted: 0,
            rows_unresolved: 0,
            null_fks: 0,
            insert_failures: 0,
        };
        let mut batch: Vec<Row> = Vec::with_capacity(self.options.batch_size);

        info!(table = %table.name, rows = self.options.rows, "seeding table");

        for _ in 0..self.options.rows {
            match self.draft_row(table, tables, pool, rng, &mut outcome) {
                Some(row) => batch.push(row),
                None => outcome.rows_unresolved += 1,
            }
            if batch.len() >= self.options.batch_size {
                self.flush(table, &columns, &mut batch, executor, pool, &mut outcome)
                    .await?;
            }
        }
        if !batch.is_empty() {
            self.flush(table, &columns, &mut batch, executor, pool, &mut outcome)
                .await?;
        }

        if outcome.rows_unresolved > 0 {
            warn!(
                table = %table.name,
                unresolved = outcome.rows_unresolved,
                "rows dropped for lack of referenceable parent keys"
            );
        }

        Ok(outcome)
    }

    /// Build one row draft, or `None` when a non-nullable foreign key has no
    /// parent keys to reference yet.
    fn draft_row(
        &self,
        table: &Table,
        tables: &BTreeMap<&str, &Table>,
        pool: &KeyPool,
        rng: &mut ChaCha8Rng,
        outcome: &mut TableOutcome,
    ) -> Option<Row> {
        let mut row = Row::with_capacity(table.columns.len());

        for column in &table.columns {
            if column.is_identity {
                continue;
            }
            let value = match table.foreign_keys.get(&column.name) {
                Some(fk) => {
                    match resolve_foreign_key(fk, column.is_nullable, tables, pool, rng) {
                        FkResolution::Value(value) => value,
                        FkResolution::Null => {
                            outcome.null_fks += 1;
                            ScalarValue::Null
                        }
                        FkResolution::Unresolved => {
                            debug!(
                                table = %table.name,
                                column = %column.name,
                                referenced = %fk.referenced_table,
                                "no parent keys available, dropping row"
                            );
                            return None;
                        }
                    }
                }
                None => self
                    .synth
                    .synthesize(&column.name, &column.data_type, rng),
            };
            row.insert(column.name.clone(), value);
        }

        Some(row)
    }

    async fn flush(
        &self,
        table: &Table,
        columns: &[String],
        batch: &mut Vec<Row>,
        executor: &dyn InsertExecutor,
        pool: &mut KeyPool,
        outcome: &mut TableOutcome,
    ) -> dbseed_core::Result<()> {
        let rows = std::mem::take(batch);
        let result = executor.insert_batch(table, columns, &rows).await?;

        for failure in &result.failures {
            warn!(
                table = %table.name,
                row = failure.row_index,
                error = %failure.message,
                "row rejected by executor"
            );
        }
        outcome.insert_failures += result.failures.len() as u64;
        outcome.rows_inserted += result.inserted;

        // Keys enter the pool only after the batch is persisted, so samples
        // never reference a row that merely exists as a draft.
        if table.has_primary_key() {
            pool.append(&table.name, result.keys);
        }
        Ok(())
    }
}

fn resolve_foreign_key(
    fk: &dbseed_core::ForeignKeyRef,
    nullable: bool,
    tables: &BTreeMap<&str, &Table>,
    pool: &KeyPool,
    rng: &mut ChaCha8Rng,
) -> FkResolution {
    let position = tables
        .get(fk.referenced_table.as_str())
        .and_then(|referenced| referenced.primary_key_position(&fk.referenced_column))
        .unwrap_or(0);

    match pool.sample(&fk.referenced_table, rng) {
        Some(key) => match key.part(position) {
            Some(value) => FkResolution::Value(value.clone()),
            None => FkResolution::Unresolved,
        },
        None if nullable => FkResolution::Null,
        None => FkResolution::Unresolved,
    }
}

/// Load immutable descriptors for a table selection. The probe and wipe
/// paths use this directly; seeding adds foreign-key validation on top.
pub async fn resolve_tables(
    facts: &dyn SchemaFacts,
    selection: &TableSelection,
) -> SeedResult<Vec<Table>> {
    let requested = match selection {
        TableSelection::All => facts.list_tables().await.map_err(SeedError::Core)?,
        TableSelection::Named(names) => names.clone(),
    };
    let mut tables = Vec::with_capacity(requested.len());
    for name in &requested {
        tables.push(load_table(facts, name).await?);
    }
    Ok(tables)
}

async fn load_table(facts: &dyn SchemaFacts, name: &str) -> dbseed_core::Result<Table> {
    let columns = facts.describe_columns(name).await?;
    if columns.is_empty() {
        return Err(CoreError::SchemaResolution(format!(
            "table '{name}' is unknown to the schema facts"
        )));
    }
    let primary_key = facts.primary_key_columns(name).await?;
    let foreign_keys = facts.foreign_keys(name).await?;
    Ok(Table {
        name: name.to_string(),
        columns,
        primary_key,
        foreign_keys,
    })
}

/// Cross-check a table's foreign keys against the seeding set. References to
/// out-of-set tables are legal; they resolve (or not) against the pool at
/// draft time.
fn validate_foreign_keys(table: &Table, index: &BTreeMap<&str, &Table>) -> Result<(), String> {
    for (column, fk) in &table.foreign_keys {
        if table.column(column).is_none() {
            return Err(format!("foreign-key column '{column}' does not exist"));
        }
        let Some(referenced) = index.get(fk.referenced_table.as_str()) else {
            continue;
        };
        if referenced.column(&fk.referenced_column).is_none() {
            return Err(format!(
                "foreign key '{column}' references missing column '{}.{}'",
                fk.referenced_table, fk.referenced_column
            ));
        }
        // Only primary-key values are harvested into the pool, so a
        // reference to any other column could never be satisfied.
        if referenced.has_primary_key()
            && referenced.primary_key_position(&fk.referenced_column).is_none()
        {
            return Err(format!(
                "foreign key '{column}' references non-key column '{}.{}'",
                fk.referenced_table, fk.referenced_column
            ));
        }
    }
    Ok(())
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf2_9ce4_8422_2325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
