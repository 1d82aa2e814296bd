use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use dbseed_core::{Column, Error as CoreError, ForeignKeyRef, Result as CoreResult, Table};
use dbseed_engine::{
    BatchOutcome, InsertExecutor, InsertFailure, KeyValue, Row, ScalarValue, SchemaFacts,
    SeedEngine, SeedError, SeedOptions, TableSelection,
};

fn column(name: &str, ty: &str) -> Column {
    Column {
        name: name.to_string(),
        data_type: ty.to_string(),
        is_nullable: false,
        is_identity: false,
    }
}

fn nullable(mut col: Column) -> Column {
    col.is_nullable = true;
    col
}

fn identity(mut col: Column) -> Column {
    col.is_identity = true;
    col
}

fn fk(local: &str, table: &str, column: &str) -> (String, ForeignKeyRef) {
    (
        local.to_string(),
        ForeignKeyRef {
            referenced_table: table.to_string(),
            referenced_column: column.to_string(),
        },
    )
}

fn table(name: &str, columns: Vec<Column>, pk: &[&str], fks: Vec<(String, ForeignKeyRef)>) -> Table {
    Table {
        name: name.to_string(),
        columns,
        primary_key: pk.iter().map(|s| s.to_string()).collect(),
        foreign_keys: fks.into_iter().collect(),
    }
}

struct MemoryFacts {
    tables: Vec<Table>,
}

#[async_trait]
impl SchemaFacts for MemoryFacts {
    async fn list_tables(&self) -> CoreResult<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn describe_columns(&self, table: &str) -> CoreResult<Vec<Column>> {
        Ok(self
            .tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn primary_key_columns(&self, table: &str) -> CoreResult<Vec<String>> {
        Ok(self
            .tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.primary_key.clone())
            .unwrap_or_default())
    }

    async fn foreign_keys(&self, table: &str) -> CoreResult<BTreeMap<String, ForeignKeyRef>> {
        Ok(self
            .tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct ExecutorState {
    batch_sizes: HashMap<String, Vec<usize>>,
    rows: HashMap<String, Vec<Row>>,
    issued_keys: HashMap<String, Vec<i64>>,
    next_key: i64,
}

/// In-memory stand-in for the bulk-insert executor: issues sequential
/// integer keys for single-column primary keys and echoes drafted values for
/// composite ones.
#[derive(Default)]
struct MemoryExecutor {
    state: Mutex<ExecutorState>,
    /// Batch-local row indexes to reject, simulating constraint violations.
    reject_indexes: Vec<usize>,
}

#[async_trait]
impl InsertExecutor for MemoryExecutor {
    async fn insert_batch(
        &self,
        table: &Table,
        _columns: &[String],
        rows: &[Row],
    ) -> CoreResult<BatchOutcome> {
        let mut state = self.state.lock().expect("executor state poisoned");
        state
            .batch_sizes
            .entry(table.name.clone())
            .or_default()
            .push(rows.len());

        let mut outcome = BatchOutcome::default();
        for (index, row) in rows.iter().enumerate() {
            if self.reject_indexes.contains(&index) {
                outcome.failures.push(InsertFailure {
                    row_index: index,
                    message: "constraint violation".to_string(),
                });
                continue;
            }

            state
                .rows
                .entry(table.name.clone())
                .or_default()
                .push(row.clone());
            outcome.inserted += 1;

            match table.primary_key.len() {
                0 => {}
                1 => {
                    state.next_key += 1;
                    let key = state.next_key;
                    state
                        .issued_keys
                        .entry(table.name.clone())
                        .or_default()
                        .push(key);
                    outcome.keys.push(KeyValue::Single(ScalarValue::Int(key)));
                }
                _ => {
                    let parts: Vec<ScalarValue> = table
                        .primary_key
                        .iter()
                        .map(|pk| row.get(pk).cloned().unwrap_or(ScalarValue::Null))
                        .collect();
                    outcome.keys.push(KeyValue::Composite(parts));
                }
            }
        }
        Ok(outcome)
    }
}

fn options(rows: u64, batch_size: usize) -> SeedOptions {
    SeedOptions {
        tables: TableSelection::All,
        rows,
        batch_size,
        seed: Some(1234),
    }
}

fn customers() -> Table {
    table(
        "customers",
        vec![
            identity(column("id", "integer")),
            column("name", "text"),
            column("email", "text"),
        ],
        &["id"],
        vec![],
    )
}

fn orders() -> Table {
    table(
        "orders",
        vec![
            identity(column("id", "integer")),
            column("customer_id", "integer"),
            column("total_amount", "numeric"),
        ],
        &["id"],
        vec![fk("customer_id", "customers", "id")],
    )
}

#[tokio::test]
async fn batch_flush_respects_configured_size() {
    let facts = MemoryFacts {
        tables: vec![customers()],
    };
    let executor = MemoryExecutor::default();

    let report = SeedEngine::new(options(25, 10))
        .run(&facts, &executor)
        .await
        .unwrap();

    let state = executor.state.lock().unwrap();
    assert_eq!(state.batch_sizes["customers"], vec![10, 10, 5]);
    assert_eq!(report.tables[0].rows_inserted, 25);
}

#[tokio::test]
async fn foreign_keys_only_reference_harvested_parent_keys() {
    let facts = MemoryFacts {
        tables: vec![orders(), customers()],
    };
    let executor = MemoryExecutor::default();

    let report = SeedEngine::new(options(30, 7))
        .run(&facts, &executor)
        .await
        .unwrap();

    let customers_idx = report
        .seeding_order
        .iter()
        .position(|t| t == "customers")
        .unwrap();
    let orders_idx = report
        .seeding_order
        .iter()
        .position(|t| t == "orders")
        .unwrap();
    assert!(customers_idx < orders_idx);

    let state = executor.state.lock().unwrap();
    let parent_keys = &state.issued_keys["customers"];
    for row in &state.rows["orders"] {
        match &row["customer_id"] {
            ScalarValue::Int(value) => assert!(parent_keys.contains(value)),
            other => panic!("expected integer foreign key, got {other}"),
        }
    }
    assert_eq!(report.rows_inserted(), 60);
}

#[tokio::test]
async fn self_reference_gets_null_until_first_flush() {
    let facts = MemoryFacts {
        tables: vec![table(
            "employees",
            vec![
                identity(column("id", "integer")),
                column("full_name", "text"),
                nullable(column("manager_id", "integer")),
            ],
            &["id"],
            vec![fk("manager_id", "employees", "id")],
        )],
    };
    let executor = MemoryExecutor::default();

    let report = SeedEngine::new(options(5, 2))
        .run(&facts, &executor)
        .await
        .unwrap();

    let state = executor.state.lock().unwrap();
    let rows = &state.rows["employees"];
    assert_eq!(rows.len(), 5);

    // The first batch is drafted before any employee key exists, so the
    // nullable self-reference is NULL; later batches sample real keys.
    assert_eq!(rows[0]["manager_id"], ScalarValue::Null);
    assert_eq!(rows[1]["manager_id"], ScalarValue::Null);
    let issued = &state.issued_keys["employees"];
    for row in &rows[2..] {
        match &row["manager_id"] {
            ScalarValue::Int(value) => assert!(issued.contains(value)),
            ScalarValue::Null => panic!("pool was non-empty, null not expected"),
            other => panic!("unexpected manager_id {other}"),
        }
    }

    assert_eq!(report.tables[0].null_fks, 2);
    assert_eq!(report.tables[0].rows_inserted, 5);
}

#[tokio::test]
async fn empty_pool_with_non_nullable_fk_drops_every_row() {
    // line_items references orders, which is not in the seeding set.
    let facts = MemoryFacts {
        tables: vec![table(
            "line_items",
            vec![
                identity(column("id", "integer")),
                column("order_id", "integer"),
                column("quantity", "integer"),
            ],
            &["id"],
            vec![fk("order_id", "orders", "id")],
        )],
    };
    let executor = MemoryExecutor::default();

    let report = SeedEngine::new(options(10, 4))
        .run(&facts, &executor)
        .await
        .unwrap();

    let outcome = &report.tables[0];
    assert_eq!(outcome.rows_inserted, 0);
    assert_eq!(outcome.rows_unresolved, 10);

    let state = executor.state.lock().unwrap();
    assert!(state.issued_keys.get("line_items").is_none());
    assert!(state.batch_sizes.get("line_items").is_none());
}

#[tokio::test]
async fn nullable_fk_to_out_of_set_table_falls_back_to_null() {
    let facts = MemoryFacts {
        tables: vec![table(
            "tags",
            vec![
                identity(column("id", "integer")),
                column("label", "text"),
                nullable(column("category_id", "integer")),
            ],
            &["id"],
            vec![fk("category_id", "categories", "id")],
        )],
    };
    let executor = MemoryExecutor::default();

    let report = SeedEngine::new(options(8, 3))
        .run(&facts, &executor)
        .await
        .unwrap();

    let outcome = &report.tables[0];
    assert_eq!(outcome.rows_inserted, 8);
    assert_eq!(outcome.null_fks, 8);

    let state = executor.state.lock().unwrap();
    for row in &state.rows["tags"] {
        assert_eq!(row["category_id"], ScalarValue::Null);
    }
}

#[tokio::test]
async fn mutual_cycle_aborts_before_any_insert() {
    let facts = MemoryFacts {
        tables: vec![
            table(
                "orders",
                vec![
                    identity(column("id", "integer")),
                    column("customer_id", "integer"),
                ],
                &["id"],
                vec![fk("customer_id", "customers", "id")],
            ),
            table(
                "customers",
                vec![
                    identity(column("id", "integer")),
                    column("last_order_id", "integer"),
                ],
                &["id"],
                vec![fk("last_order_id", "orders", "id")],
            ),
        ],
    };
    let executor = MemoryExecutor::default();

    let err = SeedEngine::new(options(5, 5))
        .run(&facts, &executor)
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::Core(CoreError::Cycle(_))));

    let state = executor.state.lock().unwrap();
    assert!(state.rows.is_empty());
}

#[tokio::test]
async fn rejected_rows_shrink_the_pool_without_aborting() {
    let facts = MemoryFacts {
        tables: vec![orders(), customers()],
    };
    let executor = MemoryExecutor {
        reject_indexes: vec![0],
        ..MemoryExecutor::default()
    };

    let report = SeedEngine::new(options(10, 10))
        .run(&facts, &executor)
        .await
        .unwrap();

    let customers_outcome = report
        .tables
        .iter()
        .find(|t| t.table == "customers")
        .unwrap();
    assert_eq!(customers_outcome.insert_failures, 1);
    assert_eq!(customers_outcome.rows_inserted, 9);

    let state = executor.state.lock().unwrap();
    assert_eq!(state.issued_keys["customers"].len(), 9);
    let parent_keys = &state.issued_keys["customers"];
    for row in &state.rows["orders"] {
        match &row["customer_id"] {
            ScalarValue::Int(value) => assert!(parent_keys.contains(value)),
            other => panic!("expected integer foreign key, got {other}"),
        }
    }
}

#[tokio::test]
async fn bad_foreign_key_skips_table_and_continues() {
    let broken = table(
        "invoices",
        vec![
            identity(column("id", "integer")),
            column("customer_id", "integer"),
        ],
        &["id"],
        vec![fk("customer_id", "customers", "no_such_column")],
    );

    let facts = MemoryFacts {
        tables: vec![broken, customers()],
    };
    let executor = MemoryExecutor::default();

    let report = SeedEngine::new(options(5, 5))
        .run(&facts, &executor)
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].table, "invoices");
    assert!(!report.seeding_order.contains(&"invoices".to_string()));

    let customers_outcome = report
        .tables
        .iter()
        .find(|t| t.table == "customers")
        .unwrap();
    assert_eq!(customers_outcome.rows_inserted, 5);
}

#[tokio::test]
async fn unknown_requested_table_aborts_the_run() {
    let facts = MemoryFacts {
        tables: vec![customers()],
    };
    let executor = MemoryExecutor::default();

    let engine = SeedEngine::new(SeedOptions {
        tables: TableSelection::Named(vec!["ghost".to_string()]),
        ..options(5, 5)
    });
    let err = engine.run(&facts, &executor).await.unwrap_err();
    assert!(matches!(
        err,
        SeedError::Core(CoreError::SchemaResolution(_))
    ));
}

#[tokio::test]
async fn composite_key_parts_resolve_downstream_references() {
    let facts = MemoryFacts {
        tables: vec![
            table(
                "order_lines",
                vec![
                    column("order_no", "integer"),
                    column("line_no", "integer"),
                    column("sku", "text"),
                ],
                &["order_no", "line_no"],
                vec![],
            ),
            table(
                "shipments",
                vec![
                    identity(column("id", "integer")),
                    column("line_no", "integer"),
                ],
                &["id"],
                vec![fk("line_no", "order_lines", "line_no")],
            ),
        ],
    };
    let executor = MemoryExecutor::default();

    SeedEngine::new(options(6, 3))
        .run(&facts, &executor)
        .await
        .unwrap();

    let state = executor.state.lock().unwrap();
    let drafted_line_numbers: Vec<&ScalarValue> = state.rows["order_lines"]
        .iter()
        .map(|row| &row["line_no"])
        .collect();
    for row in &state.rows["shipments"] {
        assert!(drafted_line_numbers.contains(&&row["line_no"]));
    }
}

#[tokio::test]
async fn seeded_runs_are_reproducible() {
    let facts = MemoryFacts {
        tables: vec![orders(), customers()],
    };

    let first = MemoryExecutor::default();
    SeedEngine::new(options(12, 5))
        .run(&facts, &first)
        .await
        .unwrap();
    let second = MemoryExecutor::default();
    SeedEngine::new(options(12, 5))
        .run(&facts, &second)
        .await
        .unwrap();

    let first_state = first.state.lock().unwrap();
    let second_state = second.state.lock().unwrap();
    assert_eq!(first_state.rows, second_state.rows);
}

#[tokio::test]
async fn zero_rows_is_rejected_up_front() {
    let facts = MemoryFacts {
        tables: vec![customers()],
    };
    let executor = MemoryExecutor::default();

    let err = SeedEngine::new(options(0, 10))
        .run(&facts, &executor)
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::InvalidConfig(_)));
}
