//! Referential-integrity-aware seeding engine.
//!
//! Tables are seeded in foreign-key dependency order; primary keys harvested
//! from inserted batches feed the foreign-key columns of downstream tables,
//! so no generated row ever carries a dangling reference.

pub mod engine;
pub mod errors;
pub mod executor;
pub mod facts;
pub mod model;
pub mod pool;
pub mod probe;
pub mod synth;
pub mod value;
pub mod wipe;

pub use engine::{SeedEngine, resolve_tables};
pub use errors::{SeedError, SeedResult};
pub use executor::{BatchOutcome, InsertExecutor, InsertFailure, QueryRunner, Row};
pub use facts::SchemaFacts;
pub use model::{SeedOptions, SeedReport, SkippedTable, TableOutcome, TableSelection};
pub use pool::{KeyPool, KeyValue};
pub use probe::{ProbeFailure, ProbeQuery, ProbeReport, probe_queries, run_probes};
pub use synth::{SynthRegistry, ValueSynthesizer};
pub use value::ScalarValue;
pub use wipe::{WipeReport, wipe_tables};
