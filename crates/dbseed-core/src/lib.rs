//! Core contracts for dbseed.
//!
//! This crate defines the table descriptors consumed by the seeding engine,
//! the foreign-key dependency graph and its topological sequencer, and the
//! shared error type.

pub mod error;
pub mod graph;
pub mod redaction;
pub mod schema;

pub use error::{Error, Result};
pub use graph::{DependencyGraph, build_dependency_graph, seeding_order};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use schema::{Column, ForeignKeyRef, Table, quote_ident};
