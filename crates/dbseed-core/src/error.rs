use thiserror::Error;

/// Core error type shared across dbseed crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error or adapter failure.
    #[error("database error: {0}")]
    Db(String),
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A foreign key names a table or column the schema facts do not know.
    #[error("unresolved schema reference: {0}")]
    SchemaResolution(String),
    /// The foreign-key graph contains a cycle among distinct tables.
    #[error("dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    /// A requested feature is not supported.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Convenience alias for results returned by dbseed crates.
pub type Result<T> = std::result::Result<T, Error>;
