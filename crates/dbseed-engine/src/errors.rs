use thiserror::Error;

/// Errors emitted by the seeding engine.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Core(#[from] dbseed_core::Error),
}

pub type SeedResult<T> = std::result::Result<T, SeedError>;
