//! Error handling for snapfolio
//!
//! Defines the domain error type and establishes a unified Result type
//! using anyhow for context chaining and error propagation.
//!
//! Analytics never fail on expected conditions (missing rates, short
//! histories, zero denominators); those surface as `None` results. The
//! errors here cover loading, configuration and lookups.

use thiserror::Error;

/// Core error types for portfolio operations
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("load error: {0}")]
    LoadError(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for portfolio operations
pub type Result<T> = anyhow::Result<T>;
