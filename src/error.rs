//! Engine Errors
//!
//! Typed failures for the few conditions the engine refuses to degrade on.
//! Noisy spreadsheet data never produces an error: missing numbers resolve to 0
//! and unnamed rows are skipped. Only configuration mistakes and lookups of
//! plots that do not exist surface here.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Unit key not present in the conversion tables
    #[error("unknown {kind} unit '{key}'")]
    UnknownUnit { kind: &'static str, key: String },

    /// Single-plot lookup for a name that was never ingested
    #[error("plot '{0}' not found")]
    PlotNotFound(String),

    #[error("unknown sort key '{0}'")]
    UnknownSortKey(String),

    /// Table pagination requires at least one row per page
    #[error("page size must be at least 1")]
    InvalidPageSize,

    /// Generation requires at least one plot per batch
    #[error("fetch batch size must be at least 1")]
    InvalidBatchSize,
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
