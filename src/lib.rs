//! Farm Yield Aggregator
//!
//! Aggregation, unit-conversion and delta engine for per-plot agricultural
//! records (expected / re-estimated values, AI-predicted ranges, audited area).
//!
//! Layout:
//! - `units`: mass / area / yield conversion tables
//! - `data`: raw spreadsheet rows, CSV (Polars) and JSON loaders
//! - `utils/`: tolerant field extraction, display rounding
//! - `normalizer`: raw rows → canonical records, partitioned by prediction
//! - `metrics/`: farm aggregate and percentage deltas
//! - `view/`: plot card, paginated table, summary, export
//! - `session`: explicit per-user context re-running the pipeline on change
//! - `generation`: batched fetch of plot data from the farm-management API
//! - `config`: JSON engine configuration

pub mod config;
pub mod data;
pub mod error;
pub mod generation;
pub mod metrics;
pub mod normalizer;
pub mod session;
pub mod units;
pub mod utils;
pub mod view;

// Re-export commonly used types
pub use config::EngineConfig;
pub use data::{load_csv_rows, rows_from_json, RawRow, Scalar};
pub use error::{EngineError, EngineResult};
pub use generation::{generate_rows, GeneratedDataset, GenerationOptions, GenerationProgress, PlotFetcher, PlotRef};
pub use metrics::*;
pub use normalizer::{normalize_rows, CanonicalPlotRecord, IngestContext, NormalizedDataset, Partition};
pub use session::AggregationSession;
pub use units::{AreaUnit, HarvestUnit, MassUnit, SourceUnits, UnitSelection, YieldUnit};
