//! Aggregation metrics
//!
//! - `farm_aggregate`: area-weighted farm-level statistics
//! - `delta`: percentage change against a baseline, used by every view

pub mod delta;
pub mod farm_aggregate;

// Re-export metric functions
pub use delta::{percent_delta, range_delta, Delta, Direction, RangeDelta};
pub use farm_aggregate::{aggregate, AggregateDeltas, AggregateYields, FarmAggregate, FarmTotals};
