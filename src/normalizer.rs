//! Record Normalizer
//!
//! Converts raw spreadsheet rows into canonical plot records and partitions
//! them by whether an AI prediction exists.
//!
//! Canonical units:
//!   - harvest: tonnes
//!   - yield: tonnes per hectare
//!   - audited area: kept as entered, plus a hectare copy for weighting
//!
//! Rules per row:
//!   1. No "ca name" value → row dropped (not counted anywhere)
//!   2. All four predicted fields 0/absent → no-prediction record
//!   3. Otherwise → has-prediction record
//!
//! Rows are independent, so the pass runs on a Rayon parallel iterator.
//! `collect` keeps input order, making the result identical to a sequential pass.

use crate::data::{RawRow, Scalar};
use crate::units::{self, AreaUnit, SourceUnits};
use crate::utils::field_extractor::{candidates, extract_numeric, extract_text, scalar_to_number};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Which side of the prediction split a record falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    #[default]
    WithPrediction,
    WithoutPrediction,
}

/// One plot, in canonical units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalPlotRecord {
    pub name: String,
    /// Audited area as entered (ingest-time area unit)
    pub audited_area: f64,
    /// Same reading in hectares, used as the aggregation weight
    pub audited_area_ha: f64,

    pub expected_yield: f64,
    pub reestimated_yield: f64,
    pub expected_harvest: f64,
    pub reestimated_harvest: f64,

    pub predicted_yield_min: Option<f64>,
    pub predicted_yield_max: Option<f64>,
    pub predicted_harvest_min: Option<f64>,
    pub predicted_harvest_max: Option<f64>,

    pub has_prediction: bool,
}

impl CanonicalPlotRecord {
    pub fn partition(&self) -> Partition {
        if self.has_prediction {
            Partition::WithPrediction
        } else {
            Partition::WithoutPrediction
        }
    }

    /// (min, max) predicted yield in tonnes/hectare
    pub fn predicted_yield_range(&self) -> Option<(f64, f64)> {
        Some((self.predicted_yield_min?, self.predicted_yield_max?))
    }

    /// (min, max) predicted harvest in tonnes
    pub fn predicted_harvest_range(&self) -> Option<(f64, f64)> {
        Some((self.predicted_harvest_min?, self.predicted_harvest_max?))
    }
}

/// Units in effect while a pass runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestContext {
    /// Unit the audited-area column is read in
    pub area_unit: AreaUnit,
    /// Unit the expected / re-estimated columns are read in
    pub source: SourceUnits,
}

/// Output of one normalization pass
#[derive(Debug, Clone, Default)]
pub struct NormalizedDataset {
    /// Every named row, in input order
    pub records: Vec<CanonicalPlotRecord>,
    /// Plot names with a prediction, in input order
    pub with_prediction: Vec<String>,
    /// Plot names without a prediction, in input order
    pub without_prediction: Vec<String>,
    /// Rows dropped for lacking a plot name
    pub skipped_rows: usize,
    index: FxHashMap<String, usize>,
}

impl NormalizedDataset {
    fn from_records(records: Vec<CanonicalPlotRecord>, skipped_rows: usize) -> Self {
        let mut with_prediction = Vec::new();
        let mut without_prediction = Vec::new();
        let mut index = FxHashMap::default();

        for (position, record) in records.iter().enumerate() {
            match record.partition() {
                Partition::WithPrediction => with_prediction.push(record.name.clone()),
                Partition::WithoutPrediction => without_prediction.push(record.name.clone()),
            }
            // First occurrence wins for duplicate names
            index.entry(record.name.clone()).or_insert(position);
        }

        Self { records, with_prediction, without_prediction, skipped_rows, index }
    }

    /// Records of one partition, in input order
    pub fn partition(&self, partition: Partition) -> impl Iterator<Item = &CanonicalPlotRecord> {
        self.records.iter().filter(move |r| r.partition() == partition)
    }

    /// Plot names of one partition, in input order
    pub fn names(&self, partition: Partition) -> &[String] {
        match partition {
            Partition::WithPrediction => &self.with_prediction,
            Partition::WithoutPrediction => &self.without_prediction,
        }
    }

    /// Look up a record by plot name
    pub fn find(&self, name: &str) -> Option<&CanonicalPlotRecord> {
        self.index.get(name).map(|&position| &self.records[position])
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Plot name of a row, if it has a non-blank one
fn plot_name(row: &RawRow) -> Option<String> {
    let value = extract_text(row, candidates::PLOT_NAME);
    if value.is_blank() {
        return None;
    }
    Some(value.to_string())
}

/// Normalize a single row; `None` when the row has no plot name
pub fn normalize_row(row: &RawRow, ctx: &IngestContext) -> Option<CanonicalPlotRecord> {
    let name = plot_name(row)?;

    let yield_min = extract_numeric(row, candidates::PREDICTED_YIELD_MIN);
    let yield_max = extract_numeric(row, candidates::PREDICTED_YIELD_MAX);
    let harvest_min = extract_numeric(row, candidates::PREDICTED_HARVEST_MIN);
    let harvest_max = extract_numeric(row, candidates::PREDICTED_HARVEST_MAX);

    // Negative readings are treated like malformed ones
    let audited_area = match extract_text(row, candidates::AUDITED_AREA) {
        Scalar::Empty => 0.0,
        value => scalar_to_number(&value).unwrap_or(0.0).max(0.0),
    };

    let source = ctx.source;
    let expected_yield = units::yield_to_canonical(
        extract_numeric(row, candidates::EXPECTED_YIELD),
        source.yield_unit,
    );
    let reestimated_yield = units::yield_to_canonical(
        extract_numeric(row, candidates::REESTIMATED_YIELD),
        source.yield_unit,
    );
    let expected_harvest = units::harvest_to_canonical(
        extract_numeric(row, candidates::EXPECTED_HARVEST),
        source.harvest,
    );
    let reestimated_harvest = units::harvest_to_canonical(
        extract_numeric(row, candidates::REESTIMATED_HARVEST),
        source.harvest,
    );

    let has_prediction = [yield_min, yield_max, harvest_min, harvest_max]
        .iter()
        .any(|&v| v != 0.0);
    let predicted = |value: f64| has_prediction.then_some(value);

    Some(CanonicalPlotRecord {
        name,
        audited_area,
        audited_area_ha: units::area_to_hectares(audited_area, ctx.area_unit),
        expected_yield,
        reestimated_yield,
        expected_harvest,
        reestimated_harvest,
        predicted_yield_min: predicted(yield_min),
        predicted_yield_max: predicted(yield_max),
        predicted_harvest_min: predicted(harvest_min),
        predicted_harvest_max: predicted(harvest_max),
        has_prediction,
    })
}

/// Normalize every row and partition the result
pub fn normalize_rows(rows: &[RawRow], ctx: &IngestContext) -> NormalizedDataset {
    let normalized: Vec<Option<CanonicalPlotRecord>> = rows
        .par_iter()
        .map(|row| normalize_row(row, ctx))
        .collect();

    let skipped_rows = normalized.iter().filter(|r| r.is_none()).count();
    let records: Vec<CanonicalPlotRecord> = normalized.into_iter().flatten().collect();
    let dataset = NormalizedDataset::from_records(records, skipped_rows);

    tracing::debug!(
        "Normalized {} rows: {} with prediction, {} without, {} skipped (no plot name)",
        rows.len(),
        dataset.with_prediction.len(),
        dataset.without_prediction.len(),
        skipped_rows
    );

    dataset
}
