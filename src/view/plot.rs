//! Single-plot projection
//!
//! Looks a plot up by name and converts its canonical record into display
//! units, with the deltas the plot card shows:
//!   - re-estimated vs expected (yield and harvest)
//!   - predicted range vs expected and vs re-estimated (yield and harvest)
//!   - midpoint of the predicted range vs re-estimated
//!
//! Plots without a prediction carry `prediction: None`, rendered as `NA`.

use crate::error::{EngineError, EngineResult};
use crate::metrics::delta::{percent_delta, range_delta, Delta, RangeDelta};
use crate::normalizer::{CanonicalPlotRecord, NormalizedDataset};
use crate::units::{self, UnitSelection};
use crate::utils::format::{fmt_smart, NOT_AVAILABLE};
use crate::view::area_text;
use serde::Serialize;

/// Predicted values of a plot, in display units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub yield_min: f64,
    pub yield_max: f64,
    pub yield_average: f64,
    pub harvest_min: f64,
    pub harvest_max: f64,
    pub harvest_average: f64,

    pub yield_vs_expected: RangeDelta,
    pub yield_vs_reestimated: RangeDelta,
    pub yield_average_vs_reestimated: Delta,
    pub harvest_vs_expected: RangeDelta,
    pub harvest_vs_reestimated: RangeDelta,
    pub harvest_average_vs_reestimated: Delta,
}

/// One plot in display units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotView {
    pub name: String,
    pub has_prediction: bool,

    /// Audited area as entered (selected area unit)
    pub audited_area: f64,
    pub audited_area_ha: f64,
    /// `"4.05 Ha"` or `"4.05 Ha / 10.00 Acres"`
    pub audited_area_text: String,

    pub expected_yield: f64,
    pub reestimated_yield: f64,
    pub expected_harvest: f64,
    pub reestimated_harvest: f64,
    pub reestimated_vs_expected_yield: Delta,
    pub reestimated_vs_expected_harvest: Delta,

    pub prediction: Option<PredictionView>,
}

impl PlotView {
    pub fn from_record(record: &CanonicalPlotRecord, units: &UnitSelection) -> Self {
        let to_yield = |t_ha: f64| units::convert_yield(t_ha, units.yield_unit);
        let to_harvest = |t: f64| units::convert_harvest(t, units.harvest);

        // Deltas use canonical values; percentages are unit-free
        let prediction = match (record.predicted_yield_range(), record.predicted_harvest_range()) {
            (Some((yield_min, yield_max)), Some((harvest_min, harvest_max))) if record.has_prediction => {
                let yield_average = (yield_min + yield_max) / 2.0;
                let harvest_average = (harvest_min + harvest_max) / 2.0;

                Some(PredictionView {
                    yield_min: to_yield(yield_min),
                    yield_max: to_yield(yield_max),
                    yield_average: to_yield(yield_average),
                    harvest_min: to_harvest(harvest_min),
                    harvest_max: to_harvest(harvest_max),
                    harvest_average: to_harvest(harvest_average),
                    yield_vs_expected: range_delta(yield_min, yield_max, record.expected_yield),
                    yield_vs_reestimated: range_delta(yield_min, yield_max, record.reestimated_yield),
                    yield_average_vs_reestimated: percent_delta(yield_average, record.reestimated_yield),
                    harvest_vs_expected: range_delta(harvest_min, harvest_max, record.expected_harvest),
                    harvest_vs_reestimated: range_delta(harvest_min, harvest_max, record.reestimated_harvest),
                    harvest_average_vs_reestimated: percent_delta(harvest_average, record.reestimated_harvest),
                })
            }
            _ => None,
        };

        PlotView {
            name: record.name.clone(),
            has_prediction: prediction.is_some(),
            audited_area: record.audited_area,
            audited_area_ha: record.audited_area_ha,
            audited_area_text: area_text(record.audited_area_ha, units.area),
            expected_yield: to_yield(record.expected_yield),
            reestimated_yield: to_yield(record.reestimated_yield),
            expected_harvest: to_harvest(record.expected_harvest),
            reestimated_harvest: to_harvest(record.reestimated_harvest),
            reestimated_vs_expected_yield: percent_delta(record.reestimated_yield, record.expected_yield),
            reestimated_vs_expected_harvest: percent_delta(record.reestimated_harvest, record.expected_harvest),
            prediction,
        }
    }

    /// `"min - max"` predicted yield, or `NA`
    pub fn predicted_yield_text(&self) -> String {
        match &self.prediction {
            Some(p) => format!("{} - {}", fmt_smart(p.yield_min), fmt_smart(p.yield_max)),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    /// `"min - max"` predicted harvest, or `NA`
    pub fn predicted_harvest_text(&self) -> String {
        match &self.prediction {
            Some(p) => format!("{} - {}", fmt_smart(p.harvest_min), fmt_smart(p.harvest_max)),
            None => NOT_AVAILABLE.to_string(),
        }
    }
}

/// Project the first record named `name` (ingest order)
pub fn plot_view(dataset: &NormalizedDataset, name: &str, units: &UnitSelection) -> EngineResult<PlotView> {
    dataset
        .find(name)
        .map(|record| PlotView::from_record(record, units))
        .ok_or_else(|| EngineError::PlotNotFound(name.to_string()))
}
