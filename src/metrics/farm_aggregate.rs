//! FARM AGGREGATE
//!
//! Farm-level statistics over every has-prediction plot.
//!
//! Two stages:
//!   1. `FarmTotals::fold`: single pass in canonical units (tonnes, hectares)
//!   2. `FarmTotals::to_display`: conversion into the selected display units
//!
//! Formulas (canonical):
//!   - harvests: plain sums
//!   - predicted yield min/max: Σ(yield_i × area_ha_i) / Σarea_ha_i
//!   - expected / re-estimated yield: Σharvest / Σarea_ha (ratio of sums)
//!
//! Weights are always hectares, whatever area unit is displayed. With zero
//! total area the yields are `None` while the sums stay valid.
//!
//! Deltas are computed on canonical values. A percentage is a ratio of two
//! values in the same unit, so it does not change with the unit selection.

use crate::metrics::delta::{percent_delta, range_delta, Delta, RangeDelta};
use crate::normalizer::CanonicalPlotRecord;
use crate::units::{self, UnitSelection};
use serde::Serialize;

/// Canonical running sums over has-prediction records
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FarmTotals {
    pub plot_count: usize,
    /// Σ audited area, hectares
    pub area_ha: f64,
    /// Σ harvests, tonnes
    pub expected_harvest: f64,
    pub reestimated_harvest: f64,
    pub predicted_harvest_min: f64,
    pub predicted_harvest_max: f64,
    /// Σ predicted yield × area_ha, tonnes
    pub weighted_yield_min: f64,
    pub weighted_yield_max: f64,
}

impl FarmTotals {
    /// Fold has-prediction records; others are ignored
    pub fn fold<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a CanonicalPlotRecord>,
    {
        records
            .into_iter()
            .filter(|r| r.has_prediction)
            .fold(Self::default(), |mut totals, record| {
                totals.add(record);
                totals
            })
    }

    fn add(&mut self, record: &CanonicalPlotRecord) {
        let area_ha = record.audited_area_ha;

        self.plot_count += 1;
        self.area_ha += area_ha;
        self.expected_harvest += record.expected_harvest;
        self.reestimated_harvest += record.reestimated_harvest;
        self.predicted_harvest_min += record.predicted_harvest_min.unwrap_or(0.0);
        self.predicted_harvest_max += record.predicted_harvest_max.unwrap_or(0.0);
        self.weighted_yield_min += record.predicted_yield_min.unwrap_or(0.0) * area_ha;
        self.weighted_yield_max += record.predicted_yield_max.unwrap_or(0.0) * area_ha;
    }

    /// Divide a tonne sum by the total area; `None` when there is no area
    fn per_hectare(&self, tonnes: f64) -> Option<f64> {
        (self.area_ha > 0.0).then(|| tonnes / self.area_ha)
    }

    /// Canonical (t/ha) aggregate yields
    pub fn yields(&self) -> AggregateYields {
        AggregateYields {
            expected: self.per_hectare(self.expected_harvest),
            reestimated: self.per_hectare(self.reestimated_harvest),
            predicted_min: self.per_hectare(self.weighted_yield_min),
            predicted_max: self.per_hectare(self.weighted_yield_max),
        }
    }

    /// Deltas from canonical values
    pub fn deltas(&self) -> AggregateDeltas {
        let yields = self.yields();
        let expected = self.expected_harvest;
        let reestimated = self.reestimated_harvest;
        let (harvest_min, harvest_max) = (self.predicted_harvest_min, self.predicted_harvest_max);

        AggregateDeltas {
            reestimated_vs_expected_harvest: percent_delta(reestimated, expected),
            predicted_harvest_vs_expected: range_delta(harvest_min, harvest_max, expected),
            predicted_harvest_vs_reestimated: range_delta(harvest_min, harvest_max, reestimated),
            reestimated_vs_expected_yield: optional_delta(yields.reestimated, yields.expected),
            predicted_yield_vs_expected: optional_range_delta(&yields, yields.expected),
            predicted_yield_vs_reestimated: optional_range_delta(&yields, yields.reestimated),
            predicted_average_vs_reestimated: optional_delta(yields.predicted_average(), yields.reestimated),
        }
    }

    /// Convert into display units
    pub fn to_display(&self, units: &UnitSelection) -> FarmAggregate {
        let harvest = |t: f64| units::convert_harvest(t, units.harvest);
        let yield_of = |v: Option<f64>| v.map(|t_ha| units::convert_yield(t_ha, units.yield_unit));
        let yields = self.yields();

        FarmAggregate {
            units: *units,
            plot_count: self.plot_count,
            total_area: units::hectares_to_area(self.area_ha, units.area),
            total_area_ha: self.area_ha,
            expected_harvest: harvest(self.expected_harvest),
            reestimated_harvest: harvest(self.reestimated_harvest),
            predicted_harvest_min: harvest(self.predicted_harvest_min),
            predicted_harvest_max: harvest(self.predicted_harvest_max),
            expected_yield: yield_of(yields.expected),
            reestimated_yield: yield_of(yields.reestimated),
            predicted_yield_min: yield_of(yields.predicted_min),
            predicted_yield_max: yield_of(yields.predicted_max),
            predicted_yield_average: yield_of(yields.predicted_average()),
            deltas: self.deltas(),
        }
    }
}

/// Aggregate yields in tonnes/hectare
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateYields {
    pub expected: Option<f64>,
    pub reestimated: Option<f64>,
    pub predicted_min: Option<f64>,
    pub predicted_max: Option<f64>,
}

impl AggregateYields {
    /// Midpoint of the predicted range
    pub fn predicted_average(&self) -> Option<f64> {
        Some((self.predicted_min? + self.predicted_max?) / 2.0)
    }
}

fn optional_delta(current: Option<f64>, baseline: Option<f64>) -> Delta {
    match (current, baseline) {
        (Some(current), Some(baseline)) => percent_delta(current, baseline),
        _ => Delta::Undefined,
    }
}

fn optional_range_delta(yields: &AggregateYields, baseline: Option<f64>) -> RangeDelta {
    RangeDelta {
        min: optional_delta(yields.predicted_min, baseline),
        max: optional_delta(yields.predicted_max, baseline),
    }
}

/// Every aggregate comparison the summary shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateDeltas {
    pub reestimated_vs_expected_harvest: Delta,
    pub predicted_harvest_vs_expected: RangeDelta,
    pub predicted_harvest_vs_reestimated: RangeDelta,
    pub reestimated_vs_expected_yield: Delta,
    pub predicted_yield_vs_expected: RangeDelta,
    pub predicted_yield_vs_reestimated: RangeDelta,
    pub predicted_average_vs_reestimated: Delta,
}

/// Farm-level statistics in display units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmAggregate {
    pub units: UnitSelection,
    pub plot_count: usize,
    /// Total audited area in the selected area unit
    pub total_area: f64,
    pub total_area_ha: f64,

    pub expected_harvest: f64,
    pub reestimated_harvest: f64,
    pub predicted_harvest_min: f64,
    pub predicted_harvest_max: f64,

    /// `None` when the total area is zero
    pub expected_yield: Option<f64>,
    pub reestimated_yield: Option<f64>,
    pub predicted_yield_min: Option<f64>,
    pub predicted_yield_max: Option<f64>,
    pub predicted_yield_average: Option<f64>,

    pub deltas: AggregateDeltas,
}

/// Aggregate the has-prediction records; `None` when there are none
pub fn aggregate<'a, I>(records: I, units: &UnitSelection) -> Option<FarmAggregate>
where
    I: IntoIterator<Item = &'a CanonicalPlotRecord>,
{
    let totals = FarmTotals::fold(records);
    if totals.plot_count == 0 {
        return None;
    }
    Some(totals.to_display(units))
}
