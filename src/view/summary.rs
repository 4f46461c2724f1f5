//! Farm summary rendering
//!
//! String form of the farm aggregate: values via `fmt_smart`, deltas via their
//! `Display`. Without an aggregate (no plot has a prediction) every field is
//! the placeholder.

use crate::metrics::farm_aggregate::FarmAggregate;
use crate::units::UnitSelection;
use crate::utils::format::{fmt_optional, fmt_smart, PLACEHOLDER};
use crate::view::area_text;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateDisplay {
    pub harvest_unit: String,
    pub yield_unit: String,

    pub plot_count: String,
    pub total_area: String,

    pub expected_harvest: String,
    pub reestimated_harvest: String,
    pub reestimated_vs_expected_harvest: String,
    pub predicted_harvest_min: String,
    pub predicted_harvest_max: String,
    pub predicted_harvest_vs_expected: String,
    pub predicted_harvest_vs_reestimated: String,

    pub expected_yield: String,
    pub reestimated_yield: String,
    pub reestimated_vs_expected_yield: String,
    pub predicted_yield_min: String,
    pub predicted_yield_max: String,
    pub predicted_yield_vs_expected: String,
    pub predicted_yield_vs_reestimated: String,
    pub predicted_average_vs_reestimated: String,
}

impl AggregateDisplay {
    pub fn new(aggregate: Option<&FarmAggregate>, units: &UnitSelection) -> Self {
        match aggregate {
            Some(agg) => Self::from_aggregate(agg),
            None => Self::placeholder(units),
        }
    }

    fn from_aggregate(agg: &FarmAggregate) -> Self {
        let deltas = &agg.deltas;
        AggregateDisplay {
            harvest_unit: agg.units.harvest.label().to_string(),
            yield_unit: agg.units.yield_unit.label(),
            plot_count: agg.plot_count.to_string(),
            total_area: area_text(agg.total_area_ha, agg.units.area),
            expected_harvest: fmt_smart(agg.expected_harvest),
            reestimated_harvest: fmt_smart(agg.reestimated_harvest),
            reestimated_vs_expected_harvest: deltas.reestimated_vs_expected_harvest.to_string(),
            predicted_harvest_min: fmt_smart(agg.predicted_harvest_min),
            predicted_harvest_max: fmt_smart(agg.predicted_harvest_max),
            predicted_harvest_vs_expected: deltas.predicted_harvest_vs_expected.to_string(),
            predicted_harvest_vs_reestimated: deltas.predicted_harvest_vs_reestimated.to_string(),
            expected_yield: fmt_optional(agg.expected_yield),
            reestimated_yield: fmt_optional(agg.reestimated_yield),
            reestimated_vs_expected_yield: deltas.reestimated_vs_expected_yield.to_string(),
            predicted_yield_min: fmt_optional(agg.predicted_yield_min),
            predicted_yield_max: fmt_optional(agg.predicted_yield_max),
            predicted_yield_vs_expected: deltas.predicted_yield_vs_expected.to_string(),
            predicted_yield_vs_reestimated: deltas.predicted_yield_vs_reestimated.to_string(),
            predicted_average_vs_reestimated: deltas.predicted_average_vs_reestimated.to_string(),
        }
    }

    fn placeholder(units: &UnitSelection) -> Self {
        let dash = || PLACEHOLDER.to_string();
        AggregateDisplay {
            harvest_unit: units.harvest.label().to_string(),
            yield_unit: units.yield_unit.label(),
            plot_count: dash(),
            total_area: dash(),
            expected_harvest: dash(),
            reestimated_harvest: dash(),
            reestimated_vs_expected_harvest: dash(),
            predicted_harvest_min: dash(),
            predicted_harvest_max: dash(),
            predicted_harvest_vs_expected: dash(),
            predicted_harvest_vs_reestimated: dash(),
            expected_yield: dash(),
            reestimated_yield: dash(),
            reestimated_vs_expected_yield: dash(),
            predicted_yield_min: dash(),
            predicted_yield_max: dash(),
            predicted_yield_vs_expected: dash(),
            predicted_yield_vs_reestimated: dash(),
            predicted_average_vs_reestimated: dash(),
        }
    }
}
