//! Batched Plot Data Generation
//!
//! Builds spreadsheet-shaped rows from the external farm-management API instead
//! of an uploaded file. For every plot two requests are needed (plot details
//! and yield prediction); they run concurrently, and plots are processed in
//! fixed-size batches so the API never sees more than `batch_size` plots in
//! flight.
//!
//! Failure model:
//!   - a failed or panicked fetch drops that plot only (logged at warn)
//!   - progress (completed/total) is reported once per batch
//!   - surviving rows keep the input order
//!
//! Post-processing:
//!   - acre preference → audited area × 2.47105
//!   - area > 0 → expected / re-estimated yield recomputed as harvest / area
//!   - missing predictions are written as the text `NA`, which the normalizer
//!     reads as absent and routes to the no-prediction partition

use crate::data::{RawRow, Scalar};
use crate::error::{EngineError, EngineResult};
use crate::normalizer::IngestContext;
use crate::units::{self, AreaUnit, HarvestUnit, MassUnit, SourceUnits, YieldUnit};
use crate::utils::field_extractor::scalar_to_number;
use crate::utils::format::NOT_AVAILABLE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;

pub const DEFAULT_BATCH_SIZE: usize = 5;

/// A plot to fetch: display name plus API identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotRef {
    pub name: String,
    pub ca_id: String,
}

impl PlotRef {
    pub fn new(name: impl Into<String>, ca_id: impl Into<String>) -> Self {
        Self { name: name.into(), ca_id: ca_id.into() }
    }
}

/// Plot details as returned by the API (hectares, API harvest unit)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CaDetails {
    pub audited_area: f64,
    pub expected_quantity: f64,
    pub reestimated_value: f64,
    pub expected_yield: f64,
}

/// Lenient number from a JSON value; `None` for anything non-numeric
fn json_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(|v| scalar_to_number(&Scalar::from(v)))
}

/// Non-zero number, falling back like `a || b`
fn non_zero(value: Option<&Value>) -> Option<f64> {
    json_number(value).filter(|n| *n != 0.0)
}

impl CaDetails {
    /// Read a details payload
    ///
    /// `auditedArea` is either a number or an object with a `count` field.
    pub fn from_payload(payload: &Value) -> Self {
        let area = payload.get("auditedArea");
        let audited_area = non_zero(area.and_then(|a| a.get("count")))
            .or_else(|| non_zero(area))
            .unwrap_or(0.0);

        CaDetails {
            audited_area,
            expected_quantity: non_zero(payload.get("expectedQuantity")).unwrap_or(0.0),
            reestimated_value: non_zero(payload.get("reestimatedValue")).unwrap_or(0.0),
            expected_yield: non_zero(payload.pointer("/data/expectedYield")).unwrap_or(0.0),
        }
    }
}

/// Prediction for one plot; `None` means "NA"
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YieldPrediction {
    pub production_min: Option<f64>,
    pub production_max: Option<f64>,
    pub production_avg: Option<f64>,
    pub yield_min: Option<f64>,
    pub yield_max: Option<f64>,
    pub yield_avg: Option<f64>,
}

impl YieldPrediction {
    /// Read a prediction payload
    ///
    /// Parameters live in `records[0].parameters` or at top-level `parameters`.
    /// Zero and unparseable values both become NA.
    pub fn from_payload(payload: &Value) -> Self {
        let first_record = payload
            .get("records")
            .and_then(Value::as_array)
            .and_then(|records| records.first());

        let params = match first_record {
            Some(record) => record.get("parameters"),
            None => payload.get("parameters"),
        };
        let param = |key: &str| non_zero(params.and_then(|p| p.get(key)));

        YieldPrediction {
            production_min: param("productionMin"),
            production_max: param("productionMax"),
            production_avg: param("productionAvg"),
            yield_min: param("yieldMin"),
            yield_max: param("yieldMax"),
            yield_avg: param("yieldAvg"),
        }
    }
}

/// Source of per-plot API data
///
/// Implementations own transport, authentication and timeouts.
pub trait PlotFetcher: Send + Sync + 'static {
    fn fetch_details(&self, ca_id: &str) -> impl Future<Output = anyhow::Result<CaDetails>> + Send;

    fn fetch_prediction(&self, ca_id: &str) -> impl Future<Output = anyhow::Result<YieldPrediction>> + Send;
}

/// Reported after every batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationProgress {
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    pub batch_size: usize,
    /// Unit the audited area is written in
    pub area_unit: AreaUnit,
    /// Mass unit the API reports harvests in
    pub api_harvest_unit: HarvestUnit,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            area_unit: AreaUnit::Hectare,
            api_harvest_unit: MassUnit::Tonne,
        }
    }
}

impl GenerationOptions {
    /// Area unit from a free-text user preference ("Acres", "hectare", ...)
    pub fn area_unit_from_preference(preference: &str) -> AreaUnit {
        if preference.to_lowercase().contains("acre") {
            AreaUnit::Acre
        } else {
            AreaUnit::Hectare
        }
    }

    /// Units the generated expected / re-estimated values end up in
    pub fn source_units(&self) -> SourceUnits {
        SourceUnits {
            harvest: self.api_harvest_unit,
            yield_unit: YieldUnit::new(self.api_harvest_unit, self.area_unit),
        }
    }
}

/// Rows built from the API, ready for ingest
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDataset {
    pub rows: Vec<RawRow>,
    pub total: usize,
    pub succeeded: usize,
    pub area_unit: AreaUnit,
    pub source_units: SourceUnits,
}

impl GeneratedDataset {
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    pub fn ingest_context(&self) -> IngestContext {
        IngestContext { area_unit: self.area_unit, source: self.source_units }
    }
}

fn predicted_cell(value: Option<f64>) -> Scalar {
    match value {
        Some(v) => Scalar::Number(v),
        None => Scalar::Text(NOT_AVAILABLE.to_string()),
    }
}

/// Spreadsheet-shaped row for one plot, post-processed for `area_unit`
pub fn build_row(plot: &PlotRef, details: &CaDetails, prediction: &YieldPrediction, area_unit: AreaUnit) -> RawRow {
    let area = units::hectares_to_area(details.audited_area, area_unit);

    let (expected_yield, reestimated_yield) = if area > 0.0 {
        (details.expected_quantity / area, details.reestimated_value / area)
    } else {
        (details.expected_yield, 0.0)
    };

    RawRow::new()
        .with("CA Name", plot.name.as_str())
        .with("CA ID", plot.ca_id.as_str())
        .with("Audited Area", area)
        .with("Expected Harvest", details.expected_quantity)
        .with("Re-estimated Harvest", details.reestimated_value)
        .with("Expected YIELD", expected_yield)
        .with("Re-estimated Yield", reestimated_yield)
        .with("Harvest Min predicted", predicted_cell(prediction.production_min))
        .with("Harvest Max predicted", predicted_cell(prediction.production_max))
        .with("Harvest Average predicted", predicted_cell(prediction.production_avg))
        .with("Yield Min predicted", predicted_cell(prediction.yield_min))
        .with("Yield Max predicted", predicted_cell(prediction.yield_max))
        .with("Yield Average predicted", predicted_cell(prediction.yield_avg))
}

async fn fetch_plot<F: PlotFetcher>(fetcher: &F, plot: &PlotRef, area_unit: AreaUnit) -> anyhow::Result<RawRow> {
    let (details, prediction) = tokio::try_join!(
        fetcher.fetch_details(&plot.ca_id),
        fetcher.fetch_prediction(&plot.ca_id)
    )?;
    Ok(build_row(plot, &details, &prediction, area_unit))
}

/// Fetch every plot in batches and build rows in input order
pub async fn generate_rows<F, P>(
    fetcher: Arc<F>,
    plots: &[PlotRef],
    options: &GenerationOptions,
    mut on_progress: P,
) -> EngineResult<GeneratedDataset>
where
    F: PlotFetcher,
    P: FnMut(GenerationProgress),
{
    if options.batch_size == 0 {
        return Err(EngineError::InvalidBatchSize);
    }

    let total = plots.len();
    let area_unit = options.area_unit;
    let mut slots: Vec<Option<RawRow>> = vec![None; total];
    let mut completed = 0;
    let mut succeeded = 0;

    tracing::info!("Generating data for {} plots (batch size {})", total, options.batch_size);

    for (batch_index, batch) in plots.chunks(options.batch_size).enumerate() {
        let offset = batch_index * options.batch_size;
        let mut set = JoinSet::new();

        for (i, plot) in batch.iter().enumerate() {
            let fetcher = Arc::clone(&fetcher);
            let plot = plot.clone();
            set.spawn(async move {
                let result = fetch_plot(fetcher.as_ref(), &plot, area_unit).await;
                (offset + i, plot, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, _, Ok(row))) => {
                    slots[index] = Some(row);
                    succeeded += 1;
                }
                Ok((_, plot, Err(e))) => {
                    tracing::warn!("Dropping plot '{}' (CA {}): {:#}", plot.name, plot.ca_id, e);
                }
                Err(e) => {
                    tracing::warn!("Plot fetch task failed: {}", e);
                }
            }
        }

        completed += batch.len();
        tracing::debug!("Generation progress {}/{}", completed, total);
        on_progress(GenerationProgress { completed, total, succeeded });
    }

    let rows: Vec<RawRow> = slots.into_iter().flatten().collect();

    tracing::info!("Generated {} of {} plots", succeeded, total);

    Ok(GeneratedDataset {
        rows,
        total,
        succeeded,
        area_unit,
        source_units: options.source_units(),
    })
}
