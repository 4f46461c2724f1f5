//! Aggregation Session
//!
//! Explicit context object holding everything one user works with: the loaded
//! raw rows, the unit selection, the normalized dataset, the farm aggregate and
//! the table state. Every mutation goes through `&mut self` (last writer wins).
//!
//! Loading rows or changing any unit re-runs normalizer + aggregator over the
//! rows already held; the source file is never parsed again.

use crate::config::EngineConfig;
use crate::data::RawRow;
use crate::error::EngineResult;
use crate::generation::GeneratedDataset;
use crate::metrics::farm_aggregate::{aggregate, FarmAggregate};
use crate::normalizer::{normalize_rows, IngestContext, NormalizedDataset, Partition};
use crate::units::{AreaUnit, HarvestUnit, SourceUnits, UnitSelection, YieldUnit};
use crate::view::{
    build_export, plot_view, AggregateDisplay, ExportScope, ExportTable, PlotView, TablePage, TableState,
};

pub struct AggregationSession {
    units: UnitSelection,
    source_units: SourceUnits,
    /// Units of the held rows when they came from the API; cleared by an upload
    generated_units: Option<SourceUnits>,
    rows: Vec<RawRow>,
    dataset: NormalizedDataset,
    aggregate: Option<FarmAggregate>,
    table: TableState,
}

impl AggregationSession {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        Ok(Self {
            units: config.units,
            source_units: config.source_units,
            generated_units: None,
            rows: Vec::new(),
            dataset: NormalizedDataset::default(),
            aggregate: None,
            table: TableState::new(config.page_size)?,
        })
    }

    pub fn units(&self) -> &UnitSelection {
        &self.units
    }

    /// Entry units of the rows currently held
    pub fn source_units(&self) -> &SourceUnits {
        self.generated_units.as_ref().unwrap_or(&self.source_units)
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn dataset(&self) -> &NormalizedDataset {
        &self.dataset
    }

    /// `None` when no plot has a prediction
    pub fn aggregate(&self) -> Option<&FarmAggregate> {
        self.aggregate.as_ref()
    }

    /// Replace the record set (spreadsheet upload)
    pub fn load_rows(&mut self, rows: Vec<RawRow>) {
        self.generated_units = None;
        self.replace_rows(rows);
    }

    fn replace_rows(&mut self, rows: Vec<RawRow>) {
        tracing::info!("Loading {} rows", rows.len());
        self.rows = rows;
        self.table.go_to_page(1);
        self.recompute();
    }

    /// Replace the record set with API-generated rows and adopt their units
    pub fn load_generated(&mut self, generated: GeneratedDataset) {
        tracing::info!(
            "Loading {} generated rows ({} of {} plots fetched, area unit {})",
            generated.rows.len(),
            generated.succeeded,
            generated.total,
            generated.area_unit
        );
        self.units.area = generated.area_unit;
        self.generated_units = Some(generated.source_units);
        self.replace_rows(generated.rows);
    }

    pub fn set_units(&mut self, units: UnitSelection) {
        if units == self.units {
            return;
        }
        tracing::info!(
            "Units changed: area {} -> {}, yield {} -> {}, harvest {} -> {}",
            self.units.area,
            units.area,
            self.units.yield_unit,
            units.yield_unit,
            self.units.harvest,
            units.harvest
        );
        self.units = units;
        self.recompute();
    }

    /// Select units by key (`"acre"`, `"kgs_acre"`, `"kgs"`)
    pub fn select_units(&mut self, area: &str, yield_unit: &str, harvest: &str) -> EngineResult<()> {
        let units = UnitSelection::parse(area, yield_unit, harvest)?;
        self.set_units(units);
        Ok(())
    }

    pub fn set_area_unit(&mut self, area: AreaUnit) {
        self.set_units(UnitSelection { area, ..self.units });
    }

    pub fn set_yield_unit(&mut self, yield_unit: YieldUnit) {
        self.set_units(UnitSelection { yield_unit, ..self.units });
    }

    pub fn set_harvest_unit(&mut self, harvest: HarvestUnit) {
        self.set_units(UnitSelection { harvest, ..self.units });
    }

    /// Entry units for spreadsheet uploads; also applied to the rows held now
    pub fn set_source_units(&mut self, source_units: SourceUnits) {
        self.source_units = source_units;
        self.generated_units = None;
        self.recompute();
    }

    fn ingest_context(&self) -> IngestContext {
        IngestContext { area_unit: self.units.area, source: *self.source_units() }
    }

    fn recompute(&mut self) {
        self.dataset = normalize_rows(&self.rows, &self.ingest_context());
        self.aggregate = aggregate(&self.dataset.records, &self.units);

        tracing::info!(
            "Ingested {} plots ({} with prediction, {} without)",
            self.dataset.records.len(),
            self.dataset.with_prediction.len(),
            self.dataset.without_prediction.len()
        );
    }

    pub fn aggregate_display(&self) -> AggregateDisplay {
        AggregateDisplay::new(self.aggregate.as_ref(), &self.units)
    }

    pub fn plot(&self, name: &str) -> EngineResult<PlotView> {
        plot_view(&self.dataset, name, &self.units)
    }

    /// Plot names of the active partition containing `query` (case-insensitive)
    pub fn search_plots(&self, query: &str) -> Vec<&str> {
        let needle = query.trim().to_lowercase();
        self.dataset
            .names(self.table.partition())
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    pub fn active_partition(&self) -> Partition {
        self.table.partition()
    }

    pub fn set_partition(&mut self, partition: Partition) {
        self.table.set_partition(partition);
    }

    pub fn table_state(&self) -> &TableState {
        &self.table
    }

    /// Query, sort and pagination controls
    pub fn table_mut(&mut self) -> &mut TableState {
        &mut self.table
    }

    pub fn table_page(&mut self) -> TablePage {
        self.table.render(&self.dataset, &self.units)
    }

    pub fn export(&self, scope: ExportScope) -> ExportTable {
        build_export(&self.dataset, &self.units, scope)
    }

    pub fn export_active_partition(&self) -> ExportTable {
        self.export(ExportScope::Partition(self.table.partition()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::MassUnit;

    fn rows() -> Vec<RawRow> {
        vec![
            RawRow::new()
                .with("CA Name", "North Field")
                .with("Audited Area", 10.0)
                .with("Expected Harvest", 100.0)
                .with("Yield Min predicted", 2.0)
                .with("Yield Max predicted", 3.0),
            RawRow::new()
                .with("CA Name", "South Field")
                .with("Audited Area", 20.0)
                .with("Expected Harvest", 150.0)
                .with("Yield Min predicted", 3.0)
                .with("Yield Max predicted", 4.0),
            RawRow::new().with("CA Name", "Plot A").with("Audited Area", 5.0),
        ]
    }

    #[test]
    fn test_load_and_search() {
        let mut session = AggregationSession::new(&EngineConfig::default()).unwrap();
        session.load_rows(rows());

        assert_eq!(session.dataset().records.len(), 3);
        assert_eq!(session.search_plots("field"), vec!["North Field", "South Field"]);
        assert_eq!(session.search_plots("SOUTH"), vec!["South Field"]);

        session.set_partition(Partition::WithoutPrediction);
        assert_eq!(session.search_plots(""), vec!["Plot A"]);
    }

    #[test]
    fn test_unit_change_recomputes() {
        let mut session = AggregationSession::new(&EngineConfig::default()).unwrap();
        session.load_rows(rows());
        assert_eq!(session.aggregate().unwrap().expected_harvest, 250_000.0);

        session.set_harvest_unit(MassUnit::Tonne);
        assert_eq!(session.aggregate().unwrap().expected_harvest, 250.0);

        assert!(session.select_units("ha", "ton_ha", "bushel").is_err());
        assert_eq!(session.units().harvest, MassUnit::Tonne);
    }

    #[test]
    fn test_empty_session() {
        let session = AggregationSession::new(&EngineConfig::default()).unwrap();
        assert!(session.aggregate().is_none());
        assert_eq!(session.aggregate_display().expected_harvest, "-");
        assert!(session.export(ExportScope::All).is_empty());
    }
}
