// Session Integration Tests
//
// Purpose: End-to-end checks of ingest → normalize → aggregate → views through
// the public session API.
// Run with: cargo test --test session_integration_tests

use approx::assert_relative_eq;
use yield_aggregator_rust::view::{ExportCell, ExportScope, SortKey, SortOrder};
use yield_aggregator_rust::{
    rows_from_json, AggregationSession, AreaUnit, EngineConfig, EngineError, MassUnit, Partition, RawRow,
    UnitSelection, YieldUnit,
};

fn metric_config() -> EngineConfig {
    EngineConfig {
        units: UnitSelection {
            area: AreaUnit::Hectare,
            yield_unit: YieldUnit::TONNES_PER_HECTARE,
            harvest: MassUnit::Tonne,
        },
        ..Default::default()
    }
}

fn session_with(rows: Vec<RawRow>, config: &EngineConfig) -> AggregationSession {
    let mut session = AggregationSession::new(config).unwrap();
    session.load_rows(rows);
    session
}

fn farm_rows() -> Vec<RawRow> {
    vec![
        RawRow::new()
            .with("CA Name", "North")
            .with("Audited Area", 10.0)
            .with("Expected Harvest", 100.0)
            .with("Re-estimated Harvest", 120.0)
            .with("Yield Min predicted", 2.0)
            .with("Yield Max predicted", 4.0)
            .with("Harvest Min predicted", 20.0)
            .with("Harvest Max predicted", 40.0),
        RawRow::new()
            .with("CA Name", "South")
            .with("Audited Area", 20.0)
            .with("Expected Harvest", 150.0)
            .with("Re-estimated Harvest", 160.0)
            .with("Yield Min predicted", 3.0)
            .with("Yield Max predicted", 5.0)
            .with("Harvest Min predicted", 60.0)
            .with("Harvest Max predicted", 100.0),
        RawRow::new()
            .with("CA Name", "Plot A")
            .with("Audited Area", 500.0)
            .with("Expected Harvest", 9999.0)
            .with("Yield Min predicted", 0.0),
        RawRow::new().with("Audited Area", 42.0),
    ]
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_area_weighted_min_yield() {
    let session = session_with(farm_rows(), &metric_config());
    let agg = session.aggregate().unwrap();

    assert_relative_eq!(agg.predicted_yield_min.unwrap(), 2.6667, epsilon = 1e-4);
    assert_eq!(session.aggregate_display().predicted_yield_min, "2.67");
}

#[test]
fn test_harvest_totals_in_kilograms() {
    let mut session = session_with(farm_rows(), &metric_config());
    session.set_harvest_unit(MassUnit::Kilogram);

    let agg = session.aggregate().unwrap();
    assert_relative_eq!(agg.expected_harvest, 250_000.0);
    assert_eq!(session.aggregate_display().expected_harvest, "250000");
}

#[test]
fn test_no_prediction_plot_isolated() {
    let session = session_with(farm_rows(), &metric_config());
    let dataset = session.dataset();

    assert_eq!(dataset.without_prediction, vec!["Plot A".to_string()]);
    assert!(!dataset.with_prediction.contains(&"Plot A".to_string()));
    assert_eq!(dataset.skipped_rows, 1);

    let agg = session.aggregate().unwrap();
    assert_eq!(agg.plot_count, 2);
    assert_eq!(agg.total_area_ha, 30.0);
    assert_eq!(agg.expected_harvest, 250.0);

    let view = session.plot("Plot A").unwrap();
    assert_eq!(view.predicted_yield_text(), "NA");
}

#[test]
fn test_area_switch_keeps_harvest_and_deltas() {
    let mut session = session_with(farm_rows(), &metric_config());
    session.set_area_unit(AreaUnit::Acre);
    let acre = session.aggregate().unwrap().clone();

    session.set_area_unit(AreaUnit::Hectare);
    let hectare = session.aggregate().unwrap().clone();

    assert_relative_eq!(hectare.total_area_ha / acre.total_area_ha, 2.47105, epsilon = 1e-12);
    assert_eq!(hectare.expected_harvest, acre.expected_harvest);
    assert_eq!(hectare.reestimated_harvest, acre.reestimated_harvest);
    assert_eq!(
        hectare.deltas.reestimated_vs_expected_yield.to_string(),
        acre.deltas.reestimated_vs_expected_yield.to_string()
    );
    assert_eq!(hectare.deltas.reestimated_vs_expected_yield.to_string(), "↑ 12.00%");
}

#[test]
fn test_display_unit_switch_leaves_deltas_alone() {
    let mut session = session_with(farm_rows(), &metric_config());
    let before = session.aggregate().unwrap().deltas;

    session.select_units("ha", "kgs_acre", "uston").unwrap();
    let after = session.aggregate().unwrap().deltas;

    assert_eq!(before, after);
}

#[test]
fn test_no_prediction_anywhere() {
    let rows = vec![RawRow::new().with("CA Name", "Plot A").with("Expected Yield", 2.0)];
    let session = session_with(rows, &metric_config());

    assert!(session.aggregate().is_none());
    let display = session.aggregate_display();
    assert_eq!(display.plot_count, "-");
    assert_eq!(display.reestimated_vs_expected_harvest, "-");
}

// ============================================================================
// Views
// ============================================================================

fn many_rows(count: usize) -> Vec<RawRow> {
    (1..=count)
        .map(|i| {
            RawRow::new()
                .with("CA Name", format!("Plot {:03}", i))
                .with("Audited Area", i as f64)
                .with("Harvest Max predicted", 1.0)
        })
        .collect()
}

#[test]
fn test_pagination_45_rows() {
    let mut session = session_with(many_rows(45), &metric_config());
    session.table_mut().set_page_size(20).unwrap();
    session.table_mut().go_to_page(3);

    let page = session.table_page();
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.rows.len(), 5);
    assert_eq!((page.start, page.end), (41, 45));
    assert_eq!(page.rows.first().unwrap().name, "Plot 041");
    assert_eq!(page.rows.last().unwrap().name, "Plot 045");
    assert!(!page.has_next);
}

#[test]
fn test_table_walk_and_sort() {
    let mut session = session_with(many_rows(45), &metric_config());
    session.table_mut().set_sort(SortKey::AuditedArea, SortOrder::Desc);

    let first = session.table_page();
    assert_eq!(first.rows[0].name, "Plot 045");
    assert!(first.has_next && !first.has_previous);

    session.table_mut().next_page();
    session.table_mut().next_page();
    session.table_mut().next_page();
    let last = session.table_page();
    assert_eq!(last.page, 3);
    assert_eq!(last.rows.last().unwrap().name, "Plot 001");

    session.set_partition(Partition::WithoutPrediction);
    let empty = session.table_page();
    assert_eq!(empty.total_rows, 0);
    assert_eq!(empty.info(), "No results found");
}

#[test]
fn test_plot_lookup_errors() {
    let session = session_with(farm_rows(), &metric_config());
    assert_eq!(session.plot("Nowhere").unwrap_err(), EngineError::PlotNotFound("Nowhere".to_string()));
}

#[test]
fn test_export_scopes() {
    let mut session = session_with(farm_rows(), &metric_config());

    let all = session.export(ExportScope::All);
    assert_eq!(all.len(), 3);
    assert_eq!(all.rows[2][4], ExportCell::NotAvailable);

    session.set_partition(Partition::WithoutPrediction);
    let partition = session.export_active_partition();
    assert_eq!(partition.len(), 1);
    assert_eq!(partition.rows[0][0], ExportCell::Text("Plot A".to_string()));
}

// ============================================================================
// Ingest adapters
// ============================================================================

#[test]
fn test_json_rows_with_inconsistent_headers() {
    let json = r#"[
        {"ca name": "Plot X", "AUDITED AREA (ha)": "12.5 ha", "exp_harvest": 30, "PREDICTED YIELD MIN": "2.1", "predicted yield max": 2.9},
        {"CA NAME": "Plot Y", "Area": 7.5, "Min Predicted Harvest": "NA"}
    ]"#;
    let rows = rows_from_json(json).unwrap();
    let session = session_with(rows, &metric_config());

    let x = session.plot("Plot X").unwrap();
    assert_eq!(x.audited_area, 12.5);
    assert_eq!(x.expected_harvest, 30.0);
    assert_eq!(x.predicted_yield_text(), "2.10 - 2.90");

    let y = session.plot("Plot Y").unwrap();
    assert!(!y.has_prediction);
    assert_eq!(y.audited_area, 7.5);
}

#[test]
fn test_csv_round_trip_through_export() {
    let dir = std::env::temp_dir();
    let input = dir.join(format!("yield_input_{}.csv", std::process::id()));
    std::fs::write(
        &input,
        "CA Name,Audited Area,Expected Harvest,Yield Min predicted,Yield Max predicted\n\
         Plot 1,10,100,2,3\n\
         Plot 2,,50,NA,NA\n\
         ,5,5,1,1\n",
    )
    .unwrap();

    let rows = yield_aggregator_rust::load_csv_rows(&input).unwrap();
    std::fs::remove_file(&input).ok();
    assert_eq!(rows.len(), 3);

    let session = session_with(rows, &metric_config());
    assert_eq!(session.dataset().with_prediction, vec!["Plot 1".to_string()]);
    assert_eq!(session.dataset().without_prediction, vec!["Plot 2".to_string()]);
    assert_eq!(session.plot("Plot 2").unwrap().audited_area, 0.0);
}
