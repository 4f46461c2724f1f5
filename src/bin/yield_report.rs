// Yield Report Binary
//
// Purpose: Aggregate a plot spreadsheet (CSV or JSON rows) and print the farm
// summary as JSON, optionally writing the plot export as CSV.
// Usage: INPUT=plots.csv [CONFIG=engine.json] [EXPORT=out.csv|dir/] cargo run --bin yield_report

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yield_aggregator_rust::view::{default_file_name, ExportScope};
use yield_aggregator_rust::{load_csv_rows, rows_from_json, AggregationSession, EngineConfig, RawRow};

fn load_rows(path: &Path) -> Result<Vec<RawRow>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => load_csv_rows(path),
        "json" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read rows: {:?}", path))?;
            rows_from_json(&text)
        }
        other => bail!("Unsupported input format '{}' (expected .csv or .json)", other),
    }
}

fn export_path(target: &str) -> PathBuf {
    let path = PathBuf::from(target);
    if path.is_dir() {
        path.join(default_file_name(chrono::Local::now().date_naive()))
    } else {
        path
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yield_aggregator_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let input = std::env::var("INPUT").context("INPUT must point at a .csv or .json rows file")?;
    let config = match std::env::var("CONFIG") {
        Ok(path) => EngineConfig::load(Path::new(&path))?,
        Err(_) => EngineConfig::default(),
    };
    let export = std::env::var("EXPORT").ok();

    tracing::info!("Configuration:");
    tracing::info!("  INPUT: {}", input);
    tracing::info!("  UNITS: {} / {} / {}", config.units.area, config.units.yield_unit, config.units.harvest);
    tracing::info!("  EXPORT: {}", export.as_deref().unwrap_or("-"));

    let rows = load_rows(Path::new(&input))?;

    let mut session = AggregationSession::new(&config)?;
    session.load_rows(rows);

    let report = serde_json::json!({
        "plots_with_prediction": session.dataset().with_prediction,
        "plots_without_prediction": session.dataset().without_prediction,
        "skipped_rows": session.dataset().skipped_rows,
        "aggregate": session.aggregate(),
        "summary": session.aggregate_display(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(target) = export {
        let path = export_path(&target);
        session.export(ExportScope::All).write_csv(&path)?;
    }

    Ok(())
}
