//! Tabular export
//!
//! One header row plus one row per plot, values converted to the selected
//! display units and rounded to 2 decimals. Predicted cells of a plot without
//! a prediction are `NA`.
//!
//! The table is independent of any file format; `write_csv` renders it through
//! a Polars DataFrame of string columns (mixed numbers and `NA` in one column).

use crate::normalizer::{NormalizedDataset, Partition};
use crate::units::{self, UnitSelection};
use crate::utils::format::{round2, NOT_AVAILABLE};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Which records go into the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportScope {
    #[default]
    All,
    Partition(Partition),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Text(String),
    Number(f64),
    NotAvailable,
}

impl fmt::Display for ExportCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportCell::Text(text) => f.write_str(text),
            ExportCell::Number(value) => write!(f, "{}", value),
            ExportCell::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for ExportCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ExportCell::Text(text) => serializer.serialize_str(text),
            ExportCell::Number(value) => serializer.serialize_f64(*value),
            ExportCell::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<ExportCell>>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One string column per header entry
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .header
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<String> = self.rows.iter().map(|row| row[idx].to_string()).collect();
                Column::new(name.as_str().into(), values)
            })
            .collect();

        DataFrame::new(columns).context("Failed to build export DataFrame")
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create export file: {:?}", path))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .with_context(|| format!("Failed to write export CSV: {:?}", path))?;

        tracing::info!("Exported {} plots to {:?}", self.len(), path);
        Ok(())
    }
}

/// `AllPlotsData_<YYYY-MM-DD>.csv`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("AllPlotsData_{}.csv", date.format("%Y-%m-%d"))
}

fn header(units: &UnitSelection) -> Vec<String> {
    let area = units.area.label();
    let harvest = units.harvest.label();
    let yield_label = units.yield_unit.label();

    vec![
        "Plot Name".to_string(),
        format!("Audited Area ({area})"),
        format!("Expected Harvest ({harvest})"),
        format!("Re-estimated Harvest ({harvest})"),
        format!("Predicted Harvest Min ({harvest})"),
        format!("Predicted Harvest Avg ({harvest})"),
        format!("Predicted Harvest Max ({harvest})"),
        format!("Expected Yield ({yield_label})"),
        format!("Re-estimated Yield ({yield_label})"),
        format!("Predicted Yield Min ({yield_label})"),
        format!("Predicted Yield Avg ({yield_label})"),
        format!("Predicted Yield Max ({yield_label})"),
    ]
}

/// Build the export table for `scope`, in ingest order
pub fn build_export(dataset: &NormalizedDataset, units: &UnitSelection, scope: ExportScope) -> ExportTable {
    let number = |value: f64| ExportCell::Number(round2(value));
    let to_yield = |t_ha: f64| units::convert_yield(t_ha, units.yield_unit);
    let to_harvest = |t: f64| units::convert_harvest(t, units.harvest);

    let rows = dataset
        .records
        .iter()
        .filter(|record| match scope {
            ExportScope::All => true,
            ExportScope::Partition(partition) => record.partition() == partition,
        })
        .map(|record| {
            let mut row = vec![
                ExportCell::Text(record.name.clone()),
                number(record.audited_area),
                number(to_harvest(record.expected_harvest)),
                number(to_harvest(record.reestimated_harvest)),
            ];

            let harvest = record.predicted_harvest_range().filter(|_| record.has_prediction);
            let yields = record.predicted_yield_range().filter(|_| record.has_prediction);

            match harvest {
                Some((min, max)) => row.extend([
                    number(to_harvest(min)),
                    number(to_harvest((min + max) / 2.0)),
                    number(to_harvest(max)),
                ]),
                None => row.extend([ExportCell::NotAvailable, ExportCell::NotAvailable, ExportCell::NotAvailable]),
            }

            row.push(number(to_yield(record.expected_yield)));
            row.push(number(to_yield(record.reestimated_yield)));

            match yields {
                Some((min, max)) => row.extend([
                    number(to_yield(min)),
                    number(to_yield((min + max) / 2.0)),
                    number(to_yield(max)),
                ]),
                None => row.extend([ExportCell::NotAvailable, ExportCell::NotAvailable, ExportCell::NotAvailable]),
            }

            row
        })
        .collect();

    ExportTable { header: header(units), rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawRow;
    use crate::normalizer::{normalize_rows, IngestContext};
    use crate::units::{AreaUnit, MassUnit, YieldUnit};

    fn dataset() -> NormalizedDataset {
        let rows = vec![
            RawRow::new()
                .with("CA Name", "Plot A")
                .with("Audited Area", 2.346)
                .with("Expected Harvest", 1.23456)
                .with("Yield Min predicted", 2.0)
                .with("Yield Max predicted", 3.0)
                .with("Harvest Min predicted", 4.0)
                .with("Harvest Max predicted", 5.0),
            RawRow::new().with("CA Name", "Plot B").with("Expected Yield", 1.5),
        ];
        normalize_rows(&rows, &IngestContext::default())
    }

    fn metric_units() -> UnitSelection {
        UnitSelection {
            area: AreaUnit::Hectare,
            yield_unit: YieldUnit::TONNES_PER_HECTARE,
            harvest: MassUnit::Tonne,
        }
    }

    #[test]
    fn test_header_carries_unit_labels() {
        let table = build_export(&dataset(), &UnitSelection::default(), ExportScope::All);
        assert_eq!(table.header.len(), 12);
        assert_eq!(table.header[1], "Audited Area (Acres)");
        assert_eq!(table.header[2], "Expected Harvest (Kgs)");
        assert_eq!(table.header[11], "Predicted Yield Max (Kgs/Acre)");
    }

    #[test]
    fn test_rows_rounded_and_na() {
        let table = build_export(&dataset(), &metric_units(), ExportScope::All);
        assert_eq!(table.len(), 2);

        let plot_a = &table.rows[0];
        assert_eq!(plot_a[0], ExportCell::Text("Plot A".to_string()));
        assert_eq!(plot_a[2], ExportCell::Number(1.23));
        assert_eq!(plot_a[5], ExportCell::Number(4.5));
        assert_eq!(plot_a[10], ExportCell::Number(2.5));

        let plot_b = &table.rows[1];
        assert_eq!(plot_b[7], ExportCell::Number(1.5));
        for idx in [4, 5, 6, 9, 10, 11] {
            assert_eq!(plot_b[idx], ExportCell::NotAvailable);
        }
    }

    #[test]
    fn test_partition_scope() {
        let scope = ExportScope::Partition(Partition::WithoutPrediction);
        let table = build_export(&dataset(), &metric_units(), scope);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][0].to_string(), "Plot B");
    }

    #[test]
    fn test_default_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(default_file_name(date), "AllPlotsData_2024-03-09.csv");
    }

    #[test]
    fn test_dataframe_and_csv() {
        let table = build_export(&dataset(), &metric_units(), ExportScope::All);
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 12));

        let path = std::env::temp_dir().join(format!("yield_export_{}.csv", std::process::id()));
        table.write_csv(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut lines = written.lines();
        assert!(lines.next().unwrap().starts_with("Plot Name,Audited Area (Hectares)"));
        assert!(lines.next().unwrap().starts_with("Plot A,2.35,1.23,0,4,4.5,5"));
        assert!(lines.next().unwrap().contains("NA"));
    }
}
