//! View projectors
//!
//! Turn canonical records and the farm aggregate into display-unit values:
//!   - `plot`: single-plot card
//!   - `table`: filtered, sorted, paginated listing of one partition
//!   - `summary`: string rendering of the farm aggregate
//!   - `export`: header + rows table, CSV writer

pub mod export;
pub mod plot;
pub mod summary;
pub mod table;

pub use export::{build_export, default_file_name, ExportCell, ExportScope, ExportTable};
pub use plot::{plot_view, PlotView, PredictionView};
pub use summary::AggregateDisplay;
pub use table::{SortKey, SortOrder, TablePage, TableState};

use crate::units::{self, AreaUnit};
use crate::utils::format::fmt_fixed2;

/// Area label: hectares always, plus acres when acre is selected
pub(crate) fn area_text(area_ha: f64, unit: AreaUnit) -> String {
    match unit {
        AreaUnit::Hectare => format!("{} Ha", fmt_fixed2(area_ha)),
        AreaUnit::Acre => format!(
            "{} Ha / {} Acres",
            fmt_fixed2(area_ha),
            fmt_fixed2(units::hectares_to_area(area_ha, unit))
        ),
    }
}
