//! Paginated plot table
//!
//! The listing always covers exactly one partition. Per render:
//!   1. filter: case-insensitive substring on the plot name, or on the
//!      2-decimal audited-area text
//!   2. sort: one key, ascending or descending, missing values last
//!   3. paginate: fixed page size, 1-based pages clamped to the last page
//!
//! State transitions:
//!   - partition switch → query, sort and page reset
//!   - query change or page-size change → page 1

use crate::error::{EngineError, EngineResult};
use crate::normalizer::{CanonicalPlotRecord, NormalizedDataset, Partition};
use crate::units::UnitSelection;
use crate::utils::format::fmt_fixed2;
use crate::view::plot::PlotView;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    AuditedArea,
    ExpectedHarvest,
    ReestimatedHarvest,
    ExpectedYield,
    ReestimatedYield,
    PredictedHarvestMin,
    PredictedHarvestMax,
    PredictedYieldMin,
    PredictedYieldMax,
}

impl SortKey {
    /// Numeric sort value; `None` for the name key and for missing predictions
    fn numeric(self, record: &CanonicalPlotRecord) -> Option<f64> {
        match self {
            SortKey::Name => None,
            SortKey::AuditedArea => Some(record.audited_area),
            SortKey::ExpectedHarvest => Some(record.expected_harvest),
            SortKey::ReestimatedHarvest => Some(record.reestimated_harvest),
            SortKey::ExpectedYield => Some(record.expected_yield),
            SortKey::ReestimatedYield => Some(record.reestimated_yield),
            SortKey::PredictedHarvestMin => record.predicted_harvest_min,
            SortKey::PredictedHarvestMax => record.predicted_harvest_max,
            SortKey::PredictedYieldMin => record.predicted_yield_min,
            SortKey::PredictedYieldMax => record.predicted_yield_max,
        }
    }

    fn compare(self, a: &CanonicalPlotRecord, b: &CanonicalPlotRecord, order: SortOrder) -> Ordering {
        if self == SortKey::Name {
            return order.apply(a.name.cmp(&b.name));
        }
        match (self.numeric(a), self.numeric(b)) {
            (Some(x), Some(y)) => order.apply(x.total_cmp(&y)),
            // Missing values sink to the bottom in either order
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl FromStr for SortKey {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let key = match s.trim().to_lowercase().as_str() {
            "" | "name" => SortKey::Name,
            "audited_area" | "area" => SortKey::AuditedArea,
            "expected_harvest" => SortKey::ExpectedHarvest,
            "reestimated_harvest" => SortKey::ReestimatedHarvest,
            "expected_yield" => SortKey::ExpectedYield,
            "reestimated_yield" => SortKey::ReestimatedYield,
            "predicted_harvest_min" => SortKey::PredictedHarvestMin,
            "predicted_harvest_max" => SortKey::PredictedHarvestMax,
            "predicted_yield_min" => SortKey::PredictedYieldMin,
            "predicted_yield_max" => SortKey::PredictedYieldMax,
            _ => return Err(EngineError::UnknownSortKey(s.to_string())),
        };
        Ok(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Filter, sort and pagination state of the plot table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableState {
    partition: Partition,
    query: String,
    sort_key: SortKey,
    sort_order: SortOrder,
    page: usize,
    page_size: usize,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            partition: Partition::WithPrediction,
            query: String::new(),
            sort_key: SortKey::Name,
            sort_order: SortOrder::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TableState {
    pub fn new(page_size: usize) -> EngineResult<Self> {
        let mut state = Self::default();
        state.set_page_size(page_size)?;
        Ok(state)
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> (SortKey, SortOrder) {
        (self.sort_key, self.sort_order)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Switch partition; query, sort and page go back to their defaults
    pub fn set_partition(&mut self, partition: Partition) {
        self.partition = partition;
        self.query.clear();
        self.sort_key = SortKey::default();
        self.sort_order = SortOrder::default();
        self.page = 1;
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = if query.trim().is_empty() { String::new() } else { query.to_lowercase() };
        self.page = 1;
    }

    pub fn set_sort(&mut self, key: SortKey, order: SortOrder) {
        self.sort_key = key;
        self.sort_order = order;
    }

    pub fn toggle_sort_order(&mut self) {
        self.sort_order = self.sort_order.toggled();
    }

    pub fn set_page_size(&mut self, page_size: usize) -> EngineResult<()> {
        if page_size == 0 {
            return Err(EngineError::InvalidPageSize);
        }
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    /// Request a page (1-based); clamped when rendered
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    fn matches(&self, record: &CanonicalPlotRecord) -> bool {
        self.query.is_empty()
            || record.name.to_lowercase().contains(&self.query)
            || fmt_fixed2(record.audited_area).contains(&self.query)
    }

    /// Filtered and sorted records of the active partition
    fn filtered<'a>(&self, dataset: &'a NormalizedDataset) -> Vec<&'a CanonicalPlotRecord> {
        let mut records: Vec<&CanonicalPlotRecord> = dataset
            .partition(self.partition)
            .filter(|record| self.matches(record))
            .collect();
        records.sort_by(|a, b| self.sort_key.compare(a, b, self.sort_order));
        records
    }

    /// Render the current page, clamping the stored page to the last one
    pub fn render(&mut self, dataset: &NormalizedDataset, units: &UnitSelection) -> TablePage {
        let records = self.filtered(dataset);
        let total_rows = records.len();
        let total_pages = total_rows.div_ceil(self.page_size);

        self.page = self.page.clamp(1, total_pages.max(1));

        let offset = (self.page - 1) * self.page_size;
        let rows: Vec<PlotView> = records
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|record| PlotView::from_record(record, units))
            .collect();

        let (start, end) = if rows.is_empty() { (0, 0) } else { (offset + 1, offset + rows.len()) };

        TablePage {
            page: self.page,
            page_size: self.page_size,
            total_pages,
            total_rows,
            start,
            end,
            has_previous: self.page > 1,
            has_next: self.page < total_pages,
            rows,
        }
    }
}

/// One rendered page of the plot table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub rows: Vec<PlotView>,
    pub page: usize,
    pub page_size: usize,
    /// 0 when nothing matches
    pub total_pages: usize,
    pub total_rows: usize,
    /// 1-based row range shown; (0, 0) on an empty page
    pub start: usize,
    pub end: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl TablePage {
    /// `"Showing 41-45 of 45"`
    pub fn info(&self) -> String {
        if self.total_rows == 0 {
            return "No results found".to_string();
        }
        format!("Showing {}-{} of {}", self.start, self.end, self.total_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawRow;
    use crate::normalizer::{normalize_rows, IngestContext};

    fn dataset(with: usize, without: usize) -> NormalizedDataset {
        let mut rows = Vec::new();
        for i in 0..with {
            rows.push(
                RawRow::new()
                    .with("CA Name", format!("Plot {:02}", i + 1))
                    .with("Audited Area", 1.0 + i as f64)
                    .with("Yield Min predicted", (i % 7) as f64)
                    .with("Yield Max predicted", 9.0),
            );
        }
        for i in 0..without {
            rows.push(RawRow::new().with("CA Name", format!("Empty {:02}", i + 1)));
        }
        normalize_rows(&rows, &IngestContext::default())
    }

    #[test]
    fn test_pagination_last_page() {
        let data = dataset(45, 0);
        let mut state = TableState::new(20).unwrap();
        state.go_to_page(3);
        let page = state.render(&data, &UnitSelection::default());

        assert_eq!(page.total_pages, 3);
        assert_eq!((page.start, page.end), (41, 45));
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.rows[0].name, "Plot 41");
        assert!(!page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.info(), "Showing 41-45 of 45");
    }

    #[test]
    fn test_page_beyond_last_clamps() {
        let data = dataset(45, 0);
        let mut state = TableState::new(20).unwrap();
        state.go_to_page(9);
        let page = state.render(&data, &UnitSelection::default());
        assert_eq!(page.page, 3);
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn test_next_page_from_huge_request() {
        let data = dataset(45, 0);
        let mut state = TableState::new(20).unwrap();
        state.go_to_page(usize::MAX);
        state.next_page();
        let page = state.render(&data, &UnitSelection::default());
        assert_eq!(page.page, 3);

        state.next_page();
        assert_eq!(state.render(&data, &UnitSelection::default()).page, 3);
    }

    #[test]
    fn test_query_keeps_inner_spaces() {
        let data = dataset(12, 0);
        let mut state = TableState::default();

        // "plot 1" matches Plot 10-12; with a trailing space it matches nothing
        state.set_query("plot 1");
        assert_eq!(state.render(&data, &UnitSelection::default()).total_rows, 3);
        state.set_query("plot 1 ");
        assert_eq!(state.render(&data, &UnitSelection::default()).total_rows, 0);

        state.set_query("   ");
        assert_eq!(state.query(), "");
        assert_eq!(state.render(&data, &UnitSelection::default()).total_rows, 12);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert_eq!(TableState::new(0), Err(EngineError::InvalidPageSize));
        let mut state = TableState::default();
        state.go_to_page(2);
        assert_eq!(state.set_page_size(0), Err(EngineError::InvalidPageSize));
        state.set_page_size(10).unwrap();
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_filter_on_name_and_area() {
        let data = dataset(45, 0);
        let mut state = TableState::default();

        state.set_query("PLOT 0");
        assert_eq!(state.render(&data, &UnitSelection::default()).total_rows, 9);

        // Plot 13 has area 13.00
        state.set_query("13.00");
        let page = state.render(&data, &UnitSelection::default());
        assert_eq!(page.total_rows, 1);
        assert_eq!(page.rows[0].name, "Plot 13");

        state.set_query("nothing");
        let page = state.render(&data, &UnitSelection::default());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.info(), "No results found");
        assert!(!page.has_next && !page.has_previous);
    }

    #[test]
    fn test_partition_switch_resets_state() {
        let data = dataset(5, 3);
        let mut state = TableState::default();
        state.set_query("plot");
        state.set_sort(SortKey::AuditedArea, SortOrder::Desc);
        state.go_to_page(2);

        state.set_partition(Partition::WithoutPrediction);
        assert_eq!(state.query(), "");
        assert_eq!(state.sort(), (SortKey::Name, SortOrder::Asc));
        assert_eq!(state.page(), 1);

        let page = state.render(&data, &UnitSelection::default());
        assert_eq!(page.total_rows, 3);
        assert!(page.rows.iter().all(|row| !row.has_prediction));
    }

    #[test]
    fn test_sort_descending_numeric() {
        let data = dataset(10, 0);
        let mut state = TableState::default();
        state.set_sort(SortKey::AuditedArea, SortOrder::Desc);
        let page = state.render(&data, &UnitSelection::default());
        assert_eq!(page.rows[0].name, "Plot 10");

        state.toggle_sort_order();
        let page = state.render(&data, &UnitSelection::default());
        assert_eq!(page.rows[0].name, "Plot 01");
    }

    #[test]
    fn test_missing_values_sort_last() {
        let data = dataset(3, 2);
        let records: Vec<&CanonicalPlotRecord> = data.records.iter().collect();
        let mut sorted = records.clone();
        for order in [SortOrder::Asc, SortOrder::Desc] {
            sorted.sort_by(|a, b| SortKey::PredictedYieldMax.compare(a, b, order));
            assert!(!sorted[3].has_prediction && !sorted[4].has_prediction);
        }
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("predicted_yield_min".parse::<SortKey>().unwrap(), SortKey::PredictedYieldMin);
        assert_eq!("".parse::<SortKey>().unwrap(), SortKey::Name);
        assert!("colour".parse::<SortKey>().is_err());
    }
}
