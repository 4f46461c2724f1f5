//! Engine configuration
//!
//! JSON file, every field optional:
//!
//! ```json
//! {
//!   "units": {"area": "acre", "yield": "kgs_acre", "harvest": "kgs"},
//!   "source_units": {"harvest": "ton", "yield": "ton_ha"},
//!   "page_size": 20,
//!   "fetch_batch_size": 5,
//!   "api_harvest_unit": "ton"
//! }
//! ```
//!
//! Unit keys are validated while deserializing; sizes are validated by `load`.

use crate::generation::{GenerationOptions, DEFAULT_BATCH_SIZE};
use crate::units::{AreaUnit, HarvestUnit, MassUnit, SourceUnits, UnitSelection};
use crate::view::table::DEFAULT_PAGE_SIZE;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Display unit selection (area is also the audited-area ingest unit)
    pub units: UnitSelection,
    /// Units of the expected / re-estimated spreadsheet columns
    pub source_units: SourceUnits,
    pub page_size: usize,
    pub fetch_batch_size: usize,
    /// Mass unit the farm-management API reports harvests in
    pub api_harvest_unit: HarvestUnit,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            units: UnitSelection::default(),
            source_units: SourceUnits::default(),
            page_size: DEFAULT_PAGE_SIZE,
            fetch_batch_size: DEFAULT_BATCH_SIZE,
            api_harvest_unit: MassUnit::Tonne,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("Invalid config: {:?}", path))?;

        tracing::info!(
            "Loaded config from {:?} (units: {}, {}, {})",
            path,
            config.units.area,
            config.units.yield_unit,
            config.units.harvest
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.fetch_batch_size == 0 {
            bail!("fetch_batch_size must be at least 1");
        }
        Ok(())
    }

    /// Generation options for a user whose area preference is `area_unit`
    pub fn generation_options(&self, area_unit: AreaUnit) -> GenerationOptions {
        GenerationOptions {
            batch_size: self.fetch_batch_size,
            area_unit,
            api_harvest_unit: self.api_harvest_unit,
        }
    }
}
