//! Unit Conversion Tables
//!
//! Static factor tables for mass, area and composite yield units.
//!
//! Canonical storage is always tonnes (harvest) and tonnes per hectare (yield).
//! Every factor converts FROM the canonical unit TO the named unit:
//!
//! | Mass      | factor  |   | Area    | factor  |
//! |-----------|---------|---|---------|---------|
//! | tonne     | 1       |   | hectare | 1       |
//! | kilogram  | 1000    |   | acre    | 2.47105 |
//! | US ton    | 1.10231 |   |         |         |
//!
//! Conversions never round. Rounding to 2 decimals happens only where values
//! are rendered or exported.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tonnes per tonne, kilograms per tonne, US tons per tonne
const TONNE_FACTOR: f64 = 1.0;
const KILOGRAM_FACTOR: f64 = 1000.0;
const US_TON_FACTOR: f64 = 1.10231;

/// Acres per hectare
const HECTARE_FACTOR: f64 = 1.0;
const ACRE_FACTOR: f64 = 2.47105;

// ============================================================================
// Mass
// ============================================================================

/// Mass unit (also the harvest unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MassUnit {
    Kilogram,
    Tonne,
    UsTon,
}

/// Harvest totals are plain masses
pub type HarvestUnit = MassUnit;

impl MassUnit {
    pub const ALL: [MassUnit; 3] = [MassUnit::Kilogram, MassUnit::Tonne, MassUnit::UsTon];

    /// Factor converting tonnes into this unit
    pub fn factor(self) -> f64 {
        match self {
            MassUnit::Tonne => TONNE_FACTOR,
            MassUnit::Kilogram => KILOGRAM_FACTOR,
            MassUnit::UsTon => US_TON_FACTOR,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            MassUnit::Kilogram => "kgs",
            MassUnit::Tonne => "ton",
            MassUnit::UsTon => "uston",
        }
    }

    /// Label used in harvest column headers
    pub fn label(self) -> &'static str {
        match self {
            MassUnit::Kilogram => "Kgs",
            MassUnit::Tonne => "Tonnes",
            MassUnit::UsTon => "US Ton",
        }
    }

    /// Short label used inside composite yield labels
    fn yield_label(self) -> &'static str {
        match self {
            MassUnit::Kilogram => "Kgs",
            MassUnit::Tonne => "Ton",
            MassUnit::UsTon => "US Ton",
        }
    }
}

impl FromStr for MassUnit {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "kgs" | "kg" | "kilogram" | "kilograms" => Ok(MassUnit::Kilogram),
            "ton" | "tonne" | "tonnes" | "t" => Ok(MassUnit::Tonne),
            "uston" | "us_ton" | "us ton" => Ok(MassUnit::UsTon),
            _ => Err(EngineError::UnknownUnit { kind: "mass", key: s.to_string() }),
        }
    }
}

// ============================================================================
// Area
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AreaUnit {
    #[default]
    Hectare,
    Acre,
}

impl AreaUnit {
    pub const ALL: [AreaUnit; 2] = [AreaUnit::Hectare, AreaUnit::Acre];

    /// Factor converting hectares into this unit
    pub fn factor(self) -> f64 {
        match self {
            AreaUnit::Hectare => HECTARE_FACTOR,
            AreaUnit::Acre => ACRE_FACTOR,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            AreaUnit::Hectare => "ha",
            AreaUnit::Acre => "acre",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AreaUnit::Hectare => "Hectares",
            AreaUnit::Acre => "Acres",
        }
    }

    fn yield_label(self) -> &'static str {
        match self {
            AreaUnit::Hectare => "Ha",
            AreaUnit::Acre => "Acre",
        }
    }
}

impl FromStr for AreaUnit {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "ha" | "hectare" | "hectares" => Ok(AreaUnit::Hectare),
            "acre" | "acres" | "ac" => Ok(AreaUnit::Acre),
            _ => Err(EngineError::UnknownUnit { kind: "area", key: s.to_string() }),
        }
    }
}

// ============================================================================
// Yield (mass per area)
// ============================================================================

/// Composite yield unit, e.g. `kgs_acre`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YieldUnit {
    pub mass: MassUnit,
    pub area: AreaUnit,
}

impl YieldUnit {
    pub const TONNES_PER_HECTARE: YieldUnit = YieldUnit { mass: MassUnit::Tonne, area: AreaUnit::Hectare };
    pub const KGS_PER_ACRE: YieldUnit = YieldUnit { mass: MassUnit::Kilogram, area: AreaUnit::Acre };

    pub fn new(mass: MassUnit, area: AreaUnit) -> Self {
        Self { mass, area }
    }

    /// Every mass × area combination
    pub fn all() -> Vec<YieldUnit> {
        MassUnit::ALL
            .iter()
            .flat_map(|&mass| AreaUnit::ALL.iter().map(move |&area| YieldUnit { mass, area }))
            .collect()
    }

    /// Factor converting tonnes/hectare into this unit
    pub fn factor(self) -> f64 {
        self.mass.factor() / self.area.factor()
    }

    pub fn key(self) -> String {
        format!("{}_{}", self.mass.key(), self.area.key())
    }

    pub fn label(self) -> String {
        format!("{}/{}", self.mass.yield_label(), self.area.yield_label())
    }
}

impl FromStr for YieldUnit {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let unknown = || EngineError::UnknownUnit { kind: "yield", key: s.to_string() };
        let (mass, area) = s.trim().rsplit_once(['_', '/']).ok_or_else(unknown)?;
        Ok(YieldUnit {
            mass: mass.parse().map_err(|_| unknown())?,
            area: area.parse().map_err(|_| unknown())?,
        })
    }
}

macro_rules! string_conversions {
    ($ty:ty) => {
        impl TryFrom<String> for $ty {
            type Error = EngineError;

            fn try_from(value: String) -> EngineResult<Self> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(unit: $ty) -> String {
                unit.key().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.key())
            }
        }
    };
}

string_conversions!(MassUnit);
string_conversions!(AreaUnit);
string_conversions!(YieldUnit);

// ============================================================================
// Conversions
// ============================================================================

/// Tonnes/hectare → target yield unit
pub fn convert_yield(value_t_per_ha: f64, target: YieldUnit) -> f64 {
    value_t_per_ha * target.mass.factor() / target.area.factor()
}

/// Target yield unit → tonnes/hectare
pub fn yield_to_canonical(value: f64, source: YieldUnit) -> f64 {
    value * source.area.factor() / source.mass.factor()
}

/// Tonnes → target harvest unit
pub fn convert_harvest(value_t: f64, target: HarvestUnit) -> f64 {
    value_t * target.factor()
}

/// Harvest unit → tonnes
pub fn harvest_to_canonical(value: f64, source: HarvestUnit) -> f64 {
    value / source.factor()
}

/// Area reading in `unit` → hectares
pub fn area_to_hectares(value: f64, unit: AreaUnit) -> f64 {
    value / unit.factor()
}

/// Hectares → area reading in `unit`
pub fn hectares_to_area(value_ha: f64, unit: AreaUnit) -> f64 {
    value_ha * unit.factor()
}

// ============================================================================
// Selections
// ============================================================================

/// Display unit selection shared by every computation in a session
///
/// `area` is also the unit audited-area readings are entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSelection {
    pub area: AreaUnit,
    #[serde(rename = "yield")]
    pub yield_unit: YieldUnit,
    pub harvest: HarvestUnit,
}

impl Default for UnitSelection {
    fn default() -> Self {
        Self {
            area: AreaUnit::Acre,
            yield_unit: YieldUnit::KGS_PER_ACRE,
            harvest: MassUnit::Kilogram,
        }
    }
}

impl UnitSelection {
    /// Build a selection from raw selector keys, rejecting unknown keys
    pub fn parse(area: &str, yield_unit: &str, harvest: &str) -> EngineResult<Self> {
        Ok(Self {
            area: area.parse()?,
            yield_unit: yield_unit.parse()?,
            harvest: harvest.parse()?,
        })
    }
}

/// Units the expected / re-estimated spreadsheet values were entered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnits {
    pub harvest: HarvestUnit,
    #[serde(rename = "yield")]
    pub yield_unit: YieldUnit,
}

impl Default for SourceUnits {
    fn default() -> Self {
        Self {
            harvest: MassUnit::Tonne,
            yield_unit: YieldUnit::TONNES_PER_HECTARE,
        }
    }
}
