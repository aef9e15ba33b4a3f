//! Grouping dimensions shared by detailed tables, aggregation views and
//! output schemas.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-value column of a detailed table.
///
/// Variants are declared in output priority order: scenario fields, then
/// location and classification fields, then emissions-only fields, then
/// units. Sorting by `Dimension` therefore sorts by column priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dimension {
    Area,
    Year,
    Season,
    DayType,
    EiType,
    Fips,
    CountyName,
    Hour,
    FuncClassId,
    FuncClass,
    AreaTypeId,
    AreaType,
    RoadTypeId,
    RoadTypeLabel,
    SourceUseTypeId,
    SutLabel,
    FuelTypeId,
    FtLabel,
    SutFtLabel,
    Scc,
    ActType,
    ActTypeLabel,
    ProcessId,
    ProcessAbb,
    ProcessName,
    PollutantId,
    PollutantCode,
    PollutantName,
    ActivityUnits,
    EmissionUnits,
}

/// Storage kind of a dimension column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Int,
    Text,
}

impl Dimension {
    pub const ALL: [Dimension; 30] = [
        Dimension::Area,
        Dimension::Year,
        Dimension::Season,
        Dimension::DayType,
        Dimension::EiType,
        Dimension::Fips,
        Dimension::CountyName,
        Dimension::Hour,
        Dimension::FuncClassId,
        Dimension::FuncClass,
        Dimension::AreaTypeId,
        Dimension::AreaType,
        Dimension::RoadTypeId,
        Dimension::RoadTypeLabel,
        Dimension::SourceUseTypeId,
        Dimension::SutLabel,
        Dimension::FuelTypeId,
        Dimension::FtLabel,
        Dimension::SutFtLabel,
        Dimension::Scc,
        Dimension::ActType,
        Dimension::ActTypeLabel,
        Dimension::ProcessId,
        Dimension::ProcessAbb,
        Dimension::ProcessName,
        Dimension::PollutantId,
        Dimension::PollutantCode,
        Dimension::PollutantName,
        Dimension::ActivityUnits,
        Dimension::EmissionUnits,
    ];

    /// Column header used in every table this dimension appears in.
    pub fn column_name(&self) -> &'static str {
        match self {
            Dimension::Area => "area",
            Dimension::Year => "year",
            Dimension::Season => "season",
            Dimension::DayType => "dayType",
            Dimension::EiType => "EIType",
            Dimension::Fips => "FIPS",
            Dimension::CountyName => "countyName",
            Dimension::Hour => "hour",
            Dimension::FuncClassId => "funcClassID",
            Dimension::FuncClass => "funcClass",
            Dimension::AreaTypeId => "areaTypeID",
            Dimension::AreaType => "areaType",
            Dimension::RoadTypeId => "mvsRoadTypeID",
            Dimension::RoadTypeLabel => "mvsRoadTypeLab",
            Dimension::SourceUseTypeId => "sourceUseTypeID",
            Dimension::SutLabel => "sutLab",
            Dimension::FuelTypeId => "fuelTypeID",
            Dimension::FtLabel => "ftLab",
            Dimension::SutFtLabel => "sutFtLabel",
            Dimension::Scc => "sccNEI",
            Dimension::ActType => "actTypeABB",
            Dimension::ActTypeLabel => "actTypeLab",
            Dimension::ProcessId => "processID",
            Dimension::ProcessAbb => "processABB",
            Dimension::ProcessName => "processName",
            Dimension::PollutantId => "pollutantID",
            Dimension::PollutantCode => "pollutantCode",
            Dimension::PollutantName => "pollutantName",
            Dimension::ActivityUnits => "activityunits",
            Dimension::EmissionUnits => "emissionunits",
        }
    }

    pub fn kind(&self) -> DimensionKind {
        match self {
            Dimension::Year
            | Dimension::Fips
            | Dimension::Hour
            | Dimension::FuncClassId
            | Dimension::AreaTypeId
            | Dimension::RoadTypeId
            | Dimension::SourceUseTypeId
            | Dimension::FuelTypeId
            | Dimension::ProcessId
            | Dimension::PollutantId => DimensionKind::Int,
            _ => DimensionKind::Text,
        }
    }

    /// Unit columns always stay in a grouping key so sums never mix units.
    pub fn is_unit(&self) -> bool {
        matches!(self, Dimension::ActivityUnits | Dimension::EmissionUnits)
    }

    /// Key columns a label column is derived from. Empty for key columns.
    pub fn sources(&self) -> &'static [Dimension] {
        match self {
            Dimension::CountyName => &[Dimension::Fips],
            Dimension::FuncClass => &[Dimension::FuncClassId],
            Dimension::AreaType => &[Dimension::AreaTypeId],
            Dimension::RoadTypeLabel => &[Dimension::RoadTypeId],
            Dimension::SutLabel => &[Dimension::SourceUseTypeId],
            Dimension::FtLabel => &[Dimension::FuelTypeId],
            Dimension::SutFtLabel | Dimension::Scc => {
                &[Dimension::SourceUseTypeId, Dimension::FuelTypeId]
            }
            Dimension::ActTypeLabel => &[Dimension::ActType],
            Dimension::ProcessAbb | Dimension::ProcessName => &[Dimension::ProcessId],
            Dimension::PollutantName => &[Dimension::PollutantId],
            _ => &[],
        }
    }

    pub fn is_label(&self) -> bool {
        !self.sources().is_empty()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Dimension::ALL
            .into_iter()
            .find(|dim| dim.column_name() == trimmed)
            .ok_or_else(|| format!("unknown dimension column: {s}"))
    }
}

impl TryFrom<String> for Dimension {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dimension> for String {
    fn from(value: Dimension) -> Self {
        value.column_name().to_string()
    }
}

/// A single cell of a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Int(i64),
    Text(String),
}

impl KeyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            KeyValue::Int(value) => Some(*value),
            KeyValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyValue::Text(value) => Some(value),
            KeyValue::Int(_) => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(value) => write!(f, "{value}"),
            KeyValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Text(value)
    }
}
