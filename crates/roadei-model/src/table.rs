use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dimension::{Dimension, KeyValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Activity,
    Emissions,
}

impl TableKind {
    pub fn value_column(&self) -> &'static str {
        match self {
            TableKind::Activity => "activity",
            TableKind::Emissions => "emission",
        }
    }

    pub fn unit_dimension(&self) -> Dimension {
        match self {
            TableKind::Activity => Dimension::ActivityUnits,
            TableKind::Emissions => Dimension::EmissionUnits,
        }
    }

    /// Suffix used for aggregate workbook sheets.
    pub fn sheet_suffix(&self) -> &'static str {
        match self {
            TableKind::Activity => "act",
            TableKind::Emissions => "emis",
        }
    }

    /// File name of the detailed table in the output directory.
    pub fn detailed_file_name(&self) -> &'static str {
        match self {
            TableKind::Activity => "activityDetailed.csv",
            TableKind::Emissions => "emissionDetailed.csv",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Activity => f.write_str("activity"),
            TableKind::Emissions => f.write_str("emissions"),
        }
    }
}

/// Canonical column layout of a detailed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Key columns.
    pub idx: Vec<Dimension>,
    /// Descriptive columns joined from label tables.
    #[serde(default)]
    pub labels: Vec<Dimension>,
}

impl TableSchema {
    pub fn default_activity() -> Self {
        Self {
            idx: vec![
                Dimension::Area,
                Dimension::Year,
                Dimension::Season,
                Dimension::DayType,
                Dimension::Fips,
                Dimension::Hour,
                Dimension::FuncClassId,
                Dimension::AreaTypeId,
                Dimension::RoadTypeId,
                Dimension::SourceUseTypeId,
                Dimension::FuelTypeId,
                Dimension::ActType,
                Dimension::ActivityUnits,
            ],
            labels: vec![
                Dimension::CountyName,
                Dimension::RoadTypeLabel,
                Dimension::SutLabel,
                Dimension::FtLabel,
                Dimension::SutFtLabel,
                Dimension::Scc,
                Dimension::ActTypeLabel,
            ],
        }
    }

    pub fn default_emissions() -> Self {
        Self {
            idx: vec![
                Dimension::Area,
                Dimension::Year,
                Dimension::Season,
                Dimension::DayType,
                Dimension::EiType,
                Dimension::Fips,
                Dimension::Hour,
                Dimension::FuncClassId,
                Dimension::AreaTypeId,
                Dimension::RoadTypeId,
                Dimension::SourceUseTypeId,
                Dimension::FuelTypeId,
                Dimension::ActType,
                Dimension::ProcessId,
                Dimension::PollutantId,
                Dimension::PollutantCode,
                Dimension::EmissionUnits,
            ],
            labels: vec![
                Dimension::CountyName,
                Dimension::RoadTypeLabel,
                Dimension::SutLabel,
                Dimension::FtLabel,
                Dimension::SutFtLabel,
                Dimension::Scc,
                Dimension::ProcessAbb,
                Dimension::PollutantName,
            ],
        }
    }

    /// Key columns followed by label columns, in declared order.
    pub fn dimensions(&self) -> Vec<Dimension> {
        self.idx.iter().chain(self.labels.iter()).copied().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRow {
    pub keys: Vec<KeyValue>,
    pub value: f64,
}

/// A table of dimension columns plus one summed value column.
///
/// Used for detailed tables, aggregate sheets and their read-back form.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedTable {
    pub kind: TableKind,
    pub dimensions: Vec<Dimension>,
    pub rows: Vec<KeyedRow>,
}

impl KeyedTable {
    pub fn new(kind: TableKind, dimensions: Vec<Dimension>) -> Self {
        Self {
            kind,
            dimensions,
            rows: Vec::new(),
        }
    }

    pub fn position(&self, dim: Dimension) -> Option<usize> {
        self.dimensions.iter().position(|candidate| *candidate == dim)
    }

    pub fn has(&self, dim: Dimension) -> bool {
        self.position(dim).is_some()
    }

    /// Header row: dimension columns then the value column.
    pub fn column_names(&self) -> Vec<String> {
        self.dimensions
            .iter()
            .map(|dim| dim.column_name().to_string())
            .chain(std::iter::once(self.kind.value_column().to_string()))
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|row| row.value).sum()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The two canonical detailed tables of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedTables {
    pub activity: KeyedTable,
    pub emissions: KeyedTable,
}

impl DetailedTables {
    pub fn table(&self, kind: TableKind) -> &KeyedTable {
        match kind {
            TableKind::Activity => &self.activity,
            TableKind::Emissions => &self.emissions,
        }
    }
}
