//! Resolved run configuration.
//!
//! A `RunConfig` is built once from a run file and passed by reference to
//! every pipeline stage. All paths are absolute or relative to the process
//! working directory by the time they land here.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::category::CategoryRules;
use crate::enums::{ActivityType, InventoryType};
use crate::pollutant::PollutantMapping;
use crate::record::ScenarioKey;
use crate::table::TableSchema;
use crate::units::ConversionTable;
use crate::view::AggregationView;

/// Which pipeline stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSelection {
    #[serde(default = "default_true")]
    pub detailed: bool,
    #[serde(default = "default_true")]
    pub aggregate: bool,
    #[serde(default = "default_true")]
    pub xml: bool,
}

impl Default for StageSelection {
    fn default() -> Self {
        Self {
            detailed: true,
            aggregate: true,
            xml: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Row set of the road type mapping file to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadTypeSource {
    /// Rows for the run area from the travel demand model network.
    #[default]
    Tdm,
    /// Statewide HPMS-based rows.
    Hpms,
}

impl RoadTypeSource {
    /// Mapping-file area value to select for a run area.
    pub fn mapping_area<'a>(&self, run_area: &'a str) -> &'a str {
        match self {
            RoadTypeSource::Tdm => run_area,
            RoadTypeSource::Hpms => "VLink",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadTypeSettings {
    pub file: PathBuf,
    #[serde(default)]
    pub source: RoadTypeSource,
}

/// Source header to canonical column, per table kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRules {
    #[serde(default = "default_activity_rename")]
    pub activity: BTreeMap<String, String>,
    #[serde(default = "default_emission_rename")]
    pub emissions: BTreeMap<String, String>,
}

impl Default for RenameRules {
    fn default() -> Self {
        Self {
            activity: default_activity_rename(),
            emissions: default_emission_rename(),
        }
    }
}

const KEY_RENAMES: [(&str, &str); 8] = [
    ("County", "FIPS"),
    ("Hour", "hour"),
    ("SUT", "sourceUseTypeID"),
    ("Soucetype", "sourceUseTypeID"),
    ("Sourcetype", "sourceUseTypeID"),
    ("Fueltype", "fuelTypeID"),
    ("Roadtype", "funcClassID"),
    ("Areatype", "areaTypeID"),
];

fn with_key_renames(extra: &[(&str, &str)]) -> BTreeMap<String, String> {
    KEY_RENAMES
        .iter()
        .chain(extra.iter())
        .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
        .collect()
}

fn default_activity_rename() -> BTreeMap<String, String> {
    with_key_renames(&[
        ("VMT Calculated", "VMT"),
        ("VHT Calculated", "VHT"),
        ("Speed", "Speed"),
        ("SHEI Calculated", "SHEI"),
        ("APU Calculated", "APU"),
        ("Adjust SHP Calculated", "activity"),
        ("ONI Calculated", "activity"),
        ("Starts Calculated", "activity"),
    ])
}

fn default_emission_rename() -> BTreeMap<String, String> {
    with_key_renames(&[
        ("Pollutant", "pollutantID"),
        ("Process", "processID"),
        ("Unit", "emissionunits"),
        ("Adjusted SHP Emission", "emission"),
        ("ONI Emission", "emission"),
        ("VMT_Emission", "emission"),
        ("Start Emission", "emission"),
        ("Emission", "emission"),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProperty {
    pub name: String,
    pub value: String,
}

/// Exchange-network header of the reporting document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub document_title: String,
    /// RFC 3339 timestamp; the current UTC time when absent.
    #[serde(default)]
    pub creation_date_time: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub data_flow_name: String,
    #[serde(default)]
    pub properties: Vec<DocumentProperty>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPayload {
    #[serde(default)]
    pub user_identifier: String,
    #[serde(default)]
    pub program_system_code: String,
    /// Defaults to the XML scenario year.
    #[serde(default)]
    pub emissions_year: Option<i64>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub model_version: String,
    #[serde(default)]
    pub submittal_comment: String,
}

/// Scenario and metadata of the reporting document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlSettings {
    pub pollutant_codes: Vec<String>,
    pub year: i64,
    pub season: String,
    pub day_type: String,
    pub header: DocumentHeader,
    pub payload: DocumentPayload,
}

impl XmlSettings {
    pub fn emissions_year(&self) -> i64 {
        self.payload.emissions_year.unwrap_or(self.year)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub scenario: ScenarioKey,
    /// Inclusive county filter.
    pub counties: BTreeSet<i64>,
    pub inventory_types: Vec<InventoryType>,
    pub output_dir: PathBuf,
    pub stages: StageSelection,
    pub activity_files: BTreeMap<String, PathBuf>,
    pub emission_files: BTreeMap<InventoryType, BTreeMap<String, PathBuf>>,
    pub pollutants: PollutantMapping,
    pub conversions: ConversionTable,
    pub activity_units: BTreeMap<ActivityType, String>,
    pub road_types: RoadTypeSettings,
    pub labels_dir: PathBuf,
    pub activity_schema: TableSchema,
    pub emissions_schema: TableSchema,
    pub rename: RenameRules,
    pub categories: CategoryRules,
    pub views: Vec<AggregationView>,
    pub xml: XmlSettings,
}

impl RunConfig {
    /// Emission files of the selected inventory types, in inventory order.
    pub fn selected_emission_files(
        &self,
    ) -> impl Iterator<Item = (InventoryType, &BTreeMap<String, PathBuf>)> {
        self.inventory_types.iter().filter_map(|inventory| {
            self.emission_files
                .get(inventory)
                .map(|files| (*inventory, files))
        })
    }
}

/// Activity type to unit, as reported by the modeling tool.
pub fn default_activity_units() -> BTreeMap<ActivityType, String> {
    ActivityType::ALL
        .into_iter()
        .map(|kind| (kind, kind.default_unit().to_string()))
        .collect()
}
