use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::ActivityType;
use crate::record::OFF_NETWORK_ID;

/// Road type assigned to off-network records.
pub const OFF_NETWORK_ROAD_TYPE: i64 = 1;

/// Description and short label of a MOVES lookup entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLabel {
    pub description: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLabel {
    pub name: String,
    pub abbreviation: String,
}

/// Names of the lookup tables a label service provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelTableName {
    County,
    EmissionProcess,
    Pollutant,
    RoadType,
    SourceUseType,
    FuelType,
    ActivityType,
}

impl LabelTableName {
    pub const ALL: [LabelTableName; 7] = [
        LabelTableName::County,
        LabelTableName::EmissionProcess,
        LabelTableName::Pollutant,
        LabelTableName::RoadType,
        LabelTableName::SourceUseType,
        LabelTableName::FuelType,
        LabelTableName::ActivityType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelTableName::County => "county",
            LabelTableName::EmissionProcess => "emisprc",
            LabelTableName::Pollutant => "pollutants",
            LabelTableName::RoadType => "moves_roadtypes",
            LabelTableName::SourceUseType => "moves_sut",
            LabelTableName::FuelType => "moves_ft",
            LabelTableName::ActivityType => "act_lab",
        }
    }
}

/// Lookup tables used to label normalized records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelTables {
    pub counties: BTreeMap<i64, String>,
    pub processes: BTreeMap<i64, ProcessLabel>,
    pub pollutants: BTreeMap<i64, String>,
    pub road_types: BTreeMap<i64, TypeLabel>,
    pub source_use_types: BTreeMap<i64, TypeLabel>,
    pub fuel_types: BTreeMap<i64, TypeLabel>,
    pub activity_types: BTreeMap<ActivityType, String>,
}

/// One row of the area road type mapping file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadTypeRow {
    pub area: String,
    pub func_class_id: i64,
    pub func_class: String,
    pub area_type_id: i64,
    pub area_type: String,
    pub road_type_id: i64,
}

impl RoadTypeRow {
    pub fn off_network(area: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            func_class_id: OFF_NETWORK_ID,
            func_class: "Off-Network".to_string(),
            area_type_id: OFF_NETWORK_ID,
            area_type: "N/A".to_string(),
            road_type_id: OFF_NETWORK_ROAD_TYPE,
        }
    }
}

/// Road type mapping filtered to a single area, keyed by
/// (functional class, area type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadTypeMapping {
    area: String,
    rows: BTreeMap<(i64, i64), RoadTypeRow>,
}

impl RoadTypeMapping {
    /// Builds the mapping and appends the synthetic off-network row.
    ///
    /// Later rows win on duplicate keys.
    pub fn new(area: impl Into<String>, rows: impl IntoIterator<Item = RoadTypeRow>) -> Self {
        let area = area.into();
        let mut by_pair: BTreeMap<(i64, i64), RoadTypeRow> = rows
            .into_iter()
            .map(|row| ((row.func_class_id, row.area_type_id), row))
            .collect();
        let off_network = RoadTypeRow::off_network(area.clone());
        by_pair.insert(
            (off_network.func_class_id, off_network.area_type_id),
            off_network,
        );
        Self {
            area,
            rows: by_pair,
        }
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn get(&self, func_class_id: i64, area_type_id: i64) -> Option<&RoadTypeRow> {
        self.rows.get(&(func_class_id, area_type_id))
    }

    pub fn contains(&self, pair: (i64, i64)) -> bool {
        self.rows.contains_key(&pair)
    }

    pub fn rows(&self) -> impl Iterator<Item = &RoadTypeRow> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
