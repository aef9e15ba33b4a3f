use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, KeyValue};
use crate::enums::{ActivityType, InventoryType};

/// Sentinel used for functional class and area type of off-network records.
pub const OFF_NETWORK_ID: i64 = -99;

/// Identity of one run: every record produced by the run shares it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub area: String,
    pub year: i64,
    pub season: String,
    pub day_type: String,
}

impl ScenarioKey {
    pub fn new(
        area: impl Into<String>,
        year: i64,
        season: impl Into<String>,
        day_type: impl Into<String>,
    ) -> Self {
        Self {
            area: area.into(),
            year,
            season: season.into(),
            day_type: day_type.into(),
        }
    }

    pub fn dimension(&self, dim: Dimension) -> Option<KeyValue> {
        match dim {
            Dimension::Area => Some(KeyValue::Text(self.area.clone())),
            Dimension::Year => Some(KeyValue::Int(self.year)),
            Dimension::Season => Some(KeyValue::Text(self.season.clone())),
            Dimension::DayType => Some(KeyValue::Text(self.day_type.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.area, self.year, self.season, self.day_type
        )
    }
}

/// Location and vehicle classification shared by activity and emissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleKey {
    pub fips: i64,
    pub hour: i64,
    pub func_class_id: i64,
    pub area_type_id: i64,
    pub source_use_type_id: i64,
    pub fuel_type_id: i64,
}

impl VehicleKey {
    pub fn is_off_network(&self) -> bool {
        self.func_class_id == OFF_NETWORK_ID && self.area_type_id == OFF_NETWORK_ID
    }

    /// The (functional class, area type) pair resolved through the road type mapping.
    pub fn road_pair(&self) -> (i64, i64) {
        (self.func_class_id, self.area_type_id)
    }

    pub fn dimension(&self, dim: Dimension) -> Option<KeyValue> {
        let value = match dim {
            Dimension::Fips => self.fips,
            Dimension::Hour => self.hour,
            Dimension::FuncClassId => self.func_class_id,
            Dimension::AreaTypeId => self.area_type_id,
            Dimension::SourceUseTypeId => self.source_use_type_id,
            Dimension::FuelTypeId => self.fuel_type_id,
            _ => return None,
        };
        Some(KeyValue::Int(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub key: VehicleKey,
    pub act_type: ActivityType,
    pub activity: f64,
    /// Empty when the activity type has no unit mapping.
    pub activity_units: String,
}

impl ActivityRecord {
    /// Uniqueness key within a run.
    pub fn identity(&self) -> (VehicleKey, ActivityType) {
        (self.key, self.act_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsRecord {
    pub key: VehicleKey,
    pub inventory: InventoryType,
    pub pollutant_id: i64,
    /// Output pollutant code; one source pollutant may fan out to several codes.
    pub pollutant_code: String,
    pub process_id: i64,
    pub act_type: ActivityType,
    pub emission: f64,
    pub emission_units: String,
}

impl EmissionsRecord {
    /// Uniqueness key within a run, including the output pollutant code so
    /// fanned-out copies stay distinct.
    pub fn identity(&self) -> (InventoryType, VehicleKey, i64, String, i64, ActivityType) {
        (
            self.inventory,
            self.key,
            self.pollutant_id,
            self.pollutant_code.clone(),
            self.process_id,
            self.act_type,
        )
    }
}

/// Normalized records tagged with the run's single scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioTable<R> {
    pub scenario: ScenarioKey,
    pub records: Vec<R>,
}

impl<R> ScenarioTable<R> {
    pub fn new(scenario: ScenarioKey, records: Vec<R>) -> Self {
        Self { scenario, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub type ActivityTable = ScenarioTable<ActivityRecord>;
pub type EmissionsTable = ScenarioTable<EmissionsRecord>;
