//! Label joining and projection onto the configured detailed schema.
//!
//! Joins run in a fixed order: road type mapping, road type label, source
//! use type label, fuel type label, county name, then the table-specific
//! labels (activity type label; or process and pollutant names). Rows that
//! fail an inner join are dropped and counted; the count is logged per
//! lookup table.

use std::collections::BTreeMap;

use tracing::warn;

use roadei_model::{
    ActivityTable, ActivityType, Dimension, EmissionsRecord, EmissionsTable, InventoryType,
    KeyValue, KeyedRow, KeyedTable, LabelTables, ProcessLabel, Result, RoadEiError,
    RoadTypeMapping, RoadTypeRow, ScenarioKey, TableKind, TableSchema, TypeLabel, VehicleKey,
};

use crate::classification::{classification_code, sut_ft_label};

/// Dimensions every detailed table can carry.
const COMMON_DIMENSIONS: [Dimension; 22] = [
    Dimension::Area,
    Dimension::Year,
    Dimension::Season,
    Dimension::DayType,
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
    Dimension::EiType,
];

/// Whether a table of `kind` can provide `dim`.
pub fn provides(kind: TableKind, dim: Dimension) -> bool {
    match kind {
        TableKind::Activity => {
            (dim != Dimension::EiType && COMMON_DIMENSIONS.contains(&dim))
                || dim == Dimension::ActivityUnits
        }
        TableKind::Emissions => {
            COMMON_DIMENSIONS.contains(&dim)
                || matches!(
                    dim,
                    Dimension::ProcessId
                        | Dimension::ProcessAbb
                        | Dimension::ProcessName
                        | Dimension::PollutantId
                        | Dimension::PollutantCode
                        | Dimension::PollutantName
                        | Dimension::EmissionUnits
                )
        }
    }
}

/// Fails with a data-shape error naming the first schema column `kind`
/// cannot provide.
pub fn check_schema(kind: TableKind, schema: &TableSchema) -> Result<()> {
    match schema.dimensions().into_iter().find(|dim| !provides(kind, *dim)) {
        Some(dim) => Err(RoadEiError::data_shape(kind.to_string(), dim.column_name())),
        None => Ok(()),
    }
}

/// Labels shared by activity and emissions rows.
struct CommonLabels<'l> {
    scenario: &'l ScenarioKey,
    key: VehicleKey,
    road: &'l RoadTypeRow,
    road_label: &'l TypeLabel,
    sut: &'l TypeLabel,
    ft: &'l TypeLabel,
    county: &'l str,
    act_type: ActivityType,
    act_label: Option<&'l str>,
}

impl CommonLabels<'_> {
    fn dimension(&self, dim: Dimension) -> Option<KeyValue> {
        if let Some(value) = self.scenario.dimension(dim) {
            return Some(value);
        }
        if let Some(value) = self.key.dimension(dim) {
            return Some(value);
        }
        let value = match dim {
            Dimension::CountyName => KeyValue::from(self.county),
            Dimension::FuncClass => KeyValue::from(self.road.func_class.as_str()),
            Dimension::AreaType => KeyValue::from(self.road.area_type.as_str()),
            Dimension::RoadTypeId => KeyValue::Int(self.road.road_type_id),
            Dimension::RoadTypeLabel => KeyValue::from(self.road_label.label.as_str()),
            Dimension::SutLabel => KeyValue::from(self.sut.label.as_str()),
            Dimension::FtLabel => KeyValue::from(self.ft.label.as_str()),
            Dimension::SutFtLabel => KeyValue::Text(sut_ft_label(&self.sut.label, &self.ft.label)),
            Dimension::Scc => KeyValue::Text(classification_code(
                self.key.fuel_type_id,
                self.key.source_use_type_id,
            )),
            Dimension::ActType => KeyValue::from(self.act_type.as_str()),
            Dimension::ActTypeLabel => KeyValue::from(self.act_label.unwrap_or_default()),
            _ => return None,
        };
        Some(value)
    }
}

struct EmissionsLabels<'l> {
    inventory: InventoryType,
    record: &'l EmissionsRecord,
    process: Option<&'l ProcessLabel>,
    pollutant_name: &'l str,
}

impl EmissionsLabels<'_> {
    fn dimension(&self, dim: Dimension) -> Option<KeyValue> {
        let value = match dim {
            Dimension::EiType => KeyValue::from(self.inventory.as_str()),
            Dimension::ProcessId => KeyValue::Int(self.record.process_id),
            Dimension::ProcessAbb => {
                KeyValue::from(self.process.map_or("", |p| p.abbreviation.as_str()))
            }
            Dimension::ProcessName => KeyValue::from(self.process.map_or("", |p| p.name.as_str())),
            Dimension::PollutantId => KeyValue::Int(self.record.pollutant_id),
            Dimension::PollutantCode => KeyValue::from(self.record.pollutant_code.as_str()),
            Dimension::PollutantName => KeyValue::from(self.pollutant_name),
            Dimension::EmissionUnits => KeyValue::from(self.record.emission_units.as_str()),
            _ => return None,
        };
        Some(value)
    }
}

/// Rows dropped by each inner join.
#[derive(Debug, Default)]
struct DropCounts(BTreeMap<&'static str, usize>);

impl DropCounts {
    fn drop_row(&mut self, lookup: &'static str) {
        *self.0.entry(lookup).or_default() += 1;
    }

    fn report(&self, kind: TableKind) {
        for (lookup, count) in &self.0 {
            warn!(table = %kind, lookup, dropped = count, "rows without a label were dropped");
        }
    }
}

/// Attaches labels and derived fields to normalized tables.
#[derive(Debug, Clone, Copy)]
pub struct LabelJoiner<'a> {
    labels: &'a LabelTables,
    mapping: &'a RoadTypeMapping,
}

impl<'a> LabelJoiner<'a> {
    pub fn new(labels: &'a LabelTables, mapping: &'a RoadTypeMapping) -> Self {
        Self { labels, mapping }
    }

    fn common<'s>(
        &'s self,
        scenario: &'s ScenarioKey,
        key: VehicleKey,
        act_type: ActivityType,
        drops: &mut DropCounts,
    ) -> Option<CommonLabels<'s>> {
        let Some(road) = self.mapping.get(key.func_class_id, key.area_type_id) else {
            drops.drop_row("road type mapping");
            return None;
        };
        let Some(road_label) = self.labels.road_types.get(&road.road_type_id) else {
            drops.drop_row("road type labels");
            return None;
        };
        let Some(sut) = self.labels.source_use_types.get(&key.source_use_type_id) else {
            drops.drop_row("source use type labels");
            return None;
        };
        let Some(ft) = self.labels.fuel_types.get(&key.fuel_type_id) else {
            drops.drop_row("fuel type labels");
            return None;
        };
        let Some(county) = self.labels.counties.get(&key.fips) else {
            drops.drop_row("county names");
            return None;
        };
        Some(CommonLabels {
            scenario,
            key,
            road,
            road_label,
            sut,
            ft,
            county,
            act_type,
            act_label: self.labels.activity_types.get(&act_type).map(String::as_str),
        })
    }

    /// Labels activity records and projects them onto `schema`.
    ///
    /// Activity types without a label are dropped like any other failed join.
    pub fn join_activity(&self, table: &ActivityTable, schema: &TableSchema) -> Result<KeyedTable> {
        check_schema(TableKind::Activity, schema)?;
        let dims = schema.dimensions();
        let mut out = KeyedTable::new(TableKind::Activity, dims.clone());
        let mut drops = DropCounts::default();
        for record in &table.records {
            let Some(common) = self.common(&table.scenario, record.key, record.act_type, &mut drops)
            else {
                continue;
            };
            if common.act_label.is_none() {
                drops.drop_row("activity type labels");
                continue;
            }
            let keys = project(&dims, TableKind::Activity, |dim| match dim {
                Dimension::ActivityUnits => Some(KeyValue::from(record.activity_units.as_str())),
                _ => common.dimension(dim),
            })?;
            out.rows.push(KeyedRow {
                keys,
                value: record.activity,
            });
        }
        drops.report(TableKind::Activity);
        Ok(out)
    }

    /// Labels emissions records and projects them onto `schema`.
    ///
    /// Process labels are optional; pollutant names are required.
    pub fn join_emissions(
        &self,
        table: &EmissionsTable,
        schema: &TableSchema,
    ) -> Result<KeyedTable> {
        check_schema(TableKind::Emissions, schema)?;
        let dims = schema.dimensions();
        let mut out = KeyedTable::new(TableKind::Emissions, dims.clone());
        let mut drops = DropCounts::default();
        for record in &table.records {
            let Some(common) = self.common(&table.scenario, record.key, record.act_type, &mut drops)
            else {
                continue;
            };
            let Some(pollutant_name) = self.labels.pollutants.get(&record.pollutant_id) else {
                drops.drop_row("pollutant names");
                continue;
            };
            let extra = EmissionsLabels {
                inventory: record.inventory,
                record,
                process: self.labels.processes.get(&record.process_id),
                pollutant_name,
            };
            let keys = project(&dims, TableKind::Emissions, |dim| {
                extra.dimension(dim).or_else(|| common.dimension(dim))
            })?;
            out.rows.push(KeyedRow {
                keys,
                value: record.emission,
            });
        }
        drops.report(TableKind::Emissions);
        Ok(out)
    }
}

fn project(
    dims: &[Dimension],
    kind: TableKind,
    lookup: impl Fn(Dimension) -> Option<KeyValue>,
) -> Result<Vec<KeyValue>> {
    dims.iter()
        .map(|dim| {
            lookup(*dim).ok_or_else(|| RoadEiError::data_shape(kind.to_string(), dim.column_name()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_cannot_carry_pollutant_columns() {
        assert!(!provides(TableKind::Activity, Dimension::PollutantCode));
        assert!(!provides(TableKind::Activity, Dimension::EiType));
        assert!(provides(TableKind::Activity, Dimension::ActivityUnits));
        assert!(!provides(TableKind::Emissions, Dimension::ActivityUnits));
        assert!(provides(TableKind::Emissions, Dimension::EiType));
    }

    fn labels() -> LabelTables {
        let label = |text: &str| TypeLabel {
            description: text.to_string(),
            label: text.to_string(),
        };
        LabelTables {
            counties: BTreeMap::from([(48201, "Harris".to_string())]),
            road_types: BTreeMap::from([(3, label("RUnr"))]),
            source_use_types: BTreeMap::from([(21, label("PC"))]),
            fuel_types: BTreeMap::from([(1, label("Gas"))]),
            activity_types: BTreeMap::from([(
                ActivityType::Vmt,
                "Vehicle Miles Travelled".to_string(),
            )]),
            ..LabelTables::default()
        }
    }

    fn record(act_type: ActivityType, activity: f64) -> roadei_model::ActivityRecord {
        roadei_model::ActivityRecord {
            key: VehicleKey {
                fips: 48201,
                hour: 1,
                func_class_id: 1,
                area_type_id: 2,
                source_use_type_id: 21,
                fuel_type_id: 1,
            },
            act_type,
            activity,
            activity_units: "miles".to_string(),
        }
    }

    #[test]
    fn unlabeled_activity_types_are_dropped() {
        let labels = labels();
        let mapping = RoadTypeMapping::new(
            "HGB",
            [RoadTypeRow {
                area: "HGB".to_string(),
                func_class_id: 1,
                func_class: "Interstate".to_string(),
                area_type_id: 2,
                area_type: "Suburban".to_string(),
                road_type_id: 3,
            }],
        );
        let table = ActivityTable::new(
            ScenarioKey::new("HGB", 2020, "Summer", "Weekday"),
            vec![record(ActivityType::Vmt, 100.0), record(ActivityType::Vht, 2.0)],
        );
        let schema = TableSchema::default_activity();
        let out = LabelJoiner::new(&labels, &mapping)
            .join_activity(&table, &schema)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows[0].value, 100.0);
        let label = out.position(Dimension::ActTypeLabel).unwrap();
        assert_eq!(out.rows[0].keys[label], KeyValue::from("Vehicle Miles Travelled"));
    }

    #[test]
    fn default_schemas_are_valid() {
        check_schema(TableKind::Activity, &TableSchema::default_activity()).unwrap();
        check_schema(TableKind::Emissions, &TableSchema::default_emissions()).unwrap();
    }

    #[test]
    fn bad_schema_names_the_column() {
        let schema = TableSchema {
            idx: vec![Dimension::Fips, Dimension::PollutantId],
            labels: vec![],
        };
        let err = check_schema(TableKind::Activity, &schema).unwrap_err();
        assert!(
            matches!(err, RoadEiError::DataShape { ref column, .. } if column == "pollutantID")
        );
    }
}
