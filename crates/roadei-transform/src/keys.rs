//! Locating and completing the vehicle key of a renamed source table.

use std::collections::BTreeSet;

use roadei_ingest::{SourceTable, parse_float_cell, parse_int_cell};
use roadei_model::{CategoryRule, Dimension, OFF_NETWORK_ID, Result, RoadEiError, VehicleKey};

/// Canonical names of the columns that make up a [`VehicleKey`].
pub const KEY_COLUMNS: [Dimension; 6] = [
    Dimension::Fips,
    Dimension::Hour,
    Dimension::FuncClassId,
    Dimension::AreaTypeId,
    Dimension::SourceUseTypeId,
    Dimension::FuelTypeId,
];

pub fn is_key_column(name: &str) -> bool {
    KEY_COLUMNS.iter().any(|dim| dim.column_name() == name)
}

#[derive(Debug, Clone, Copy)]
enum VehicleSource {
    Columns(usize, usize),
    Pinned(i64, i64),
}

/// Column positions of the vehicle key in one source table.
///
/// Columns a category rule fills in are not looked up.
#[derive(Debug, Clone, Copy)]
pub struct KeyColumns {
    fips: usize,
    hour: usize,
    road: Option<(usize, usize)>,
    vehicle: VehicleSource,
}

impl KeyColumns {
    pub fn locate(table: &SourceTable, rule: &CategoryRule) -> Result<Self> {
        let col = |dim: Dimension| table.require_column(dim.column_name());
        let road = if rule.off_network {
            None
        } else {
            Some((col(Dimension::FuncClassId)?, col(Dimension::AreaTypeId)?))
        };
        let vehicle = match rule.pinned {
            Some(pinned) => VehicleSource::Pinned(pinned.source_use_type_id, pinned.fuel_type_id),
            None => VehicleSource::Columns(
                col(Dimension::SourceUseTypeId)?,
                col(Dimension::FuelTypeId)?,
            ),
        };
        Ok(Self {
            fips: col(Dimension::Fips)?,
            hour: col(Dimension::Hour)?,
            road,
            vehicle,
        })
    }

    pub fn fips(&self, table: &SourceTable, row: &[String]) -> Result<i64> {
        int_cell(table, row, self.fips, Dimension::Fips)
    }

    /// Builds the key for `row`, applying off-network sentinels and pinned
    /// vehicles.
    pub fn vehicle_key(&self, table: &SourceTable, row: &[String]) -> Result<VehicleKey> {
        let (func_class_id, area_type_id) = match self.road {
            Some((fc, at)) => (
                int_cell(table, row, fc, Dimension::FuncClassId)?,
                int_cell(table, row, at, Dimension::AreaTypeId)?,
            ),
            None => (OFF_NETWORK_ID, OFF_NETWORK_ID),
        };
        let (source_use_type_id, fuel_type_id) = match self.vehicle {
            VehicleSource::Columns(sut, ft) => (
                int_cell(table, row, sut, Dimension::SourceUseTypeId)?,
                int_cell(table, row, ft, Dimension::FuelTypeId)?,
            ),
            VehicleSource::Pinned(sut, ft) => (sut, ft),
        };
        Ok(VehicleKey {
            fips: self.fips(table, row)?,
            hour: int_cell(table, row, self.hour, Dimension::Hour)?,
            func_class_id,
            area_type_id,
            source_use_type_id,
            fuel_type_id,
        })
    }
}

pub fn int_cell(table: &SourceTable, row: &[String], idx: usize, dim: Dimension) -> Result<i64> {
    parse_int_cell(&row[idx]).ok_or_else(|| {
        RoadEiError::invalid_value(
            table.path.display().to_string(),
            dim.column_name(),
            row[idx].clone(),
        )
    })
}

/// Parses a value cell; an empty cell is `None`.
pub fn value_cell(table: &SourceTable, row: &[String], idx: usize) -> Result<Option<f64>> {
    let raw = &row[idx];
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_float_cell(raw).map(Some).ok_or_else(|| {
        RoadEiError::invalid_value(
            table.path.display().to_string(),
            table.headers[idx].clone(),
            raw.clone(),
        )
    })
}

/// Rows whose county is in the inclusive selection.
pub fn selected_rows<'t>(
    table: &'t SourceTable,
    keys: &KeyColumns,
    counties: &BTreeSet<i64>,
) -> Result<Vec<&'t [String]>> {
    let mut selected = Vec::new();
    for row in &table.rows {
        if counties.contains(&keys.fips(table, row)?) {
            selected.push(row.as_slice());
        }
    }
    Ok(selected)
}
