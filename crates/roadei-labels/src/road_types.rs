use std::path::Path;

use tracing::{debug, error};

use roadei_ingest::{ReadOptions, parse_int_cell, read_source_table};
use roadei_model::{
    ConfigMismatch, Result, RoadEiError, RoadTypeMapping, RoadTypeRow, RoadTypeSource,
};

const AREA: &str = "Area";
const FUNC_CLASS_CODE: &str = "TDM_FunctionClass_Code";
const FUNC_CLASS: &str = "FunctionClass";
const AREA_TYPE_CODE: &str = "TDM_AreaType_Code";
const AREA_TYPE: &str = "AreaType";
const ROAD_TYPE_ID: &str = "MOVES_RoadTypeID";

/// Loads the road type designation file and keeps the rows for `run_area`.
///
/// `source` picks which rows stand for the area: the area's own network
/// rows or the statewide `VLink` rows. The result always includes the
/// off-network row.
///
/// # Errors
///
/// Fails when the file is unreadable, a column is missing, or no row
/// matches the selected area.
pub fn load_road_type_mapping(
    path: &Path,
    source: RoadTypeSource,
    run_area: &str,
) -> Result<RoadTypeMapping> {
    let table = read_source_table(path, &ReadOptions::comma())?;
    let area_idx = table.require_column(AREA)?;
    let fc_idx = table.require_column(FUNC_CLASS_CODE)?;
    let fc_name_idx = table.require_column(FUNC_CLASS)?;
    let at_idx = table.require_column(AREA_TYPE_CODE)?;
    let at_name_idx = table.require_column(AREA_TYPE)?;
    let rt_idx = table.require_column(ROAD_TYPE_ID)?;

    let wanted = source.mapping_area(run_area);
    let int = |row: &[String], idx: usize, column: &str| {
        parse_int_cell(&row[idx]).ok_or_else(|| {
            RoadEiError::invalid_value(path.display().to_string(), column, row[idx].clone())
        })
    };
    let mut rows = Vec::new();
    for row in table.rows.iter().filter(|row| row[area_idx] == wanted) {
        let row = row.as_slice();
        rows.push(RoadTypeRow {
            area: run_area.to_string(),
            func_class_id: int(row, fc_idx, FUNC_CLASS_CODE)?,
            func_class: row[fc_name_idx].clone(),
            area_type_id: int(row, at_idx, AREA_TYPE_CODE)?,
            area_type: row[at_name_idx].clone(),
            road_type_id: int(row, rt_idx, ROAD_TYPE_ID)?,
        });
    }
    if rows.is_empty() {
        error!(area = wanted, path = %path.display(), "area not in road type mapping");
        return Err(ConfigMismatch::AreaNotInRoadTypeMapping {
            area: wanted.to_string(),
        }
        .into());
    }
    debug!(area = wanted, rows = rows.len(), "loaded road type mapping");
    Ok(RoadTypeMapping::new(run_area, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: &str = "Area,TDM_FunctionClass_Code,FunctionClass,TDM_AreaType_Code,AreaType,MOVES_RoadTypeID,MOVES_RoadType\n\
HGB,1,Interstate,2,Urban,4,Urban Restricted\n\
HGB,3,Arterial,2,Urban,5,Urban Unrestricted\n\
VLink,1,Interstate,2,Urban,2,Rural Restricted\n";

    fn write_mapping() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("RoadType_Designation.csv");
        std::fs::write(&path, MAPPING).expect("write mapping");
        (dir, path)
    }

    #[test]
    fn tdm_source_keeps_area_rows() {
        let (_dir, path) = write_mapping();
        let mapping = load_road_type_mapping(&path, RoadTypeSource::Tdm, "HGB").expect("load");
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.get(1, 2).map(|row| row.road_type_id), Some(4));
        assert!(mapping.contains((-99, -99)));
    }

    #[test]
    fn hpms_source_uses_vlink_rows_for_any_area() {
        let (_dir, path) = write_mapping();
        let mapping = load_road_type_mapping(&path, RoadTypeSource::Hpms, "ELP").expect("load");
        assert_eq!(mapping.get(1, 2).map(|row| row.road_type_id), Some(2));
        assert_eq!(mapping.area(), "ELP");
    }

    #[test]
    fn unknown_area_is_a_config_mismatch() {
        let (_dir, path) = write_mapping();
        let err = load_road_type_mapping(&path, RoadTypeSource::Tdm, "DFW").unwrap_err();
        assert_eq!(
            err.as_config_mismatch(),
            Some(&ConfigMismatch::AreaNotInRoadTypeMapping {
                area: "DFW".to_string()
            })
        );
    }
}
