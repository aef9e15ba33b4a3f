//! Label service: the reference lookups used to describe normalized records.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use roadei_ingest::{ReadOptions, SourceTable, parse_int_cell, read_source_table};
use roadei_model::{
    ActivityType, LabelTableName, LabelTables, ProcessLabel, Result, RoadEiError, TypeLabel,
};

/// Provider of the fixed set of label tables.
///
/// Implementations acquire whatever backing resource they need inside
/// `load` and release it before returning, on success and on error.
pub trait LabelService: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// Loads every table named by [`LabelTableName`].
    ///
    /// # Errors
    ///
    /// Returns an error when a table is missing or lacks an expected column.
    fn load(&self) -> Result<LabelTables>;
}

/// Label tables stored as `<name>.csv` files in one directory.
#[derive(Debug, Clone)]
pub struct CsvLabelDirectory {
    dir: PathBuf,
}

impl CsvLabelDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, table: LabelTableName) -> PathBuf {
        self.dir.join(format!("{}.csv", table.as_str()))
    }

    fn read(&self, table: LabelTableName) -> Result<SourceTable> {
        let path = self.path_for(table);
        let source = read_source_table(&path, &ReadOptions::comma())?;
        debug!(table = table.as_str(), rows = source.len(), "loaded label table");
        Ok(source)
    }
}

impl LabelService for CsvLabelDirectory {
    fn describe(&self) -> String {
        format!("label directory {}", self.dir.display())
    }

    fn load(&self) -> Result<LabelTables> {
        let counties = text_by_id(&self.read(LabelTableName::County)?, "FIPS", "countyName")?;
        let processes = process_labels(&self.read(LabelTableName::EmissionProcess)?)?;
        let pollutants = text_by_id(
            &self.read(LabelTableName::Pollutant)?,
            "pollutantID",
            "pollutantName",
        )?;
        let road_types = type_labels(
            &self.read(LabelTableName::RoadType)?,
            "mvsRoadTypeID",
            "mvsRoadTypeLab",
        )?;
        let source_use_types = type_labels(
            &self.read(LabelTableName::SourceUseType)?,
            "sourceUseTypeID",
            "sutLab",
        )?;
        let fuel_types = type_labels(&self.read(LabelTableName::FuelType)?, "fuelTypeID", "ftLab")?;
        let activity_types = activity_labels(&self.read(LabelTableName::ActivityType)?)?;
        Ok(LabelTables {
            counties,
            processes,
            pollutants,
            road_types,
            source_use_types,
            fuel_types,
            activity_types,
        })
    }
}

fn table_name(source: &SourceTable) -> String {
    source.path.display().to_string()
}

fn id_cell(source: &SourceTable, row: &[String], idx: usize, column: &str) -> Result<i64> {
    parse_int_cell(&row[idx])
        .ok_or_else(|| RoadEiError::invalid_value(table_name(source), column, row[idx].clone()))
}

fn text_by_id(source: &SourceTable, id: &str, text: &str) -> Result<BTreeMap<i64, String>> {
    let id_idx = source.require_column(id)?;
    let text_idx = source.require_column(text)?;
    source
        .rows
        .iter()
        .map(|row| Ok((id_cell(source, row, id_idx, id)?, row[text_idx].clone())))
        .collect()
}

fn type_labels(source: &SourceTable, id: &str, label: &str) -> Result<BTreeMap<i64, TypeLabel>> {
    let id_idx = source.require_column(id)?;
    let desc_idx = source.require_column("desc")?;
    let label_idx = source.require_column(label)?;
    source
        .rows
        .iter()
        .map(|row| {
            Ok((
                id_cell(source, row, id_idx, id)?,
                TypeLabel {
                    description: row[desc_idx].clone(),
                    label: row[label_idx].clone(),
                },
            ))
        })
        .collect()
}

fn process_labels(source: &SourceTable) -> Result<BTreeMap<i64, ProcessLabel>> {
    let id_idx = source.require_column("processID")?;
    let name_idx = source.require_column("processName")?;
    let abb_idx = source.require_column("processABB")?;
    source
        .rows
        .iter()
        .map(|row| {
            Ok((
                id_cell(source, row, id_idx, "processID")?,
                ProcessLabel {
                    name: row[name_idx].clone(),
                    abbreviation: row[abb_idx].clone(),
                },
            ))
        })
        .collect()
}

fn activity_labels(source: &SourceTable) -> Result<BTreeMap<ActivityType, String>> {
    let abb_idx = source.require_column("actTypeABB")?;
    let label_idx = source.require_column("actTypeLab")?;
    source
        .rows
        .iter()
        .map(|row| {
            let kind = row[abb_idx].parse::<ActivityType>().map_err(|_| {
                RoadEiError::invalid_value(table_name(source), "actTypeABB", row[abb_idx].clone())
            })?;
            Ok((kind, row[label_idx].clone()))
        })
        .collect()
}

/// Checks that every label table file exists without parsing it.
pub fn missing_label_files(dir: &Path) -> Vec<PathBuf> {
    let service = CsvLabelDirectory::new(dir);
    LabelTableName::ALL
        .into_iter()
        .map(|table| service.path_for(table))
        .filter(|path| !path.is_file())
        .collect()
}
