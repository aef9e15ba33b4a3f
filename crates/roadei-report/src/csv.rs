//! Delimited table outputs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::{debug, info};

use roadei_core::{AggregateTables, keyed_table_frame, staging_frame};
use roadei_model::{DetailedTables, StagingRow, TableKind};

use crate::common::{AGGREGATE_DIR, STAGING_FILE, StagedFiles};

fn write_frame(file: &mut std::fs::File, df: &mut DataFrame) -> Result<()> {
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .context("write csv")
}

/// Paths of the two detailed tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedOutputs {
    pub activity: PathBuf,
    pub emissions: PathBuf,
}

impl DetailedOutputs {
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            activity: output_dir.join(TableKind::Activity.detailed_file_name()),
            emissions: output_dir.join(TableKind::Emissions.detailed_file_name()),
        }
    }
}

/// Writes both detailed tables or neither.
///
/// Both frames are built and written to staged files first; the files are
/// renamed into place only after both writes succeeded.
pub fn write_detailed_tables(output_dir: &Path, tables: &DetailedTables) -> Result<DetailedOutputs> {
    let outputs = DetailedOutputs::in_dir(output_dir);
    let mut activity = keyed_table_frame(&tables.activity)?;
    let mut emissions = keyed_table_frame(&tables.emissions)?;

    let mut batch = StagedFiles::new();
    batch.stage(&outputs.activity, |file| write_frame(file, &mut activity))?;
    batch.stage(&outputs.emissions, |file| write_frame(file, &mut emissions))?;
    batch.commit().context("commit detailed tables")?;
    info!(
        activity_rows = tables.activity.len(),
        emission_rows = tables.emissions.len(),
        dir = %output_dir.display(),
        "detailed tables written"
    );
    Ok(outputs)
}

/// Sheet file name of one view and table kind, e.g. `aggByScc_emis.csv`.
pub fn sheet_file_name(view: &str, kind: TableKind) -> String {
    format!("{view}_{}.csv", kind.sheet_suffix())
}

/// Writes the aggregate workbook: one CSV sheet per view and table kind.
pub fn write_aggregate_tables(output_dir: &Path, sheets: &AggregateTables) -> Result<Vec<PathBuf>> {
    let dir = output_dir.join(AGGREGATE_DIR);
    let mut batch = StagedFiles::new();
    for (view, sheet) in sheets {
        for kind in [TableKind::Activity, TableKind::Emissions] {
            let table = sheet.table(kind);
            let mut df = keyed_table_frame(table)
                .with_context(|| format!("build sheet {}", sheet_file_name(view, kind)))?;
            let path = dir.join(sheet_file_name(view, kind));
            batch.stage(&path, |file| write_frame(file, &mut df))?;
            debug!(view = %view, table = %kind, rows = table.len(), "sheet staged");
        }
    }
    let written = batch.commit().context("commit aggregate workbook")?;
    info!(sheets = written.len(), dir = %dir.display(), "aggregate workbook written");
    Ok(written)
}

/// Writes the XML staging table.
pub fn write_staging_table(output_dir: &Path, rows: &[StagingRow]) -> Result<PathBuf> {
    let path = output_dir.join(STAGING_FILE);
    let mut df = staging_frame(rows)?;
    let mut batch = StagedFiles::new();
    batch.stage(&path, |file| write_frame(file, &mut df))?;
    batch.commit().context("commit staging table")?;
    info!(rows = rows.len(), path = %path.display(), "staging table written");
    Ok(path)
}
