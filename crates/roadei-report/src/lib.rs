//! Output generation for a run.
//!
//! - **csv**: detailed tables, aggregate workbook sheets, staging table
//! - **cers**: the CERS reporting document
//! - **common**: staged writes and XML helpers

pub mod cers;
pub mod common;
pub mod csv;

pub use cers::{CersDocument, calculation_material_code};
pub use common::{AGGREGATE_DIR, STAGING_FILE, StagedFiles, staged_path};
pub use csv::{
    DetailedOutputs, sheet_file_name, write_aggregate_tables, write_detailed_tables,
    write_staging_table,
};
