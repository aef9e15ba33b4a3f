//! Post-run quality checks.
//!
//! | Code  | Check |
//! |-------|-------|
//! | QC001 | detailed columns equal the configured schema |
//! | QC002 | detailed keys are unique |
//! | QC003 | aggregate sheets drop collapsed columns and reconcile with the detailed tables |
//! | QC004 | staging totals reconcile with the detailed emissions |

pub mod checks;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, info_span, warn};

use roadei_core::{AggregateTables, Aggregator};
use roadei_model::{
    DetailedTables, IssueSeverity, QcReport, Result, RoadEiError, RunConfig, StagingRow,
};

pub use checks::RELATIVE_TOLERANCE;

/// QC report file name.
pub const QC_REPORT_FILE: &str = "qcReport.json";

/// Outputs of one run available for checking. Stages that did not run
/// are `None` and their checks are skipped.
#[derive(Debug, Clone, Copy)]
pub struct QcInputs<'a> {
    pub detailed: &'a DetailedTables,
    pub aggregates: Option<&'a AggregateTables>,
    pub staging: Option<&'a [StagingRow]>,
}

/// Runs every applicable check.
pub fn run_qc(config: &RunConfig, inputs: QcInputs<'_>) -> QcReport {
    let span = info_span!("qc");
    let _guard = span.enter();

    let mut report = QcReport::new(config.scenario.to_string());
    let detailed = inputs.detailed;
    report.extend(checks::schema::check(&detailed.activity, &config.activity_schema));
    report.extend(checks::schema::check(&detailed.emissions, &config.emissions_schema));
    report.extend(checks::uniqueness::check(&detailed.activity, &config.activity_schema));
    report.extend(checks::uniqueness::check(&detailed.emissions, &config.emissions_schema));
    if let Some(sheets) = inputs.aggregates {
        match Aggregator::from_config(config) {
            Ok(aggregator) => {
                report.extend(checks::aggregate::check(&aggregator, detailed, sheets));
            }
            Err(error) => report.push(checks::issue(
                checks::aggregate::CODE,
                IssueSeverity::Error,
                "views",
                error.to_string(),
                None,
            )),
        }
    }
    if let Some(staging) = inputs.staging {
        report.extend(checks::staging::check(&detailed.emissions, staging, &config.xml));
    }

    for issue in &report.issues {
        warn!(
            code = %issue.code,
            table = %issue.table,
            severity = ?issue.severity,
            "{}",
            issue.message
        );
    }
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "quality checks complete"
    );
    report
}

/// Writes `qcReport.json` into `output_dir`.
///
/// # Errors
///
/// Fails when the file cannot be written.
pub fn write_qc_report(output_dir: &Path, report: &QcReport) -> Result<PathBuf> {
    let path = output_dir.join(QC_REPORT_FILE);
    let json = serde_json::to_vec_pretty(report)
        .map_err(|err| RoadEiError::io(&path, std::io::Error::other(err)))?;
    fs::create_dir_all(output_dir).map_err(|err| RoadEiError::io(output_dir, err))?;
    fs::write(&path, json).map_err(|err| RoadEiError::io(&path, err))?;
    Ok(path)
}
