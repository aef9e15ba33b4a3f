//! Individual quality checks. Each returns the issues it found.

pub mod aggregate;
pub mod schema;
pub mod staging;
pub mod uniqueness;

use roadei_model::{IssueSeverity, QcIssue, TableKind};

/// Relative tolerance for reconciling sums.
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

pub(crate) fn within_tolerance(expected: f64, actual: f64) -> bool {
    let scale = expected.abs().max(actual.abs());
    (expected - actual).abs() <= RELATIVE_TOLERANCE * scale
}

/// Report name of a detailed table, e.g. `activityDetailed`.
pub(crate) fn detailed_name(kind: TableKind) -> String {
    kind.detailed_file_name()
        .trim_end_matches(".csv")
        .to_string()
}

pub(crate) fn issue(
    code: &str,
    severity: IssueSeverity,
    table: impl Into<String>,
    message: impl Into<String>,
    count: Option<u64>,
) -> QcIssue {
    QcIssue {
        code: code.to_string(),
        message: message.into(),
        severity,
        table: table.into(),
        count,
    }
}
