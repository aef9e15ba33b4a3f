//! QC001: detailed table columns equal the configured schema.

use std::collections::BTreeSet;

use roadei_model::{Dimension, IssueSeverity, KeyedTable, QcIssue, TableSchema};

use super::{detailed_name, issue};

pub const CODE: &str = "QC001";

pub fn check(table: &KeyedTable, schema: &TableSchema) -> Vec<QcIssue> {
    let name = detailed_name(table.kind);
    let expected = schema.dimensions();
    let expected_set: BTreeSet<Dimension> = expected.iter().copied().collect();
    let actual_set: BTreeSet<Dimension> = table.dimensions.iter().copied().collect();

    let missing: Vec<&str> = expected_set
        .difference(&actual_set)
        .map(|dim| dim.column_name())
        .collect();
    let extra: Vec<&str> = actual_set
        .difference(&expected_set)
        .map(|dim| dim.column_name())
        .collect();

    let mut issues = Vec::new();
    if !missing.is_empty() || !extra.is_empty() {
        issues.push(issue(
            CODE,
            IssueSeverity::Error,
            name.as_str(),
            format!(
                "columns differ from the schema: missing [{}], unexpected [{}]",
                missing.join(", "),
                extra.join(", ")
            ),
            Some((missing.len() + extra.len()) as u64),
        ));
    } else if table.dimensions != expected {
        issues.push(issue(
            CODE,
            IssueSeverity::Warning,
            name,
            "columns match the schema but not its order",
            None,
        ));
    }
    issues
}
