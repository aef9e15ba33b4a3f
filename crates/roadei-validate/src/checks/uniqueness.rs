//! QC002: one row per detailed key.

use std::collections::BTreeSet;

use roadei_model::{IssueSeverity, KeyValue, KeyedTable, QcIssue, TableSchema};

use super::{detailed_name, issue};

pub const CODE: &str = "QC002";

/// Counts rows whose key columns (the schema's `idx` list) repeat an
/// earlier row.
pub fn check(table: &KeyedTable, schema: &TableSchema) -> Vec<QcIssue> {
    let positions: Vec<usize> = schema
        .idx
        .iter()
        .filter_map(|dim| table.position(*dim))
        .collect();
    let mut seen: BTreeSet<Vec<&KeyValue>> = BTreeSet::new();
    let duplicates = table
        .rows
        .iter()
        .filter(|row| !seen.insert(positions.iter().map(|p| &row.keys[*p]).collect()))
        .count();
    if duplicates == 0 {
        return Vec::new();
    }
    vec![issue(
        CODE,
        IssueSeverity::Error,
        detailed_name(table.kind),
        format!("{duplicates} rows repeat the key of an earlier row"),
        Some(duplicates as u64),
    )]
}
