//! QC003: every view sheet drops the columns its view collapses and
//! reproduces the detailed sums over its key.

use roadei_core::{AggregateTables, Aggregator, group_sum, view_key};
use roadei_model::{
    AggregationView, DetailedTables, Dimension, IssueSeverity, KeyedTable, QcIssue, TableKind,
    TableSchema,
};

use super::{issue, within_tolerance};

pub const CODE: &str = "QC003";

fn sheet_name(view: &str, kind: TableKind) -> String {
    format!("{view}_{}", kind.sheet_suffix())
}

fn reconcile(
    view: &AggregationView,
    schema: &TableSchema,
    detail: &KeyedTable,
    sheet: &KeyedTable,
) -> Option<QcIssue> {
    let name = sheet_name(&view.name, detail.kind);
    let leftover: Vec<Dimension> = view
        .collapsed(schema)
        .into_iter()
        .filter(|dim| sheet.has(*dim))
        .collect();
    if !leftover.is_empty() {
        let columns: Vec<String> = leftover.iter().map(ToString::to_string).collect();
        return Some(issue(
            CODE,
            IssueSeverity::Error,
            name,
            format!("sheet keeps collapsed columns: {}", columns.join(", ")),
            Some(leftover.len() as u64),
        ));
    }
    let key = view_key(view, schema, detail);
    if sheet.dimensions != key {
        return Some(issue(
            CODE,
            IssueSeverity::Error,
            name,
            "sheet columns differ from the view's grouping key",
            None,
        ));
    }
    let expected = group_sum(detail, &key);
    if expected.rows.len() != sheet.rows.len() {
        return Some(issue(
            CODE,
            IssueSeverity::Error,
            name,
            format!(
                "expected {} groups, found {}",
                expected.rows.len(),
                sheet.rows.len()
            ),
            Some(expected.rows.len().abs_diff(sheet.rows.len()) as u64),
        ));
    }
    let mismatched = expected
        .rows
        .iter()
        .zip(&sheet.rows)
        .filter(|(want, got)| want.keys != got.keys || !within_tolerance(want.value, got.value))
        .count();
    (mismatched > 0).then(|| {
        issue(
            CODE,
            IssueSeverity::Error,
            name,
            format!("{mismatched} groups do not reconcile with the detailed table"),
            Some(mismatched as u64),
        )
    })
}

pub fn check(
    aggregator: &Aggregator<'_>,
    detailed: &DetailedTables,
    sheets: &AggregateTables,
) -> Vec<QcIssue> {
    let mut issues = Vec::new();
    for view in aggregator.views() {
        let Some(sheet) = sheets.get(&view.name) else {
            issues.push(issue(
                CODE,
                IssueSeverity::Error,
                view.name.as_str(),
                "view has no aggregate sheets",
                None,
            ));
            continue;
        };
        for kind in [TableKind::Activity, TableKind::Emissions] {
            issues.extend(reconcile(
                view,
                aggregator.schema(kind),
                detailed.table(kind),
                sheet.table(kind),
            ));
        }
    }
    issues
}
