//! QC004: staging emission totals equal the matching detailed emissions.

use roadei_model::{
    Dimension, IssueSeverity, KeyValue, KeyedRow, KeyedTable, QcIssue, StagingRow, XmlSettings,
};

use super::{issue, within_tolerance};

pub const CODE: &str = "QC004";

const STAGING_TABLE: &str = "xmlSCCStagingTable";

fn selected(table: &KeyedTable, row: &KeyedRow, xml: &XmlSettings) -> Option<bool> {
    let key = |dim: Dimension| table.position(dim).map(|p| &row.keys[p]);
    let code = key(Dimension::PollutantCode)?.as_text()?;
    Some(
        *key(Dimension::Year)? == KeyValue::Int(xml.year)
            && key(Dimension::Season)?.as_text()? == xml.season
            && key(Dimension::DayType)?.as_text()? == xml.day_type
            && xml.pollutant_codes.iter().any(|c| c == code),
    )
}

pub fn check(emissions: &KeyedTable, staging: &[StagingRow], xml: &XmlSettings) -> Vec<QcIssue> {
    let mut unreadable = 0_u64;
    let mut expected = 0.0;
    for row in &emissions.rows {
        match selected(emissions, row, xml) {
            Some(true) => expected += row.value,
            Some(false) => {}
            None => unreadable += 1,
        }
    }
    let mut issues = Vec::new();
    if unreadable > 0 {
        issues.push(issue(
            CODE,
            IssueSeverity::Warning,
            STAGING_TABLE,
            "detailed emissions rows lack scenario or pollutant columns",
            Some(unreadable),
        ));
    }
    let actual: f64 = staging.iter().map(|row| row.emission).sum();
    if !within_tolerance(expected, actual) {
        issues.push(issue(
            CODE,
            IssueSeverity::Error,
            STAGING_TABLE,
            format!("staging emissions total {actual} differs from detailed total {expected}"),
            None,
        ));
    }
    issues
}
