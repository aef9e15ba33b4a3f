use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use roadei_ingest::{ReadOptions, SourceTable, read_source_table};
use roadei_model::{
    ActivityRecord, ActivityType, CategoryRule, CategoryRules, Result, RoadEiError, RunConfig,
};

use crate::keys::{KeyColumns, is_key_column, selected_rows, value_cell};

/// Column name a single-valued file's value is renamed to.
const GENERIC_VALUE: &str = "activity";

/// Turns wide activity files (one column per activity type) into long-form
/// records.
#[derive(Debug, Clone)]
pub struct ActivityNormalizer<'a> {
    rename: &'a BTreeMap<String, String>,
    rules: &'a CategoryRules,
    counties: &'a BTreeSet<i64>,
    units: &'a BTreeMap<ActivityType, String>,
}

impl<'a> ActivityNormalizer<'a> {
    pub fn new(
        rename: &'a BTreeMap<String, String>,
        rules: &'a CategoryRules,
        counties: &'a BTreeSet<i64>,
        units: &'a BTreeMap<ActivityType, String>,
    ) -> Self {
        Self {
            rename,
            rules,
            counties,
            units,
        }
    }

    pub fn from_config(config: &'a RunConfig) -> Self {
        Self::new(
            &config.rename.activity,
            &config.categories,
            &config.counties,
            &config.activity_units,
        )
    }

    /// Normalizes every category file, skipping categories marked `skip`.
    pub fn normalize(&self, files: &BTreeMap<String, PathBuf>) -> Result<Vec<ActivityRecord>> {
        let span = info_span!("normalize_activity", files = files.len());
        let _guard = span.enter();
        let start = Instant::now();

        let mut records = Vec::new();
        let mut unitless: BTreeSet<ActivityType> = BTreeSet::new();
        for (category, path) in files {
            let rule = self.rules.activity_rule(category);
            if rule.skip {
                debug!(category = %category, "skipping derived activity category");
                continue;
            }
            let mut category_records = self.normalize_category(category, &rule, path)?;
            for record in &mut category_records {
                match self.units.get(&record.act_type) {
                    Some(unit) => record.activity_units.clone_from(unit),
                    None => {
                        unitless.insert(record.act_type);
                    }
                }
            }
            records.extend(category_records);
        }
        for act_type in &unitless {
            warn!(activity_type = %act_type, "activity type has no unit mapping");
        }
        info!(
            records = records.len(),
            duration_ms = start.elapsed().as_millis(),
            "activity normalization complete"
        );
        Ok(records)
    }

    /// Reads one category file and unpivots its value columns.
    pub fn normalize_category(
        &self,
        category: &str,
        rule: &CategoryRule,
        path: &Path,
    ) -> Result<Vec<ActivityRecord>> {
        let raw = read_source_table(path, &ReadOptions::default())?;
        let table = raw.select_rename(self.rename)?;
        let keys = KeyColumns::locate(&table, rule)?;
        let values = value_columns(&table, category, rule)?;

        let rows = selected_rows(&table, &keys, self.counties)?;
        let mut records = Vec::with_capacity(rows.len() * values.len());
        let mut empty_cells = 0usize;
        for row in rows {
            let key = keys.vehicle_key(&table, row)?;
            for (idx, act_type) in &values {
                let Some(activity) = value_cell(&table, row, *idx)? else {
                    empty_cells += 1;
                    continue;
                };
                records.push(ActivityRecord {
                    key,
                    act_type: *act_type,
                    activity,
                    activity_units: String::new(),
                });
            }
        }
        debug!(
            category,
            path = %path.display(),
            records = records.len(),
            empty_cells,
            "normalized activity category"
        );
        Ok(records)
    }
}

/// Value columns of a renamed activity table with the activity type each
/// one is reported as.
fn value_columns(
    table: &SourceTable,
    category: &str,
    rule: &CategoryRule,
) -> Result<Vec<(usize, ActivityType)>> {
    let mut values = Vec::new();
    for (idx, header) in table.headers.iter().enumerate() {
        if is_key_column(header) {
            continue;
        }
        let act_type = if header == GENERIC_VALUE {
            category_activity_type(category, rule, &table.path)?
        } else {
            header.parse::<ActivityType>().map_err(|_| {
                RoadEiError::invalid_value(
                    table.path.display().to_string(),
                    header.clone(),
                    "renamed column is neither a key nor an activity type",
                )
            })?
        };
        values.push((idx, act_type));
    }
    if values.is_empty() {
        return Err(RoadEiError::data_shape(
            table.path.display().to_string(),
            GENERIC_VALUE,
        ));
    }
    Ok(values)
}

pub(crate) fn category_activity_type(
    category: &str,
    rule: &CategoryRule,
    path: &Path,
) -> Result<ActivityType> {
    match rule.activity_type {
        Some(act_type) => Ok(act_type),
        None => category.parse::<ActivityType>().map_err(|_| {
            RoadEiError::invalid_value(
                path.display().to_string(),
                "category",
                format!("{category} has no activity type rule"),
            )
        }),
    }
}
