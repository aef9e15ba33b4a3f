use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info, info_span};

use roadei_ingest::{ReadOptions, read_source_table};
use roadei_model::{
    CategoryRule, CategoryRules, ConfigMismatch, ConversionTable, Dimension, EmissionsRecord,
    InventoryType, PollutantMapping, Result, RunConfig,
};

use crate::activity::category_activity_type;
use crate::keys::{KeyColumns, int_cell, selected_rows, value_cell};

const EMISSION: &str = "emission";

/// Turns per-inventory, per-category emissions files into long-form
/// records in output units.
#[derive(Debug, Clone)]
pub struct EmissionsNormalizer<'a> {
    rename: &'a BTreeMap<String, String>,
    rules: &'a CategoryRules,
    counties: &'a BTreeSet<i64>,
    pollutants: &'a PollutantMapping,
    conversions: &'a ConversionTable,
}

impl<'a> EmissionsNormalizer<'a> {
    pub fn new(
        rename: &'a BTreeMap<String, String>,
        rules: &'a CategoryRules,
        counties: &'a BTreeSet<i64>,
        pollutants: &'a PollutantMapping,
        conversions: &'a ConversionTable,
    ) -> Self {
        Self {
            rename,
            rules,
            counties,
            pollutants,
            conversions,
        }
    }

    pub fn from_config(config: &'a RunConfig) -> Self {
        Self::new(
            &config.rename.emissions,
            &config.categories,
            &config.counties,
            &config.pollutants,
            &config.conversions,
        )
    }

    /// Normalizes all files, then enforces and applies unit conversion.
    ///
    /// # Errors
    ///
    /// Fails on unreadable files, on missing columns, and with
    /// [`ConfigMismatch::UnitsNotConvertible`] when a unit in the data has
    /// no conversion factor.
    pub fn normalize<'f>(
        &self,
        inventories: impl IntoIterator<Item = (InventoryType, &'f BTreeMap<String, PathBuf>)>,
    ) -> Result<Vec<EmissionsRecord>> {
        let span = info_span!("normalize_emissions");
        let _guard = span.enter();
        let start = Instant::now();

        let mut records = Vec::new();
        for (inventory, files) in inventories {
            for (category, path) in files {
                let rule = self.rules.emission_rule(category);
                if rule.skip {
                    debug!(inventory = %inventory, category = %category, "skipping emission category");
                    continue;
                }
                records.extend(self.normalize_category(inventory, category, &rule, path)?);
            }
        }
        check_units(&records, self.conversions)?;
        let records = convert_units(records, self.conversions);
        info!(
            records = records.len(),
            duration_ms = start.elapsed().as_millis(),
            "emissions normalization complete"
        );
        Ok(records)
    }

    /// Reads one category file, keeps selected counties and mapped
    /// pollutants, and tags rows with the inventory type.
    ///
    /// Values stay in input units.
    pub fn normalize_category(
        &self,
        inventory: InventoryType,
        category: &str,
        rule: &CategoryRule,
        path: &Path,
    ) -> Result<Vec<EmissionsRecord>> {
        let mut options = ReadOptions::default();
        if let Some(prefix) = inventory.header_prefix() {
            options = options.with_strip_prefix(prefix);
        }
        let raw = read_source_table(path, &options)?;
        let table = raw.select_rename(self.rename)?;
        let keys = KeyColumns::locate(&table, rule)?;
        let pollutant_idx = table.require_column(Dimension::PollutantId.column_name())?;
        let process_idx = table.require_column(Dimension::ProcessId.column_name())?;
        let unit_idx = table.require_column(Dimension::EmissionUnits.column_name())?;
        let value_idx = table.require_column(EMISSION)?;
        let act_type = category_activity_type(category, rule, path)?;

        let mut records = Vec::new();
        let mut unmapped = 0usize;
        for row in selected_rows(&table, &keys, self.counties)? {
            let pollutant_id = int_cell(&table, row, pollutant_idx, Dimension::PollutantId)?;
            let codes = self.pollutants.codes_for(pollutant_id);
            if codes.is_empty() {
                unmapped += 1;
                continue;
            }
            let Some(emission) = value_cell(&table, row, value_idx)? else {
                continue;
            };
            let key = keys.vehicle_key(&table, row)?;
            let process_id = int_cell(&table, row, process_idx, Dimension::ProcessId)?;
            for code in codes {
                records.push(EmissionsRecord {
                    key,
                    inventory,
                    pollutant_id,
                    pollutant_code: code.to_string(),
                    process_id,
                    act_type,
                    emission,
                    emission_units: row[unit_idx].clone(),
                });
            }
        }
        debug!(
            inventory = %inventory,
            category,
            path = %path.display(),
            records = records.len(),
            unmapped_pollutant_rows = unmapped,
            "normalized emission category"
        );
        Ok(records)
    }
}

/// Every unit present in the data needs a conversion factor. Extra,
/// unused factors are fine.
pub fn check_units(
    records: &[EmissionsRecord],
    conversions: &ConversionTable,
) -> std::result::Result<(), ConfigMismatch> {
    let missing: BTreeSet<&str> = records
        .iter()
        .map(|record| record.emission_units.as_str())
        .filter(|unit| conversions.get(unit).is_none())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    let units: Vec<String> = missing.into_iter().map(str::to_string).collect();
    error!(units = ?units, "emission units have no conversion factor");
    Err(ConfigMismatch::UnitsNotConvertible { units })
}

/// Multiplies each emission by its unit's factor and relabels the unit.
///
/// Records whose unit is not in the table are returned unchanged; run
/// [`check_units`] first.
pub fn convert_units(
    records: Vec<EmissionsRecord>,
    conversions: &ConversionTable,
) -> Vec<EmissionsRecord> {
    records
        .into_iter()
        .map(|mut record| {
            if let Some(factor) = conversions.get(&record.emission_units) {
                record.emission *= factor.factor;
                record.emission_units.clone_from(&factor.output_units);
            }
            record
        })
        .collect()
}

