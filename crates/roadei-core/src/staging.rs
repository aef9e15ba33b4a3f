//! XML staging table.
//!
//! One row per (area, scenario, FIPS, classification code, pollutant code)
//! with summed emissions and the summed VMT in millions of miles.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{info, info_span};

use roadei_model::{
    ActivityType, DetailedTables, Dimension, KeyValue, KeyedRow, KeyedTable, Result, RoadEiError,
    StagingRow, XmlSettings,
};
use roadei_transform::classification_code;

const MILES_PER_E6MILE: f64 = 1.0e6;

/// (area, year, season, dayType, FIPS, sccNEI)
type LocationKey = (String, i64, String, String, i64, String);

/// Column positions of one detailed table.
struct Columns<'t> {
    table: &'t KeyedTable,
    area: usize,
    year: usize,
    season: usize,
    day_type: usize,
    fips: usize,
    sut: usize,
    fuel: usize,
}

impl<'t> Columns<'t> {
    fn locate(table: &'t KeyedTable) -> Result<Self> {
        Ok(Self {
            table,
            area: require(table, Dimension::Area)?,
            year: require(table, Dimension::Year)?,
            season: require(table, Dimension::Season)?,
            day_type: require(table, Dimension::DayType)?,
            fips: require(table, Dimension::Fips)?,
            sut: require(table, Dimension::SourceUseTypeId)?,
            fuel: require(table, Dimension::FuelTypeId)?,
        })
    }

    fn int(&self, row: &KeyedRow, position: usize) -> Result<i64> {
        row.keys[position].as_int().ok_or_else(|| self.bad(row, position))
    }

    fn text<'r>(&self, row: &'r KeyedRow, position: usize) -> Result<&'r str> {
        row.keys[position].as_text().ok_or_else(|| self.bad(row, position))
    }

    fn bad(&self, row: &KeyedRow, position: usize) -> RoadEiError {
        RoadEiError::invalid_value(
            self.table.kind.to_string(),
            self.table.dimensions[position].column_name(),
            row.keys[position].to_string(),
        )
    }

    fn matches(&self, row: &KeyedRow, xml: &XmlSettings) -> Result<bool> {
        Ok(self.int(row, self.year)? == xml.year
            && self.text(row, self.season)? == xml.season
            && self.text(row, self.day_type)? == xml.day_type)
    }

    fn location(&self, row: &KeyedRow) -> Result<LocationKey> {
        Ok((
            self.text(row, self.area)?.to_string(),
            self.int(row, self.year)?,
            self.text(row, self.season)?.to_string(),
            self.text(row, self.day_type)?.to_string(),
            self.int(row, self.fips)?,
            classification_code(self.int(row, self.fuel)?, self.int(row, self.sut)?),
        ))
    }
}

fn require(table: &KeyedTable, dim: Dimension) -> Result<usize> {
    table
        .position(dim)
        .ok_or_else(|| RoadEiError::data_shape(table.kind.to_string(), dim.column_name()))
}

/// Builds the staging rows consumed by the reporting document.
#[derive(Debug, Clone, Copy)]
pub struct StagingTableBuilder<'a> {
    xml: &'a XmlSettings,
}

impl<'a> StagingTableBuilder<'a> {
    pub fn new(xml: &'a XmlSettings) -> Self {
        Self { xml }
    }

    /// Summed VMT per location, in millions of miles.
    fn distance(&self, activity: &KeyedTable) -> Result<BTreeMap<LocationKey, f64>> {
        let columns = Columns::locate(activity)?;
        let act_type = require(activity, Dimension::ActType)?;
        let mut totals: BTreeMap<LocationKey, f64> = BTreeMap::new();
        for row in &activity.rows {
            if row.keys[act_type] != KeyValue::from(ActivityType::Vmt.as_str())
                || !columns.matches(row, self.xml)?
            {
                continue;
            }
            *totals.entry(columns.location(row)?).or_default() += row.value / MILES_PER_E6MILE;
        }
        Ok(totals)
    }

    /// Filters, groups, and joins the detailed tables.
    ///
    /// Rows are ordered by location then pollutant code then unit. A
    /// location without VMT gets an `E6MILE` of exactly zero.
    ///
    /// # Errors
    ///
    /// Fails with a data-shape error when a detailed table lacks a column
    /// the staging grouping needs.
    pub fn build(&self, detailed: &DetailedTables) -> Result<Vec<StagingRow>> {
        let span = info_span!("staging");
        let _guard = span.enter();
        let start = Instant::now();

        let emissions = &detailed.emissions;
        let columns = Columns::locate(emissions)?;
        let code = require(emissions, Dimension::PollutantCode)?;
        let units = require(emissions, Dimension::EmissionUnits)?;

        let mut groups: BTreeMap<(LocationKey, String, String), f64> = BTreeMap::new();
        for row in &emissions.rows {
            let pollutant = columns.text(row, code)?;
            if !self.xml.pollutant_codes.iter().any(|c| c == pollutant)
                || !columns.matches(row, self.xml)?
            {
                continue;
            }
            let unit = columns.text(row, units)?.to_string();
            *groups
                .entry((columns.location(row)?, pollutant.to_string(), unit))
                .or_default() += row.value;
        }

        let distance = self.distance(&detailed.activity)?;
        let rows: Vec<StagingRow> = groups
            .into_iter()
            .map(|((location, pollutant_code, emission_units), emission)| {
                let e6mile = distance.get(&location).copied().unwrap_or(0.0);
                let (area, year, season, day_type, fips, scc) = location;
                StagingRow {
                    area,
                    year,
                    season,
                    day_type,
                    fips,
                    scc,
                    pollutant_code,
                    emission_units,
                    emission,
                    e6mile,
                }
            })
            .collect();
        info!(
            rows = rows.len(),
            duration_ms = start.elapsed().as_millis(),
            "staging table complete"
        );
        Ok(rows)
    }
}
