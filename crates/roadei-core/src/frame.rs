//! DataFrame construction for writing.
//!
//! Columns come out in the table's dimension order followed by the value
//! column, so the written header is exactly the configured schema.

use anyhow::{Context, Result};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};

use roadei_model::{DimensionKind, KeyedTable, STAGING_COLUMNS, StagingRow};

/// Build a DataFrame from a keyed table.
///
/// Integer dimensions become `i64` columns; everything else is text.
pub fn keyed_table_frame(table: &KeyedTable) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(table.dimensions.len() + 1);
    for (position, dim) in table.dimensions.iter().enumerate() {
        let name = dim.column_name();
        match dim.kind() {
            DimensionKind::Int => {
                let values: Vec<Option<i64>> = table
                    .rows
                    .iter()
                    .map(|row| row.keys[position].as_int())
                    .collect();
                columns.push(Series::new(name.into(), values).into());
            }
            DimensionKind::Text => {
                let values: Vec<String> = table
                    .rows
                    .iter()
                    .map(|row| row.keys[position].to_string())
                    .collect();
                columns.push(Series::new(name.into(), values).into());
            }
        }
    }
    let values: Vec<f64> = table.rows.iter().map(|row| row.value).collect();
    columns.push(Series::new(table.kind.value_column().into(), values).into());
    DataFrame::new(columns).with_context(|| format!("build {} dataframe", table.kind))
}

/// Build the staging table DataFrame in [`STAGING_COLUMNS`] order.
pub fn staging_frame(rows: &[StagingRow]) -> Result<DataFrame> {
    let [area, year, season, day_type, fips, scc, code, units, emission, e6mile] =
        STAGING_COLUMNS;
    let columns: Vec<Column> = vec![
        Series::new(area.into(), text_values(rows, |r| r.area.as_str())).into(),
        Series::new(year.into(), rows.iter().map(|r| r.year).collect::<Vec<_>>()).into(),
        Series::new(season.into(), text_values(rows, |r| r.season.as_str())).into(),
        Series::new(day_type.into(), text_values(rows, |r| r.day_type.as_str())).into(),
        Series::new(fips.into(), rows.iter().map(|r| r.fips).collect::<Vec<_>>()).into(),
        Series::new(scc.into(), text_values(rows, |r| r.scc.as_str())).into(),
        Series::new(code.into(), text_values(rows, |r| r.pollutant_code.as_str())).into(),
        Series::new(units.into(), text_values(rows, |r| r.emission_units.as_str())).into(),
        Series::new(emission.into(), rows.iter().map(|r| r.emission).collect::<Vec<_>>()).into(),
        Series::new(e6mile.into(), rows.iter().map(|r| r.e6mile).collect::<Vec<_>>()).into(),
    ];
    DataFrame::new(columns).context("build staging dataframe")
}

fn text_values(rows: &[StagingRow], field: impl Fn(&StagingRow) -> &str) -> Vec<String> {
    rows.iter().map(|row| field(row).to_string()).collect()
}
