//! Read-back of detailed tables written by an earlier run, so later stages
//! can be re-run without regenerating detail.

use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, SerReader};
use tracing::info;

use roadei_model::{
    Dimension, DimensionKind, KeyValue, KeyedRow, KeyedTable, Result, RoadEiError, TableKind,
};

use crate::polars_utils::{any_to_f64, any_to_i64, any_to_string};

/// Reads a CSV file into a DataFrame.
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(RoadEiError::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "not found; generate the detailed tables first",
            ),
        ));
    }
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|err| RoadEiError::Csv {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

/// Converts a DataFrame of dimension columns plus the kind's value column.
pub fn frame_to_keyed_table(df: &DataFrame, kind: TableKind, table: &str) -> Result<KeyedTable> {
    let value_name = kind.value_column();
    let mut dimensions = Vec::new();
    let mut dim_columns = Vec::new();
    let mut value_column = None;
    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == value_name {
            value_column = Some(column);
            continue;
        }
        let dim: Dimension = name
            .parse()
            .map_err(|_| RoadEiError::data_shape(table, name))?;
        dimensions.push(dim);
        dim_columns.push(column);
    }
    let value_column = value_column.ok_or_else(|| RoadEiError::data_shape(table, value_name))?;

    let mut out = KeyedTable::new(kind, dimensions.clone());
    for row_idx in 0..df.height() {
        let mut keys = Vec::with_capacity(dimensions.len());
        for (dim, column) in dimensions.iter().zip(&dim_columns) {
            let cell = column
                .get(row_idx)
                .map_err(|err| RoadEiError::Polars(err.to_string()))?;
            let key = match dim.kind() {
                DimensionKind::Int => {
                    let text = any_to_string(cell.clone());
                    KeyValue::Int(any_to_i64(cell).ok_or_else(|| {
                        RoadEiError::invalid_value(table, dim.column_name(), text)
                    })?)
                }
                DimensionKind::Text => KeyValue::Text(any_to_string(cell)),
            };
            keys.push(key);
        }
        let cell = value_column
            .get(row_idx)
            .map_err(|err| RoadEiError::Polars(err.to_string()))?;
        let text = any_to_string(cell.clone());
        let value = any_to_f64(cell)
            .ok_or_else(|| RoadEiError::invalid_value(table, value_name, text))?;
        out.rows.push(KeyedRow { keys, value });
    }
    Ok(out)
}

/// Loads a previously written detailed table.
pub fn read_keyed_table(path: &Path, kind: TableKind) -> Result<KeyedTable> {
    let df = read_frame(path)?;
    let table = frame_to_keyed_table(&df, kind, &path.display().to_string())?;
    info!(
        path = %path.display(),
        rows = table.len(),
        table = %kind,
        "loaded detailed table"
    );
    Ok(table)
}
