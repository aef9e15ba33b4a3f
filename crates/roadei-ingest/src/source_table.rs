use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::debug;

use roadei_model::{Result, RoadEiError};

/// Raw cells of one delimited source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// How a source file is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub delimiter: u8,
    /// Inventory prefixes removed from headers, e.g. `TEC` turns
    /// `TEC Emission` into `Emission` and `VMT_TEC_Emission` into
    /// `VMT_Emission`.
    pub strip_prefixes: Vec<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            strip_prefixes: Vec::new(),
        }
    }
}

impl ReadOptions {
    /// Comma-separated reference tables.
    pub fn comma() -> Self {
        Self {
            delimiter: b',',
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefixes.push(prefix.into());
        self
    }
}

fn normalize_header(raw: &str, prefixes: &[String]) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut normalized = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    for prefix in prefixes {
        let leading = format!("{prefix} ");
        if let Some(rest) = normalized.strip_prefix(&leading) {
            normalized = rest.to_string();
        }
        normalized = normalized.replace(&format!("_{prefix}_"), "_");
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn csv_error(path: &Path, err: &csv::Error) -> RoadEiError {
    if let csv::ErrorKind::Io(io) = err.kind() {
        return RoadEiError::io(path, std::io::Error::new(io.kind(), io.to_string()));
    }
    RoadEiError::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Reads a delimited file whose first non-blank row is the header.
///
/// Blank rows are skipped and short rows are padded with empty cells.
pub fn read_source_table(path: &Path, options: &ReadOptions) -> Result<SourceTable> {
    if !path.is_file() {
        return Err(RoadEiError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "source file not found"),
        ));
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_path(path)
        .map_err(|err| csv_error(path, &err))?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| csv_error(path, &err))?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        match &headers {
            None => {
                headers = Some(
                    record
                        .iter()
                        .map(|value| normalize_header(value, &options.strip_prefixes))
                        .collect(),
                );
            }
            Some(header) => {
                let row = (0..header.len())
                    .map(|idx| record.get(idx).map(normalize_cell).unwrap_or_default())
                    .collect();
                rows.push(row);
            }
        }
    }
    let headers = headers.unwrap_or_default();
    debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "read source table"
    );
    Ok(SourceTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

impl SourceTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| RoadEiError::data_shape(self.path.display().to_string(), name))
    }

    /// Keeps the columns named in `rename` and gives them their canonical names.
    ///
    /// Columns absent from `rename` are dropped. Two source headers that map
    /// to the same canonical name in one file are a data-shape error.
    pub fn select_rename(&self, rename: &BTreeMap<String, String>) -> Result<SourceTable> {
        let mut picked: Vec<(usize, String)> = Vec::new();
        for (idx, header) in self.headers.iter().enumerate() {
            let Some(target) = rename.get(header) else {
                continue;
            };
            if picked.iter().any(|(_, existing)| existing == target) {
                return Err(RoadEiError::invalid_value(
                    self.path.display().to_string(),
                    target.clone(),
                    format!("more than one source column maps to {target}"),
                ));
            }
            picked.push((idx, target.clone()));
        }
        let headers = picked.iter().map(|(_, name)| name.clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| picked.iter().map(|(idx, _)| row[*idx].clone()).collect())
            .collect();
        Ok(SourceTable {
            path: self.path.clone(),
            headers,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parses an integer cell, accepting float spellings such as `48201.0`.
pub fn parse_int_cell(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    let float = trimmed.parse::<f64>().ok()?;
    if float.fract() == 0.0 && float.is_finite() {
        Some(float as i64)
    } else {
        None
    }
}

pub fn parse_float_cell(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
