use std::path::PathBuf;

use crate::enums::InventoryType;

/// Configuration problems that must halt a run before any output is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigMismatch {
    #[error("units {units:?} found in emissions data have no conversion factor")]
    UnitsNotConvertible { units: Vec<String> },

    #[error("area {area} has no rows in the road type mapping")]
    AreaNotInRoadTypeMapping { area: String },

    #[error(
        "road type mapping for area {area} is missing (funcClassID, areaTypeID) pairs {pairs:?}; \
         try the other road type source"
    )]
    RoadTypeMappingIncomplete { area: String, pairs: Vec<(i64, i64)> },

    #[error("{field} must select exactly one value, got {values:?}")]
    NonSingletonScenario { field: String, values: Vec<String> },

    #[error("inventory type {inventory} is selected but has no emission files")]
    MissingInventoryFiles { inventory: InventoryType },

    #[error("conversion table lists input unit {unit} more than once")]
    DuplicateConversion { unit: String },

    #[error("xml pollutant code {code} is not one of the configured pollutant codes")]
    XmlPollutantNotSelected { code: String },

    #[error("unknown unit {unit}")]
    UnknownUnit { unit: String },

    #[error("cannot convert {input} into {output}")]
    IncompatibleUnits { input: String, output: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RoadEiError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse delimited file {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("invalid run configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    ConfigMismatch(#[from] ConfigMismatch),

    #[error("column {column} missing from {table}")]
    DataShape { table: String, column: String },

    #[error("invalid value {value:?} in column {column} of {table}")]
    InvalidValue {
        table: String,
        column: String,
        value: String,
    },

    #[error("polars error: {0}")]
    Polars(String),

    #[error("xml error: {0}")]
    Xml(String),
}

impl RoadEiError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn data_shape(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DataShape {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn invalid_value(
        table: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            table: table.into(),
            column: column.into(),
            value: value.into(),
        }
    }

    /// Returns the configuration mismatch behind this error, if any.
    pub fn as_config_mismatch(&self) -> Option<&ConfigMismatch> {
        match self {
            Self::ConfigMismatch(mismatch) => Some(mismatch),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RoadEiError>;
