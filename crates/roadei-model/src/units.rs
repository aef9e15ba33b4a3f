use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigMismatch;

/// Multiplicative factor converting `input_units` into `output_units`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionFactor {
    pub input_units: String,
    pub output_units: String,
    pub factor: f64,
}

/// Conversion factors keyed by input unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionTable {
    factors: BTreeMap<String, ConversionFactor>,
}

impl ConversionTable {
    pub fn new(factors: Vec<ConversionFactor>) -> Result<Self, ConfigMismatch> {
        let mut table = BTreeMap::new();
        for factor in factors {
            let unit = factor.input_units.clone();
            if table.insert(unit.clone(), factor).is_some() {
                return Err(ConfigMismatch::DuplicateConversion { unit });
            }
        }
        Ok(Self { factors: table })
    }

    pub fn get(&self, input_units: &str) -> Option<&ConversionFactor> {
        self.factors.get(input_units)
    }

    pub fn input_units(&self) -> impl Iterator<Item = &str> {
        self.factors.keys().map(String::as_str)
    }

    pub fn factors(&self) -> impl Iterator<Item = &ConversionFactor> {
        self.factors.values()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}
