use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Source pollutant ID for total energy consumption.
pub const TOTAL_ENERGY_POLLUTANT_ID: i64 = 91;

/// Output pollutant code to source pollutant IDs.
///
/// Several codes may share a source ID; a record with that ID is then
/// reported once under each code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollutantMapping {
    codes: BTreeMap<String, Vec<i64>>,
}

impl PollutantMapping {
    pub fn new(codes: BTreeMap<String, Vec<i64>>) -> Self {
        Self { codes }
    }

    /// Mapping used when a run file does not list pollutants.
    pub fn default_selection() -> Self {
        let mut codes = BTreeMap::new();
        codes.insert("CO".to_string(), vec![2]);
        codes.insert("NOx".to_string(), vec![3]);
        codes.insert("PM10".to_string(), vec![100, 106, 107]);
        Self { codes }
    }

    pub fn insert(&mut self, code: impl Into<String>, ids: Vec<i64>) {
        self.codes.insert(code.into(), ids);
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.codes.contains_key(code)
    }

    pub fn maps_id(&self, pollutant_id: i64) -> bool {
        self.codes.values().any(|ids| ids.contains(&pollutant_id))
    }

    /// Output codes for a source pollutant ID, in code order.
    pub fn codes_for(&self, pollutant_id: i64) -> Vec<&str> {
        self.codes
            .iter()
            .filter(|(_, ids)| ids.contains(&pollutant_id))
            .map(|(code, _)| code.as_str())
            .collect()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[i64])> {
        self.codes
            .iter()
            .map(|(code, ids)| (code.as_str(), ids.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
