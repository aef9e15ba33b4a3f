use serde::{Deserialize, Serialize};

/// Column order of the XML staging table.
pub const STAGING_COLUMNS: [&str; 10] = [
    "area",
    "year",
    "season",
    "dayType",
    "FIPS",
    "sccNEI",
    "pollutantCode",
    "emissionunits",
    "emission",
    "E6MILE",
];

/// One (FIPS, classification code, pollutant code) row consumed by the
/// reporting document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingRow {
    pub area: String,
    pub year: i64,
    pub season: String,
    #[serde(rename = "dayType")]
    pub day_type: String,
    #[serde(rename = "FIPS")]
    pub fips: i64,
    #[serde(rename = "sccNEI")]
    pub scc: String,
    #[serde(rename = "pollutantCode")]
    pub pollutant_code: String,
    #[serde(rename = "emissionunits")]
    pub emission_units: String,
    pub emission: f64,
    /// Vehicle miles travelled in millions; zero when no VMT matched.
    #[serde(rename = "E6MILE")]
    pub e6mile: f64,
}
