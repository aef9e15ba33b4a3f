//! Enumerations for the categorical fields carried by activity and
//! emissions records.
//!
//! Both enums round-trip through the exact abbreviations used in the
//! modeling tool's output files, so `Display` and `FromStr` are inverse.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Activity type abbreviation.
///
/// Declaration order is the output sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    #[serde(rename = "VMT")]
    Vmt,
    #[serde(rename = "VHT")]
    Vht,
    Speed,
    AdjSHP,
    #[serde(rename = "ONI")]
    Oni,
    Starts,
    #[serde(rename = "SHEI")]
    Shei,
    #[serde(rename = "APU")]
    Apu,
}

impl ActivityType {
    pub const ALL: [ActivityType; 8] = [
        ActivityType::Vmt,
        ActivityType::Vht,
        ActivityType::Speed,
        ActivityType::AdjSHP,
        ActivityType::Oni,
        ActivityType::Starts,
        ActivityType::Shei,
        ActivityType::Apu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Vmt => "VMT",
            ActivityType::Vht => "VHT",
            ActivityType::Speed => "Speed",
            ActivityType::AdjSHP => "AdjSHP",
            ActivityType::Oni => "ONI",
            ActivityType::Starts => "Starts",
            ActivityType::Shei => "SHEI",
            ActivityType::Apu => "APU",
        }
    }

    /// Unit the modeling tool reports this activity in.
    pub fn default_unit(&self) -> &'static str {
        match self {
            ActivityType::Vmt => "miles",
            ActivityType::Vht => "hours",
            ActivityType::Speed => "mph",
            ActivityType::Starts => "starts",
            ActivityType::AdjSHP | ActivityType::Oni | ActivityType::Shei | ActivityType::Apu => {
                "hours"
            }
        }
    }

    /// Average speed is an intensive quantity and cannot be summed.
    pub fn is_additive(&self) -> bool {
        !matches!(self, ActivityType::Speed)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ActivityType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown activity type: {s}"))
    }
}

/// Emissions inventory type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InventoryType {
    /// Running, start and idle exhaust.
    Ems,
    /// Refueling losses.
    Rf,
    /// Total energy consumption.
    Tec,
}

impl InventoryType {
    pub const ALL: [InventoryType; 3] = [InventoryType::Ems, InventoryType::Rf, InventoryType::Tec];

    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryType::Ems => "EMS",
            InventoryType::Rf => "RF",
            InventoryType::Tec => "TEC",
        }
    }

    /// Prefix the modeling tool puts on headers of this inventory's files.
    pub fn header_prefix(&self) -> Option<&'static str> {
        match self {
            InventoryType::Ems => None,
            InventoryType::Rf => Some("RF"),
            InventoryType::Tec => Some("TEC"),
        }
    }
}

impl fmt::Display for InventoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InventoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EMS" => Ok(InventoryType::Ems),
            "RF" => Ok(InventoryType::Rf),
            "TEC" => Ok(InventoryType::Tec),
            _ => Err(format!("unknown inventory type: {s}")),
        }
    }
}
