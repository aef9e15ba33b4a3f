//! Per-category normalization rules.
//!
//! Source files come one per activity or emissions category. Some
//! categories have no road context (off-network) or lack the vehicle
//! dimension altogether (pinned). The rules here say how each category's
//! rows are completed before they are unpivoted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::ActivityType;

/// Source use type of combination long-haul trucks.
pub const LONG_HAUL_TRUCK: i64 = 62;
/// Fuel type ID of diesel.
pub const DIESEL: i64 = 2;

/// A fixed (source use type, fuel type) pair for categories whose files
/// do not carry the vehicle dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedVehicle {
    pub source_use_type_id: i64,
    pub fuel_type_id: i64,
}

impl PinnedVehicle {
    pub const LONG_HAUL_DIESEL: PinnedVehicle = PinnedVehicle {
        source_use_type_id: LONG_HAUL_TRUCK,
        fuel_type_id: DIESEL,
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category is derived from others and would double count.
    #[serde(default)]
    pub skip: bool,
    /// Functional class and area type get the off-network sentinel.
    #[serde(default)]
    pub off_network: bool,
    #[serde(default)]
    pub pinned: Option<PinnedVehicle>,
    /// Activity type a single generic value column is reported as.
    #[serde(default)]
    pub activity_type: Option<ActivityType>,
}

impl CategoryRule {
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            skip: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn off_network(activity_type: Option<ActivityType>) -> Self {
        Self {
            off_network: true,
            activity_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pinned(mut self, pinned: PinnedVehicle) -> Self {
        self.pinned = Some(pinned);
        self
    }

    #[must_use]
    pub fn with_activity_type(mut self, activity_type: ActivityType) -> Self {
        self.activity_type = Some(activity_type);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRules {
    #[serde(default = "default_activity_rules")]
    pub activity: BTreeMap<String, CategoryRule>,
    #[serde(default = "default_emission_rules")]
    pub emissions: BTreeMap<String, CategoryRule>,
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            activity: default_activity_rules(),
            emissions: default_emission_rules(),
        }
    }
}

impl CategoryRules {
    pub fn activity_rule(&self, category: &str) -> CategoryRule {
        self.activity.get(category).cloned().unwrap_or_default()
    }

    pub fn emission_rule(&self, category: &str) -> CategoryRule {
        self.emissions.get(category).cloned().unwrap_or_default()
    }
}

fn default_activity_rules() -> BTreeMap<String, CategoryRule> {
    BTreeMap::from([
        ("TotSHP".to_string(), CategoryRule::skipped()),
        (
            "AdjSHP".to_string(),
            CategoryRule::off_network(Some(ActivityType::AdjSHP)),
        ),
        (
            "ONI".to_string(),
            CategoryRule::off_network(Some(ActivityType::Oni)),
        ),
        (
            "APU_SHEI".to_string(),
            CategoryRule::off_network(None).with_pinned(PinnedVehicle::LONG_HAUL_DIESEL),
        ),
        (
            "Starts".to_string(),
            CategoryRule::off_network(Some(ActivityType::Starts)),
        ),
    ])
}

fn default_emission_rules() -> BTreeMap<String, CategoryRule> {
    BTreeMap::from([
        (
            "OnRoad".to_string(),
            CategoryRule::default().with_activity_type(ActivityType::Vmt),
        ),
        (
            "SHP".to_string(),
            CategoryRule::off_network(Some(ActivityType::AdjSHP)),
        ),
        (
            "ONI".to_string(),
            CategoryRule::off_network(Some(ActivityType::Oni)),
        ),
        (
            "APU".to_string(),
            CategoryRule::off_network(Some(ActivityType::Apu))
                .with_pinned(PinnedVehicle::LONG_HAUL_DIESEL),
        ),
        (
            "SHEI".to_string(),
            CategoryRule::off_network(Some(ActivityType::Shei))
                .with_pinned(PinnedVehicle::LONG_HAUL_DIESEL),
        ),
        (
            "Starts".to_string(),
            CategoryRule::off_network(Some(ActivityType::Starts)),
        ),
    ])
}
