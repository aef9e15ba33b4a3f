pub mod category;
pub mod config;
pub mod conformance;
pub mod dimension;
pub mod enums;
pub mod error;
pub mod labels;
pub mod pollutant;
pub mod record;
pub mod staging;
pub mod table;
pub mod units;
pub mod view;

pub use category::{CategoryRule, CategoryRules, PinnedVehicle};
pub use config::{
    DocumentHeader, DocumentPayload, DocumentProperty, RenameRules, RoadTypeSettings,
    RoadTypeSource, RunConfig, StageSelection, XmlSettings, default_activity_units,
};
pub use conformance::{IssueSeverity, QcIssue, QcReport};
pub use dimension::{Dimension, DimensionKind, KeyValue};
pub use enums::{ActivityType, InventoryType};
pub use error::{ConfigMismatch, Result, RoadEiError};
pub use labels::{
    LabelTableName, LabelTables, ProcessLabel, RoadTypeMapping, RoadTypeRow, TypeLabel,
};
pub use pollutant::PollutantMapping;
pub use record::{
    ActivityRecord, ActivityTable, EmissionsRecord, EmissionsTable, OFF_NETWORK_ID, ScenarioKey,
    ScenarioTable, VehicleKey,
};
pub use staging::{STAGING_COLUMNS, StagingRow};
pub use table::{DetailedTables, KeyedRow, KeyedTable, TableKind, TableSchema};
pub use units::{ConversionFactor, ConversionTable};
pub use view::{AggregationView, default_views};
