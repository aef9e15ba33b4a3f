//! Normalization and labeling of modeling tool output.
//!
//! - **activity** / **emissions**: wide source files to long-form records
//! - **keys**: vehicle key extraction with off-network and pinned rules
//! - **joiner**: label joins and projection onto the detailed schema
//! - **completeness**: road type mapping coverage check
//! - **classification**: classification code and combined labels

pub mod activity;
pub mod classification;
pub mod completeness;
pub mod emissions;
pub mod joiner;
pub mod keys;

pub use activity::ActivityNormalizer;
pub use classification::{classification_code, sut_ft_label};
pub use completeness::check_road_type_completeness;
pub use emissions::{EmissionsNormalizer, check_units, convert_units};
pub use joiner::{LabelJoiner, check_schema, provides};
