pub mod road_types;
pub mod service;
pub mod units;

pub use road_types::load_road_type_mapping;
pub use service::{CsvLabelDirectory, LabelService, missing_label_files};
pub use units::{BuiltinUnits, UnitConverter, conversion_table_from_quantities};
