pub mod polars_utils;
pub mod readback;
pub mod source_table;

pub use polars_utils::{any_to_f64, any_to_i64, any_to_string, format_numeric};
pub use readback::{frame_to_keyed_table, read_frame, read_keyed_table};
pub use source_table::{
    ReadOptions, SourceTable, parse_float_cell, parse_int_cell, read_source_table,
};
