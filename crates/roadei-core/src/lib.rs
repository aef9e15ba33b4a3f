//! Run orchestration for the road emissions inventory pipeline.
//!
//! - **config**: TOML run file to [`roadei_model::RunConfig`]
//! - **detail**: normalize, check, and label the detailed tables
//! - **aggregate**: named aggregation views
//! - **staging**: the XML staging table
//! - **frame**: polars DataFrames for the writers

pub mod aggregate;
pub mod config;
pub mod detail;
pub mod frame;
pub mod staging;

pub use aggregate::{
    AggregateSheet, AggregateTables, Aggregator, aggregate_table, group_sum, is_additive_row,
    view_key,
};
pub use config::{RunFile, load_run_config, missing_input_files, resolve_run_file};
pub use detail::{DetailGenerator, DetailInputs, load_detail_inputs};
pub use frame::{keyed_table_frame, staging_frame};
pub use staging::StagingTableBuilder;
