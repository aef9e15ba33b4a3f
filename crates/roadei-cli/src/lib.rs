//! Command-line layer of the road emissions inventory pipeline.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod pipeline;
