//! Detailed table generation.
//!
//! Normalizes the activity and emissions files of one scenario, checks that
//! the road type mapping covers every observed on-network pair, and labels
//! the records onto the configured detailed schemas.

use std::time::Instant;

use tracing::{info, info_span};

use roadei_labels::{LabelService, load_road_type_mapping};
use roadei_model::{
    ActivityTable, DetailedTables, EmissionsTable, LabelTables, Result, RoadTypeMapping,
    RunConfig,
};
use roadei_transform::{
    ActivityNormalizer, EmissionsNormalizer, LabelJoiner, check_road_type_completeness,
};

/// Reference inputs of the detail stage.
#[derive(Debug, Clone)]
pub struct DetailInputs {
    pub labels: LabelTables,
    pub road_types: RoadTypeMapping,
}

/// Loads the label tables and the road type mapping for `config`.
///
/// # Errors
///
/// Fails when a label table is missing or the run area has no mapping rows.
pub fn load_detail_inputs(
    config: &RunConfig,
    labels: &dyn LabelService,
) -> Result<DetailInputs> {
    info!(source = %labels.describe(), "loading label tables");
    let label_tables = labels.load()?;
    let road_types = load_road_type_mapping(
        &config.road_types.file,
        config.road_types.source,
        &config.scenario.area,
    )?;
    Ok(DetailInputs {
        labels: label_tables,
        road_types,
    })
}

/// Produces the detailed activity and emissions tables of one run.
#[derive(Debug, Clone, Copy)]
pub struct DetailGenerator<'a> {
    config: &'a RunConfig,
    inputs: &'a DetailInputs,
}

impl<'a> DetailGenerator<'a> {
    pub fn new(config: &'a RunConfig, inputs: &'a DetailInputs) -> Self {
        Self { config, inputs }
    }

    /// Normalized activity records tagged with the run scenario.
    pub fn activity(&self) -> Result<ActivityTable> {
        let records =
            ActivityNormalizer::from_config(self.config).normalize(&self.config.activity_files)?;
        Ok(ActivityTable::new(self.config.scenario.clone(), records))
    }

    /// Normalized, unit-converted emissions records tagged with the run
    /// scenario.
    pub fn emissions(&self) -> Result<EmissionsTable> {
        let records = EmissionsNormalizer::from_config(self.config)
            .normalize(self.config.selected_emission_files())?;
        Ok(EmissionsTable::new(self.config.scenario.clone(), records))
    }

    /// Runs normalization, the completeness check, and the label join for
    /// both tables.
    ///
    /// # Errors
    ///
    /// Propagates input, shape, and configuration errors. Nothing is
    /// written by this stage, so a failure leaves no partial output.
    pub fn generate(&self) -> Result<DetailedTables> {
        let span = info_span!("detail", scenario = %self.config.scenario);
        let _guard = span.enter();
        let start = Instant::now();
        let joiner = LabelJoiner::new(&self.inputs.labels, &self.inputs.road_types);

        let activity = self.activity()?;
        check_road_type_completeness(
            activity.records.iter().map(|r| r.key.road_pair()),
            &self.inputs.road_types,
        )?;
        let activity = joiner.join_activity(&activity, &self.config.activity_schema)?;

        let emissions = self.emissions()?;
        check_road_type_completeness(
            emissions.records.iter().map(|r| r.key.road_pair()),
            &self.inputs.road_types,
        )?;
        let emissions = joiner.join_emissions(&emissions, &self.config.emissions_schema)?;

        info!(
            activity_rows = activity.len(),
            emission_rows = emissions.len(),
            duration_ms = start.elapsed().as_millis(),
            "detailed tables complete"
        );
        Ok(DetailedTables {
            activity,
            emissions,
        })
    }
}
