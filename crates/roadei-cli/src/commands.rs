use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, info_span};

use roadei_core::{Aggregator, load_run_config, missing_input_files, view_key};
use roadei_labels::{load_road_type_mapping, missing_label_files};
use roadei_model::{
    AggregationView, Dimension, KeyedTable, RunConfig, ScenarioKey, TableKind, TableSchema,
    default_views,
};

use crate::cli::{CheckConfigArgs, RunArgs, ViewsArgs};
use crate::pipeline::{RunOutcome, execute};

/// Loads the run file, applies command-line overrides and runs the pipeline.
pub fn run_pipeline(args: &RunArgs) -> Result<RunOutcome> {
    let mut config = load_run_config(&args.run_file)
        .with_context(|| format!("load run file {}", args.run_file.display()))?;
    apply_overrides(&mut config, args);
    execute(&config, Utc::now())
}

fn apply_overrides(config: &mut RunConfig, args: &RunArgs) {
    if let Some(dir) = &args.output_dir {
        config.output_dir.clone_from(dir);
    }
    if args.reuse_detailed {
        config.stages.detailed = false;
    }
    if args.no_aggregate {
        config.stages.aggregate = false;
    }
    if args.no_xml {
        config.stages.xml = false;
    }
}

/// One row of the `views` listing.
#[derive(Debug, Clone)]
pub struct ViewListing {
    pub name: String,
    pub remove: Vec<String>,
    pub add: Vec<String>,
    pub activity_key: Vec<String>,
    pub emissions_key: Vec<String>,
}

/// Lists the views of a run file, or the built-in views.
pub fn run_views(args: &ViewsArgs) -> Result<Vec<ViewListing>> {
    let (views, activity_schema, emissions_schema) = match &args.run_file {
        Some(path) => {
            let config = load_run_config(path)
                .with_context(|| format!("load run file {}", path.display()))?;
            (
                config.views,
                config.activity_schema,
                config.emissions_schema,
            )
        }
        None => (
            default_views(),
            TableSchema::default_activity(),
            TableSchema::default_emissions(),
        ),
    };
    let aggregator =
        Aggregator::new(&views, &activity_schema, &emissions_schema).context("build view registry")?;

    let activity = KeyedTable::new(TableKind::Activity, activity_schema.dimensions());
    let emissions = KeyedTable::new(TableKind::Emissions, emissions_schema.dimensions());
    Ok(views
        .iter()
        .map(|view| listing(&aggregator, view, &activity, &emissions))
        .collect())
}

fn listing(
    aggregator: &Aggregator<'_>,
    view: &AggregationView,
    activity: &KeyedTable,
    emissions: &KeyedTable,
) -> ViewListing {
    let names = |dims: &[Dimension]| {
        dims.iter().map(ToString::to_string).collect::<Vec<_>>()
    };
    let key = |table: &KeyedTable| view_key(view, aggregator.schema(table.kind), table);
    ViewListing {
        name: view.name.clone(),
        remove: names(&view.remove),
        add: names(&view.add),
        activity_key: names(&key(activity)),
        emissions_key: names(&key(emissions)),
    }
}

/// Outcome of `check-config`.
#[derive(Debug, Clone)]
pub struct ConfigCheck {
    pub run_file: PathBuf,
    pub scenario: ScenarioKey,
    pub counties: usize,
    pub views: usize,
    pub pollutant_codes: Vec<String>,
    pub output_dir: PathBuf,
    pub problems: Vec<String>,
}

impl ConfigCheck {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Resolves a run file and checks its inputs without reading any data rows
/// beyond the road type mapping.
///
/// Resolution failures (scenario lists, inventory tables, XML pollutant
/// codes, unit tables) are returned as errors. Missing files and an empty
/// road type mapping are collected as problems.
pub fn run_check_config(args: &CheckConfigArgs) -> Result<ConfigCheck> {
    let span = info_span!("check_config", run_file = %args.run_file.display());
    let _guard = span.enter();

    let config = load_run_config(&args.run_file)
        .with_context(|| format!("load run file {}", args.run_file.display()))?;
    Aggregator::from_config(&config).context("build view registry")?;

    let mut problems: Vec<String> = missing_input_files(&config)
        .into_iter()
        .chain(missing_label_files(&config.labels_dir))
        .map(|path| format!("missing input file {}", path.display()))
        .collect();

    if config.road_types.file.is_file()
        && let Err(error) = load_road_type_mapping(
            &config.road_types.file,
            config.road_types.source,
            &config.scenario.area,
        )
    {
        problems.push(error.to_string());
    }

    info!(problems = problems.len(), "run file checked");
    Ok(ConfigCheck {
        run_file: args.run_file.clone(),
        counties: config.counties.len(),
        views: config.views.len(),
        pollutant_codes: config.xml.pollutant_codes.clone(),
        output_dir: config.output_dir.clone(),
        scenario: config.scenario,
        problems,
    })
}
