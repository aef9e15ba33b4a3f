//! Stage orchestration for one run.
//!
//! Each stage materializes its output before the next one starts. When the
//! detail stage is disabled the detailed tables are read back from the
//! output directory instead.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, info_span};

use roadei_core::{
    AggregateTables, Aggregator, DetailGenerator, StagingTableBuilder, load_detail_inputs,
};
use roadei_ingest::read_keyed_table;
use roadei_labels::CsvLabelDirectory;
use roadei_model::{DetailedTables, QcReport, RunConfig, ScenarioKey, StagingRow, TableKind};
use roadei_report::{
    CersDocument, DetailedOutputs, write_aggregate_tables, write_detailed_tables,
    write_staging_table,
};
use roadei_validate::{QcInputs, run_qc, write_qc_report};

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detail,
    Reuse,
    Aggregate,
    Xml,
    Qc,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Detail => "detail",
            Stage::Reuse => "detail (reused)",
            Stage::Aggregate => "aggregate",
            Stage::Xml => "xml",
            Stage::Qc => "qc",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What one stage produced.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: Stage,
    pub rows: usize,
    pub outputs: Vec<PathBuf>,
    pub duration_ms: u128,
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub scenario: ScenarioKey,
    pub output_dir: PathBuf,
    pub stages: Vec<StageOutcome>,
    pub qc: QcReport,
    pub qc_report: PathBuf,
}

impl RunOutcome {
    pub fn has_errors(&self) -> bool {
        self.qc.has_errors()
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|outcome| outcome.stage == stage)
    }
}

/// Runs every enabled stage of `config`, then the quality checks.
///
/// `now` stamps the reporting document when its header carries no
/// creation time.
///
/// # Errors
///
/// Fails on the first stage error; outputs of earlier stages stay in place.
pub fn execute(config: &RunConfig, now: DateTime<Utc>) -> Result<RunOutcome> {
    let span = info_span!("run", scenario = %config.scenario);
    let _guard = span.enter();
    let start = Instant::now();
    let output_dir = config.output_dir.as_path();
    let mut stages = Vec::new();

    let (detailed, detail) = if config.stages.detailed {
        detail_stage(config, output_dir)?
    } else {
        reuse_stage(output_dir)?
    };
    stages.push(detail);

    let aggregates = if config.stages.aggregate {
        let (sheets, outcome) = aggregate_stage(config, output_dir, &detailed)?;
        stages.push(outcome);
        Some(sheets)
    } else {
        None
    };

    let staging = if config.stages.xml {
        let (rows, outcome) = xml_stage(config, output_dir, &detailed, now)?;
        stages.push(outcome);
        Some(rows)
    } else {
        None
    };

    let qc_start = Instant::now();
    let qc = run_qc(
        config,
        QcInputs {
            detailed: &detailed,
            aggregates: aggregates.as_ref(),
            staging: staging.as_deref(),
        },
    );
    let qc_report = write_qc_report(output_dir, &qc).context("write QC report")?;
    stages.push(StageOutcome {
        stage: Stage::Qc,
        rows: qc.issues.len(),
        outputs: vec![qc_report.clone()],
        duration_ms: qc_start.elapsed().as_millis(),
    });

    info!(
        stages = stages.len(),
        qc_errors = qc.error_count(),
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );
    Ok(RunOutcome {
        scenario: config.scenario.clone(),
        output_dir: output_dir.to_path_buf(),
        stages,
        qc,
        qc_report,
    })
}

fn detail_stage(config: &RunConfig, output_dir: &Path) -> Result<(DetailedTables, StageOutcome)> {
    let start = Instant::now();
    let labels = CsvLabelDirectory::new(&config.labels_dir);
    let inputs = load_detail_inputs(config, &labels).context("load reference tables")?;
    let tables = DetailGenerator::new(config, &inputs)
        .generate()
        .context("generate detailed tables")?;
    let outputs = write_detailed_tables(output_dir, &tables).context("write detailed tables")?;
    let outcome = StageOutcome {
        stage: Stage::Detail,
        rows: tables.activity.len() + tables.emissions.len(),
        outputs: vec![outputs.activity, outputs.emissions],
        duration_ms: start.elapsed().as_millis(),
    };
    Ok((tables, outcome))
}

fn reuse_stage(output_dir: &Path) -> Result<(DetailedTables, StageOutcome)> {
    let start = Instant::now();
    let paths = DetailedOutputs::in_dir(output_dir);
    let activity = read_keyed_table(&paths.activity, TableKind::Activity)
        .context("read back detailed activity")?;
    let emissions = read_keyed_table(&paths.emissions, TableKind::Emissions)
        .context("read back detailed emissions")?;
    info!(
        activity_rows = activity.len(),
        emission_rows = emissions.len(),
        "reusing detailed tables"
    );
    let outcome = StageOutcome {
        stage: Stage::Reuse,
        rows: activity.len() + emissions.len(),
        outputs: vec![paths.activity, paths.emissions],
        duration_ms: start.elapsed().as_millis(),
    };
    Ok((DetailedTables { activity, emissions }, outcome))
}

fn aggregate_stage(
    config: &RunConfig,
    output_dir: &Path,
    detailed: &DetailedTables,
) -> Result<(AggregateTables, StageOutcome)> {
    let start = Instant::now();
    let sheets = Aggregator::from_config(config)
        .context("build view registry")?
        .aggregate(detailed);
    let outputs = write_aggregate_tables(output_dir, &sheets).context("write aggregate workbook")?;
    let rows = sheets
        .values()
        .map(|sheet| sheet.activity.len() + sheet.emissions.len())
        .sum();
    let outcome = StageOutcome {
        stage: Stage::Aggregate,
        rows,
        outputs,
        duration_ms: start.elapsed().as_millis(),
    };
    Ok((sheets, outcome))
}

fn xml_stage(
    config: &RunConfig,
    output_dir: &Path,
    detailed: &DetailedTables,
    now: DateTime<Utc>,
) -> Result<(Vec<StagingRow>, StageOutcome)> {
    let start = Instant::now();
    let rows = StagingTableBuilder::new(&config.xml)
        .build(detailed)
        .context("build staging table")?;
    let staging = write_staging_table(output_dir, &rows).context("write staging table")?;
    let document = CersDocument::new(&config.xml, &rows)
        .write(output_dir, now)
        .context("write reporting document")?;
    let outcome = StageOutcome {
        stage: Stage::Xml,
        rows: rows.len(),
        outputs: vec![staging, document],
        duration_ms: start.elapsed().as_millis(),
    };
    Ok((rows, outcome))
}
