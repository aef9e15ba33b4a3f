//! Run file loading.
//!
//! A run file is TOML. It is parsed into [`RunFile`] and resolved once
//! into an immutable [`RunConfig`]: scenario lists are collapsed to single
//! values, relative paths are anchored at the run file's directory, and
//! unit tables become conversion factors.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use roadei_labels::{BuiltinUnits, UnitConverter, conversion_table_from_quantities};
use roadei_model::{
    ActivityType, AggregationView, CategoryRules, ConfigMismatch, ConversionFactor,
    ConversionTable, DocumentHeader, DocumentPayload, InventoryType, PollutantMapping,
    RenameRules, Result, RoadEiError, RoadTypeSettings, RunConfig, ScenarioKey, StageSelection,
    TableSchema, XmlSettings, default_activity_units, default_views,
    pollutant::TOTAL_ENERGY_POLLUTANT_ID,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    pub area: String,
    pub years: Vec<i64>,
    pub seasons: Vec<String>,
    pub day_types: Vec<String>,
    pub counties: Vec<i64>,
    #[serde(default = "default_inventory_types")]
    pub inventory_types: Vec<InventoryType>,
    pub output_dir: PathBuf,
}

fn default_inventory_types() -> Vec<InventoryType> {
    vec![InventoryType::Ems]
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitsSection {
    /// Quantity (`mass`, `energy`) to the unit the source files report.
    #[serde(default)]
    pub input: BTreeMap<String, String>,
    /// Quantity to the unit outputs are reported in.
    #[serde(default)]
    pub output: BTreeMap<String, String>,
    /// Explicit factors; used instead of the quantity tables when present.
    #[serde(default)]
    pub factors: Vec<ConversionFactor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelsSection {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSection {
    #[serde(default = "TableSchema::default_activity")]
    pub activity: TableSchema,
    #[serde(default = "TableSchema::default_emissions")]
    pub emissions: TableSchema,
}

impl Default for SchemaSection {
    fn default() -> Self {
        Self {
            activity: TableSchema::default_activity(),
            emissions: TableSchema::default_emissions(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XmlSection {
    /// Defaults to every configured pollutant code.
    #[serde(default)]
    pub pollutant_codes: Option<Vec<String>>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub day_type: Option<String>,
    #[serde(default)]
    pub header: Option<DocumentHeader>,
    #[serde(default)]
    pub payload: DocumentPayload,
}

/// Raw run file as written by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    pub run: RunSection,
    #[serde(default)]
    pub stages: StageSelection,
    #[serde(default)]
    pub activity_files: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub emission_files: BTreeMap<InventoryType, BTreeMap<String, PathBuf>>,
    #[serde(default)]
    pub pollutants: Option<BTreeMap<String, Vec<i64>>>,
    #[serde(default)]
    pub units: UnitsSection,
    #[serde(default)]
    pub activity_units: Option<BTreeMap<ActivityType, String>>,
    pub road_types: RoadTypeSettings,
    pub labels: LabelsSection,
    #[serde(default)]
    pub schema: SchemaSection,
    #[serde(default)]
    pub rename: RenameRules,
    #[serde(default)]
    pub categories: CategoryRules,
    #[serde(default)]
    pub views: Option<Vec<AggregationView>>,
    #[serde(default)]
    pub xml: XmlSection,
}

/// Reads and resolves a run file.
///
/// # Errors
///
/// Returns [`RoadEiError::Config`] for unreadable or malformed files and
/// [`RoadEiError::ConfigMismatch`] for inconsistent selections.
pub fn load_run_config(path: &Path) -> Result<RunConfig> {
    let text = std::fs::read_to_string(path).map_err(|err| RoadEiError::io(path, err))?;
    let file: RunFile = toml::from_str(&text).map_err(|err| RoadEiError::Config {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_run_file(file, base, &BuiltinUnits).map_err(|err| match err {
        RoadEiError::Config { message, .. } => RoadEiError::Config {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

fn single<T: Clone + ToString>(field: &str, values: &[T]) -> Result<T> {
    match values {
        [value] => Ok(value.clone()),
        _ => Err(ConfigMismatch::NonSingletonScenario {
            field: field.to_string(),
            values: values.iter().map(ToString::to_string).collect(),
        }
        .into()),
    }
}

fn anchor(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn anchor_files(base: &Path, files: BTreeMap<String, PathBuf>) -> BTreeMap<String, PathBuf> {
    files
        .into_iter()
        .map(|(category, path)| {
            let anchored = anchor(base, &path);
            (category, anchored)
        })
        .collect()
}

fn default_quantity_units(input: bool) -> BTreeMap<String, String> {
    let mass = if input { "grams" } else { "pound" };
    BTreeMap::from([
        ("mass".to_string(), mass.to_string()),
        ("energy".to_string(), "Kilojoules".to_string()),
    ])
}

fn conversion_table(units: UnitsSection, converter: &dyn UnitConverter) -> Result<ConversionTable> {
    if !units.factors.is_empty() {
        return Ok(ConversionTable::new(units.factors)?);
    }
    let input = if units.input.is_empty() {
        default_quantity_units(true)
    } else {
        units.input
    };
    let output = if units.output.is_empty() {
        default_quantity_units(false)
    } else {
        units.output
    };
    Ok(conversion_table_from_quantities(&input, &output, converter)?)
}

/// Resolves a parsed run file against `base`.
pub fn resolve_run_file(
    file: RunFile,
    base: &Path,
    converter: &dyn UnitConverter,
) -> Result<RunConfig> {
    let run = file.run;
    let scenario = ScenarioKey::new(
        run.area.clone(),
        single("years", &run.years)?,
        single("seasons", &run.seasons)?,
        single("day_types", &run.day_types)?,
    );
    let counties: BTreeSet<i64> = run.counties.into_iter().collect();
    if counties.is_empty() {
        return Err(RoadEiError::Config {
            path: base.to_path_buf(),
            message: "run.counties must list at least one FIPS code".to_string(),
        });
    }

    let emission_files: BTreeMap<InventoryType, BTreeMap<String, PathBuf>> = file
        .emission_files
        .into_iter()
        .map(|(inventory, files)| (inventory, anchor_files(base, files)))
        .collect();
    if file.stages.detailed {
        if let Some(inventory) = run.inventory_types.iter().find(|inventory| {
            emission_files
                .get(inventory)
                .is_none_or(BTreeMap::is_empty)
        }) {
            return Err(ConfigMismatch::MissingInventoryFiles {
                inventory: *inventory,
            }
            .into());
        }
    }

    let mut pollutants = file
        .pollutants
        .map(PollutantMapping::new)
        .unwrap_or_else(PollutantMapping::default_selection);
    if run.inventory_types.contains(&InventoryType::Tec)
        && !pollutants.maps_id(TOTAL_ENERGY_POLLUTANT_ID)
    {
        info!("TEC inventory selected; adding pollutant code TEC for total energy consumption");
        pollutants.insert("TEC", vec![TOTAL_ENERGY_POLLUTANT_ID]);
    }

    let conversions = conversion_table(file.units, converter)?;

    let xml_codes = file
        .xml
        .pollutant_codes
        .unwrap_or_else(|| pollutants.codes().map(str::to_string).collect());
    if let Some(code) = xml_codes.iter().find(|code| !pollutants.contains_code(code)) {
        return Err(ConfigMismatch::XmlPollutantNotSelected { code: code.clone() }.into());
    }
    let xml_year = file.xml.year.unwrap_or(scenario.year);
    let xml_season = file.xml.season.unwrap_or_else(|| scenario.season.clone());
    let xml_day_type = file.xml.day_type.unwrap_or_else(|| scenario.day_type.clone());
    let header = file.xml.header.unwrap_or_else(|| DocumentHeader {
        id: format!(
            "{}_{}_{}_{}",
            scenario.area, xml_year, xml_season, xml_day_type
        ),
        ..DocumentHeader::default()
    });
    let xml = XmlSettings {
        pollutant_codes: xml_codes,
        year: xml_year,
        season: xml_season,
        day_type: xml_day_type,
        header,
        payload: file.xml.payload,
    };

    Ok(RunConfig {
        scenario,
        counties,
        inventory_types: run.inventory_types,
        output_dir: anchor(base, &run.output_dir),
        stages: file.stages,
        activity_files: anchor_files(base, file.activity_files),
        emission_files,
        pollutants,
        conversions,
        activity_units: file.activity_units.unwrap_or_else(default_activity_units),
        road_types: RoadTypeSettings {
            file: anchor(base, &file.road_types.file),
            source: file.road_types.source,
        },
        labels_dir: anchor(base, &file.labels.dir),
        activity_schema: file.schema.activity,
        emissions_schema: file.schema.emissions,
        rename: file.rename,
        categories: file.categories,
        views: file.views.unwrap_or_else(default_views),
        xml,
    })
}

/// Input files named by the configuration that do not exist.
pub fn missing_input_files(config: &RunConfig) -> Vec<PathBuf> {
    let mut paths: Vec<&PathBuf> = vec![&config.road_types.file];
    if config.stages.detailed {
        paths.extend(config.activity_files.values());
        for (_, files) in config.selected_emission_files() {
            paths.extend(files.values());
        }
    }
    paths
        .into_iter()
        .filter(|path| !path.is_file())
        .cloned()
        .collect()
}
