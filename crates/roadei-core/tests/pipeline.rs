use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use proptest::prelude::*;

use roadei_core::{
    Aggregator, DetailGenerator, StagingTableBuilder, aggregate_table, group_sum,
    load_detail_inputs, load_run_config, view_key,
};
use roadei_labels::CsvLabelDirectory;
use roadei_model::{
    AggregationView, ConfigMismatch, DetailedTables, Dimension, KeyValue, KeyedRow, KeyedTable,
    RoadEiError, RunConfig, TableKind, TableSchema,
};

const GRAMS_PER_POUND: f64 = 453.592_37;

const LABELS: [(&str, &str); 7] = [
    ("county.csv", "FIPS,countyName\n48201,Harris\n48157,Fort Bend\n"),
    (
        "emisprc.csv",
        "processID,processName,processABB\n1,Running Exhaust,RUNEX\n2,Start Exhaust,STREX\n",
    ),
    ("pollutants.csv", "pollutantID,pollutantName\n2,Carbon Monoxide\n3,Oxides of Nitrogen\n"),
    (
        "moves_roadtypes.csv",
        "mvsRoadTypeID,desc,mvsRoadTypeLab\n1,Off-Network,OffNet\n3,Rural Unrestricted Access,RUnr\n",
    ),
    (
        "moves_sut.csv",
        "sourceUseTypeID,desc,sutLab\n21,Passenger Car,PC\n31,Passenger Truck,PT\n",
    ),
    ("moves_ft.csv", "fuelTypeID,desc,ftLab\n1,Gasoline,Gas\n2,Diesel Fuel,Diesel\n"),
    (
        "act_lab.csv",
        "actTypeABB,actTypeLab\nVMT,Vehicle Miles Travelled\nSpeed,Average Speed\n",
    ),
];

const ROAD_TYPES: &str = "Area,TDM_FunctionClass_Code,FunctionClass,TDM_AreaType_Code,AreaType,MOVES_RoadTypeID\n\
HGB,1,Interstate,2,Suburban,3\n\
VLink,1,Interstate,1,Urban,4\n";

const RUN_FILE: &str = r#"
[run]
area = "HGB"
years = [2020]
seasons = ["Summer"]
day_types = ["Weekday"]
counties = [48201]
output_dir = "out"

[activity_files]
OnRoad = "onroad_act.txt"

[emission_files.EMS]
OnRoad = "onroad_emis.txt"
Starts = "starts_emis.txt"

[road_types]
file = "roadtypes.csv"

[labels]
dir = "labels"
"#;

const ONROAD_ACT: &str = "County\tHour\tRoadtype\tAreatype\tSUT\tFueltype\tVMT Calculated\n\
48201\t1\t1\t2\t21\t1\t1000.0\n";

const ONROAD_EMIS: &str =
    "County\tHour\tRoadtype\tAreatype\tSUT\tFueltype\tPollutant\tProcess\tUnit\tVMT_Emission\n\
48201\t1\t1\t2\t21\t1\t2\t1\tgrams\t453.59237\n";

const STARTS_EMIS: &str = "County\tHour\tSUT\tFueltype\tPollutant\tProcess\tUnit\tStart Emission\n\
48201\t7\t21\t2\t2\t2\tgrams\t907.18474\n";

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let labels = dir.path().join("labels");
        fs::create_dir(&labels).expect("labels dir");
        for (name, contents) in LABELS {
            fs::write(labels.join(name), contents).expect("write label table");
        }
        let ws = Self { dir };
        ws.write("roadtypes.csv", ROAD_TYPES);
        ws.write("onroad_act.txt", ONROAD_ACT);
        ws.write("onroad_emis.txt", ONROAD_EMIS);
        ws.write("starts_emis.txt", STARTS_EMIS);
        ws.write("run.toml", RUN_FILE);
        ws
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    fn config(&self) -> RunConfig {
        load_run_config(&self.path().join("run.toml")).expect("load run file")
    }

    fn detail(&self, config: &RunConfig) -> roadei_model::Result<DetailedTables> {
        let labels = CsvLabelDirectory::new(&config.labels_dir);
        let inputs = load_detail_inputs(config, &labels)?;
        DetailGenerator::new(config, &inputs).generate()
    }
}

fn value(table: &KeyedTable, row: &KeyedRow, dim: Dimension) -> KeyValue {
    let position = table.position(dim).expect("column present");
    row.keys[position].clone()
}

#[test]
fn single_vmt_row_flows_through_detail_and_staging() {
    let ws = Workspace::new();
    let config = ws.config();
    let detailed = ws.detail(&config).expect("detail");

    let activity = &detailed.activity;
    assert_eq!(activity.len(), 1);
    let row = &activity.rows[0];
    assert_eq!(value(activity, row, Dimension::RoadTypeId), KeyValue::Int(3));
    assert_eq!(value(activity, row, Dimension::Scc), KeyValue::from("2201210080"));
    assert_eq!(value(activity, row, Dimension::SutFtLabel), KeyValue::from("PC_Gas"));
    assert_eq!(value(activity, row, Dimension::Area), KeyValue::from("HGB"));
    assert_eq!(row.value, 1000.0);
    assert_eq!(
        activity.dimensions,
        config.activity_schema.dimensions(),
        "columns follow the configured schema"
    );

    let emissions = &detailed.emissions;
    assert_eq!(emissions.len(), 2);
    let starts = emissions
        .rows
        .iter()
        .find(|row| value(emissions, row, Dimension::ActType) == KeyValue::from("Starts"))
        .expect("starts row");
    assert_eq!(value(emissions, starts, Dimension::FuncClassId), KeyValue::Int(-99));
    assert_eq!(value(emissions, starts, Dimension::RoadTypeId), KeyValue::Int(1));
    assert_eq!(value(emissions, starts, Dimension::EmissionUnits), KeyValue::from("pound"));
    assert!((starts.value - 2.0).abs() < 1e-9);

    let staging = StagingTableBuilder::new(&config.xml)
        .build(&detailed)
        .expect("staging");
    assert_eq!(staging.len(), 2);
    let gas = staging
        .iter()
        .find(|row| row.scc == "2201210080")
        .expect("gasoline row");
    assert_eq!(gas.pollutant_code, "CO");
    assert!((gas.e6mile - 0.001).abs() < 1e-15);
    assert!((gas.emission - 1.0).abs() < 1e-9);
    let diesel = staging
        .iter()
        .find(|row| row.scc == "2202210080")
        .expect("diesel row");
    assert_eq!(diesel.e6mile, 0.0, "emissions without VMT are zero filled");
}

#[test]
fn dropping_hour_sums_rows_sharing_the_remaining_key() {
    let ws = Workspace::new();
    ws.write(
        "onroad_act.txt",
        "County\tHour\tRoadtype\tAreatype\tSUT\tFueltype\tVMT Calculated\tSpeed\n\
48201\t1\t1\t2\t21\t1\t1000.0\t45.0\n\
48201\t2\t1\t2\t21\t1\t250.0\t55.0\n",
    );
    let config = ws.config();
    let detailed = ws.detail(&config).expect("detail");
    let view = AggregationView::new("noHour", &[Dimension::Hour], &[]);
    assert_eq!(detailed.activity.len(), 4, "Speed rows are kept in detail");
    let sheet = aggregate_table(&view, &config.activity_schema, &detailed.activity);

    assert!(!sheet.has(Dimension::Hour));
    assert_eq!(sheet.len(), 1, "Speed rows are not aggregated");
    assert_eq!(sheet.rows[0].value, 1250.0);
}

#[test]
fn default_views_cover_both_tables() {
    let ws = Workspace::new();
    let config = ws.config();
    let detailed = ws.detail(&config).expect("detail");
    let sheets = Aggregator::from_config(&config)
        .expect("views")
        .aggregate(&detailed);

    assert_eq!(sheets.len(), 5);
    let by_scc = &sheets["aggByScc"];
    assert!(by_scc.emissions.has(Dimension::Scc));
    assert!(!by_scc.emissions.has(Dimension::Hour));
    assert!((by_scc.emissions.total() - detailed.emissions.total()).abs() < 1e-9);
}

#[test]
fn default_views_collapse_counties_and_vehicles() {
    let ws = Workspace::new();
    ws.write(
        "run.toml",
        &RUN_FILE.replace("counties = [48201]", "counties = [48201, 48157]"),
    );
    ws.write(
        "onroad_act.txt",
        "County\tHour\tRoadtype\tAreatype\tSUT\tFueltype\tVMT Calculated\n\
48201\t1\t1\t2\t21\t1\t1000.0\n\
48157\t1\t1\t2\t21\t1\t500.0\n\
48201\t2\t1\t2\t31\t1\t200.0\n",
    );
    ws.write(
        "onroad_emis.txt",
        "County\tHour\tRoadtype\tAreatype\tSUT\tFueltype\tPollutant\tProcess\tUnit\tVMT_Emission\n\
48201\t1\t1\t2\t21\t1\t2\t1\tgrams\t453.59237\n\
48157\t1\t1\t2\t21\t1\t2\t1\tgrams\t453.59237\n\
48201\t2\t1\t2\t31\t1\t2\t1\tgrams\t453.59237\n",
    );
    let config = ws.config();
    let detailed = ws.detail(&config).expect("detail");
    assert_eq!(detailed.activity.len(), 3);
    assert_eq!(detailed.emissions.len(), 4);
    let sheets = Aggregator::from_config(&config)
        .expect("views")
        .aggregate(&detailed);

    // (activity rows, emission rows); the Starts record adds one emission group.
    let expected = [
        ("aggByRdSutFt", 2, 3),
        ("aggByCntyRdSutFt", 3, 4),
        ("aggByHrRd", 2, 3),
        ("aggByScc", 3, 4),
        ("aggByFcAt", 2, 3),
    ];
    for (name, activity_rows, emission_rows) in expected {
        let sheet = &sheets[name];
        assert_eq!(sheet.activity.len(), activity_rows, "{name} activity");
        assert_eq!(sheet.emissions.len(), emission_rows, "{name} emissions");
        assert!((sheet.activity.total() - 1700.0).abs() < 1e-9, "{name}");
        assert!(
            (sheet.emissions.total() - detailed.emissions.total()).abs() < 1e-9,
            "{name}"
        );
    }

    let absent = |name: &str, dims: &[Dimension]| {
        let sheet = &sheets[name];
        for table in [&sheet.activity, &sheet.emissions] {
            for dim in dims {
                assert!(!table.has(*dim), "{name} {} keeps {dim}", table.kind);
            }
        }
    };
    absent("aggByRdSutFt", &[Dimension::Fips, Dimension::CountyName, Dimension::Hour]);
    absent(
        "aggByHrRd",
        &[
            Dimension::Fips,
            Dimension::CountyName,
            Dimension::SourceUseTypeId,
            Dimension::SutLabel,
            Dimension::FuelTypeId,
            Dimension::FtLabel,
            Dimension::SutFtLabel,
            Dimension::Scc,
        ],
    );
    absent(
        "aggByScc",
        &[Dimension::RoadTypeId, Dimension::RoadTypeLabel, Dimension::SutFtLabel],
    );
    absent("aggByFcAt", &[Dimension::RoadTypeLabel, Dimension::Scc]);

    let by_road = &sheets["aggByRdSutFt"].activity;
    assert!(by_road.has(Dimension::RoadTypeLabel) && by_road.has(Dimension::SutFtLabel));
    let labels: Vec<(KeyValue, f64)> = by_road
        .rows
        .iter()
        .map(|row| (value(by_road, row, Dimension::SutFtLabel), row.value))
        .collect();
    assert_eq!(
        labels,
        vec![(KeyValue::from("PC_Gas"), 1500.0), (KeyValue::from("PT_Gas"), 200.0)]
    );
    let by_county = &sheets["aggByCntyRdSutFt"].activity;
    assert!(by_county.has(Dimension::Fips) && by_county.has(Dimension::CountyName));
    assert!(sheets["aggByScc"].emissions.has(Dimension::CountyName));
}

#[test]
fn unmapped_road_pair_aborts_detail_generation() {
    let ws = Workspace::new();
    ws.write(
        "onroad_act.txt",
        "County\tHour\tRoadtype\tAreatype\tSUT\tFueltype\tVMT Calculated\n\
48201\t1\t5\t1\t21\t1\t10.0\n",
    );
    let err = ws.detail(&ws.config()).expect_err("incomplete mapping");
    assert_eq!(
        err.as_config_mismatch(),
        Some(&ConfigMismatch::RoadTypeMappingIncomplete {
            area: "HGB".to_string(),
            pairs: vec![(5, 1)],
        })
    );
}

#[test]
fn area_missing_from_mapping_is_a_config_mismatch() {
    let ws = Workspace::new();
    ws.write("run.toml", &RUN_FILE.replace("\"HGB\"", "\"ELP\""));
    let err = ws.detail(&ws.config()).expect_err("unknown area");
    assert!(matches!(
        err.as_config_mismatch(),
        Some(ConfigMismatch::AreaNotInRoadTypeMapping { .. })
    ));
}

#[test]
fn overlapping_codes_both_receive_the_record() {
    let ws = Workspace::new();
    ws.write(
        "run.toml",
        &format!("{RUN_FILE}\n[pollutants]\nCO = [2]\nCO-ALL = [2, 3]\n"),
    );
    let config = ws.config();
    let detailed = ws.detail(&config).expect("detail");
    let emissions = &detailed.emissions;
    let codes: Vec<KeyValue> = emissions
        .rows
        .iter()
        .map(|row| value(emissions, row, Dimension::PollutantCode))
        .collect();
    assert_eq!(
        codes.iter().filter(|c| **c == KeyValue::from("CO")).count(),
        2
    );
    assert_eq!(
        codes.iter().filter(|c| **c == KeyValue::from("CO-ALL")).count(),
        2
    );
}

#[test]
fn relative_paths_resolve_against_the_run_file() {
    let ws = Workspace::new();
    let config = ws.config();
    assert_eq!(config.output_dir, ws.path().join("out"));
    assert_eq!(config.labels_dir, ws.path().join("labels"));
    assert_eq!(config.xml.year, 2020);
    assert_eq!(config.xml.header.id, "HGB_2020_Summer_Weekday");
    assert_eq!(config.xml.pollutant_codes, vec!["CO", "NOx", "PM10"]);
}

#[test]
fn multiple_years_are_rejected() {
    let ws = Workspace::new();
    ws.write("run.toml", &RUN_FILE.replace("[2020]", "[2020, 2021]"));
    let err = load_run_config(&ws.path().join("run.toml")).expect_err("two years");
    assert_eq!(
        err.as_config_mismatch(),
        Some(&ConfigMismatch::NonSingletonScenario {
            field: "years".to_string(),
            values: vec!["2020".to_string(), "2021".to_string()],
        })
    );
}

#[test]
fn tec_selection_adds_total_energy_code() {
    let ws = Workspace::new();
    let run = RUN_FILE.replace(
        "output_dir = \"out\"",
        "output_dir = \"out\"\ninventory_types = [\"EMS\", \"TEC\"]",
    );
    ws.write(
        "run.toml",
        &format!("{run}\n[emission_files.TEC]\nOnRoad = \"onroad_tec.txt\"\n"),
    );
    let config = ws.config();
    assert!(config.pollutants.contains_code("TEC"));
    assert!(config.pollutants.maps_id(91));
}

#[test]
fn selected_inventory_without_files_is_rejected() {
    let ws = Workspace::new();
    ws.write(
        "run.toml",
        &RUN_FILE.replace(
            "output_dir = \"out\"",
            "output_dir = \"out\"\ninventory_types = [\"EMS\", \"RF\"]",
        ),
    );
    let err = load_run_config(&ws.path().join("run.toml")).expect_err("no RF files");
    assert!(matches!(
        err.as_config_mismatch(),
        Some(ConfigMismatch::MissingInventoryFiles { .. })
    ));
}

#[test]
fn xml_codes_must_be_configured() {
    let ws = Workspace::new();
    ws.write(
        "run.toml",
        &format!("{RUN_FILE}\n[xml]\npollutant_codes = [\"SO2\"]\n"),
    );
    let err = load_run_config(&ws.path().join("run.toml")).expect_err("unknown code");
    assert_eq!(
        err.as_config_mismatch(),
        Some(&ConfigMismatch::XmlPollutantNotSelected {
            code: "SO2".to_string()
        })
    );
}

#[test]
fn malformed_run_file_is_a_config_error() {
    let ws = Workspace::new();
    ws.write("run.toml", "[run]\narea = 3\n");
    let err = load_run_config(&ws.path().join("run.toml")).expect_err("bad toml");
    assert!(matches!(err, RoadEiError::Config { .. }));
}

fn emissions_schema() -> TableSchema {
    TableSchema {
        idx: vec![
            Dimension::Fips,
            Dimension::Hour,
            Dimension::PollutantCode,
            Dimension::EmissionUnits,
        ],
        labels: vec![Dimension::CountyName],
    }
}

fn county_name(fips: i64) -> &'static str {
    if fips == 48201 { "Harris" } else { "Fort Bend" }
}

fn emissions_table(rows: &[(i64, i64, &str, f64)]) -> KeyedTable {
    let mut table = KeyedTable::new(TableKind::Emissions, emissions_schema().dimensions());
    for (fips, hour, code, emission) in rows {
        table.rows.push(KeyedRow {
            keys: vec![
                KeyValue::Int(*fips),
                KeyValue::Int(*hour),
                KeyValue::from(*code),
                KeyValue::from("pound"),
                KeyValue::from(county_name(*fips)),
            ],
            value: *emission,
        });
    }
    table
}

fn close(a: &KeyedTable, b: &KeyedTable) -> bool {
    a.dimensions == b.dimensions
        && a.rows.len() == b.rows.len()
        && a.rows.iter().zip(&b.rows).all(|(x, y)| {
            x.keys == y.keys && (x.value - y.value).abs() <= 1e-9 * x.value.abs().max(1.0)
        })
}

proptest! {
    #[test]
    fn grouping_commutes_with_view_drop(
        rows in proptest::collection::vec(
            (prop_oneof![Just(48201i64), Just(48157)], 0i64..24,
             prop_oneof![Just("CO"), Just("NOx")], 0.0f64..1.0e4),
            0..60,
        ),
        drop_hour in any::<bool>(),
        drop_fips in any::<bool>(),
    ) {
        let rows: Vec<(i64, i64, &str, f64)> = rows;
        let schema = emissions_schema();
        let detailed = emissions_table(&rows);
        let mut remove = Vec::new();
        if drop_hour { remove.push(Dimension::Hour); }
        if drop_fips { remove.push(Dimension::Fips); }
        let view = AggregationView::new("generated", &remove, &[]);
        let sheet = aggregate_table(&view, &schema, &detailed);

        let retained = view_key(&view, &schema, &detailed);
        prop_assert_eq!(&sheet.dimensions, &retained);
        prop_assert_eq!(sheet.has(Dimension::CountyName), !drop_fips);

        let groups: BTreeSet<(Option<i64>, Option<i64>, &str)> = rows
            .iter()
            .map(|(fips, hour, code, _)| {
                ((!drop_fips).then_some(*fips), (!drop_hour).then_some(*hour), *code)
            })
            .collect();
        prop_assert_eq!(sheet.len(), groups.len());

        let coarser: Vec<Dimension> = retained
            .iter()
            .copied()
            .filter(|dim| *dim != Dimension::Hour)
            .collect();
        prop_assert!(close(&group_sum(&sheet, &coarser), &group_sum(&detailed, &coarser)));
    }
}
