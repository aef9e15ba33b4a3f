//! End-to-end runs of the command layer against a fixture workspace.

use std::fs;
use std::path::{Path, PathBuf};

use roadei_cli::cli::{CheckConfigArgs, RunArgs, ViewsArgs};
use roadei_cli::commands::{run_check_config, run_pipeline, run_views};
use roadei_cli::pipeline::Stage;

const LABELS: [(&str, &str); 7] = [
    ("county.csv", "FIPS,countyName\n48201,Harris\n"),
    (
        "emisprc.csv",
        "processID,processName,processABB\n1,Running Exhaust,RUNEX\n2,Start Exhaust,STREX\n",
    ),
    ("pollutants.csv", "pollutantID,pollutantName\n2,Carbon Monoxide\n3,Oxides of Nitrogen\n"),
    (
        "moves_roadtypes.csv",
        "mvsRoadTypeID,desc,mvsRoadTypeLab\n1,Off-Network,OffNet\n3,Rural Unrestricted Access,RUnr\n",
    ),
    ("moves_sut.csv", "sourceUseTypeID,desc,sutLab\n21,Passenger Car,PC\n"),
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

[xml.header]
id = "HGB_2020_Summer_Weekday"
creation_date_time = "2026-01-15T12:00:00Z"
"#;

const ONROAD_ACT: &str = "County\tHour\tRoadtype\tAreatype\tSUT\tFueltype\tVMT Calculated\tSpeed\n\
48201\t1\t1\t2\t21\t1\t1000.0\t45.0\n\
48201\t2\t1\t2\t21\t1\t250.0\t55.0\n";

const ONROAD_EMIS: &str =
    "County\tHour\tRoadtype\tAreatype\tSUT\tFueltype\tPollutant\tProcess\tUnit\tVMT_Emission\n\
48201\t1\t1\t2\t21\t1\t2\t1\tgrams\t453.59237\n\
48201\t1\t1\t2\t21\t1\t3\t1\tgrams\t90.718474\n";

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

    fn run_file(&self) -> PathBuf {
        self.path().join("run.toml")
    }

    fn out(&self) -> PathBuf {
        self.path().join("out")
    }

    fn run_args(&self) -> RunArgs {
        RunArgs {
            run_file: self.run_file(),
            output_dir: None,
            reuse_detailed: false,
            no_aggregate: false,
            no_xml: false,
        }
    }
}

#[test]
fn full_run_writes_every_output() {
    let ws = Workspace::new();
    let outcome = run_pipeline(&ws.run_args()).expect("run");
    let out = ws.out();

    assert_eq!(outcome.output_dir, out);
    for name in [
        "activityDetailed.csv",
        "emissionDetailed.csv",
        "xmlSCCStagingTable.csv",
        "HGB_2020_Summer_Weekday.xml",
        "qcReport.json",
    ] {
        assert!(out.join(name).is_file(), "{name} written");
    }
    for view in ["aggByRdSutFt", "aggByCntyRdSutFt", "aggByHrRd", "aggByScc", "aggByFcAt"] {
        assert!(out.join("aggregateTable").join(format!("{view}_act.csv")).is_file());
        assert!(out.join("aggregateTable").join(format!("{view}_emis.csv")).is_file());
    }

    assert!(
        !outcome.has_errors(),
        "unexpected QC errors: {:?}",
        outcome.qc.issues
    );
    let stages: Vec<Stage> = outcome.stages.iter().map(|stage| stage.stage).collect();
    assert_eq!(
        stages,
        vec![Stage::Detail, Stage::Aggregate, Stage::Xml, Stage::Qc]
    );
    let xml = outcome.stage(Stage::Xml).expect("xml stage");
    assert_eq!(xml.rows, 3, "CO and NOx for gasoline, CO for diesel");

    let document = fs::read_to_string(out.join("HGB_2020_Summer_Weekday.xml")).expect("read xml");
    assert!(document.contains("<hdr:CreationDateTime>2026-01-15T12:00:00Z</hdr:CreationDateTime>"));
    assert!(document.contains("<cer:StateAndCountyFIPSCode>48201</cer:StateAndCountyFIPSCode>"));
}

#[test]
fn reruns_write_identical_bytes() {
    let ws = Workspace::new();
    let first = ws.path().join("first");
    let second = ws.path().join("second");
    for dir in [&first, &second] {
        let args = RunArgs {
            output_dir: Some(dir.clone()),
            ..ws.run_args()
        };
        run_pipeline(&args).expect("run");
    }

    let sheets = ["aggByRdSutFt", "aggByCntyRdSutFt", "aggByHrRd", "aggByScc", "aggByFcAt"]
        .into_iter()
        .flat_map(|view| [format!("{view}_act.csv"), format!("{view}_emis.csv")])
        .map(|name| Path::new("aggregateTable").join(name));
    let outputs = ["activityDetailed.csv", "emissionDetailed.csv", "xmlSCCStagingTable.csv"]
        .into_iter()
        .map(PathBuf::from)
        .chain(sheets);
    for relative in outputs {
        let a = fs::read(first.join(&relative)).expect("first output");
        let b = fs::read(second.join(&relative)).expect("second output");
        assert!(!a.is_empty(), "{} is empty", relative.display());
        assert_eq!(a, b, "{} differs between runs", relative.display());
    }
}

#[test]
fn reuse_reads_detailed_tables_back() {
    let ws = Workspace::new();
    let first = run_pipeline(&ws.run_args()).expect("first run");
    let detailed_rows = first.stage(Stage::Detail).expect("detail stage").rows;

    fs::remove_file(ws.path().join("onroad_act.txt")).expect("remove source");
    let args = RunArgs {
        reuse_detailed: true,
        ..ws.run_args()
    };
    let second = run_pipeline(&args).expect("reuse run");

    let reuse = second.stage(Stage::Reuse).expect("reuse stage");
    assert_eq!(reuse.rows, detailed_rows);
    assert!(second.stage(Stage::Detail).is_none());
    assert!(
        !second.has_errors(),
        "unexpected QC errors: {:?}",
        second.qc.issues
    );
    assert_eq!(
        first.stage(Stage::Xml).expect("xml").rows,
        second.stage(Stage::Xml).expect("xml").rows
    );
}

#[test]
fn reuse_without_detailed_tables_points_at_the_detail_stage() {
    let ws = Workspace::new();
    let args = RunArgs {
        reuse_detailed: true,
        ..ws.run_args()
    };
    let error = run_pipeline(&args).expect_err("nothing to reuse");
    let message = format!("{error:#}");
    assert!(
        message.contains("generate the detailed tables first"),
        "{message}"
    );
}

#[test]
fn disabled_stages_write_nothing() {
    let ws = Workspace::new();
    let target = ws.path().join("elsewhere");
    let args = RunArgs {
        output_dir: Some(target.clone()),
        no_aggregate: true,
        no_xml: true,
        ..ws.run_args()
    };
    let outcome = run_pipeline(&args).expect("run");

    assert_eq!(outcome.output_dir, target);
    assert!(target.join("activityDetailed.csv").is_file());
    assert!(target.join("qcReport.json").is_file());
    assert!(!target.join("aggregateTable").exists());
    assert!(!target.join("xmlSCCStagingTable.csv").exists());
    assert!(!ws.out().exists());
}

#[test]
fn views_lists_built_in_registry() {
    let views = run_views(&ViewsArgs { run_file: None }).expect("views");
    let names: Vec<&str> = views.iter().map(|view| view.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["aggByRdSutFt", "aggByCntyRdSutFt", "aggByHrRd", "aggByScc", "aggByFcAt"]
    );
    let by_scc = &views[3];
    assert!(by_scc.activity_key.iter().any(|column| column == "sccNEI"));
    assert!(!by_scc.emissions_key.iter().any(|column| column == "hour"));
}

#[test]
fn check_config_passes_for_complete_workspace() {
    let ws = Workspace::new();
    let check = run_check_config(&CheckConfigArgs {
        run_file: ws.run_file(),
    })
    .expect("check");
    assert!(check.is_ok(), "{:?}", check.problems);
    assert_eq!(check.scenario.to_string(), "HGB_2020_Summer_Weekday");
    assert_eq!(check.counties, 1);
    assert_eq!(check.views, 5);
}

#[test]
fn check_config_collects_missing_files_and_unmapped_area() {
    let ws = Workspace::new();
    fs::remove_file(ws.path().join("labels").join("moves_ft.csv")).expect("remove label");
    fs::remove_file(ws.path().join("starts_emis.txt")).expect("remove emissions");
    ws.write("run.toml", &RUN_FILE.replace(r#"area = "HGB""#, r#"area = "ELP""#));

    let check = run_check_config(&CheckConfigArgs {
        run_file: ws.run_file(),
    })
    .expect("check");
    assert_eq!(check.problems.len(), 3, "{:?}", check.problems);
    assert!(check.problems.iter().any(|p| p.contains("moves_ft.csv")));
    assert!(check.problems.iter().any(|p| p.contains("starts_emis.txt")));
    assert!(check.problems.iter().any(|p| p.contains("ELP")));
}

#[test]
fn check_config_rejects_unresolvable_run_file() {
    let ws = Workspace::new();
    ws.write("run.toml", &RUN_FILE.replace("years = [2020]", "years = [2020, 2023]"));
    let error = run_check_config(&CheckConfigArgs {
        run_file: ws.run_file(),
    })
    .expect_err("two years");
    assert!(format!("{error:#}").contains("years"));
}
