use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use roadei_ingest::{ReadOptions, read_keyed_table, read_source_table};
use roadei_model::{Dimension, KeyValue, RoadEiError, TableKind};

fn temp_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

#[test]
fn reads_tab_delimited_table_and_skips_blank_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = temp_file(
        &dir,
        "onroad.txt",
        "County\tHour\tVMT Calculated\n48201\t1\t1000.0\n\t\t\n48201\t2\n",
    );
    let table = read_source_table(&path, &ReadOptions::default()).expect("read table");
    assert_eq!(table.headers, vec!["County", "Hour", "VMT Calculated"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1], vec!["48201", "2", ""]);
}

#[test]
fn strips_inventory_prefixes_from_headers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = temp_file(
        &dir,
        "tec.txt",
        "County\tTEC Emission\tUnit\n48201\t10\tKilojoules\n",
    );
    let options = ReadOptions::default().with_strip_prefix("TEC");
    let table = read_source_table(&path, &options).expect("read table");
    assert_eq!(table.headers, vec!["County", "Emission", "Unit"]);
}

#[test]
fn select_rename_drops_unlisted_columns() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = temp_file(
        &dir,
        "onroad.txt",
        "County\tNotes\tHour\n48201\tx\t3\n",
    );
    let table = read_source_table(&path, &ReadOptions::default()).expect("read table");
    let rename = BTreeMap::from([
        ("County".to_string(), "FIPS".to_string()),
        ("Hour".to_string(), "hour".to_string()),
    ]);
    let renamed = table.select_rename(&rename).expect("rename");
    assert_eq!(renamed.headers, vec!["FIPS", "hour"]);
    assert_eq!(renamed.rows[0], vec!["48201", "3"]);
}

#[test]
fn missing_source_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = read_source_table(&dir.path().join("absent.txt"), &ReadOptions::default())
        .expect_err("missing file");
    assert!(matches!(err, RoadEiError::Io { .. }));
}

#[test]
fn reads_detailed_table_back() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = temp_file(
        &dir,
        "activityDetailed.csv",
        "area,year,FIPS,actTypeABB,activityunits,activity\nHGB,2020,48201,VMT,miles,1000.0\n",
    );
    let table = read_keyed_table(&path, TableKind::Activity).expect("read back");
    assert_eq!(
        table.dimensions,
        vec![
            Dimension::Area,
            Dimension::Year,
            Dimension::Fips,
            Dimension::ActType,
            Dimension::ActivityUnits
        ]
    );
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].keys[2], KeyValue::Int(48201));
    assert_eq!(table.rows[0].keys[3], KeyValue::Text("VMT".to_string()));
    assert!((table.rows[0].value - 1000.0).abs() < 1e-9);
}

#[test]
fn read_back_rejects_unknown_columns() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = temp_file(&dir, "bad.csv", "FIPS,color,activity\n48201,red,1\n");
    let err = read_keyed_table(&path, TableKind::Activity).expect_err("unknown column");
    assert!(matches!(err, RoadEiError::DataShape { .. }));
}
