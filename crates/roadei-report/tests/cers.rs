use chrono::{TimeZone, Utc};

use roadei_model::{DocumentHeader, DocumentPayload, DocumentProperty, StagingRow, XmlSettings};
use roadei_report::CersDocument;

fn settings() -> XmlSettings {
    XmlSettings {
        pollutant_codes: vec!["CO".to_string(), "NOx".to_string()],
        year: 2020,
        season: "Summer".to_string(),
        day_type: "Weekday".to_string(),
        header: DocumentHeader {
            id: "HGB_2020_Summer_Weekday".to_string(),
            author_name: "Air Quality Modeling".to_string(),
            organization_name: "Example Agency".to_string(),
            document_title: "Onroad CERS".to_string(),
            creation_date_time: Some("2026-01-15T12:00:00Z".to_string()),
            comment: String::new(),
            data_flow_name: "CERS".to_string(),
            properties: vec![DocumentProperty {
                name: "SubmissionType".to_string(),
                value: "QA".to_string(),
            }],
        },
        payload: DocumentPayload {
            user_identifier: "ROADEI".to_string(),
            program_system_code: "TXTCEQ".to_string(),
            emissions_year: None,
            model: "MOVES".to_string(),
            model_version: "4.0".to_string(),
            submittal_comment: String::new(),
        },
    }
}

fn row(scc: &str, code: &str, emission: f64, e6mile: f64) -> StagingRow {
    StagingRow {
        area: "HGB".to_string(),
        year: 2020,
        season: "Summer".to_string(),
        day_type: "Weekday".to_string(),
        fips: 48201,
        scc: scc.to_string(),
        pollutant_code: code.to_string(),
        emission_units: "pound".to_string(),
        emission,
        e6mile,
    }
}

fn rows() -> Vec<StagingRow> {
    vec![
        row("2201210080", "CO", 1.5, 0.001),
        row("2201210080", "NOx", 0.25, 0.001),
        row("2202210080", "CO", 2.0, 0.0),
    ]
}

#[test]
fn document_groups_by_county_then_classification_code() {
    let settings = settings();
    let rows = rows();
    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let xml = CersDocument::new(&settings, &rows).render(now).unwrap();
    insta::assert_snapshot!(xml);
}

#[test]
fn creation_time_defaults_to_now() {
    let mut settings = settings();
    settings.header.creation_date_time = None;
    let now = Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap();
    let xml = CersDocument::new(&settings, &[]).render(now).unwrap();
    assert!(xml.contains("<hdr:CreationDateTime>2026-10-16T08:30:00Z</hdr:CreationDateTime>"));
    assert!(!xml.contains("cer:Location>"));
}

#[test]
fn unknown_fuel_digit_fails_the_document() {
    let settings = settings();
    let rows = vec![row("2205210080", "CO", 1.0, 0.0)];
    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    assert!(CersDocument::new(&settings, &rows).render(now).is_err());
}

#[test]
fn document_is_written_under_its_id() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings();
    let rows = rows();
    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let path = CersDocument::new(&settings, &rows)
        .write(dir.path(), now)
        .unwrap();
    assert_eq!(path, dir.path().join("HGB_2020_Summer_Weekday.xml"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert_eq!(text.matches("<cer:ReportingPeriodEmissions>").count(), 3);
}
