//! Combined Emissions Reporting (CERS) document generation.
//!
//! The document holds one `Location` per county, one
//! `LocationEmissionsProcess` per classification code inside it, and one
//! `ReportingPeriodEmissions` per pollutant of that code.

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use tracing::{info, info_span};

use roadei_model::{StagingRow, XmlSettings};

use crate::common::{
    CER_NS, CER_SCHEMA_LOCATION, HEADER_NS, StagedFiles, XSI_NS, write_text_element,
};

const REPORTING_PERIOD_TYPE: &str = "O3D";
const CALCULATION_PARAMETER_TYPE: &str = "I";
const CALCULATION_PARAMETER_UNIT: &str = "E6MILE";
const GASOLINE_MATERIAL: &str = "127";
const DIESEL_MATERIAL: &str = "44";

/// Calculation material of a classification code, from its fuel digit.
///
/// # Errors
///
/// Fails for fuel digits other than gasoline (`1`) and diesel (`2`).
pub fn calculation_material_code(scc: &str) -> Result<&'static str> {
    match scc.as_bytes().get(3) {
        Some(b'1') => Ok(GASOLINE_MATERIAL),
        Some(b'2') => Ok(DIESEL_MATERIAL),
        _ => bail!("classification code {scc} has no gasoline or diesel fuel digit"),
    }
}

/// Rows of one county grouped by classification code.
type ProcessGroups<'r> = BTreeMap<&'r str, Vec<&'r StagingRow>>;

fn group_rows(rows: &[StagingRow]) -> BTreeMap<i64, ProcessGroups<'_>> {
    let mut groups: BTreeMap<i64, ProcessGroups<'_>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.fips)
            .or_default()
            .entry(row.scc.as_str())
            .or_default()
            .push(row);
    }
    groups
}

/// Builder for the reporting document of one scenario.
#[derive(Debug, Clone, Copy)]
pub struct CersDocument<'a> {
    settings: &'a XmlSettings,
    rows: &'a [StagingRow],
}

impl<'a> CersDocument<'a> {
    pub fn new(settings: &'a XmlSettings, rows: &'a [StagingRow]) -> Self {
        Self { settings, rows }
    }

    /// Output file name: the document id plus `.xml`.
    pub fn file_name(&self) -> String {
        format!("{}.xml", self.settings.header.id)
    }

    fn creation_date_time(&self, now: DateTime<Utc>) -> String {
        self.settings
            .header
            .creation_date_time
            .clone()
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    /// Serializes the document into `sink`.
    pub fn write_to<W: Write>(&self, sink: &mut W, now: DateTime<Utc>) -> Result<()> {
        let mut xml = Writer::new_with_indent(sink, b' ', 2);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("hdr:Document");
        root.push_attribute(("xmlns:hdr", HEADER_NS));
        root.push_attribute(("xmlns:cer", CER_NS));
        root.push_attribute(("xmlns:xsi", XSI_NS));
        root.push_attribute(("xsi:schemaLocation", CER_SCHEMA_LOCATION));
        root.push_attribute(("id", self.settings.header.id.as_str()));
        xml.write_event(Event::Start(root))?;
        self.write_header(&mut xml, now)?;

        let mut payload = BytesStart::new("hdr:Payload");
        payload.push_attribute(("operation", "refresh"));
        xml.write_event(Event::Start(payload))?;
        xml.write_event(Event::Start(BytesStart::new("cer:CERS")))?;
        self.write_submission(&mut xml)?;
        for (fips, processes) in group_rows(self.rows) {
            write_location(&mut xml, fips, &processes)?;
        }
        xml.write_event(Event::End(BytesEnd::new("cer:CERS")))?;
        xml.write_event(Event::End(BytesEnd::new("hdr:Payload")))?;
        xml.write_event(Event::End(BytesEnd::new("hdr:Document")))?;
        Ok(())
    }

    fn write_header<W: Write>(&self, xml: &mut Writer<W>, now: DateTime<Utc>) -> Result<()> {
        let header = &self.settings.header;
        xml.write_event(Event::Start(BytesStart::new("hdr:Header")))?;
        write_text_element(xml, "hdr:AuthorName", &header.author_name)?;
        write_text_element(xml, "hdr:OrganizationName", &header.organization_name)?;
        write_text_element(xml, "hdr:DocumentTitle", &header.document_title)?;
        write_text_element(xml, "hdr:CreationDateTime", &self.creation_date_time(now))?;
        write_text_element(xml, "hdr:Comment", &header.comment)?;
        write_text_element(xml, "hdr:DataFlowName", &header.data_flow_name)?;
        for property in &header.properties {
            xml.write_event(Event::Start(BytesStart::new("hdr:Property")))?;
            write_text_element(xml, "hdr:PropertyName", &property.name)?;
            write_text_element(xml, "hdr:PropertyValue", &property.value)?;
            xml.write_event(Event::End(BytesEnd::new("hdr:Property")))?;
        }
        xml.write_event(Event::End(BytesEnd::new("hdr:Header")))?;
        Ok(())
    }

    fn write_submission<W: Write>(&self, xml: &mut Writer<W>) -> Result<()> {
        let payload = &self.settings.payload;
        write_text_element(xml, "cer:UserIdentifier", &payload.user_identifier)?;
        write_text_element(xml, "cer:ProgramSystemCode", &payload.program_system_code)?;
        write_text_element(
            xml,
            "cer:EmissionsYear",
            &self.settings.emissions_year().to_string(),
        )?;
        write_text_element(xml, "cer:Model", &payload.model)?;
        write_text_element(xml, "cer:ModelVersion", &payload.model_version)?;
        write_text_element(xml, "cer:SubmittalComment", &payload.submittal_comment)?;
        Ok(())
    }

    /// Renders the document as a string.
    pub fn render(&self, now: DateTime<Utc>) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, now)?;
        String::from_utf8(buffer).context("document is not UTF-8")
    }

    /// Writes `<document id>.xml` into `output_dir`.
    pub fn write(&self, output_dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
        let span = info_span!("report", document = %self.settings.header.id);
        let _guard = span.enter();
        let start = Instant::now();

        let path = output_dir.join(self.file_name());
        let mut batch = StagedFiles::new();
        batch.stage(&path, |file| {
            let mut out = BufWriter::new(file);
            self.write_to(&mut out, now)?;
            out.flush().context("flush document")
        })?;
        batch.commit().context("commit reporting document")?;
        info!(
            rows = self.rows.len(),
            path = %path.display(),
            duration_ms = start.elapsed().as_millis(),
            "reporting document written"
        );
        Ok(path)
    }
}

fn write_location<W: Write>(
    xml: &mut Writer<W>,
    fips: i64,
    processes: &ProcessGroups<'_>,
) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new("cer:Location")))?;
    write_text_element(xml, "cer:StateAndCountyFIPSCode", &format!("{fips:05}"))?;
    for (scc, rows) in processes {
        let material = calculation_material_code(scc)?;
        let e6mile = rows.first().map_or(0.0, |row| row.e6mile);
        xml.write_event(Event::Start(BytesStart::new("cer:LocationEmissionsProcess")))?;
        write_text_element(xml, "cer:SourceClassificationCode", scc)?;
        xml.write_event(Event::Start(BytesStart::new("cer:ReportingPeriod")))?;
        write_text_element(xml, "cer:ReportingPeriodTypeCode", REPORTING_PERIOD_TYPE)?;
        write_text_element(
            xml,
            "cer:CalculationParameterTypeCode",
            CALCULATION_PARAMETER_TYPE,
        )?;
        write_text_element(xml, "cer:CalculationParameterValue", &e6mile.to_string())?;
        write_text_element(
            xml,
            "cer:CalculationParameterUnitofMeasure",
            CALCULATION_PARAMETER_UNIT,
        )?;
        write_text_element(xml, "cer:CalculationMaterialCode", material)?;
        for row in rows {
            xml.write_event(Event::Start(BytesStart::new("cer:ReportingPeriodEmissions")))?;
            write_text_element(xml, "cer:PollutantCode", &row.pollutant_code)?;
            write_text_element(xml, "cer:TotalEmissions", &row.emission.to_string())?;
            write_text_element(xml, "cer:EmissionsUnitofMeasureCode", &row.emission_units)?;
            xml.write_event(Event::End(BytesEnd::new("cer:ReportingPeriodEmissions")))?;
        }
        xml.write_event(Event::End(BytesEnd::new("cer:ReportingPeriod")))?;
        xml.write_event(Event::End(BytesEnd::new("cer:LocationEmissionsProcess")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("cer:Location")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_code_follows_fuel_digit() {
        assert_eq!(calculation_material_code("2201210080").unwrap(), "127");
        assert_eq!(calculation_material_code("2202620080").unwrap(), "44");
        assert!(calculation_material_code("2205210080").is_err());
        assert!(calculation_material_code("22").is_err());
    }
}
