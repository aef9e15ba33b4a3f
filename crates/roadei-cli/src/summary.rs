use std::cmp::Ordering;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use roadei_cli::commands::{ConfigCheck, ViewListing};
use roadei_cli::pipeline::RunOutcome;
use roadei_model::{IssueSeverity, QcIssue};

pub fn print_summary(outcome: &RunOutcome) {
    println!("Scenario: {}", outcome.scenario);
    println!("Output: {}", outcome.output_dir.display());
    println!("QC report: {}", outcome.qc_report.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Rows"),
        header_cell("Files"),
        header_cell("Time (ms)"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for stage in &outcome.stages {
        table.add_row(vec![
            Cell::new(stage.stage.label())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(stage.rows),
            count_cell(stage.outputs.len(), Color::Green),
            dim_cell(stage.duration_ms),
        ]);
    }
    println!("{table}");
    println!(
        "QC: {} error(s), {} warning(s)",
        outcome.qc.error_count(),
        outcome.qc.warning_count()
    );
    print_issue_table(&outcome.qc.issues);
}

fn print_issue_table(issues: &[QcIssue]) {
    if issues.is_empty() {
        return;
    }
    let mut ordered: Vec<&QcIssue> = issues.iter().collect();
    ordered.sort_by(|a, b| {
        let severity = severity_rank(b.severity).cmp(&severity_rank(a.severity));
        if severity != Ordering::Equal {
            return severity;
        }
        a.code.cmp(&b.code).then_with(|| a.table.cmp(&b.table))
    });
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Table"),
        header_cell("Count"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for issue in ordered {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(&issue.code),
            Cell::new(&issue.table),
            issue_count_cell(issue.count, issue.severity),
            Cell::new(&issue.message),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

pub fn print_views(views: &[ViewListing]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("View"),
        header_cell("Removes"),
        header_cell("Adds"),
        header_cell("Activity key"),
        header_cell("Emissions key"),
    ]);
    apply_table_style(&mut table);
    for view in views {
        table.add_row(vec![
            Cell::new(&view.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            list_cell(&view.remove),
            list_cell(&view.add),
            Cell::new(view.activity_key.join(", ")),
            Cell::new(view.emissions_key.join(", ")),
        ]);
    }
    println!("{table}");
}

pub fn print_config_check(check: &ConfigCheck) {
    let mut table = Table::new();
    apply_table_style(&mut table);
    table.add_row(vec![header_cell("Run file"), Cell::new(check.run_file.display())]);
    table.add_row(vec![header_cell("Scenario"), Cell::new(&check.scenario)]);
    table.add_row(vec![header_cell("Counties"), Cell::new(check.counties)]);
    table.add_row(vec![header_cell("Views"), Cell::new(check.views)]);
    table.add_row(vec![
        header_cell("XML pollutants"),
        Cell::new(check.pollutant_codes.join(", ")),
    ]);
    table.add_row(vec![
        header_cell("Output"),
        Cell::new(check.output_dir.display()),
    ]);
    let status = if check.is_ok() {
        Cell::new("OK").fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        Cell::new(format!("{} problem(s)", check.problems.len()))
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    };
    table.add_row(vec![header_cell("Status"), status]);
    println!("{table}");
    if !check.problems.is_empty() {
        eprintln!("Problems:");
        for problem in &check.problems {
            eprintln!("- {problem}");
        }
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn list_cell(values: &[String]) -> Cell {
    if values.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(values.join(", "))
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn issue_count_cell(count: Option<u64>, severity: IssueSeverity) -> Cell {
    match count {
        Some(value) => Cell::new(value).fg(severity_color(severity)),
        None => dim_cell("-"),
    }
}

fn severity_rank(severity: IssueSeverity) -> u8 {
    match severity {
        IssueSeverity::Error => 2,
        IssueSeverity::Warning => 1,
    }
}

fn severity_color(severity: IssueSeverity) -> Color {
    match severity {
        IssueSeverity::Error => Color::Red,
        IssueSeverity::Warning => Color::Yellow,
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
