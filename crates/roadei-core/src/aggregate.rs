//! Aggregation views over the detailed tables.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::{debug, info, info_span};

use roadei_model::{
    ActivityType, AggregationView, DetailedTables, Dimension, KeyValue, KeyedRow, KeyedTable,
    Result, RoadEiError, RunConfig, TableKind, TableSchema,
};

/// Activity and emissions sheets of one view.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSheet {
    pub activity: KeyedTable,
    pub emissions: KeyedTable,
}

impl AggregateSheet {
    pub fn table(&self, kind: TableKind) -> &KeyedTable {
        match kind {
            TableKind::Activity => &self.activity,
            TableKind::Emissions => &self.emissions,
        }
    }
}

/// View name to its pair of sheets, in view name order.
pub type AggregateTables = BTreeMap<String, AggregateSheet>;

/// Re-groups detailed tables along a registry of named views.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    views: &'a [AggregationView],
    activity: &'a TableSchema,
    emissions: &'a TableSchema,
}

impl<'a> Aggregator<'a> {
    /// Views keyed against the detail schemas of both tables.
    ///
    /// # Errors
    ///
    /// Fails when two views share a name.
    pub fn new(
        views: &'a [AggregationView],
        activity: &'a TableSchema,
        emissions: &'a TableSchema,
    ) -> Result<Self> {
        let mut seen = BTreeSet::new();
        if let Some(view) = views.iter().find(|view| !seen.insert(view.name.as_str())) {
            return Err(RoadEiError::invalid_value("views", "name", view.name.clone()));
        }
        Ok(Self {
            views,
            activity,
            emissions,
        })
    }

    /// # Errors
    ///
    /// Fails when two configured views share a name.
    pub fn from_config(config: &'a RunConfig) -> Result<Self> {
        Self::new(
            &config.views,
            &config.activity_schema,
            &config.emissions_schema,
        )
    }

    pub fn schema(&self, kind: TableKind) -> &'a TableSchema {
        match kind {
            TableKind::Activity => self.activity,
            TableKind::Emissions => self.emissions,
        }
    }

    pub fn views(&self) -> &'a [AggregationView] {
        self.views
    }

    pub fn view(&self, name: &str) -> Option<&'a AggregationView> {
        self.views.iter().find(|view| view.name == name)
    }

    /// Aggregates both tables for every view.
    pub fn aggregate(&self, detailed: &DetailedTables) -> AggregateTables {
        let span = info_span!("aggregate", views = self.views.len());
        let _guard = span.enter();
        let start = Instant::now();

        let sheets: AggregateTables = self
            .views
            .iter()
            .map(|view| {
                let sheet = AggregateSheet {
                    activity: aggregate_table(view, self.activity, &detailed.activity),
                    emissions: aggregate_table(view, self.emissions, &detailed.emissions),
                };
                debug!(
                    view = %view.name,
                    activity_rows = sheet.activity.len(),
                    emission_rows = sheet.emissions.len(),
                    "view aggregated"
                );
                (view.name.clone(), sheet)
            })
            .collect();
        info!(
            views = sheets.len(),
            duration_ms = start.elapsed().as_millis(),
            "aggregation complete"
        );
        sheets
    }
}

/// Columns a view groups `table` by: the view's grouping key over the detail
/// schema, restricted to the columns the table carries, in priority order.
pub fn view_key(
    view: &AggregationView,
    schema: &TableSchema,
    table: &KeyedTable,
) -> Vec<Dimension> {
    view.grouping_key(schema)
        .into_iter()
        .filter(|dim| table.has(*dim))
        .collect()
}

/// Whether a row takes part in aggregation. Speed is not additive.
pub fn is_additive_row(table: &KeyedTable, row: &KeyedRow) -> bool {
    if table.kind != TableKind::Activity {
        return true;
    }
    let Some(position) = table.position(Dimension::ActType) else {
        return true;
    };
    row.keys[position]
        .as_text()
        .and_then(|abbr| abbr.parse::<ActivityType>().ok())
        .is_none_or(|kind| kind.is_additive())
}

/// Groups `table` by `key`, summing values. Rows come out sorted by key.
pub fn group_sum(table: &KeyedTable, key: &[Dimension]) -> KeyedTable {
    let positions: Vec<usize> = key.iter().filter_map(|dim| table.position(*dim)).collect();
    let mut groups: BTreeMap<Vec<KeyValue>, f64> = BTreeMap::new();
    for row in table.rows.iter().filter(|row| is_additive_row(table, row)) {
        let group: Vec<KeyValue> = positions.iter().map(|p| row.keys[*p].clone()).collect();
        *groups.entry(group).or_default() += row.value;
    }
    KeyedTable {
        kind: table.kind,
        dimensions: key.to_vec(),
        rows: groups
            .into_iter()
            .map(|(keys, value)| KeyedRow { keys, value })
            .collect(),
    }
}

/// Aggregates one table for one view.
pub fn aggregate_table(
    view: &AggregationView,
    schema: &TableSchema,
    table: &KeyedTable,
) -> KeyedTable {
    let key = view_key(view, schema, table);
    let skipped: Vec<&Dimension> = view.add.iter().filter(|dim| !table.has(**dim)).collect();
    if !skipped.is_empty() {
        debug!(
            view = %view.name,
            table = %table.kind,
            columns = ?skipped,
            "view adds columns absent from the detailed table"
        );
    }
    group_sum(table, &key)
}
