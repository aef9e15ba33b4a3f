use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::table::TableSchema;

/// A named reduction of the detailed grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationView {
    pub name: String,
    #[serde(default)]
    pub remove: Vec<Dimension>,
    #[serde(default)]
    pub add: Vec<Dimension>,
}

impl AggregationView {
    pub fn new(name: impl Into<String>, remove: &[Dimension], add: &[Dimension]) -> Self {
        Self {
            name: name.into(),
            remove: remove.to_vec(),
            add: add.to_vec(),
        }
    }

    /// Key columns of `schema` minus removed, plus the schema labels whose
    /// key columns all survive, plus added columns. Sorted by column priority.
    ///
    /// Unit columns are never removed. A label whose key column is removed
    /// only stays when the view adds it.
    pub fn grouping_key(&self, schema: &TableSchema) -> Vec<Dimension> {
        let mut key: Vec<Dimension> = schema
            .idx
            .iter()
            .copied()
            .filter(|dim| dim.is_unit() || !self.remove.contains(dim))
            .collect();
        let retained: Vec<Dimension> = schema
            .labels
            .iter()
            .copied()
            .filter(|label| !self.remove.contains(label))
            .filter(|label| label.sources().iter().all(|source| key.contains(source)))
            .collect();
        key.extend(retained);
        key.extend(self.add.iter().copied());
        key.sort();
        key.dedup();
        key
    }

    /// Columns this view must not carry: removed columns and labels of
    /// removed columns, unless added back.
    pub fn collapsed(&self, schema: &TableSchema) -> Vec<Dimension> {
        let key = self.grouping_key(schema);
        schema
            .dimensions()
            .into_iter()
            .filter(|dim| !key.contains(dim))
            .collect()
    }
}

pub fn default_views() -> Vec<AggregationView> {
    use Dimension::{
        AreaTypeId, CountyName, Fips, FuelTypeId, FuncClassId, Hour, RoadTypeId, RoadTypeLabel,
        Scc, SourceUseTypeId, SutFtLabel,
    };
    vec![
        AggregationView::new(
            "aggByRdSutFt",
            &[Hour, Fips, FuncClassId, AreaTypeId],
            &[RoadTypeLabel, SutFtLabel],
        ),
        AggregationView::new(
            "aggByCntyRdSutFt",
            &[Hour, FuncClassId, AreaTypeId],
            &[CountyName, RoadTypeLabel, SutFtLabel],
        ),
        AggregationView::new(
            "aggByHrRd",
            &[Fips, FuncClassId, AreaTypeId, SourceUseTypeId, FuelTypeId],
            &[RoadTypeLabel],
        ),
        AggregationView::new(
            "aggByScc",
            &[Hour, FuncClassId, AreaTypeId, RoadTypeId, SourceUseTypeId, FuelTypeId],
            &[Scc],
        ),
        AggregationView::new(
            "aggByFcAt",
            &[Hour, RoadTypeId, SourceUseTypeId, FuelTypeId],
            &[],
        ),
    ]
}
