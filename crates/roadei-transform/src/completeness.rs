use std::collections::BTreeSet;

use tracing::error;

use roadei_model::{ConfigMismatch, RoadTypeMapping};

/// Every observed (functional class, area type) pair must resolve through
/// the area's road type mapping.
///
/// Runs before the label join so a gap surfaces as a diagnostic instead of
/// as rows silently dropped by the join.
pub fn check_road_type_completeness(
    pairs: impl IntoIterator<Item = (i64, i64)>,
    mapping: &RoadTypeMapping,
) -> Result<(), ConfigMismatch> {
    let missing: BTreeSet<(i64, i64)> = pairs
        .into_iter()
        .filter(|pair| !mapping.contains(*pair))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    let pairs: Vec<(i64, i64)> = missing.into_iter().collect();
    error!(
        area = mapping.area(),
        pairs = ?pairs,
        "road type mapping lacks observed (funcClassID, areaTypeID) pairs; switch the road type source"
    );
    Err(ConfigMismatch::RoadTypeMappingIncomplete {
        area: mapping.area().to_string(),
        pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadei_model::RoadTypeRow;

    fn mapping() -> RoadTypeMapping {
        RoadTypeMapping::new(
            "HGB",
            vec![RoadTypeRow {
                area: "HGB".to_string(),
                func_class_id: 1,
                func_class: "Interstate".to_string(),
                area_type_id: 2,
                area_type: "Urban".to_string(),
                road_type_id: 3,
            }],
        )
    }

    #[test]
    fn mapped_and_off_network_pairs_pass() {
        check_road_type_completeness([(1, 2), (-99, -99), (1, 2)], &mapping()).unwrap();
    }

    #[test]
    fn missing_pairs_are_listed_once_in_order() {
        let err = check_road_type_completeness([(5, 1), (1, 2), (4, 2), (5, 1)], &mapping())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigMismatch::RoadTypeMappingIncomplete {
                area: "HGB".to_string(),
                pairs: vec![(4, 2), (5, 1)],
            }
        );
    }
}
