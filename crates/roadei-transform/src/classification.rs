/// Classification code of an onroad vehicle/fuel combination.
///
/// `22` + two-digit fuel type + source use type + `0080`, e.g. gasoline
/// passenger cars (fuel 1, source use type 21) give `2201210080`.
pub fn classification_code(fuel_type_id: i64, source_use_type_id: i64) -> String {
    format!("22{fuel_type_id:02}{source_use_type_id}0080")
}

/// Combined source use type and fuel type label, e.g. `PC_Gas`.
pub fn sut_ft_label(sut_label: &str, ft_label: &str) -> String {
    format!("{sut_label}_{ft_label}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_type_is_zero_padded() {
        assert_eq!(classification_code(1, 21), "2201210080");
        assert_eq!(classification_code(2, 62), "2202620080");
        assert_eq!(classification_code(9, 11), "2209110080");
    }

    #[test]
    fn combined_label_uses_underscore() {
        assert_eq!(sut_ft_label("CLhT", "Diesel"), "CLhT_Diesel");
    }
}
