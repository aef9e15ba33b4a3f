use std::collections::BTreeMap;

use roadei_model::{ConfigMismatch, ConversionFactor, ConversionTable};

/// Returns the multiplicative factor that converts `input` into `output`.
pub trait UnitConverter: Send + Sync {
    /// # Errors
    ///
    /// Fails for unknown units and for units of different quantities.
    fn factor(&self, input: &str, output: &str) -> Result<f64, ConfigMismatch>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantity {
    Mass,
    Energy,
}

/// Mass and energy units reported by the modeling tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinUnits;

impl BuiltinUnits {
    /// Quantity and size of `unit` in grams or joules.
    fn lookup(unit: &str) -> Option<(Quantity, f64)> {
        let normalized = unit.trim().to_ascii_lowercase();
        let entry = match normalized.as_str() {
            "g" | "gram" | "grams" => (Quantity::Mass, 1.0),
            "kg" | "kilogram" | "kilograms" => (Quantity::Mass, 1_000.0),
            "lb" | "lbs" | "pound" | "pounds" => (Quantity::Mass, 453.592_37),
            "ton" | "tons" | "short ton" | "short tons" => (Quantity::Mass, 907_184.74),
            "tonne" | "tonnes" | "metric ton" | "metric tons" => (Quantity::Mass, 1_000_000.0),
            "j" | "joule" | "joules" => (Quantity::Energy, 1.0),
            "kj" | "kilojoule" | "kilojoules" => (Quantity::Energy, 1_000.0),
            "mj" | "megajoule" | "megajoules" => (Quantity::Energy, 1_000_000.0),
            "btu" => (Quantity::Energy, 1_055.055_852_62),
            "mmbtu" => (Quantity::Energy, 1_055_055_852.62),
            _ => return None,
        };
        Some(entry)
    }
}

impl UnitConverter for BuiltinUnits {
    fn factor(&self, input: &str, output: &str) -> Result<f64, ConfigMismatch> {
        let unknown = |unit: &str| ConfigMismatch::UnknownUnit {
            unit: unit.to_string(),
        };
        let (in_quantity, in_size) = Self::lookup(input).ok_or_else(|| unknown(input))?;
        let (out_quantity, out_size) = Self::lookup(output).ok_or_else(|| unknown(output))?;
        if in_quantity != out_quantity {
            return Err(ConfigMismatch::IncompatibleUnits {
                input: input.to_string(),
                output: output.to_string(),
            });
        }
        Ok(in_size / out_size)
    }
}

/// Builds the conversion table from per-quantity input and output units,
/// e.g. `mass = "grams"` in and `mass = "pound"` out.
///
/// A quantity without an output unit keeps its input unit.
pub fn conversion_table_from_quantities(
    input: &BTreeMap<String, String>,
    output: &BTreeMap<String, String>,
    converter: &dyn UnitConverter,
) -> Result<ConversionTable, ConfigMismatch> {
    let mut factors = Vec::with_capacity(input.len());
    for (quantity, input_units) in input {
        let output_units = output.get(quantity).unwrap_or(input_units);
        factors.push(ConversionFactor {
            input_units: input_units.clone(),
            output_units: output_units.clone(),
            factor: converter.factor(input_units, output_units)?,
        });
    }
    ConversionTable::new(factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn grams_to_pounds() {
        let factor = BuiltinUnits.factor("grams", "pound").unwrap();
        assert!((factor - 1.0 / 453.592_37).abs() < 1e-15);
    }

    #[test]
    fn identity_conversion_is_one() {
        assert_eq!(BuiltinUnits.factor("Kilojoules", "Kilojoules").unwrap(), 1.0);
    }

    #[test]
    fn mass_and_energy_do_not_mix() {
        let err = BuiltinUnits.factor("grams", "joules").unwrap_err();
        assert!(matches!(err, ConfigMismatch::IncompatibleUnits { .. }));
    }

    #[test]
    fn unknown_unit_is_reported() {
        let err = BuiltinUnits.factor("furlongs", "pound").unwrap_err();
        assert_eq!(
            err,
            ConfigMismatch::UnknownUnit {
                unit: "furlongs".to_string()
            }
        );
    }

    #[test]
    fn quantity_tables_build_one_factor_per_input() {
        let input = BTreeMap::from([
            ("mass".to_string(), "grams".to_string()),
            ("energy".to_string(), "Kilojoules".to_string()),
        ]);
        let output = BTreeMap::from([("mass".to_string(), "pound".to_string())]);
        let table = conversion_table_from_quantities(&input, &output, &BuiltinUnits).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get("grams").map(|f| f.output_units.as_str()),
            Some("pound")
        );
        assert_eq!(table.get("Kilojoules").map(|f| f.factor), Some(1.0));
    }

    proptest! {
        #[test]
        fn round_trip_factors_multiply_to_one(idx_a in 0usize..5, idx_b in 0usize..5) {
            let units = ["grams", "kilograms", "pound", "short ton", "metric ton"];
            let forward = BuiltinUnits.factor(units[idx_a], units[idx_b]).unwrap();
            let backward = BuiltinUnits.factor(units[idx_b], units[idx_a]).unwrap();
            prop_assert!((forward * backward - 1.0).abs() < 1e-12);
        }
    }
}
