//! Polars `AnyValue` conversions used when reading tables back.

use polars::prelude::AnyValue;

/// Cell text of a read-back value. Null reads as the empty string and
/// floats lose their trailing zeros.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        other => other.to_string(),
    }
}

/// Formats a float without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Numeric value of a cell; text cells are parsed like source cells.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => crate::parse_float_cell(s),
        AnyValue::StringOwned(s) => crate::parse_float_cell(&s),
        other => other.extract::<f64>(),
    }
}

/// Integer value of a cell. Floats convert only when they carry no
/// fraction, so `3.0` reads as `3` and `3.5` is rejected.
pub fn any_to_i64(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Float32(v) => whole(f64::from(v)),
        AnyValue::Float64(v) => whole(v),
        AnyValue::String(s) => crate::parse_int_cell(s),
        AnyValue::StringOwned(s) => crate::parse_int_cell(&s),
        other => other.extract::<i64>(),
    }
}

fn whole(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0).then_some(v as i64)
}
