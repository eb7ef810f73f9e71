//! Known axis types, units and string encodings.
//!
//! Units follow OME-NGFF 0.5, plus `pixel` and `frame`. Unknown values are
//! not errors; callers log a warning so readers know the value may not be
//! understood.

use lazy_static::lazy_static;
use rustc_hash::FxHashSet;

use crate::model::DType;

pub const VALID_SPACE_UNITS: [&str; 27] = [
    "angstrom",
    "attometer",
    "centimeter",
    "decimeter",
    "exameter",
    "femtometer",
    "foot",
    "gigameter",
    "hectometer",
    "inch",
    "kilometer",
    "megameter",
    "meter",
    "micrometer",
    "mile",
    "millimeter",
    "nanometer",
    "parsec",
    "petameter",
    "picometer",
    "terameter",
    "yard",
    "yoctometer",
    "yottameter",
    "zeptometer",
    "zettameter",
    "pixel",
];

pub const VALID_TIME_UNITS: [&str; 24] = [
    "attosecond",
    "centisecond",
    "day",
    "decisecond",
    "exasecond",
    "femtosecond",
    "gigasecond",
    "hectosecond",
    "hour",
    "kilosecond",
    "megasecond",
    "microsecond",
    "millisecond",
    "minute",
    "nanosecond",
    "petasecond",
    "picosecond",
    "second",
    "terasecond",
    "yoctosecond",
    "yottasecond",
    "zeptosecond",
    "zettasecond",
    "frame",
];

pub const VALID_AXIS_TYPES: [&str; 3] = ["space", "time", "channel"];

/// Normalized names (lowercase, `_` separators) of common text encodings.
pub const VALID_STR_ENCODINGS: [&str; 16] = [
    "ascii",
    "utf_8",
    "utf_8_sig",
    "utf_16",
    "utf_16_le",
    "utf_16_be",
    "utf_32",
    "utf_32_le",
    "utf_32_be",
    "latin_1",
    "iso8859_1",
    "iso8859_15",
    "cp1252",
    "cp437",
    "mac_roman",
    "big5",
];

lazy_static! {
    static ref SPACE_UNITS: FxHashSet<&'static str> = VALID_SPACE_UNITS.iter().copied().collect();
    static ref TIME_UNITS: FxHashSet<&'static str> = VALID_TIME_UNITS.iter().copied().collect();
    static ref STR_ENCODINGS: FxHashSet<&'static str> = VALID_STR_ENCODINGS.iter().copied().collect();
}

pub fn validate_axis_type(axis_type: &str) -> bool {
    VALID_AXIS_TYPES.contains(&axis_type)
}

/// True if `unit` is a known space unit. Unknown units may still be valid.
pub fn validate_space_unit(unit: &str) -> bool {
    SPACE_UNITS.contains(unit)
}

/// True if `unit` is a known time unit. Unknown units may still be valid.
pub fn validate_time_unit(unit: &str) -> bool {
    TIME_UNITS.contains(unit)
}

/// True if `dtype` parses to an allowed element type.
pub fn validate_data_type(dtype: &str) -> bool {
    DType::parse(dtype).is_some()
}

pub fn validate_str_encoding(encoding: &str) -> bool {
    let normalized = encoding.trim().to_ascii_lowercase().replace('-', "_");
    let normalized = match normalized.as_str() {
        "utf8" => "utf_8",
        "latin1" => "latin_1",
        other => other,
    };
    STR_ENCODINGS.contains(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert!(validate_space_unit("micrometer"));
        assert!(validate_space_unit("pixel"));
        assert!(!validate_space_unit("second"));
        assert!(validate_time_unit("frame"));
        assert!(!validate_time_unit("parsec"));
    }

    #[test]
    fn test_axis_types() {
        assert!(validate_axis_type("channel"));
        assert!(!validate_axis_type("spatial"));
    }

    #[test]
    fn test_data_types() {
        assert!(validate_data_type("int16"));
        assert!(validate_data_type(">i4"));
        assert!(!validate_data_type("float16"));
        assert!(!validate_data_type("integer"));
    }

    #[test]
    fn test_encodings() {
        assert!(validate_str_encoding("utf-8"));
        assert!(validate_str_encoding("UTF8"));
        assert!(validate_str_encoding("ascii"));
        assert!(!validate_str_encoding("klingon"));
    }
}
