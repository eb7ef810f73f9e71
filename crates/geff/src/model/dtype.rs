//! Element data types allowed in GEFF property arrays.
//!
//! The allow-list is closed: half-precision floats and complex types do not
//! parse. Names, common aliases and numpy typestrs are all accepted.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Element type of an [`NdArray`](super::NdArray).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Raw bytes, one byte per element.
    Bytes,
    /// Unicode strings.
    Str,
}

impl DType {
    pub const ALL: [DType; 13] = [
        DType::Bool,
        DType::Int8,
        DType::Int16,
        DType::Int32,
        DType::Int64,
        DType::UInt8,
        DType::UInt16,
        DType::UInt32,
        DType::UInt64,
        DType::Float32,
        DType::Float64,
        DType::Bytes,
        DType::Str,
    ];

    /// Canonical name, as written into property metadata.
    pub fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Bytes => "bytes",
            DType::Str => "str",
        }
    }

    /// Parses a dtype name, alias or numpy typestr.
    ///
    /// Returns `None` for anything outside the allow-list, including
    /// `float16` and complex types.
    pub fn parse(s: &str) -> Option<DType> {
        let s = s.trim();
        Self::from_name(s).or_else(|| Self::from_typestr(s))
    }

    fn from_name(s: &str) -> Option<DType> {
        Some(match s {
            "bool" | "bool_" | "bool8" | "?" => DType::Bool,
            "int8" | "byte" => DType::Int8,
            "int16" | "short" => DType::Int16,
            "int32" | "intc" => DType::Int32,
            "int64" | "int" | "int_" | "long" | "longlong" => DType::Int64,
            "uint8" | "ubyte" => DType::UInt8,
            "uint16" | "ushort" => DType::UInt16,
            "uint32" | "uintc" => DType::UInt32,
            "uint64" | "uint" | "ulong" | "ulonglong" => DType::UInt64,
            "float32" | "single" => DType::Float32,
            "float64" | "float" | "double" | "float_" => DType::Float64,
            "bytes" | "bytes_" => DType::Bytes,
            "str" | "str_" | "string" | "unicode" => DType::Str,
            _ => return None,
        })
    }

    fn from_typestr(s: &str) -> Option<DType> {
        let body = s.strip_prefix(['<', '>', '|', '=']).unwrap_or(s);
        let mut chars = body.chars();
        let kind = chars.next()?;
        let size = chars.as_str();
        let width_ok = size.is_empty() || size.parse::<usize>().is_ok();
        Some(match (kind, size) {
            ('b', "1") => DType::Bool,
            ('i', "1") => DType::Int8,
            ('i', "2") => DType::Int16,
            ('i', "4") => DType::Int32,
            ('i', "8") => DType::Int64,
            ('u', "1") => DType::UInt8,
            ('u', "2") => DType::UInt16,
            ('u', "4") => DType::UInt32,
            ('u', "8") => DType::UInt64,
            ('f', "4") => DType::Float32,
            ('f', "8") => DType::Float64,
            ('S', _) if width_ok => DType::Bytes,
            ('U', _) if width_ok => DType::Str,
            _ => return None,
        })
    }

    /// Numpy kind character.
    pub fn kind(self) -> char {
        match self {
            DType::Bool => 'b',
            DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64 => 'i',
            DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64 => 'u',
            DType::Float32 | DType::Float64 => 'f',
            DType::Bytes => 'S',
            DType::Str => 'U',
        }
    }

    /// Bytes per element, `None` for strings.
    pub fn item_size(self) -> Option<usize> {
        match self {
            DType::Bool | DType::Int8 | DType::UInt8 | DType::Bytes => Some(1),
            DType::Int16 | DType::UInt16 => Some(2),
            DType::Int32 | DType::UInt32 | DType::Float32 => Some(4),
            DType::Int64 | DType::UInt64 | DType::Float64 => Some(8),
            DType::Str => None,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self.kind(), 'i' | 'u')
    }

    pub fn is_float(self) -> bool {
        self.kind() == 'f'
    }

    /// True for integers, floats and booleans.
    pub fn is_numeric(self) -> bool {
        matches!(self.kind(), 'b' | 'i' | 'u' | 'f')
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for DType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DType::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown dtype {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_roundtrip() {
        for dtype in DType::ALL {
            assert_eq!(DType::parse(dtype.name()), Some(dtype));
        }
    }

    #[test]
    fn test_parse_aliases_and_typestrs() {
        assert_eq!(DType::parse("int"), Some(DType::Int64));
        assert_eq!(DType::parse("float"), Some(DType::Float64));
        assert_eq!(DType::parse(">i4"), Some(DType::Int32));
        assert_eq!(DType::parse("<u2"), Some(DType::UInt16));
        assert_eq!(DType::parse("|b1"), Some(DType::Bool));
        assert_eq!(DType::parse("<U12"), Some(DType::Str));
        assert_eq!(DType::parse("|S1"), Some(DType::Bytes));
    }

    #[test]
    fn test_disallowed_types() {
        assert_eq!(DType::parse("float16"), None);
        assert_eq!(DType::parse(">f2"), None);
        assert_eq!(DType::parse("complex64"), None);
        assert_eq!(DType::parse("<c16"), None);
        assert_eq!(DType::parse("nope"), None);
        assert_eq!(DType::parse(""), None);
    }

    #[test]
    fn test_kinds() {
        assert!(DType::UInt32.is_integer());
        assert!(!DType::Bool.is_integer());
        assert!(DType::Bool.is_numeric());
        assert!(!DType::Str.is_numeric());
        assert_eq!(DType::Str.item_size(), None);
        assert_eq!(DType::Float64.item_size(), Some(8));
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&DType::UInt16).unwrap();
        assert_eq!(json, "\"uint16\"");
        let back: DType = serde_json::from_str("\"<f8\"").unwrap();
        assert_eq!(back, DType::Float64);
    }
}
