//! Per-element property values, as handed over by graph adapters.

use std::collections::BTreeMap;

use crate::model::{DType, NdArray};

/// A single node or edge property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Array(NdArray),
    /// Explicitly absent. Equivalent to the key not being present.
    Absent,
}

impl PropValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, PropValue::Absent)
    }

    /// The dtype this value is stored with.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            PropValue::Bool(_) => Some(DType::Bool),
            PropValue::Int(_) => Some(DType::Int64),
            PropValue::UInt(_) => Some(DType::UInt64),
            PropValue::Float(_) => Some(DType::Float64),
            PropValue::Text(_) => Some(DType::Str),
            PropValue::Array(arr) => Some(arr.dtype()),
            PropValue::Absent => None,
        }
    }

    /// Numeric scalar as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            PropValue::Bool(b) => Some(f64::from(u8::from(b))),
            PropValue::Int(v) => Some(v as f64),
            PropValue::UInt(v) => Some(v as f64),
            PropValue::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Int(i64::from(v))
    }
}

impl From<u64> for PropValue {
    fn from(v: u64) -> Self {
        PropValue::UInt(v)
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Float(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Text(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Text(v)
    }
}

impl From<NdArray> for PropValue {
    fn from(v: NdArray) -> Self {
        PropValue::Array(v)
    }
}

/// Property bag of one graph element.
pub type PropMap = BTreeMap<String, PropValue>;

/// Looks up `name`, treating explicit [`PropValue::Absent`] as not present.
pub fn present<'a>(props: &'a PropMap, name: &str) -> Option<&'a PropValue> {
    props.get(name).filter(|v| !v.is_absent())
}

/// One element of a variable-length property.
#[derive(Debug, Clone, PartialEq)]
pub enum Ragged {
    Present(NdArray),
    Absent,
}

impl Ragged {
    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Ragged::Present(arr) => Some(arr),
            Ragged::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Ragged::Absent)
    }
}

impl From<Option<NdArray>> for Ragged {
    fn from(v: Option<NdArray>) -> Self {
        match v {
            Some(arr) => Ragged::Present(arr),
            None => Ragged::Absent,
        }
    }
}

impl From<NdArray> for Ragged {
    fn from(v: NdArray) -> Self {
        Ragged::Present(v)
    }
}
