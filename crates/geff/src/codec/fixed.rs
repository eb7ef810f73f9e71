//! Fixed-shape property codec.
//!
//! Converts per-element property maps into one dense `values` array with
//! a leading dimension of one row per element, plus a `missing` mask when
//! any element lacks the property. Absent rows hold a placeholder chosen
//! by a [`DefaultPolicy`].

use std::collections::BTreeMap;

use tracing::warn;

use crate::codec::PropArrays;
use crate::error::CodecError;
use crate::model::{ArrayData, DType, NdArray, PropMap, PropValue, present};

/// Placeholder used for elements that lack the property.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultPolicy {
    /// Zero of the column's own type (`false` for booleans, `""` for text).
    Zero,
    /// The empty string.
    EmptyText,
    /// A caller-chosen value, e.g. an array of the right shape.
    Placeholder(PropValue),
}

impl DefaultPolicy {
    /// The policy implied by the first present value of a property.
    ///
    /// Numeric scalars default to zero, text to `""`, and arrays reuse the
    /// first present array so the placeholder has a compatible shape.
    pub fn infer(first: &PropValue) -> Self {
        match first {
            PropValue::Text(_) => DefaultPolicy::EmptyText,
            PropValue::Array(_) => DefaultPolicy::Placeholder(first.clone()),
            _ => DefaultPolicy::Zero,
        }
    }

    fn placeholder(&self, kind: Option<Kind>, first_array: Option<&NdArray>) -> PropValue {
        match self {
            DefaultPolicy::Placeholder(value) => value.clone(),
            DefaultPolicy::EmptyText => PropValue::Text(String::new()),
            DefaultPolicy::Zero => match kind {
                Some(Kind::Bool) => PropValue::Bool(false),
                Some(Kind::UInt) => PropValue::UInt(0),
                Some(Kind::Float) => PropValue::Float(0.0),
                Some(Kind::Text) => PropValue::Text(String::new()),
                Some(Kind::Array) => first_array
                    .map(|a| PropValue::Array(NdArray::zeros(a.dtype(), a.shape().to_vec())))
                    .unwrap_or(PropValue::Int(0)),
                Some(Kind::Int) | None => PropValue::Int(0),
            },
        }
    }
}

/// Column kind; numeric scalars promote along the declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Kind {
    Bool,
    UInt,
    Int,
    Float,
    Text,
    Array,
}

impl Kind {
    fn of(value: &PropValue) -> Option<Kind> {
        match value {
            PropValue::Bool(_) => Some(Kind::Bool),
            PropValue::UInt(_) => Some(Kind::UInt),
            PropValue::Int(_) => Some(Kind::Int),
            PropValue::Float(_) => Some(Kind::Float),
            PropValue::Text(_) => Some(Kind::Text),
            PropValue::Array(_) => Some(Kind::Array),
            PropValue::Absent => None,
        }
    }

    fn merge(self, other: Kind) -> Option<Kind> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Kind::Text | Kind::Array, _) | (_, Kind::Text | Kind::Array) => None,
            (a, b) => Some(a.max(b)),
        }
    }
}

fn incompatible(name: &str, index: usize, reason: impl Into<String>) -> CodecError {
    CodecError::IncompatibleValue {
        name: name.to_string(),
        index,
        reason: reason.into(),
    }
}

/// Encodes one property across `elements`, preserving input order.
///
/// If no element has the property, a warning is logged and the column is
/// int64 zeros with every row missing.
pub fn encode_fixed_property<I>(elements: &[(I, PropMap)], name: &str) -> Result<PropArrays, CodecError> {
    match elements.iter().find_map(|(_, props)| present(props, name)) {
        Some(first) => encode_fixed_property_with_default(elements, name, DefaultPolicy::infer(first)),
        None => {
            warn!("Property {name} is not present on any graph elements. Using 0 as the default.");
            let n = elements.len();
            Ok(PropArrays {
                values: NdArray::zeros(DType::Int64, vec![n]),
                missing: (n > 0).then(|| vec![true; n]),
            })
        }
    }
}

/// Encodes one property using an explicit placeholder policy.
pub fn encode_fixed_property_with_default<I>(
    elements: &[(I, PropMap)],
    name: &str,
    policy: DefaultPolicy,
) -> Result<PropArrays, CodecError> {
    let cells: Vec<Option<&PropValue>> = elements
        .iter()
        .map(|(_, props)| present(props, name))
        .collect();

    let mut kind: Option<Kind> = None;
    let mut first_array = None;
    for (index, value) in cells.iter().enumerate() {
        let Some(value) = value else { continue };
        let Some(value_kind) = Kind::of(value) else { continue };
        if first_array.is_none() {
            if let PropValue::Array(array) = value {
                first_array = Some(array);
            }
        }
        kind = Some(match kind {
            None => value_kind,
            Some(k) => k
                .merge(value_kind)
                .ok_or_else(|| incompatible(name, index, format!("{value_kind:?} value in a {k:?} column")))?,
        });
    }

    let placeholder = policy.placeholder(kind, first_array);
    if let Some(index) = cells.iter().position(Option::is_none) {
        if let Some(fill_kind) = Kind::of(&placeholder) {
            kind = Some(match kind {
                None => fill_kind,
                Some(k) => k.merge(fill_kind).ok_or_else(|| {
                    incompatible(name, index, format!("default {fill_kind:?} value in a {k:?} column"))
                })?,
            });
        }
    }

    let filled: Vec<&PropValue> = cells
        .iter()
        .map(|cell| cell.unwrap_or(&placeholder))
        .collect();
    let n = filled.len();

    let values = match kind.unwrap_or(Kind::Int) {
        Kind::Bool => NdArray::from_vec_1d(
            filled
                .iter()
                .map(|v| matches!(v, PropValue::Bool(true)))
                .collect::<Vec<bool>>(),
        ),
        Kind::UInt => NdArray::from_vec_1d(
            filled
                .iter()
                .map(|v| match **v {
                    PropValue::Bool(b) => u64::from(b),
                    PropValue::UInt(x) => x,
                    _ => 0,
                })
                .collect::<Vec<u64>>(),
        ),
        Kind::Int => NdArray::from_vec_1d(
            filled
                .iter()
                .enumerate()
                .map(|(index, v)| match **v {
                    PropValue::Bool(b) => Ok(i64::from(b)),
                    PropValue::Int(x) => Ok(x),
                    PropValue::UInt(x) => {
                        i64::try_from(x).map_err(|_| incompatible(name, index, "value exceeds int64 range"))
                    }
                    _ => Ok(0),
                })
                .collect::<Result<Vec<i64>, _>>()?,
        ),
        Kind::Float => NdArray::from_vec_1d(
            filled
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0))
                .collect::<Vec<f64>>(),
        ),
        Kind::Text => {
            let texts: Vec<&str> = filled
                .iter()
                .map(|v| match v {
                    PropValue::Text(s) => s.as_str(),
                    _ => "",
                })
                .collect();
            padded_utf8(&texts, vec![n])?
        }
        Kind::Array => stack_arrays(&filled, name)?,
    };

    let missing = cells.iter().any(Option::is_none).then(|| {
        cells.iter().map(Option::is_none).collect::<Vec<bool>>()
    });
    Ok(PropArrays { values, missing })
}

/// Encodes strings as zero-padded UTF-8 `uint8` rows of the longest byte
/// length, appended as a trailing axis to `lead_shape`.
fn padded_utf8(texts: &[&str], mut lead_shape: Vec<usize>) -> Result<NdArray, CodecError> {
    let width = texts.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut data = Vec::with_capacity(texts.len() * width);
    for s in texts {
        data.extend_from_slice(s.as_bytes());
        data.resize(data.len() + width - s.len(), 0);
    }
    lead_shape.push(width);
    NdArray::new(lead_shape, ArrayData::UInt8(data))
}

fn stack_arrays(filled: &[&PropValue], name: &str) -> Result<NdArray, CodecError> {
    let arrays = filled
        .iter()
        .enumerate()
        .map(|(index, v)| match v {
            PropValue::Array(array) => Ok(array),
            _ => Err(incompatible(name, index, "expected an array value")),
        })
        .collect::<Result<Vec<&NdArray>, _>>()?;
    let Some(first) = arrays.first() else {
        return Ok(NdArray::zeros(DType::Int64, vec![0]));
    };

    for (index, array) in arrays.iter().enumerate() {
        if array.shape() != first.shape() {
            return Err(incompatible(
                name,
                index,
                format!(
                    "shape {:?} differs from {:?}; use a variable-length property",
                    array.shape(),
                    first.shape()
                ),
            ));
        }
    }

    let mut lead = vec![arrays.len()];
    lead.extend_from_slice(first.shape());

    if first.dtype() == DType::Str {
        let mut texts = Vec::with_capacity(arrays.len() * first.size());
        for (index, array) in arrays.iter().enumerate() {
            let strings = array
                .as_slice::<String>()
                .ok_or_else(|| incompatible(name, index, "expected a string array"))?;
            texts.extend(strings.iter().map(String::as_str));
        }
        return padded_utf8(&texts, lead);
    }

    let mut data = ArrayData::zeros(first.dtype(), 0);
    for array in &arrays {
        data.append(array.data().cast(first.dtype())?)?;
    }
    NdArray::new(lead, data)
}

/// Encodes each named property across `elements`.
pub fn dict_props_to_arrays<I, S: AsRef<str>>(
    elements: &[(I, PropMap)],
    names: &[S],
) -> Result<BTreeMap<String, PropArrays>, CodecError> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            encode_fixed_property(elements, name).map(|arrays| (name.to_string(), arrays))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements(values: Vec<Option<PropValue>>) -> Vec<(i64, PropMap)> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                let mut props = PropMap::new();
                if let Some(v) = v {
                    props.insert("p".to_string(), v);
                }
                (i as i64, props)
            })
            .collect()
    }

    #[test]
    fn test_numeric_with_missing() {
        let elems = elements(vec![Some(1.5.into()), None, Some(3.0.into())]);
        let arrays = encode_fixed_property(&elems, "p").unwrap();
        assert_eq!(arrays.values.as_slice::<f64>(), Some(&[1.5, 0.0, 3.0][..]));
        assert_eq!(arrays.missing, Some(vec![false, true, false]));
    }

    #[test]
    fn test_all_present_omits_missing() {
        let elems = elements(vec![Some(1i64.into()), Some(2i64.into())]);
        let arrays = encode_fixed_property(&elems, "p").unwrap();
        assert_eq!(arrays.values.as_slice::<i64>(), Some(&[1i64, 2][..]));
        assert_eq!(arrays.missing, None);
    }

    #[test]
    fn test_explicit_absent_counts_as_missing() {
        let elems = elements(vec![Some(true.into()), Some(PropValue::Absent)]);
        let arrays = encode_fixed_property(&elems, "p").unwrap();
        assert_eq!(arrays.values.as_slice::<bool>(), Some(&[true, false][..]));
        assert_eq!(arrays.missing, Some(vec![false, true]));
    }

    #[test]
    fn test_numeric_promotion() {
        let elems = elements(vec![Some(1i64.into()), Some(2.5.into()), Some(true.into())]);
        let arrays = encode_fixed_property(&elems, "p").unwrap();
        assert_eq!(arrays.values.as_slice::<f64>(), Some(&[1.0, 2.5, 1.0][..]));
    }

    #[test]
    fn test_text_is_padded_bytes() {
        let elems = elements(vec![Some("ab".into()), None, Some("c".into())]);
        let arrays = encode_fixed_property(&elems, "p").unwrap();
        assert_eq!(arrays.values.shape(), &[3, 2]);
        assert_eq!(arrays.values.dtype(), DType::UInt8);
        assert_eq!(
            arrays.values.as_slice::<u8>(),
            Some(&[b'a', b'b', 0, 0, b'c', 0][..])
        );
        assert_eq!(arrays.missing, Some(vec![false, true, false]));
    }

    #[test]
    fn test_array_placeholder_reuses_first_value() {
        let elems = elements(vec![
            None,
            Some(NdArray::from_vec_1d(vec![1.0f32, 2.0]).into()),
            None,
            Some(NdArray::from_vec_1d(vec![3.0f32, 4.0]).into()),
        ]);
        let arrays = encode_fixed_property(&elems, "p").unwrap();
        assert_eq!(arrays.values.shape(), &[4, 2]);
        assert_eq!(
            arrays.values.as_slice::<f32>(),
            Some(&[1.0f32, 2.0, 1.0, 2.0, 1.0, 2.0, 3.0, 4.0][..])
        );
        assert_eq!(arrays.missing, Some(vec![true, false, true, false]));
    }

    #[test]
    fn test_zero_policy_for_arrays() {
        let elems = elements(vec![Some(NdArray::from_vec_1d(vec![5i32, 6]).into()), None]);
        let arrays = encode_fixed_property_with_default(&elems, "p", DefaultPolicy::Zero).unwrap();
        assert_eq!(arrays.values.as_slice::<i32>(), Some(&[5, 6, 0, 0][..]));
    }

    #[test]
    fn test_string_arrays_are_padded() {
        let elems = elements(vec![
            Some(NdArray::strings(["x", "yz"]).into()),
            Some(NdArray::strings(["", "w"]).into()),
        ]);
        let arrays = encode_fixed_property(&elems, "p").unwrap();
        assert_eq!(arrays.values.shape(), &[2, 2, 2]);
        assert_eq!(
            arrays.values.as_slice::<u8>(),
            Some(&[b'x', 0, b'y', b'z', 0, 0, b'w', 0][..])
        );
    }

    #[test]
    fn test_absent_everywhere() {
        let elems = elements(vec![None, None]);
        let arrays = encode_fixed_property(&elems, "p").unwrap();
        assert_eq!(arrays.values.as_slice::<i64>(), Some(&[0i64, 0][..]));
        assert_eq!(arrays.missing, Some(vec![true, true]));
    }

    #[test]
    fn test_mixed_text_and_numbers() {
        let elems = elements(vec![Some(1i64.into()), Some("one".into())]);
        assert!(matches!(
            encode_fixed_property(&elems, "p"),
            Err(CodecError::IncompatibleValue { index: 1, .. })
        ));
    }

    #[test]
    fn test_ragged_arrays_rejected() {
        let elems = elements(vec![
            Some(NdArray::from_vec_1d(vec![1.0f64]).into()),
            Some(NdArray::from_vec_1d(vec![1.0f64, 2.0]).into()),
        ]);
        assert!(matches!(
            encode_fixed_property(&elems, "p"),
            Err(CodecError::IncompatibleValue { index: 1, .. })
        ));
    }

    #[test]
    fn test_dict_props_to_arrays() {
        let mut a = PropMap::new();
        a.insert("t".into(), 0i64.into());
        a.insert("x".into(), 1.0.into());
        let mut b = PropMap::new();
        b.insert("t".into(), 1i64.into());
        let elems = vec![(0i64, a), (1i64, b)];
        let out = dict_props_to_arrays(&elems, &["t", "x"]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out["t"].missing, None);
        assert_eq!(out["x"].missing, Some(vec![false, true]));
    }
}
