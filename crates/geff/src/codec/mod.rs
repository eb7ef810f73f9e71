//! Property codecs for GEFF.
//!
//! Properties are stored per graph component as a group holding a `values`
//! array, an optional boolean `missing` array and, for variable-length and
//! string properties, a flat `data` payload indexed by `values`.

pub mod fixed;
pub mod primitives;
pub mod string;
pub mod varlen;

use crate::error::{CodecError, StoreError};
use crate::layout::{DATA, MISSING, VALUES};
use crate::model::{DType, NdArray};
use crate::store::Group;

pub use fixed::{DefaultPolicy, dict_props_to_arrays, encode_fixed_property, encode_fixed_property_with_default};
pub use primitives::{Reader, Writer};
pub use string::{decode_string_data, encode_string_data};
pub use varlen::{
    deserialize_vlen_array, deserialize_vlen_property_data, serialize_vlen_property_data,
    serialize_vlen_property_data_default,
};

/// Values plus optional missing mask of a fixed-shape property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropArrays {
    pub values: NdArray,
    /// `None` when no element is missing.
    pub missing: Option<Vec<bool>>,
}

impl PropArrays {
    pub fn new(values: NdArray) -> Self {
        Self {
            values,
            missing: None,
        }
    }

    pub fn with_missing(values: NdArray, missing: Vec<bool>) -> Self {
        Self {
            values,
            missing: Some(missing),
        }
    }

    /// Number of elements (rows).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, i: usize) -> bool {
        self.missing
            .as_ref()
            .is_some_and(|m| m.get(i).copied().unwrap_or(false))
    }

    /// Keeps the rows selected by `mask`.
    pub fn select(&self, mask: &[bool]) -> Self {
        Self {
            values: self.values.select_rows(mask),
            missing: self.missing.as_ref().map(|m| select_mask(m, mask)),
        }
    }

    /// Reads `values` and `missing` from a property group.
    pub fn from_group(group: &Group) -> Result<Self, CodecError> {
        let values = group
            .array(VALUES)
            .ok_or(CodecError::MissingKey { key: VALUES })?
            .clone();
        let missing = read_missing(group, values.len())?;
        Ok(Self { values, missing })
    }

    pub fn write_to(&self, group: &mut Group) -> Result<(), StoreError> {
        group.create_array(VALUES, self.values.clone())?;
        write_missing(group, self.missing.as_deref())
    }
}

/// Index table, optional missing mask and flat payload of a
/// variable-length or string property.
#[derive(Debug, Clone, PartialEq)]
pub struct VarLenArrays {
    /// `(N, 1 + ndim)` int64 rows of `(offset, dim0, ...)`.
    pub values: NdArray,
    /// `None` when no element is missing.
    pub missing: Option<Vec<bool>>,
    /// Concatenated element payloads.
    pub data: NdArray,
}

impl VarLenArrays {
    /// Number of elements (rows).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_group(group: &Group) -> Result<Self, CodecError> {
        let values = group
            .array(VALUES)
            .ok_or(CodecError::MissingKey { key: VALUES })?
            .clone();
        let data = group
            .array(DATA)
            .ok_or(CodecError::MissingKey { key: DATA })?
            .clone();
        let missing = read_missing(group, values.len())?;
        Ok(Self {
            values,
            missing,
            data,
        })
    }

    pub fn write_to(&self, group: &mut Group) -> Result<(), StoreError> {
        group.create_array(VALUES, self.values.clone())?;
        group.create_array(DATA, self.data.clone())?;
        write_missing(group, self.missing.as_deref())
    }
}

fn read_missing(group: &Group, expected: usize) -> Result<Option<Vec<bool>>, CodecError> {
    let Some(missing) = group.array(MISSING) else {
        return Ok(None);
    };
    if missing.len() != expected {
        return Err(CodecError::MissingLengthMismatch {
            missing: missing.len(),
            values: expected,
        });
    }
    let mask = missing.cast(DType::Bool)?;
    Ok(mask.to_vec::<bool>())
}

fn write_missing(group: &mut Group, missing: Option<&[bool]>) -> Result<(), StoreError> {
    match missing {
        Some(mask) => group.create_array(MISSING, NdArray::from_vec_1d(mask.to_vec())),
        None => {
            group.remove(MISSING);
            Ok(())
        }
    }
}

pub(crate) fn select_mask(values: &[bool], mask: &[bool]) -> Vec<bool> {
    values
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(v, _)| *v)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_arrays_group_roundtrip() {
        let arrays = PropArrays::with_missing(
            NdArray::from_vec_1d(vec![1.0f64, 0.0]),
            vec![false, true],
        );
        let mut group = Group::new();
        arrays.write_to(&mut group).unwrap();
        assert_eq!(group.array_keys(), vec!["missing", "values"]);
        assert_eq!(PropArrays::from_group(&group).unwrap(), arrays);
        assert!(arrays.is_missing(1));
        assert!(!arrays.is_missing(0));
    }

    #[test]
    fn test_missing_length_checked() {
        let mut group = Group::new();
        group
            .create_array(VALUES, NdArray::from_vec_1d(vec![1i32, 2, 3]))
            .unwrap();
        group
            .create_array(MISSING, NdArray::from_vec_1d(vec![false]))
            .unwrap();
        assert_eq!(
            PropArrays::from_group(&group),
            Err(CodecError::MissingLengthMismatch {
                missing: 1,
                values: 3
            })
        );
    }

    #[test]
    fn test_varlen_group_requires_data() {
        let mut group = Group::new();
        group
            .create_array(VALUES, NdArray::from_rows(&[[0i64, 1]]))
            .unwrap();
        assert_eq!(
            VarLenArrays::from_group(&group),
            Err(CodecError::MissingKey { key: "data" })
        );
        assert_eq!(
            VarLenArrays::from_group(&Group::new()),
            Err(CodecError::MissingKey { key: "values" })
        );
    }

    #[test]
    fn test_select() {
        let arrays = PropArrays::with_missing(
            NdArray::from_vec_1d(vec![1u8, 2, 3]),
            vec![false, true, false],
        );
        let picked = arrays.select(&[false, true, true]);
        assert_eq!(picked.values.as_slice::<u8>(), Some(&[2u8, 3][..]));
        assert_eq!(picked.missing, Some(vec![true, false]));
    }
}
