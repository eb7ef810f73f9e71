//! Variable-length (ragged) property codec.
//!
//! A sequence of N-d arrays of varying shape, any of which may be absent,
//! is flattened into:
//!
//! - `values`: `(N, 1 + ndim)` int64 rows of `(offset, dim0, dim1, ...)`
//! - `missing`: optional boolean mask, omitted when nothing is absent
//! - `data`: every present element's payload concatenated in input order
//!
//! Absent elements get an all-zero shape and the current offset; they
//! contribute nothing to `data`. A present element with a zero-sized shape
//! is kept distinct from an absent one.

use crate::codec::VarLenArrays;
use crate::error::CodecError;
use crate::model::{ArrayData, DType, NdArray, Ragged};

// =============================================================================
// ENCODING
// =============================================================================

/// Serializes ragged elements, casting every payload to `dtype`.
pub fn serialize_vlen_property_data(elements: &[Ragged], dtype: DType) -> Result<VarLenArrays, CodecError> {
    let ndim = elements
        .iter()
        .find_map(Ragged::as_array)
        .map_or(1, NdArray::ndim);
    for (index, array) in elements
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.as_array().map(|a| (i, a)))
    {
        if array.ndim() != ndim {
            return Err(CodecError::DimensionMismatch {
                index,
                expected: ndim,
                actual: array.ndim(),
            });
        }
    }

    let width = 1 + ndim;
    let mut index = Vec::with_capacity(elements.len() * width);
    let mut missing = Vec::with_capacity(elements.len());
    let mut data = ArrayData::zeros(dtype, 0);
    let mut offset = 0usize;

    for element in elements {
        index.push(offset as i64);
        match element {
            Ragged::Absent => {
                index.extend(std::iter::repeat_n(0i64, ndim));
                missing.push(true);
            }
            Ragged::Present(array) => {
                index.extend(array.shape().iter().map(|&d| d as i64));
                data.append(array.data().cast(dtype)?)?;
                offset += array.size();
                missing.push(false);
            }
        }
    }

    let values = NdArray::from_vec(vec![elements.len(), width], index)?;
    let data_len = data.len();
    Ok(VarLenArrays {
        values,
        missing: missing.iter().any(|&m| m).then_some(missing),
        data: NdArray::new(vec![data_len], data)?,
    })
}

/// [`serialize_vlen_property_data`] with the default `float32` payload.
pub fn serialize_vlen_property_data_default(elements: &[Ragged]) -> Result<VarLenArrays, CodecError> {
    serialize_vlen_property_data(elements, DType::Float32)
}

// =============================================================================
// DECODING
// =============================================================================

/// Row view over an index array.
pub(crate) struct IndexTable {
    flat: Vec<i64>,
    width: usize,
    len: usize,
}

impl IndexTable {
    pub(crate) fn new(values: &NdArray) -> Result<Self, CodecError> {
        let invalid = || CodecError::InvalidIndexArray {
            dtype: values.dtype(),
            shape: values.shape().to_vec(),
        };
        if values.ndim() != 2 || values.shape()[1] < 2 {
            return Err(invalid());
        }
        let flat = values.to_i64_vec().ok_or_else(invalid)?;
        Ok(Self {
            flat,
            width: values.shape()[1],
            len: values.shape()[0],
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    fn row(&self, i: usize) -> &[i64] {
        &self.flat[i * self.width..(i + 1) * self.width]
    }

    /// Offset and per-dimension extents of row `i`.
    pub(crate) fn entry(&self, i: usize) -> Result<(usize, Vec<usize>), CodecError> {
        let row = self.row(i);
        let offset = usize::try_from(row[0]).map_err(|_| CodecError::MalformedIndex {
            row: i,
            reason: "negative offset",
        })?;
        let shape = row[1..]
            .iter()
            .map(|&d| usize::try_from(d))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| CodecError::MalformedIndex {
                row: i,
                reason: "negative dimension",
            })?;
        Ok((offset, shape))
    }

    /// Byte or element range of row `i` within a payload of `available` elements.
    pub(crate) fn range(&self, i: usize, available: usize) -> Result<(usize, usize, Vec<usize>), CodecError> {
        let (offset, shape) = self.entry(i)?;
        let count = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(CodecError::MalformedIndex {
                row: i,
                reason: "shape overflows",
            })?;
        let end = offset
            .checked_add(count)
            .filter(|&end| end <= available)
            .ok_or(CodecError::MalformedIndex {
                row: i,
                reason: "range exceeds data",
            })?;
        Ok((offset, end, shape))
    }

    fn element(&self, i: usize, data: &NdArray) -> Result<NdArray, CodecError> {
        let (start, end, shape) = self.range(i, data.size())?;
        NdArray::new(shape, data.data().slice(start..end))
    }
}

/// Decodes the element at `index`, or `None` if it is missing.
///
/// Negative indices are out of bounds; there is no wrap-around.
pub fn deserialize_vlen_array(
    values: &NdArray,
    missing: Option<&[bool]>,
    data: &NdArray,
    index: i64,
) -> Result<Option<NdArray>, CodecError> {
    let table = IndexTable::new(values)?;
    let i = usize::try_from(index)
        .ok()
        .filter(|&i| i < table.len())
        .ok_or(CodecError::IndexOutOfBounds {
            index,
            len: table.len(),
        })?;
    if missing.is_some_and(|m| m.get(i).copied().unwrap_or(false)) {
        return Ok(None);
    }
    table.element(i, data).map(Some)
}

/// Decodes every element, the inverse of [`serialize_vlen_property_data`].
pub fn deserialize_vlen_property_data(arrays: &VarLenArrays) -> Result<Vec<Ragged>, CodecError> {
    let table = IndexTable::new(&arrays.values)?;
    if let Some(missing) = &arrays.missing {
        if missing.len() != table.len() {
            return Err(CodecError::MissingLengthMismatch {
                missing: missing.len(),
                values: table.len(),
            });
        }
    }
    (0..table.len())
        .map(|i| {
            let absent = arrays.missing.as_ref().is_some_and(|m| m[i]);
            if absent {
                Ok(Ragged::Absent)
            } else {
                table.element(i, &arrays.data).map(Ragged::Present)
            }
        })
        .collect()
}
