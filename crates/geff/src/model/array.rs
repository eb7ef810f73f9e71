//! Typed N-dimensional arrays, the value exchanged with the store.
//!
//! Data is held flat in C order. The shape's leading dimension indexes graph
//! elements (nodes or edges); the remaining dimensions are per-element.

use std::ops::Range;

use crate::error::CodecError;
use crate::model::DType;

/// Flat, typed element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Bytes(Vec<u8>),
    Str(Vec<String>),
}

/// Evaluates `$body` with `$v` bound to the inner vector, whatever the variant.
macro_rules! with_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::Bool($v) => $body,
            ArrayData::Int8($v) => $body,
            ArrayData::Int16($v) => $body,
            ArrayData::Int32($v) => $body,
            ArrayData::Int64($v) => $body,
            ArrayData::UInt8($v) => $body,
            ArrayData::UInt16($v) => $body,
            ArrayData::UInt32($v) => $body,
            ArrayData::UInt64($v) => $body,
            ArrayData::Float32($v) => $body,
            ArrayData::Float64($v) => $body,
            ArrayData::Bytes($v) => $body,
            ArrayData::Str($v) => $body,
        }
    };
}

/// Like `with_data!`, rewrapping the result in the same variant.
macro_rules! map_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::Bool($v) => ArrayData::Bool($body),
            ArrayData::Int8($v) => ArrayData::Int8($body),
            ArrayData::Int16($v) => ArrayData::Int16($body),
            ArrayData::Int32($v) => ArrayData::Int32($body),
            ArrayData::Int64($v) => ArrayData::Int64($body),
            ArrayData::UInt8($v) => ArrayData::UInt8($body),
            ArrayData::UInt16($v) => ArrayData::UInt16($body),
            ArrayData::UInt32($v) => ArrayData::UInt32($body),
            ArrayData::UInt64($v) => ArrayData::UInt64($body),
            ArrayData::Float32($v) => ArrayData::Float32($body),
            ArrayData::Float64($v) => ArrayData::Float64($body),
            ArrayData::Bytes($v) => ArrayData::Bytes($body),
            ArrayData::Str($v) => ArrayData::Str($body),
        }
    };
}

impl ArrayData {
    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Bool(_) => DType::Bool,
            ArrayData::Int8(_) => DType::Int8,
            ArrayData::Int16(_) => DType::Int16,
            ArrayData::Int32(_) => DType::Int32,
            ArrayData::Int64(_) => DType::Int64,
            ArrayData::UInt8(_) => DType::UInt8,
            ArrayData::UInt16(_) => DType::UInt16,
            ArrayData::UInt32(_) => DType::UInt32,
            ArrayData::UInt64(_) => DType::UInt64,
            ArrayData::Float32(_) => DType::Float32,
            ArrayData::Float64(_) => DType::Float64,
            ArrayData::Bytes(_) => DType::Bytes,
            ArrayData::Str(_) => DType::Str,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        with_data!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `n` zero elements (`false`, `0`, `""`) of the given dtype.
    pub fn zeros(dtype: DType, n: usize) -> ArrayData {
        match dtype {
            DType::Bool => ArrayData::Bool(vec![false; n]),
            DType::Int8 => ArrayData::Int8(vec![0; n]),
            DType::Int16 => ArrayData::Int16(vec![0; n]),
            DType::Int32 => ArrayData::Int32(vec![0; n]),
            DType::Int64 => ArrayData::Int64(vec![0; n]),
            DType::UInt8 => ArrayData::UInt8(vec![0; n]),
            DType::UInt16 => ArrayData::UInt16(vec![0; n]),
            DType::UInt32 => ArrayData::UInt32(vec![0; n]),
            DType::UInt64 => ArrayData::UInt64(vec![0; n]),
            DType::Float32 => ArrayData::Float32(vec![0.0; n]),
            DType::Float64 => ArrayData::Float64(vec![0.0; n]),
            DType::Bytes => ArrayData::Bytes(vec![0; n]),
            DType::Str => ArrayData::Str(vec![String::new(); n]),
        }
    }

    /// Copies out a contiguous range of elements.
    pub fn slice(&self, range: Range<usize>) -> ArrayData {
        map_data!(self, v => v[range.clone()].to_vec())
    }

    /// Appends `other`, which must have the same dtype.
    pub fn append(&mut self, other: ArrayData) -> Result<(), CodecError> {
        let (to, from) = (self.dtype(), other.dtype());
        match (self, other) {
            (ArrayData::Bool(a), ArrayData::Bool(b)) => a.extend(b),
            (ArrayData::Int8(a), ArrayData::Int8(b)) => a.extend(b),
            (ArrayData::Int16(a), ArrayData::Int16(b)) => a.extend(b),
            (ArrayData::Int32(a), ArrayData::Int32(b)) => a.extend(b),
            (ArrayData::Int64(a), ArrayData::Int64(b)) => a.extend(b),
            (ArrayData::UInt8(a), ArrayData::UInt8(b)) => a.extend(b),
            (ArrayData::UInt16(a), ArrayData::UInt16(b)) => a.extend(b),
            (ArrayData::UInt32(a), ArrayData::UInt32(b)) => a.extend(b),
            (ArrayData::UInt64(a), ArrayData::UInt64(b)) => a.extend(b),
            (ArrayData::Float32(a), ArrayData::Float32(b)) => a.extend(b),
            (ArrayData::Float64(a), ArrayData::Float64(b)) => a.extend(b),
            (ArrayData::Bytes(a), ArrayData::Bytes(b)) => a.extend(b),
            (ArrayData::Str(a), ArrayData::Str(b)) => a.extend(b),
            _ => return Err(CodecError::UnsupportedCast { from, to }),
        }
        Ok(())
    }

    /// Converts between numeric dtypes (and raw bytes) with `as` semantics.
    ///
    /// Strings only cast to themselves.
    pub fn cast(&self, to: DType) -> Result<ArrayData, CodecError> {
        let from = self.dtype();
        if from == to {
            return Ok(self.clone());
        }

        macro_rules! convert {
            ($src:expr) => {
                match to {
                    DType::Bool => ArrayData::Bool($src.iter().map(|&x| (x as f64) != 0.0).collect()),
                    DType::Int8 => ArrayData::Int8($src.iter().map(|&x| x as i8).collect()),
                    DType::Int16 => ArrayData::Int16($src.iter().map(|&x| x as i16).collect()),
                    DType::Int32 => ArrayData::Int32($src.iter().map(|&x| x as i32).collect()),
                    DType::Int64 => ArrayData::Int64($src.iter().map(|&x| x as i64).collect()),
                    DType::UInt8 => ArrayData::UInt8($src.iter().map(|&x| x as u8).collect()),
                    DType::UInt16 => ArrayData::UInt16($src.iter().map(|&x| x as u16).collect()),
                    DType::UInt32 => ArrayData::UInt32($src.iter().map(|&x| x as u32).collect()),
                    DType::UInt64 => ArrayData::UInt64($src.iter().map(|&x| x as u64).collect()),
                    DType::Float32 => ArrayData::Float32($src.iter().map(|&x| x as f32).collect()),
                    DType::Float64 => ArrayData::Float64($src.iter().map(|&x| x as f64).collect()),
                    DType::Bytes => ArrayData::Bytes($src.iter().map(|&x| x as u8).collect()),
                    DType::Str => return Err(CodecError::UnsupportedCast { from, to }),
                }
            };
        }

        Ok(match self {
            ArrayData::Bool(v) => {
                let bits: Vec<u8> = v.iter().map(|&b| u8::from(b)).collect();
                convert!(bits)
            }
            ArrayData::Int8(v) => convert!(v),
            ArrayData::Int16(v) => convert!(v),
            ArrayData::Int32(v) => convert!(v),
            ArrayData::Int64(v) => convert!(v),
            ArrayData::UInt8(v) => convert!(v),
            ArrayData::UInt16(v) => convert!(v),
            ArrayData::UInt32(v) => convert!(v),
            ArrayData::UInt64(v) => convert!(v),
            ArrayData::Float32(v) => convert!(v),
            ArrayData::Float64(v) => convert!(v),
            ArrayData::Bytes(v) => convert!(v),
            ArrayData::Str(_) => return Err(CodecError::UnsupportedCast { from, to }),
        })
    }
}

// =============================================================================
// ELEMENT TYPES
// =============================================================================

/// A Rust type that can be stored in an [`NdArray`].
pub trait Element: Clone + Sized {
    const DTYPE: DType;

    fn wrap(values: Vec<Self>) -> ArrayData;

    fn slice_of(data: &ArrayData) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$variant;

                fn wrap(values: Vec<Self>) -> ArrayData {
                    ArrayData::$variant(values)
                }

                fn slice_of(data: &ArrayData) -> Option<&[Self]> {
                    match data {
                        ArrayData::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_element!(
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => Str,
);

// =============================================================================
// N-D ARRAY
// =============================================================================

/// A typed, C-ordered N-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    /// Creates an array, checking that `shape` matches the element count.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self, CodecError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(CodecError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn from_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> Result<Self, CodecError> {
        Self::new(shape, T::wrap(values))
    }

    /// A 1-D array.
    pub fn from_vec_1d<T: Element>(values: Vec<T>) -> Self {
        Self {
            shape: vec![values.len()],
            data: T::wrap(values),
        }
    }

    /// A 2-D array with one row per entry, e.g. edge id pairs.
    pub fn from_rows<T: Element, const N: usize>(rows: &[[T; N]]) -> Self {
        let values: Vec<T> = rows.iter().flat_map(|row| row.iter().cloned()).collect();
        Self {
            shape: vec![rows.len(), N],
            data: T::wrap(values),
        }
    }

    /// A 1-D array of raw bytes.
    pub fn bytes(values: Vec<u8>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Bytes(values),
        }
    }

    /// A 1-D string array.
    pub fn strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::from_vec_1d(values.into_iter().map(Into::into).collect::<Vec<String>>())
    }

    /// A zero-filled array.
    pub fn zeros(dtype: DType, shape: Vec<usize>) -> Self {
        let n = shape.iter().product();
        Self {
            shape,
            data: ArrayData::zeros(dtype, n),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Extent of the leading dimension (0 for a 0-d array).
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    pub fn into_parts(self) -> (Vec<usize>, ArrayData) {
        (self.shape, self.data)
    }

    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice_of(&self.data)
    }

    /// Contents of a raw byte array.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.data {
            ArrayData::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        self.as_slice().map(<[T]>::to_vec)
    }

    pub fn reshape(self, shape: Vec<usize>) -> Result<Self, CodecError> {
        Self::new(shape, self.data)
    }

    pub fn cast(&self, dtype: DType) -> Result<Self, CodecError> {
        Ok(Self {
            shape: self.shape.clone(),
            data: self.data.cast(dtype)?,
        })
    }

    /// Elements per leading-dimension row.
    pub fn row_size(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    /// The sub-array at leading index `i`.
    pub fn row(&self, i: usize) -> Option<NdArray> {
        if i >= self.len() {
            return None;
        }
        let row = self.row_size();
        Some(Self {
            shape: self.shape[1..].to_vec(),
            data: self.data.slice(i * row..(i + 1) * row),
        })
    }

    /// Keeps the rows whose mask entry is true.
    ///
    /// `mask` is expected to have one entry per row.
    pub fn select_rows(&self, mask: &[bool]) -> NdArray {
        let row = self.row_size();
        let kept = mask.iter().take(self.len()).filter(|&&keep| keep).count();
        let mut shape = self.shape.clone();
        if let Some(first) = shape.first_mut() {
            *first = kept;
        }
        let data = map_data!(&self.data, v => select_chunks(v, row, mask));
        Self { shape, data }
    }

    /// Integer contents widened to `i64`; `None` for non-integer dtypes or
    /// `uint64` values beyond `i64::MAX`.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match &self.data {
            ArrayData::Int8(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            ArrayData::Int16(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            ArrayData::Int32(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            ArrayData::Int64(v) => Some(v.clone()),
            ArrayData::UInt8(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            ArrayData::UInt16(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            ArrayData::UInt32(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            ArrayData::UInt64(v) => v.iter().map(|&x| i64::try_from(x).ok()).collect(),
            _ => None,
        }
    }

    /// Numeric contents as `f64`; `None` for strings.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match &self.data {
            ArrayData::Float64(v) => Some(v.clone()),
            ArrayData::Str(_) => None,
            data => match data.cast(DType::Float64) {
                Ok(ArrayData::Float64(v)) => Some(v),
                _ => None,
            },
        }
    }

    /// Rows of an `(E, 2)` integer array as id pairs.
    pub fn to_edge_pairs(&self) -> Option<Vec<[i64; 2]>> {
        if self.ndim() != 2 || self.shape[1] != 2 {
            return None;
        }
        let flat = self.to_i64_vec()?;
        Some(flat.chunks_exact(2).map(|c| [c[0], c[1]]).collect())
    }
}

fn select_chunks<T: Clone>(values: &[T], row: usize, mask: &[bool]) -> Vec<T> {
    if row == 0 {
        return Vec::new();
    }
    values
        .chunks(row)
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .flat_map(|(chunk, _)| chunk.iter().cloned())
        .collect()
}
