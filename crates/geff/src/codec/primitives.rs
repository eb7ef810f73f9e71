//! Primitive encoding/decoding for chunk payloads.
//!
//! Chunks hold C-ordered little-endian elements. Strings are fixed-width
//! UTF-32LE, zero padded, matching numpy's `<U{n}` layout.

use crate::error::StoreError;
use crate::model::{ArrayData, DType};

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding chunk bytes.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

macro_rules! read_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self, context: &'static str) -> Result<$ty, StoreError> {
                let bytes = self.read_array::<{ std::mem::size_of::<$ty>() }>(context)?;
                Ok(<$ty>::from_le_bytes(bytes))
            }
        )*
    };
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], StoreError> {
        if n > self.remaining_len() {
            return Err(StoreError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], StoreError> {
        let bytes = self.read_bytes(N, context)?;
        // SAFETY: read_bytes guarantees exactly N bytes, try_into always succeeds
        Ok(bytes.try_into().unwrap())
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, StoreError> {
        Ok(self.read_array::<1>(context)?[0])
    }

    /// Reads a bool stored as one byte; any non-zero value is true.
    #[inline]
    pub fn read_bool(&mut self, context: &'static str) -> Result<bool, StoreError> {
        Ok(self.read_byte(context)? != 0)
    }

    read_le!(
        read_i8 => i8,
        read_i16 => i16,
        read_i32 => i32,
        read_i64 => i64,
        read_u16 => u16,
        read_u32 => u32,
        read_u64 => u64,
        read_f32 => f32,
        read_f64 => f64,
    );

    /// Reads a fixed-width UTF-32LE string of `width` code points.
    ///
    /// Trailing NUL code points are padding and are dropped.
    pub fn read_utf32(&mut self, width: usize, context: &'static str) -> Result<String, StoreError> {
        let mut out = String::with_capacity(width.min(self.remaining_len() / 4));
        let mut ended = false;
        for _ in 0..width {
            let value = self.read_u32(context)?;
            ended |= value == 0;
            if !ended {
                out.push(char::from_u32(value).ok_or(StoreError::InvalidCodePoint { value })?);
            }
        }
        Ok(out)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding chunk bytes.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

macro_rules! write_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self, value: $ty) {
                self.buf.extend_from_slice(&value.to_le_bytes());
            }
        )*
    };
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    write_le!(
        write_i8 => i8,
        write_i16 => i16,
        write_i32 => i32,
        write_i64 => i64,
        write_u16 => u16,
        write_u32 => u32,
        write_u64 => u64,
        write_f32 => f32,
        write_f64 => f64,
    );

    /// Writes `s` as UTF-32LE padded with NULs to `width` code points.
    ///
    /// `width` must be at least the string's char count.
    pub fn write_utf32(&mut self, s: &str, width: usize) {
        let mut written = 0;
        for c in s.chars() {
            self.write_u32(c as u32);
            written += 1;
        }
        for _ in written..width {
            self.write_u32(0);
        }
    }
}

// =============================================================================
// ARRAY DATA
// =============================================================================

/// Width in code points needed to hold every string of `values` (at least 1).
pub fn utf32_width(values: &[String]) -> usize {
    values.iter().map(|s| s.chars().count()).max().unwrap_or(0).max(1)
}

/// Encodes flat array data. `str_width` is only used for string data.
pub fn encode_array_data(data: &ArrayData, str_width: usize) -> Vec<u8> {
    let item = data.dtype().item_size().unwrap_or(4 * str_width);
    let mut writer = Writer::with_capacity(item * data.len());
    match data {
        ArrayData::Bool(v) => v.iter().for_each(|&x| writer.write_bool(x)),
        ArrayData::Int8(v) => v.iter().for_each(|&x| writer.write_i8(x)),
        ArrayData::Int16(v) => v.iter().for_each(|&x| writer.write_i16(x)),
        ArrayData::Int32(v) => v.iter().for_each(|&x| writer.write_i32(x)),
        ArrayData::Int64(v) => v.iter().for_each(|&x| writer.write_i64(x)),
        ArrayData::UInt8(v) | ArrayData::Bytes(v) => writer.write_bytes(v),
        ArrayData::UInt16(v) => v.iter().for_each(|&x| writer.write_u16(x)),
        ArrayData::UInt32(v) => v.iter().for_each(|&x| writer.write_u32(x)),
        ArrayData::UInt64(v) => v.iter().for_each(|&x| writer.write_u64(x)),
        ArrayData::Float32(v) => v.iter().for_each(|&x| writer.write_f32(x)),
        ArrayData::Float64(v) => v.iter().for_each(|&x| writer.write_f64(x)),
        ArrayData::Str(v) => v.iter().for_each(|s| writer.write_utf32(s, str_width)),
    }
    writer.into_bytes()
}

/// Decodes `count` elements of `dtype`, consuming the whole input.
pub fn decode_array_data(
    bytes: &[u8],
    dtype: DType,
    count: usize,
    str_width: usize,
) -> Result<ArrayData, StoreError> {
    const CONTEXT: &str = "chunk";
    let mut reader = Reader::new(bytes);

    macro_rules! read_all {
        ($variant:ident, $method:ident) => {
            ArrayData::$variant(
                (0..count)
                    .map(|_| reader.$method(CONTEXT))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        };
    }

    let data = match dtype {
        DType::Bool => read_all!(Bool, read_bool),
        DType::Int8 => read_all!(Int8, read_i8),
        DType::Int16 => read_all!(Int16, read_i16),
        DType::Int32 => read_all!(Int32, read_i32),
        DType::Int64 => read_all!(Int64, read_i64),
        DType::UInt8 => ArrayData::UInt8(reader.read_bytes(count, CONTEXT)?.to_vec()),
        DType::UInt16 => read_all!(UInt16, read_u16),
        DType::UInt32 => read_all!(UInt32, read_u32),
        DType::UInt64 => read_all!(UInt64, read_u64),
        DType::Float32 => read_all!(Float32, read_f32),
        DType::Float64 => read_all!(Float64, read_f64),
        DType::Bytes => ArrayData::Bytes(reader.read_bytes(count, CONTEXT)?.to_vec()),
        DType::Str => ArrayData::Str(
            (0..count)
                .map(|_| reader.read_utf32(str_width, CONTEXT))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };

    if !reader.is_empty() {
        return Err(StoreError::ChunkSize {
            path: CONTEXT.to_string(),
            expected: reader.position(),
            actual: bytes.len(),
        });
    }
    Ok(data)
}
