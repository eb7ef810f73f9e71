//! String property codec.
//!
//! Strings are stored as one UTF-8 byte blob plus an `(N, 2)` index of
//! `(offset, byte_length)` rows. Missing rows are still encoded; the mask
//! is an overlay only.

use crate::codec::varlen::IndexTable;
use crate::codec::{PropArrays, VarLenArrays};
use crate::error::CodecError;
use crate::model::{DType, NdArray};

/// Encodes a string array into index rows and a byte payload.
pub fn encode_string_data(values: &NdArray, missing: Option<&[bool]>) -> Result<VarLenArrays, CodecError> {
    let strings = values
        .as_slice::<String>()
        .ok_or(CodecError::NotString {
            dtype: values.dtype(),
        })?;
    if let Some(mask) = missing {
        if mask.len() != strings.len() {
            return Err(CodecError::MissingLengthMismatch {
                missing: mask.len(),
                values: strings.len(),
            });
        }
    }

    let mut index = Vec::with_capacity(strings.len() * 2);
    let mut data = Vec::with_capacity(strings.iter().map(String::len).sum());
    for s in strings {
        index.push(data.len() as i64);
        index.push(s.len() as i64);
        data.extend_from_slice(s.as_bytes());
    }

    Ok(VarLenArrays {
        values: NdArray::from_vec(vec![strings.len(), 2], index)?,
        missing: missing.map(<[bool]>::to_vec),
        data: NdArray::bytes(data),
    })
}

/// Decodes index rows and a byte payload back into a 1-D string array.
pub fn decode_string_data(arrays: &VarLenArrays) -> Result<PropArrays, CodecError> {
    let bytes = arrays.data.as_bytes().ok_or(CodecError::NotBytes {
        dtype: arrays.data.dtype(),
    })?;
    let table = IndexTable::new(&arrays.values)?;
    if table.width() != 2 {
        return Err(CodecError::InvalidIndexArray {
            dtype: arrays.values.dtype(),
            shape: arrays.values.shape().to_vec(),
        });
    }
    if let Some(mask) = &arrays.missing {
        if mask.len() != table.len() {
            return Err(CodecError::MissingLengthMismatch {
                missing: mask.len(),
                values: table.len(),
            });
        }
    }

    let strings = (0..table.len())
        .map(|row| {
            let (start, end, _) = table.range(row, bytes.len())?;
            std::str::from_utf8(&bytes[start..end])
                .map(str::to_string)
                .map_err(|_| CodecError::InvalidUtf8 { row })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PropArrays {
        values: NdArray::from_vec_1d(strings),
        missing: arrays.missing.clone(),
    })
}

/// True if a `data` array holds encoded strings rather than a numeric payload.
pub fn is_string_payload(data: &NdArray) -> bool {
    data.dtype() == DType::Bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_layout() {
        let values = NdArray::strings(["hi", "my", "name", "is"]);
        let missing = [false, true, true, true];
        let encoded = encode_string_data(&values, Some(&missing)).unwrap();
        // missing rows are still encoded
        assert_eq!(encoded.data.as_bytes(), Some(&b"himynameis"[..]));
        assert_eq!(encoded.values.shape(), &[4, 2]);
        assert_eq!(
            encoded.values.as_slice::<i64>(),
            Some(&[0i64, 2, 2, 2, 4, 4, 8, 2][..])
        );
        assert_eq!(encoded.missing, Some(missing.to_vec()));

        let decoded = decode_string_data(&encoded).unwrap();
        assert_eq!(decoded.values, values);
        assert_eq!(decoded.missing, Some(missing.to_vec()));

        assert_eq!(encode_string_data(&values, None).unwrap().missing, None);
    }

    #[test]
    fn test_multibyte_lengths_are_bytes() {
        let values = NdArray::strings(["é", "日本"]);
        let encoded = encode_string_data(&values, None).unwrap();
        assert_eq!(
            encoded.values.as_slice::<i64>(),
            Some(&[0i64, 2, 2, 6][..])
        );
        assert_eq!(decode_string_data(&encoded).unwrap().values, values);
    }

    #[test]
    fn test_non_string_rejected() {
        let values = NdArray::from_vec_1d(vec![1i32, 2]);
        assert_eq!(
            encode_string_data(&values, None),
            Err(CodecError::NotString {
                dtype: DType::Int32
            })
        );
    }

    #[test]
    fn test_non_bytes_rejected() {
        let arrays = VarLenArrays {
            values: NdArray::from_rows(&[[0i64, 1]]),
            missing: None,
            data: NdArray::from_vec_1d(vec![1u8]),
        };
        assert_eq!(
            decode_string_data(&arrays),
            Err(CodecError::NotBytes {
                dtype: DType::UInt8
            })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let arrays = VarLenArrays {
            values: NdArray::from_rows(&[[0i64, 1], [1, 1]]),
            missing: None,
            data: NdArray::bytes(vec![b'a', 0xFF]),
        };
        assert_eq!(
            decode_string_data(&arrays),
            Err(CodecError::InvalidUtf8 { row: 1 })
        );
    }

    proptest! {
        #[test]
        fn prop_roundtrip(strings in prop::collection::vec(".{0,8}", 0..10)) {
            let values = NdArray::strings(strings.clone());
            let encoded = encode_string_data(&values, None).unwrap();
            let rows = encoded.values.as_slice::<i64>().unwrap();
            let mut expected = 0i64;
            for (row, s) in rows.chunks(2).zip(&strings) {
                prop_assert_eq!(row[0], expected);
                prop_assert_eq!(row[1], s.len() as i64);
                expected += s.len() as i64;
            }
            prop_assert_eq!(decode_string_data(&encoded).unwrap().values, values);
        }
    }
}
