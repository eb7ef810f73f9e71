//! Per-property metadata.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::PropArrays;
use crate::error::SchemaError;
use crate::metadata::valid_values::{validate_data_type, validate_str_encoding};
use crate::model::{DType, Ragged};

/// Describes one node or edge property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropMetadata {
    /// Unique within its component. Non-empty.
    pub identifier: String,
    /// Element dtype name. Non-empty; unknown names only warn.
    pub dtype: String,
    #[serde(default)]
    pub varlength: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropMetadata {
    /// Creates and validates metadata for a fixed-shape property.
    pub fn new(identifier: impl Into<String>, dtype: impl Into<String>) -> Result<Self, SchemaError> {
        let md = Self::unchecked(identifier.into(), dtype.into(), false);
        md.validate()?;
        Ok(md)
    }

    /// Creates and validates metadata for a variable-length property.
    pub fn new_varlength(identifier: impl Into<String>, dtype: impl Into<String>) -> Result<Self, SchemaError> {
        let md = Self::unchecked(identifier.into(), dtype.into(), true);
        md.validate()?;
        Ok(md)
    }

    fn unchecked(identifier: String, dtype: String, varlength: bool) -> Self {
        Self {
            identifier,
            dtype,
            varlength,
            encoding: None,
            unit: None,
            name: None,
            description: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        let encoding = encoding.into();
        warn_unknown_encoding(&encoding);
        self.encoding = Some(encoding);
        self
    }

    /// The dtype, if it is on the allow-list.
    pub fn parsed_dtype(&self) -> Option<DType> {
        DType::parse(&self.dtype)
    }

    /// Checks hard constraints and logs warnings for unknown values.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.identifier.is_empty() {
            return Err(SchemaError::EmptyIdentifier);
        }
        if self.dtype.is_empty() {
            return Err(SchemaError::EmptyDtype {
                identifier: self.identifier.clone(),
            });
        }
        if self.varlength && self.parsed_dtype() == Some(DType::Str) {
            return Err(SchemaError::VarLengthString {
                identifier: self.identifier.clone(),
            });
        }
        if !validate_data_type(&self.dtype) {
            warn!(
                "Data type {} cannot be matched to a valid data type {:?}. \
                 Reader applications may not know what to do with this information.",
                self.dtype,
                DType::ALL.map(DType::name),
            );
        }
        if let Some(encoding) = &self.encoding {
            warn_unknown_encoding(encoding);
        }
        Ok(())
    }

    /// Infers metadata for a fixed-shape property from its arrays.
    pub fn infer_fixed(identifier: impl Into<String>, arrays: &PropArrays) -> Result<Self, SchemaError> {
        Self::new(identifier, arrays.values.dtype().name())
    }

    /// Infers metadata for a variable-length property.
    ///
    /// The dtype comes from the present elements, which must all agree. With
    /// no present element the default `float32` payload type is used.
    pub fn infer_varlength(identifier: impl Into<String>, elements: &[Ragged]) -> Result<Self, SchemaError> {
        let identifier = identifier.into();
        let mut present = elements.iter().filter_map(Ragged::as_array);
        let dtype = match present.next() {
            Some(first) => {
                let first = first.dtype();
                if let Some(other) = present.map(|a| a.dtype()).find(|&d| d != first) {
                    return Err(SchemaError::InconsistentDtypes {
                        identifier,
                        first,
                        other,
                    });
                }
                first
            }
            None => DType::Float32,
        };
        Self::new_varlength(identifier, dtype.name())
    }
}

fn warn_unknown_encoding(encoding: &str) {
    if !validate_str_encoding(encoding) {
        warn!(
            "Encoding {encoding} not in valid encodings. \
             Reader applications may not know what to do with this information."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NdArray;

    #[test]
    fn test_constraints() {
        assert_eq!(PropMetadata::new("", "int64"), Err(SchemaError::EmptyIdentifier));
        assert!(matches!(
            PropMetadata::new("x", ""),
            Err(SchemaError::EmptyDtype { .. })
        ));
        assert!(matches!(
            PropMetadata::new_varlength("x", "str"),
            Err(SchemaError::VarLengthString { .. })
        ));
        assert!(PropMetadata::new("x", "str").is_ok());
    }

    #[test]
    fn test_unknown_dtype_is_accepted() {
        let md = PropMetadata::new("x", "integer").unwrap();
        assert_eq!(md.parsed_dtype(), None);
    }

    #[test]
    fn test_serde_shape() {
        let md = PropMetadata::new("score", "float32").unwrap().with_unit("au");
        let json = serde_json::to_value(&md).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"identifier": "score", "dtype": "float32", "varlength": false, "unit": "au"})
        );
        let back: PropMetadata =
            serde_json::from_value(serde_json::json!({"identifier": "a", "dtype": "int"})).unwrap();
        assert!(!back.varlength);
        assert_eq!(back.parsed_dtype(), Some(DType::Int64));
    }

    #[test]
    fn test_infer_fixed() {
        let arrays = PropArrays::new(NdArray::from_vec_1d(vec![1u16, 2]));
        let md = PropMetadata::infer_fixed("a", &arrays).unwrap();
        assert_eq!(md.dtype, "uint16");
        assert!(!md.varlength);
    }

    #[test]
    fn test_infer_varlength() {
        let elements = vec![
            Ragged::Present(NdArray::from_vec_1d(vec![1.0f64])),
            Ragged::Absent,
            Ragged::Present(NdArray::from_vec_1d(vec![2.0f64, 3.0])),
        ];
        let md = PropMetadata::infer_varlength("poly", &elements).unwrap();
        assert_eq!(md.dtype, "float64");
        assert!(md.varlength);

        let mixed = vec![
            Ragged::Present(NdArray::from_vec_1d(vec![1.0f64])),
            Ragged::Present(NdArray::from_vec_1d(vec![1i32])),
        ];
        assert!(matches!(
            PropMetadata::infer_varlength("poly", &mixed),
            Err(SchemaError::InconsistentDtypes {
                first: DType::Float64,
                other: DType::Int32,
                ..
            })
        ));

        let md = PropMetadata::infer_varlength("poly", &[Ragged::Absent]).unwrap();
        assert_eq!(md.dtype, "float32");
    }
}
