//! Spatiotemporal axis descriptions.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SchemaError;
use crate::metadata::valid_values::{
    VALID_AXIS_TYPES, validate_axis_type, validate_space_unit, validate_time_unit,
};

pub const AXIS_TYPE_SPACE: &str = "space";
pub const AXIS_TYPE_TIME: &str = "time";
pub const AXIS_TYPE_CHANNEL: &str = "channel";

/// A named node property that places nodes in space or time.
///
/// `min`/`max` bound the region of interest and are either both set or both
/// unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Axis {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            axis_type: None,
            unit: None,
            min: None,
            max: None,
        }
    }

    pub fn space(name: impl Into<String>) -> Self {
        Self::new(name).with_type(AXIS_TYPE_SPACE)
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name).with_type(AXIS_TYPE_TIME)
    }

    pub fn with_type(mut self, axis_type: impl Into<String>) -> Self {
        self.axis_type = Some(axis_type.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Checks the bounds and warns about unknown types and units.
    pub fn validate(&self) -> Result<(), SchemaError> {
        match (self.min, self.max) {
            (None, None) => {}
            (Some(min), Some(max)) => {
                if min > max {
                    return Err(SchemaError::AxisMinGreaterThanMax {
                        name: self.name.clone(),
                        min,
                        max,
                    });
                }
            }
            (min, max) => {
                return Err(SchemaError::IncompleteAxisBounds {
                    name: self.name.clone(),
                    min,
                    max,
                });
            }
        }

        if let Some(axis_type) = &self.axis_type {
            if !validate_axis_type(axis_type) {
                warn!(
                    "Type {axis_type} not in valid types {VALID_AXIS_TYPES:?}. \
                     Reader applications may not know what to do with this information."
                );
            }
        }

        if let Some(unit) = &self.unit {
            let known = match self.axis_type.as_deref() {
                Some(AXIS_TYPE_SPACE) => validate_space_unit(unit),
                Some(AXIS_TYPE_TIME) => validate_time_unit(unit),
                _ => true,
            };
            if !known {
                warn!(
                    "{unit} is not a valid unit for axis {}. \
                     Reader applications may not know what to do with this information.",
                    self.name
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(Axis::space("x").with_bounds(0.0, 10.0).validate().is_ok());
        assert!(Axis::space("x").with_bounds(3.0, 3.0).validate().is_ok());

        let err = Axis::space("x").with_bounds(4.0, 1.0).validate().unwrap_err();
        assert_eq!(err.to_string(), "axis \"x\": Min 4 is greater than max 1");

        let mut half = Axis::space("x");
        half.min = Some(0.0);
        assert!(matches!(
            half.validate(),
            Err(SchemaError::IncompleteAxisBounds { min: Some(_), max: None, .. })
        ));
    }

    #[test]
    fn test_unknown_values_only_warn() {
        assert!(Axis::new("c").with_type("spectral").validate().is_ok());
        assert!(Axis::time("t").with_unit("parsec").validate().is_ok());
    }

    #[test]
    fn test_serde_uses_type_key() {
        let axis = Axis::time("t").with_unit("second");
        let json = serde_json::to_value(&axis).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "t", "type": "time", "unit": "second"})
        );
        let back: Axis = serde_json::from_value(json).unwrap();
        assert_eq!(back, axis);
    }
}
