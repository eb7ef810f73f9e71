//! Helpers for building and merging metadata.

use tracing::warn;

use crate::error::{CodecError, Component, GeffError, SchemaError};
use crate::metadata::axis::Axis;
use crate::metadata::prop::PropMetadata;
use crate::metadata::schema::GeffMetadata;
use crate::metadata::versions::GEFF_VERSION;
use crate::model::{PropMap, present};

/// Parallel per-axis lists, as accepted by the writers.
///
/// Every provided list must have the same length as `names`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisLists {
    pub names: Option<Vec<String>>,
    pub units: Option<Vec<Option<String>>>,
    pub types: Option<Vec<Option<String>>>,
    pub roi_min: Option<Vec<Option<f64>>>,
    pub roi_max: Option<Vec<Option<f64>>>,
}

impl AxisLists {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_units<S: Into<String>>(mut self, units: impl IntoIterator<Item = Option<S>>) -> Self {
        self.units = Some(units.into_iter().map(|u| u.map(Into::into)).collect());
        self
    }

    pub fn with_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = Option<S>>) -> Self {
        self.types = Some(types.into_iter().map(|t| t.map(Into::into)).collect());
        self
    }

    pub fn with_roi(mut self, min: Vec<Option<f64>>, max: Vec<Option<f64>>) -> Self {
        self.roi_min = Some(min);
        self.roi_max = Some(max);
        self
    }

    /// True if none of the name, unit or type lists is given.
    pub fn is_empty(&self) -> bool {
        self.names.is_none() && self.units.is_none() && self.types.is_none()
    }
}

/// Builds axes from parallel lists. No names means no axes.
pub fn axes_from_lists(lists: &AxisLists) -> Result<Vec<Axis>, SchemaError> {
    let Some(names) = &lists.names else {
        return Ok(Vec::new());
    };
    let expected = names.len();
    check_list_len("units", lists.units.as_deref(), expected)?;
    check_list_len("types", lists.types.as_deref(), expected)?;
    check_list_len("roi_min", lists.roi_min.as_deref(), expected)?;
    check_list_len("roi_max", lists.roi_max.as_deref(), expected)?;

    let pick = |list: &Option<Vec<Option<String>>>, i: usize| list.as_ref().and_then(|l| l[i].clone());
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let axis = Axis {
                name: name.clone(),
                axis_type: pick(&lists.types, i),
                unit: pick(&lists.units, i),
                min: lists.roi_min.as_ref().and_then(|l| l[i]),
                max: lists.roi_max.as_ref().and_then(|l| l[i]),
            };
            axis.validate()?;
            Ok(axis)
        })
        .collect()
}

fn check_list_len<T>(field: &'static str, list: Option<&[T]>, expected: usize) -> Result<(), SchemaError> {
    match list {
        Some(list) if list.len() != expected => Err(SchemaError::AxisListLength {
            field,
            len: list.len(),
            expected,
        }),
        _ => Ok(()),
    }
}

/// Resolves axis lists against existing metadata.
///
/// Explicit lists win; any list left unset falls back to the axes of
/// `metadata`. ROI bounds are not carried over.
pub fn get_graph_existing_metadata(metadata: Option<&GeffMetadata>, mut lists: AxisLists) -> AxisLists {
    if !lists.is_empty() && metadata.is_some() {
        warn!("Both axis lists and metadata provided. Overriding metadata with axis lists.");
    }
    if let Some(axes) = metadata.and_then(|md| md.axes.as_ref()) {
        lists
            .names
            .get_or_insert_with(|| axes.iter().map(|a| a.name.clone()).collect());
        lists
            .units
            .get_or_insert_with(|| axes.iter().map(|a| a.unit.clone()).collect());
        lists
            .types
            .get_or_insert_with(|| axes.iter().map(|a| a.axis_type.clone()).collect());
    }
    lists
}

/// Copies `metadata` (or starts fresh) and sets the version, directedness
/// and axes.
pub fn create_or_update_metadata(metadata: Option<&GeffMetadata>, directed: bool, axes: Option<Vec<Axis>>) -> GeffMetadata {
    let mut metadata = metadata.cloned().unwrap_or_else(|| GeffMetadata::new(directed));
    metadata.geff_version = GEFF_VERSION.to_string();
    metadata.directed = directed;
    metadata.axes = axes;
    metadata
}

/// Returns a copy of `metadata` with `props` merged into the node or edge
/// property metadata. Existing entries with the same identifier are replaced.
pub fn create_or_update_props_metadata(
    metadata: &GeffMetadata,
    props: impl IntoIterator<Item = PropMetadata>,
    component: Component,
) -> GeffMetadata {
    let mut metadata = metadata.clone();
    let target = metadata.props_metadata_mut(component);
    for prop in props {
        target.insert(prop.identifier.clone(), prop);
    }
    metadata
}

/// Per-axis `(min, max)` over all nodes, or `None` for an empty node list.
///
/// Every node must carry a numeric scalar for every axis.
pub fn calculate_roi<S: AsRef<str>>(
    nodes: &[(i64, PropMap)],
    axis_names: &[S],
) -> Result<Option<(Vec<f64>, Vec<f64>)>, GeffError> {
    let mut bounds: Option<(Vec<f64>, Vec<f64>)> = None;
    for (index, (node, props)) in nodes.iter().enumerate() {
        let mut position = Vec::with_capacity(axis_names.len());
        for name in axis_names {
            let name = name.as_ref();
            let value = present(props, name).ok_or_else(|| GeffError::AxisPropMissing {
                prop: name.to_string(),
                node: *node,
            })?;
            let value = value.as_f64().ok_or_else(|| CodecError::IncompatibleValue {
                name: name.to_string(),
                index,
                reason: "axis values must be numeric scalars".to_string(),
            })?;
            position.push(value);
        }
        match &mut bounds {
            None => bounds = Some((position.clone(), position)),
            Some((min, max)) => {
                for (i, v) in position.into_iter().enumerate() {
                    min[i] = min[i].min(v);
                    max[i] = max[i].max(v);
                }
            }
        }
    }
    Ok(bounds)
}

/// Sets each axis's bounds from the node positions.
pub fn update_axes_roi(axes: &mut [Axis], nodes: &[(i64, PropMap)]) -> Result<(), GeffError> {
    let names: Vec<&str> = axes.iter().map(|a| a.name.as_str()).collect();
    if let Some((min, max)) = calculate_roi(nodes, &names)? {
        for ((axis, lo), hi) in axes.iter_mut().zip(min).zip(max) {
            axis.min = Some(lo);
            axis.max = Some(hi);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropValue;

    fn node(id: i64, t: i64, x: f64) -> (i64, PropMap) {
        let mut props = PropMap::new();
        props.insert("t".into(), PropValue::Int(t));
        props.insert("x".into(), PropValue::Float(x));
        (id, props)
    }

    #[test]
    fn test_axes_from_lists() {
        let lists = AxisLists::new(["t", "y", "x"])
            .with_types([Some("time"), Some("space"), Some("space")])
            .with_units([Some("second"), None, Some("micrometer")]);
        let axes = axes_from_lists(&lists).unwrap();
        assert_eq!(axes.len(), 3);
        assert_eq!(axes[0], Axis::time("t").with_unit("second"));
        assert_eq!(axes[1], Axis::space("y"));

        assert_eq!(axes_from_lists(&AxisLists::default()).unwrap(), vec![]);
    }

    #[test]
    fn test_axes_from_lists_length_mismatch() {
        let lists = AxisLists::new(["t", "x"]).with_units([Some("second")]);
        assert_eq!(
            axes_from_lists(&lists),
            Err(SchemaError::AxisListLength {
                field: "units",
                len: 1,
                expected: 2
            })
        );
    }

    #[test]
    fn test_axes_from_lists_checks_bounds() {
        let lists = AxisLists::new(["x"]).with_roi(vec![Some(2.0)], vec![Some(1.0)]);
        assert!(matches!(
            axes_from_lists(&lists),
            Err(SchemaError::AxisMinGreaterThanMax { .. })
        ));
    }

    #[test]
    fn test_existing_metadata_fallback() {
        let md = GeffMetadata::new(false).with_axes(vec![
            Axis::time("t").with_unit("second"),
            Axis::space("x"),
        ]);
        let lists = get_graph_existing_metadata(Some(&md), AxisLists::default());
        assert_eq!(lists.names, Some(vec!["t".to_string(), "x".to_string()]));
        assert_eq!(lists.units, Some(vec![Some("second".to_string()), None]));

        let lists = get_graph_existing_metadata(Some(&md), AxisLists::new(["z"]));
        assert_eq!(lists.names, Some(vec!["z".to_string()]));
        assert_eq!(lists.types, Some(vec![Some("time".to_string()), Some("space".to_string())]));

        assert_eq!(get_graph_existing_metadata(None, AxisLists::default()), AxisLists::default());
    }

    #[test]
    fn test_create_or_update_metadata() {
        let mut old = GeffMetadata::new(false);
        old.geff_version = "0.2.0".into();
        old.sphere = Some("r".into());
        let md = create_or_update_metadata(Some(&old), true, Some(vec![Axis::space("x")]));
        assert_eq!(md.geff_version, GEFF_VERSION);
        assert!(md.directed);
        assert_eq!(md.sphere.as_deref(), Some("r"));
        assert_eq!(md.axis_names(), vec!["x"]);

        let fresh = create_or_update_metadata(None, false, None);
        assert_eq!(fresh, GeffMetadata::new(false));
    }

    #[test]
    fn test_props_metadata_merge_overwrites() {
        let md = GeffMetadata::new(true);
        let md = create_or_update_props_metadata(
            &md,
            [PropMetadata::new("a", "int64").unwrap(), PropMetadata::new("b", "str").unwrap()],
            Component::Node,
        );
        let md = create_or_update_props_metadata(
            &md,
            [PropMetadata::new("a", "float32").unwrap()],
            Component::Node,
        );
        let node_props = md.props_metadata(Component::Node).unwrap();
        assert_eq!(node_props.len(), 2);
        assert_eq!(node_props["a"].dtype, "float32");
        assert!(md.props_metadata(Component::Edge).is_none());
    }

    #[test]
    fn test_calculate_roi() {
        let nodes = vec![node(0, 3, 1.5), node(1, 1, 4.0), node(2, 2, -2.0)];
        let (min, max) = calculate_roi(&nodes, &["t", "x"]).unwrap().unwrap();
        assert_eq!(min, vec![1.0, -2.0]);
        assert_eq!(max, vec![3.0, 4.0]);

        assert_eq!(calculate_roi::<&str>(&[], &["t"]).unwrap(), None);
    }

    #[test]
    fn test_calculate_roi_missing_prop() {
        let nodes = vec![node(0, 3, 1.5), (7, PropMap::new())];
        assert_eq!(
            calculate_roi(&nodes, &["t"]),
            Err(GeffError::AxisPropMissing {
                prop: "t".into(),
                node: 7
            })
        );
    }

    #[test]
    fn test_update_axes_roi() {
        let nodes = vec![node(0, 3, 1.5), node(1, 1, 4.0)];
        let mut axes = vec![Axis::time("t"), Axis::space("x")];
        update_axes_roi(&mut axes, &nodes).unwrap();
        assert_eq!((axes[0].min, axes[0].max), (Some(1.0), Some(3.0)));
        assert_eq!((axes[1].min, axes[1].max), (Some(1.5), Some(4.0)));
    }
}
