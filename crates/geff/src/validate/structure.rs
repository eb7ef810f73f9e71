//! Structural validation of a GEFF store.
//!
//! Checks run in a fixed order and the first failure is returned.

use tracing::debug;

use crate::error::{Component, ValidationError};
use crate::layout::{DATA, EDGES, IDS, MISSING, NODES, PROPS, VALUES};
use crate::metadata::{GeffMetadata, PropMetadata};
use crate::model::{DType, NdArray};
use crate::store::{Group, Member, open_storelike};

const ROOT: &str = "graph";

/// Opens `store` and validates its layout against its metadata.
///
/// Returns the validated metadata document on success.
pub fn validate_structure(store: &str) -> Result<GeffMetadata, ValidationError> {
    let group = open_storelike(store)?;
    validate_structure_group(&group)
}

/// Validates an already opened graph group.
pub fn validate_structure_group(graph: &Group) -> Result<GeffMetadata, ValidationError> {
    let metadata = GeffMetadata::read(graph)?;

    let nodes = expect_group(graph, ROOT, NODES)?;
    let node_ids = expect_array(nodes, NODES, IDS)?;
    if !node_ids.dtype().is_integer() {
        return Err(ValidationError::NodeIdsNotInteger {
            dtype: node_ids.dtype(),
        });
    }
    if node_ids.ndim() != 1 {
        return Err(ValidationError::NodeIdsShape {
            shape: node_ids.shape().to_vec(),
        });
    }
    let node_props = expect_group(nodes, NODES, PROPS)?;
    validate_props_group(node_props, node_ids.len(), Component::Node)?;

    // edges are optional; without them there are no edge ids or props to check
    let (num_edges, edge_props) = match optional_group(graph, ROOT, EDGES)? {
        Some(edges) => validate_edges(edges, node_ids)?,
        None => (0, None),
    };

    if let Some(declared) = &metadata.node_props_metadata {
        validate_props_metadata(declared.values(), Some(node_props), Component::Node)?;
    }
    if let Some(declared) = &metadata.edge_props_metadata {
        validate_props_metadata(declared.values(), edge_props, Component::Edge)?;
    }

    for axis in metadata.axis_names() {
        validate_axis(node_props, axis)?;
    }

    debug!(
        nodes = node_ids.len(),
        edges = num_edges,
        "validated geff structure"
    );
    Ok(metadata)
}

fn expect_group<'a>(parent: &'a Group, parent_name: &str, name: &str) -> Result<&'a Group, ValidationError> {
    match parent.member(name) {
        Some(Member::Group(group)) => Ok(group),
        Some(Member::Array(_)) => Err(ValidationError::ExpectedGroup {
            parent: parent_name.to_string(),
            name: name.to_string(),
        }),
        None => Err(ValidationError::MissingGroup {
            parent: parent_name.to_string(),
            name: name.to_string(),
        }),
    }
}

fn optional_group<'a>(parent: &'a Group, parent_name: &str, name: &str) -> Result<Option<&'a Group>, ValidationError> {
    match parent.member(name) {
        None => Ok(None),
        Some(Member::Group(group)) => Ok(Some(group)),
        Some(Member::Array(_)) => Err(ValidationError::ExpectedGroup {
            parent: parent_name.to_string(),
            name: name.to_string(),
        }),
    }
}

/// Checks edge ids against the node ids and the optional edge props group.
///
/// Returns the edge count and the props group, if any.
fn validate_edges<'a>(edges: &'a Group, node_ids: &NdArray) -> Result<(usize, Option<&'a Group>), ValidationError> {
    let edge_ids = expect_array(edges, EDGES, IDS)?;
    if edge_ids.ndim() != 2 || edge_ids.shape()[1] != 2 {
        return Err(ValidationError::EdgeIdsShape {
            shape: edge_ids.shape().to_vec(),
        });
    }
    if edge_ids.dtype() != node_ids.dtype() {
        return Err(ValidationError::EdgeIdsDtype {
            node_dtype: node_ids.dtype(),
            edge_dtype: edge_ids.dtype(),
        });
    }
    let edge_props = optional_group(edges, EDGES, PROPS)?;
    if let Some(props) = edge_props {
        validate_props_group(props, edge_ids.len(), Component::Edge)?;
    }
    Ok((edge_ids.len(), edge_props))
}

fn expect_array<'a>(parent: &'a Group, parent_name: &str, name: &str) -> Result<&'a NdArray, ValidationError> {
    parent.array(name).ok_or_else(|| ValidationError::MissingArray {
        parent: parent_name.to_string(),
        name: name.to_string(),
    })
}

fn validate_props_group(props: &Group, expected: usize, component: Component) -> Result<(), ValidationError> {
    for (name, member) in props.members() {
        let Member::Group(prop) = member else {
            return Err(ValidationError::ExpectedGroup {
                parent: format!("{}/{PROPS}", component.group_name()),
                name: name.to_string(),
            });
        };

        let values = prop.array(VALUES).ok_or_else(|| ValidationError::MissingValues {
            component,
            prop: name.to_string(),
        })?;
        if values.len() != expected {
            return Err(ValidationError::ValuesLength {
                component,
                prop: name.to_string(),
                len: values.len(),
                expected,
            });
        }

        if let Some(missing) = prop.array(MISSING) {
            if missing.len() != expected {
                return Err(ValidationError::MissingLength {
                    component,
                    prop: name.to_string(),
                    len: missing.len(),
                    expected,
                });
            }
            if missing.dtype() != DType::Bool {
                return Err(ValidationError::MissingNotBoolean {
                    component,
                    prop: name.to_string(),
                    dtype: missing.dtype(),
                });
            }
        }
    }
    Ok(())
}

fn validate_props_metadata<'a>(
    declared: impl IntoIterator<Item = &'a PropMetadata>,
    props: Option<&Group>,
    component: Component,
) -> Result<(), ValidationError> {
    for prop in declared {
        let Some(group) = props.and_then(|p| p.group(&prop.identifier)) else {
            return Err(ValidationError::UndeclaredPropArrays {
                component,
                prop: prop.identifier.clone(),
            });
        };
        let parent = format!("{}/{PROPS}/{}", component.group_name(), prop.identifier);
        let values = expect_array(group, &parent, VALUES)?;
        let declared_dtype = prop.parsed_dtype();

        let (actual, matches) = if prop.varlength {
            let data = expect_array(group, &parent, DATA)?;
            (data.dtype(), declared_dtype == Some(data.dtype()))
        } else if declared_dtype == Some(DType::Str) {
            match group.array(DATA) {
                Some(data) => (data.dtype(), data.dtype() == DType::Bytes),
                None => (values.dtype(), values.dtype() == DType::Str),
            }
        } else {
            (values.dtype(), declared_dtype == Some(values.dtype()))
        };

        if !matches {
            return Err(ValidationError::DtypeMismatch {
                component,
                prop: prop.identifier.clone(),
                actual: actual.name().to_string(),
                declared: prop.dtype.clone(),
            });
        }
    }
    Ok(())
}

fn validate_axis(node_props: &Group, axis: &str) -> Result<(), ValidationError> {
    let Some(values) = node_props.group(axis).and_then(|g| g.array(VALUES)) else {
        return Err(ValidationError::AxisMissing {
            axis: axis.to_string(),
        });
    };
    if values.ndim() != 1 {
        return Err(ValidationError::AxisNotOneDimensional {
            axis: axis.to_string(),
            ndim: values.ndim(),
        });
    }
    if node_props.contains(&format!("{axis}/{MISSING}")) {
        return Err(ValidationError::AxisHasMissing {
            axis: axis.to_string(),
        });
    }
    Ok(())
}
