//! Writing graphs into a GEFF group or directory store.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::codec::string::encode_string_data;
use crate::codec::varlen::serialize_vlen_property_data;
use crate::codec::dict_props_to_arrays;
use crate::error::{Component, GeffError};
use crate::io::memory::{InMemoryGeff, PropData};
use crate::layout::{EDGES, NODES, ids_path, prop_path, props_path};
use crate::metadata::{GeffMetadata, PropMetadata, calculate_roi};
use crate::model::{DType, NdArray, PropMap};
use crate::store::{Group, StoreOptions, write_group};
use crate::validate::validate_structure_group;

/// Options for [`write_arrays`], [`write_dicts`] and [`write_to_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    /// Validate the written group before returning.
    pub validate: bool,
    /// Directory store settings, used by [`write_to_path`].
    pub store: StoreOptions,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            validate: true,
            store: StoreOptions::default(),
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_store(mut self, store: StoreOptions) -> Self {
        self.store = store;
        self
    }
}

/// Writes ids, properties and metadata of `graph` into `group`.
///
/// Property metadata is inferred from the data and merged into the graph's
/// metadata; descriptive fields already declared for a property are kept.
/// Returns the metadata document that was written.
pub fn write_arrays(group: &mut Group, graph: &InMemoryGeff, options: &WriteOptions) -> Result<GeffMetadata, GeffError> {
    let node_dtype = graph.node_ids.dtype();
    let edge_dtype = graph.edge_ids.dtype();
    if node_dtype != edge_dtype {
        return Err(GeffError::IdDtypeMismatch {
            node_dtype,
            edge_dtype,
        });
    }
    group.create_array(&ids_path(NODES), graph.node_ids.clone())?;
    group.create_array(&ids_path(EDGES), edge_ids_2d(&graph.edge_ids)?)?;
    // props groups are always present, even when empty
    group.require_group(&props_path(NODES))?;
    group.require_group(&props_path(EDGES))?;

    let mut metadata = graph.metadata.clone();
    for (component, props, expected) in [
        (Component::Node, &graph.node_props, graph.num_nodes()),
        (Component::Edge, &graph.edge_props, graph.num_edges()),
    ] {
        let inferred = write_props(group, component, props, expected)?;
        let declared = metadata.props_metadata_mut(component);
        for prop in inferred {
            let merged = match declared.remove(&prop.identifier) {
                Some(existing) => PropMetadata {
                    dtype: prop.dtype,
                    varlength: prop.varlength,
                    ..existing
                },
                None => prop,
            };
            declared.insert(merged.identifier.clone(), merged);
        }
    }
    metadata.write(group)?;

    if options.validate {
        validate_structure_group(group)?;
    }
    debug!(
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        "wrote geff arrays"
    );
    Ok(metadata)
}

/// Empty edge arrays are stored with shape `(0, 2)`.
fn edge_ids_2d(edge_ids: &NdArray) -> Result<NdArray, GeffError> {
    if edge_ids.size() == 0 && edge_ids.shape() != [0, 2] {
        return Ok(NdArray::zeros(edge_ids.dtype(), vec![0, 2]));
    }
    Ok(edge_ids.clone())
}

fn write_props(
    group: &mut Group,
    component: Component,
    props: &BTreeMap<String, PropData>,
    expected: usize,
) -> Result<Vec<PropMetadata>, GeffError> {
    let mut inferred = Vec::with_capacity(props.len());
    for (name, data) in props {
        if data.len() != expected {
            return Err(GeffError::PropLength {
                component,
                prop: name.clone(),
                len: data.len(),
                expected,
            });
        }
        let target = group.require_group(&prop_path(component.group_name(), name))?;
        let md = match data {
            PropData::Fixed(arrays) if arrays.values.dtype() == DType::Str => {
                encode_string_data(&arrays.values, arrays.missing.as_deref())?.write_to(target)?;
                PropMetadata::new(name.as_str(), DType::Str.name())?
            }
            PropData::Fixed(arrays) => {
                arrays.write_to(target)?;
                PropMetadata::infer_fixed(name.as_str(), arrays)?
            }
            PropData::VarLength(elements) => {
                let md = PropMetadata::infer_varlength(name.as_str(), elements)?;
                let dtype = md.parsed_dtype().unwrap_or(DType::Float32);
                serialize_vlen_property_data(elements, dtype)?.write_to(target)?;
                md
            }
        };
        inferred.push(md);
    }
    Ok(inferred)
}

/// Writes a graph given as `(id, properties)` pairs.
///
/// Only the named properties are written, plus every axis declared in
/// `metadata`, which must be present on every node. Axes without bounds get
/// bounds computed from the node positions.
pub fn write_dicts<S: AsRef<str>>(
    group: &mut Group,
    nodes: &[(i64, PropMap)],
    edges: &[([i64; 2], PropMap)],
    node_prop_names: &[S],
    edge_prop_names: &[S],
    metadata: &GeffMetadata,
    options: &WriteOptions,
) -> Result<GeffMetadata, GeffError> {
    let mut metadata = metadata.clone();
    let axis_names: Vec<String> = metadata.axis_names().into_iter().map(str::to_string).collect();

    let mut node_names: Vec<String> = node_prop_names.iter().map(|n| n.as_ref().to_string()).collect();
    for axis in &axis_names {
        if !node_names.contains(axis) {
            node_names.push(axis.clone());
        }
    }
    let node_arrays = dict_props_to_arrays(nodes, &node_names)?;
    for axis in &axis_names {
        let missing = node_arrays.get(axis).and_then(|a| a.missing.as_ref());
        if let Some(row) = missing.and_then(|m| m.iter().position(|&is_missing| is_missing)) {
            return Err(GeffError::AxisPropMissing {
                prop: axis.clone(),
                node: nodes[row].0,
            });
        }
    }

    if let Some(axes) = metadata.axes.as_mut() {
        if axes.iter().any(|a| a.min.is_none() && a.max.is_none()) {
            if let Some((min, max)) = calculate_roi(nodes, &axis_names)? {
                for ((axis, lo), hi) in axes.iter_mut().zip(min).zip(max) {
                    if axis.min.is_none() && axis.max.is_none() {
                        axis.min = Some(lo);
                        axis.max = Some(hi);
                    }
                }
            }
        }
    }

    let edge_arrays = dict_props_to_arrays(edges, edge_prop_names)?;
    let edge_ids: Vec<[i64; 2]> = edges.iter().map(|(ids, _)| *ids).collect();
    let graph = InMemoryGeff {
        metadata,
        node_ids: NdArray::from_vec_1d(nodes.iter().map(|(id, _)| *id).collect()),
        edge_ids: NdArray::from_rows(&edge_ids),
        node_props: node_arrays.into_iter().map(|(k, v)| (k, v.into())).collect(),
        edge_props: edge_arrays.into_iter().map(|(k, v)| (k, v.into())).collect(),
    };
    write_arrays(group, &graph, options)
}

/// Writes `graph` as a directory store at `path`.
pub fn write_to_path(path: &Path, graph: &InMemoryGeff, options: &WriteOptions) -> Result<GeffMetadata, GeffError> {
    let mut group = Group::new();
    let metadata = write_arrays(&mut group, graph, options)?;
    write_group(path, &group, &options.store)?;
    Ok(metadata)
}
