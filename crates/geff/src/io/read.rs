//! Loading a GEFF store into memory.
//!
//! [`GeffReader`] loads a chosen subset of properties and can then build
//! graphs restricted to masked nodes and edges. [`read_to_memory`] is the
//! one-call path.

use std::collections::BTreeMap;
use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::codec::string::{decode_string_data, is_string_payload};
use crate::codec::varlen::deserialize_vlen_property_data;
use crate::codec::{PropArrays, VarLenArrays};
use crate::error::{Component, GeffError, ValidationError};
use crate::io::memory::{InMemoryGeff, PropData};
use crate::layout::{DATA, EDGES, IDS, NODES, ids_path, prop_path, props_path};
use crate::metadata::{GeffMetadata, PropMetadata};
use crate::model::NdArray;
use crate::store::{Group, open_storelike, read_group};
use crate::validate::{ValidationConfig, validate_optional_data, validate_structure_group, validate_zarr_data};

/// Options for [`read_to_memory`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    /// Validate the store structure before loading.
    pub validate: bool,
    /// Run [`validate_zarr_data`] on the loaded graph.
    pub validate_data: bool,
    /// Run [`validate_optional_data`] with this configuration.
    pub optional_validation: Option<ValidationConfig>,
    /// Node properties to load; `None` loads all of them.
    pub node_props: Option<Vec<String>>,
    /// Edge properties to load; `None` loads all of them.
    pub edge_props: Option<Vec<String>>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            validate: true,
            validate_data: false,
            optional_validation: None,
            node_props: None,
            edge_props: None,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_data_validation(mut self, validate_data: bool) -> Self {
        self.validate_data = validate_data;
        self
    }

    pub fn with_optional_validation(mut self, config: ValidationConfig) -> Self {
        self.optional_validation = Some(config);
        self
    }

    pub fn with_node_props<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.node_props = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_edge_props<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.edge_props = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Reads properties from a graph group and builds in-memory graphs.
#[derive(Debug, Clone)]
pub struct GeffReader {
    group: Group,
    metadata: GeffMetadata,
    node_ids: NdArray,
    edge_ids: NdArray,
    node_prop_names: Vec<String>,
    edge_prop_names: Vec<String>,
    node_props: BTreeMap<String, PropData>,
    edge_props: BTreeMap<String, PropData>,
}

impl GeffReader {
    /// Opens a store location (local path, `~` expanded).
    pub fn open(store: &str, validate: bool) -> Result<Self, GeffError> {
        Self::from_group(open_storelike(store)?, validate)
    }

    /// Wraps an already loaded graph group.
    pub fn from_group(group: Group, validate: bool) -> Result<Self, GeffError> {
        let metadata = if validate {
            validate_structure_group(&group)?
        } else {
            GeffMetadata::read(&group)?
        };
        let node_ids = required_array(&group, NODES)?;
        // a store without an edges group has no edges
        let edge_ids = if group.contains(EDGES) {
            required_array(&group, EDGES)?
        } else {
            NdArray::zeros(node_ids.dtype(), vec![0, 2])
        };
        let prop_names = |component: &str| -> Vec<String> {
            group
                .group(&props_path(component))
                .map(|props| props.group_keys().into_iter().map(str::to_string).collect())
                .unwrap_or_default()
        };
        let node_prop_names = prop_names(NODES);
        let edge_prop_names = prop_names(EDGES);
        Ok(Self {
            metadata,
            node_ids,
            edge_ids,
            node_prop_names,
            edge_prop_names,
            node_props: BTreeMap::new(),
            edge_props: BTreeMap::new(),
            group,
        })
    }

    pub fn metadata(&self) -> &GeffMetadata {
        &self.metadata
    }

    /// Names of all node properties in the store.
    pub fn node_prop_names(&self) -> &[String] {
        &self.node_prop_names
    }

    /// Names of all edge properties in the store.
    pub fn edge_prop_names(&self) -> &[String] {
        &self.edge_prop_names
    }

    /// Loads the named node properties, or all of them for `None`.
    pub fn read_node_props<S: AsRef<str>>(&mut self, names: Option<&[S]>) -> Result<(), GeffError> {
        self.read_props(Component::Node, names)
    }

    /// Loads the named edge properties, or all of them for `None`.
    pub fn read_edge_props<S: AsRef<str>>(&mut self, names: Option<&[S]>) -> Result<(), GeffError> {
        self.read_props(Component::Edge, names)
    }

    fn read_props<S: AsRef<str>>(&mut self, component: Component, names: Option<&[S]>) -> Result<(), GeffError> {
        let names: Vec<String> = match names {
            Some(names) => names.iter().map(|n| n.as_ref().to_string()).collect(),
            None => match component {
                Component::Node => self.node_prop_names.clone(),
                Component::Edge => self.edge_prop_names.clone(),
            },
        };
        let declared = self.metadata.props_metadata(component);
        let mut loaded = BTreeMap::new();
        for name in names {
            let group = self
                .group
                .group(&prop_path(component.group_name(), &name))
                .ok_or_else(|| ValidationError::MissingGroup {
                    parent: props_path(component.group_name()),
                    name: name.clone(),
                })?;
            let data = read_prop(group, declared.and_then(|d| d.get(&name)))?;
            debug!(%component, prop = %name, rows = data.len(), "loaded property");
            loaded.insert(name, data);
        }
        match component {
            Component::Node => self.node_props.extend(loaded),
            Component::Edge => self.edge_props.extend(loaded),
        }
        Ok(())
    }

    /// Builds an in-memory graph from the loaded properties.
    ///
    /// `node_mask` keeps the nodes where it is true and drops every edge
    /// touching a removed node. `edge_mask` further restricts the edges.
    pub fn build(&self, node_mask: Option<&[bool]>, edge_mask: Option<&[bool]>) -> Result<InMemoryGeff, GeffError> {
        check_mask(node_mask, self.node_ids.len())?;
        check_mask(edge_mask, self.edge_ids.len())?;

        let node_ids = match node_mask {
            Some(mask) => self.node_ids.select_rows(mask),
            None => self.node_ids.clone(),
        };

        let edge_mask: Option<Vec<bool>> = match node_mask {
            None => edge_mask.map(<[bool]>::to_vec),
            Some(_) => {
                let kept: FxHashSet<i64> = node_ids
                    .to_i64_vec()
                    .ok_or(ValidationError::IdsNotRepresentable {
                        component: Component::Node,
                    })?
                    .into_iter()
                    .collect();
                let pairs = edge_pairs(&self.edge_ids)?;
                let touching_kept = pairs
                    .iter()
                    .map(|[source, target]| kept.contains(source) && kept.contains(target));
                Some(match edge_mask {
                    Some(mask) => touching_kept.zip(mask).map(|(a, &b)| a && b).collect(),
                    None => touching_kept.collect(),
                })
            }
        };
        let edge_ids = match &edge_mask {
            Some(mask) => self.edge_ids.select_rows(mask),
            None => self.edge_ids.clone(),
        };

        let select = |props: &BTreeMap<String, PropData>, mask: Option<&[bool]>| -> BTreeMap<String, PropData> {
            props
                .iter()
                .map(|(name, data)| {
                    let data = match mask {
                        Some(mask) => data.select(mask),
                        None => data.clone(),
                    };
                    (name.clone(), data)
                })
                .collect()
        };

        Ok(InMemoryGeff {
            metadata: self.metadata.clone(),
            node_props: select(&self.node_props, node_mask),
            edge_props: select(&self.edge_props, edge_mask.as_deref()),
            node_ids,
            edge_ids,
        })
    }
}

fn required_array(group: &Group, component: &str) -> Result<NdArray, ValidationError> {
    group
        .array(&ids_path(component))
        .cloned()
        .ok_or_else(|| ValidationError::MissingArray {
            parent: component.to_string(),
            name: IDS.to_string(),
        })
}

fn check_mask(mask: Option<&[bool]>, expected: usize) -> Result<(), GeffError> {
    match mask {
        Some(mask) if mask.len() != expected => Err(GeffError::MaskLength {
            len: mask.len(),
            expected,
        }),
        _ => Ok(()),
    }
}

fn edge_pairs(edge_ids: &NdArray) -> Result<Vec<[i64; 2]>, ValidationError> {
    if edge_ids.is_empty() {
        return Ok(Vec::new());
    }
    edge_ids.to_edge_pairs().ok_or(ValidationError::IdsNotRepresentable {
        component: Component::Edge,
    })
}

/// Decodes one property group.
///
/// Declared variable-length properties decode as ragged arrays. Otherwise a
/// byte `data` array marks an encoded string property, any other `data`
/// array a ragged one, and its absence a dense property.
fn read_prop(group: &Group, declared: Option<&PropMetadata>) -> Result<PropData, GeffError> {
    let Some(data) = group.array(DATA) else {
        return Ok(PropData::Fixed(PropArrays::from_group(group)?));
    };
    let arrays = VarLenArrays::from_group(group)?;
    let varlength = declared.is_some_and(|p| p.varlength);
    if !varlength && is_string_payload(data) {
        Ok(PropData::Fixed(decode_string_data(&arrays)?))
    } else {
        Ok(PropData::VarLength(deserialize_vlen_property_data(&arrays)?))
    }
}

/// Reads a whole store location into memory.
pub fn read_to_memory(store: &str, options: &ReadOptions) -> Result<InMemoryGeff, GeffError> {
    load(GeffReader::open(store, options.validate)?, options)
}

/// Reads the store at a directory path into memory.
pub fn read_from_path(path: &Path, options: &ReadOptions) -> Result<InMemoryGeff, GeffError> {
    load(GeffReader::from_group(read_group(path)?, options.validate)?, options)
}

fn load(mut reader: GeffReader, options: &ReadOptions) -> Result<InMemoryGeff, GeffError> {
    reader.read_node_props(options.node_props.as_deref())?;
    reader.read_edge_props(options.edge_props.as_deref())?;
    let graph = reader.build(None, None)?;

    if options.validate_data {
        validate_zarr_data(&graph)?;
    }
    if let Some(config) = &options.optional_validation {
        validate_optional_data(config, &graph)?;
    }
    debug!(
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        "read geff graph"
    );
    Ok(graph)
}
