//! The `geff` metadata document stored in the graph group attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Component, SchemaError};
use crate::layout::GEFF_KEY;
use crate::metadata::axis::Axis;
use crate::metadata::prop::PropMetadata;
use crate::metadata::versions::{GEFF_VERSION, is_supported_version, supported_versions};
use crate::store::Group;

pub const TRACK_KEY_LINEAGE: &str = "lineage";
pub const TRACK_KEY_TRACKLET: &str = "tracklet";

/// Another zarr object (labels, images) stored alongside the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedObject {
    #[serde(rename = "type")]
    pub object_type: String,
    /// Relative to the graph group.
    pub path: String,
    /// Node property holding the label value of each node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_prop: Option<String>,
}

/// Which axes a viewer should show by default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_horizontal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_vertical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_depth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_time: Option<String>,
}

/// Graph-level metadata, serialized under the `geff` attribute key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeffMetadata {
    pub geff_version: String,
    pub directed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes: Option<Vec<Axis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_props_metadata: Option<BTreeMap<String, PropMetadata>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_props_metadata: Option<BTreeMap<String, PropMetadata>>,
    /// Node property holding sphere radii.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sphere: Option<String>,
    /// Node property holding ellipsoid covariance matrices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ellipsoid: Option<String>,
    /// Maps `lineage`/`tracklet` to the node property holding that id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_node_props: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_objects: Option<Vec<RelatedObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_hints: Option<DisplayHints>,
    /// Free-form application data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl GeffMetadata {
    /// Empty metadata at the current format version.
    pub fn new(directed: bool) -> Self {
        Self {
            geff_version: GEFF_VERSION.to_string(),
            directed,
            axes: None,
            node_props_metadata: None,
            edge_props_metadata: None,
            sphere: None,
            ellipsoid: None,
            track_node_props: None,
            related_objects: None,
            display_hints: None,
            extra: Map::new(),
        }
    }

    pub fn with_axes(mut self, axes: Vec<Axis>) -> Self {
        self.axes = Some(axes);
        self
    }

    pub fn props_metadata(&self, component: Component) -> Option<&BTreeMap<String, PropMetadata>> {
        match component {
            Component::Node => self.node_props_metadata.as_ref(),
            Component::Edge => self.edge_props_metadata.as_ref(),
        }
    }

    pub fn props_metadata_mut(&mut self, component: Component) -> &mut BTreeMap<String, PropMetadata> {
        let slot = match component {
            Component::Node => &mut self.node_props_metadata,
            Component::Edge => &mut self.edge_props_metadata,
        };
        slot.get_or_insert_with(BTreeMap::new)
    }

    /// Names of the axes, in declaration order.
    pub fn axis_names(&self) -> Vec<&str> {
        self.axes
            .iter()
            .flatten()
            .map(|axis| axis.name.as_str())
            .collect()
    }

    /// Checks every document-level constraint.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !is_supported_version(&self.geff_version) {
            return Err(SchemaError::UnsupportedVersion {
                version: self.geff_version.clone(),
                supported: supported_versions().join(", "),
            });
        }

        if let Some(axes) = &self.axes {
            let mut seen = rustc_hash::FxHashSet::default();
            for axis in axes {
                axis.validate()?;
                if !seen.insert(axis.name.as_str()) {
                    return Err(SchemaError::DuplicateAxis {
                        name: axis.name.clone(),
                    });
                }
            }
        }

        for (component, label) in [(Component::Node, "node"), (Component::Edge, "edge")] {
            for (key, prop) in self.props_metadata(component).into_iter().flatten() {
                if key != &prop.identifier {
                    return Err(SchemaError::PropKeyMismatch {
                        component: label,
                        key: key.clone(),
                        identifier: prop.identifier.clone(),
                    });
                }
                prop.validate()?;
            }
        }

        if let Some(track_props) = &self.track_node_props {
            if let Some(key) = track_props
                .keys()
                .find(|k| *k != TRACK_KEY_LINEAGE && *k != TRACK_KEY_TRACKLET)
            {
                return Err(SchemaError::InvalidTrackKey { key: key.clone() });
            }
        }

        if let Some(declared) = &self.node_props_metadata {
            for (role, prop) in self.node_roles() {
                if !declared.contains_key(prop) {
                    return Err(SchemaError::UndeclaredNodeProp {
                        role,
                        prop: prop.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Node properties that carry a special meaning, labeled by role.
    fn node_roles(&self) -> Vec<(&'static str, &str)> {
        let mut roles: Vec<(&'static str, &str)> =
            self.axis_names().into_iter().map(|name| ("Axis", name)).collect();
        roles.extend(self.sphere.as_deref().map(|p| ("Sphere", p)));
        roles.extend(self.ellipsoid.as_deref().map(|p| ("Ellipsoid", p)));
        if let Some(track_props) = &self.track_node_props {
            roles.extend(track_props.values().map(|p| ("Track", p.as_str())));
        }
        if let Some(objects) = &self.related_objects {
            roles.extend(
                objects
                    .iter()
                    .filter_map(|o| o.label_prop.as_deref())
                    .map(|p| ("Related object label", p)),
            );
        }
        roles
    }

    /// Reads and validates the document from a graph group's attributes.
    pub fn read(group: &Group) -> Result<Self, SchemaError> {
        let value = group
            .attrs()
            .get(GEFF_KEY)
            .ok_or_else(|| SchemaError::MissingGeffKey {
                group: "graph group attributes".to_string(),
            })?;
        let metadata: GeffMetadata =
            serde_json::from_value(value.clone()).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Validates the document and stores it in the group's attributes.
    pub fn write(&self, group: &mut Group) -> Result<(), SchemaError> {
        self.validate()?;
        let value = serde_json::to_value(self).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        group.attrs_mut().insert(GEFF_KEY.to_string(), value);
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self).map_err(|e| SchemaError::Malformed(e.to_string()))
    }
}
