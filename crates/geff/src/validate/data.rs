//! Checks on a fully loaded graph.

use crate::codec::PropArrays;
use crate::error::ValidationError;
use crate::io::memory::{InMemoryGeff, PropData};
use crate::metadata::schema::{TRACK_KEY_LINEAGE, TRACK_KEY_TRACKLET};
use crate::validate::graph::{validate_no_repeated_edges, validate_no_self_edges, validate_nodes_for_edges};
use crate::validate::shapes::{validate_ellipsoid, validate_sphere};
use crate::validate::tracks::{validate_lineages, validate_tracklets};

/// Selects the optional checks run by [`validate_optional_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationConfig {
    pub sphere: bool,
    pub ellipsoid: bool,
    pub lineage: bool,
    pub tracklet: bool,
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every optional check enabled.
    pub fn all() -> Self {
        Self {
            sphere: true,
            ellipsoid: true,
            lineage: true,
            tracklet: true,
        }
    }

    pub fn with_sphere(mut self, enabled: bool) -> Self {
        self.sphere = enabled;
        self
    }

    pub fn with_ellipsoid(mut self, enabled: bool) -> Self {
        self.ellipsoid = enabled;
        self
    }

    pub fn with_lineage(mut self, enabled: bool) -> Self {
        self.lineage = enabled;
        self
    }

    pub fn with_tracklet(mut self, enabled: bool) -> Self {
        self.tracklet = enabled;
        self
    }
}

/// Edges must reference nodes, and there are no self or repeated edges.
pub fn validate_zarr_data(graph: &InMemoryGeff) -> Result<(), ValidationError> {
    let node_ids = graph.node_ids_i64()?;
    let edge_ids = graph.edge_pairs()?;

    let (valid, invalid) = validate_nodes_for_edges(&node_ids, &edge_ids);
    if !valid {
        return Err(ValidationError::EdgesMissingNodes {
            edges: format!("{invalid:?}"),
        });
    }
    let (valid, nodes) = validate_no_self_edges(&edge_ids);
    if !valid {
        return Err(ValidationError::SelfEdges {
            nodes: format!("{nodes:?}"),
        });
    }
    let (valid, repeated) = validate_no_repeated_edges(&edge_ids);
    if !valid {
        return Err(ValidationError::RepeatedEdges {
            edges: format!("{repeated:?}"),
        });
    }
    Ok(())
}

/// Runs the checks enabled in `config` for which the metadata names a
/// property. The named property must have been loaded.
pub fn validate_optional_data(config: &ValidationConfig, graph: &InMemoryGeff) -> Result<(), ValidationError> {
    let meta = &graph.metadata;
    let node_ids = graph.node_ids_i64()?;

    if config.sphere {
        if let Some(prop) = &meta.sphere {
            validate_sphere(&node_ids, fixed_node_prop(graph, "Sphere", prop)?)?;
        }
    }
    if config.ellipsoid {
        if let Some(prop) = &meta.ellipsoid {
            validate_ellipsoid(&node_ids, fixed_node_prop(graph, "Ellipsoid", prop)?)?;
        }
    }

    let Some(track_props) = &meta.track_node_props else {
        return Ok(());
    };
    if config.tracklet {
        if let Some(prop) = track_props.get(TRACK_KEY_TRACKLET) {
            let tracklets = group_ids(graph, "Tracklet", prop)?;
            let (valid, errors) = validate_tracklets(&node_ids, &graph.edge_pairs()?, &tracklets);
            if !valid {
                return Err(ValidationError::InvalidTracklets {
                    details: errors.join("\n"),
                });
            }
        }
    }
    if config.lineage {
        if let Some(prop) = track_props.get(TRACK_KEY_LINEAGE) {
            let lineages = group_ids(graph, "Lineage", prop)?;
            let (valid, errors) = validate_lineages(&node_ids, &graph.edge_pairs()?, &lineages);
            if !valid {
                return Err(ValidationError::InvalidLineages {
                    details: errors.join("\n"),
                });
            }
        }
    }
    Ok(())
}

fn fixed_node_prop<'a>(graph: &'a InMemoryGeff, role: &'static str, prop: &str) -> Result<&'a PropArrays, ValidationError> {
    graph
        .node_props
        .get(prop)
        .and_then(PropData::as_fixed)
        .ok_or_else(|| ValidationError::OptionalPropMissing {
            role,
            prop: prop.to_string(),
        })
}

fn group_ids(graph: &InMemoryGeff, role: &'static str, prop: &str) -> Result<Vec<i64>, ValidationError> {
    let arrays = fixed_node_prop(graph, role, prop)?;
    arrays.values.to_i64_vec().ok_or(ValidationError::NotNumeric {
        role,
        dtype: arrays.values.dtype(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::metadata::GeffMetadata;
    use crate::model::NdArray;

    fn graph(edges: &[[i64; 2]]) -> InMemoryGeff {
        InMemoryGeff {
            metadata: GeffMetadata::new(true),
            node_ids: NdArray::from_vec_1d(vec![0i64, 1, 2, 3]),
            edge_ids: NdArray::from_rows(edges),
            node_props: BTreeMap::new(),
            edge_props: BTreeMap::new(),
        }
    }

    fn with_node_prop(mut g: InMemoryGeff, name: &str, values: NdArray) -> InMemoryGeff {
        g.node_props
            .insert(name.to_string(), PropData::Fixed(PropArrays::new(values)));
        g
    }

    #[test]
    fn test_valid_data() {
        assert!(validate_zarr_data(&graph(&[[0, 1], [1, 2], [1, 3]])).is_ok());
        assert!(validate_zarr_data(&graph(&[])).is_ok());
    }

    #[test]
    fn test_edges_missing_nodes() {
        let err = validate_zarr_data(&graph(&[[0, 1], [1, 9]])).unwrap_err();
        assert_eq!(err.to_string(), "Some edges are missing nodes: [[1, 9]]");
    }

    #[test]
    fn test_self_and_repeated_edges() {
        assert_eq!(
            validate_zarr_data(&graph(&[[0, 0], [1, 2]])),
            Err(ValidationError::SelfEdges { nodes: "[0]".into() })
        );
        assert_eq!(
            validate_zarr_data(&graph(&[[0, 1], [0, 1], [1, 2]])),
            Err(ValidationError::RepeatedEdges {
                edges: "[[0, 1]]".into()
            })
        );
    }

    #[test]
    fn test_sphere_gated_by_config() {
        let mut g = with_node_prop(graph(&[]), "r", NdArray::from_vec_1d(vec![1.0f64, -1.0, 0.0, 2.0]));
        g.metadata.sphere = Some("r".into());
        assert!(validate_optional_data(&ValidationConfig::new(), &g).is_ok());
        assert_eq!(
            validate_optional_data(&ValidationConfig::new().with_sphere(true), &g),
            Err(ValidationError::NegativeRadius { node: 1, radius: -1.0 })
        );
    }

    #[test]
    fn test_optional_prop_not_loaded() {
        let mut g = graph(&[]);
        g.metadata.ellipsoid = Some("cov".into());
        assert_eq!(
            validate_optional_data(&ValidationConfig::all(), &g),
            Err(ValidationError::OptionalPropMissing {
                role: "Ellipsoid",
                prop: "cov".into()
            })
        );
    }

    #[test]
    fn test_tracklets_use_tracklet_flag() {
        let mut g = with_node_prop(
            graph(&[[0, 1], [0, 2], [2, 3]]),
            "track_id",
            NdArray::from_vec_1d(vec![1i64, 1, 1, 1]),
        );
        g.metadata.track_node_props = Some(BTreeMap::from([(
            "tracklet".to_string(),
            "track_id".to_string(),
        )]));
        assert!(validate_optional_data(&ValidationConfig::new().with_lineage(true), &g).is_ok());
        assert!(matches!(
            validate_optional_data(&ValidationConfig::new().with_tracklet(true), &g),
            Err(ValidationError::InvalidTracklets { .. })
        ));
    }

    #[test]
    fn test_lineages() {
        let mut g = with_node_prop(
            graph(&[[0, 1], [0, 2]]),
            "lineage_id",
            NdArray::from_vec_1d(vec![5u16, 5, 5, 6]),
        );
        g.metadata.track_node_props = Some(BTreeMap::from([(
            "lineage".to_string(),
            "lineage_id".to_string(),
        )]));
        let config = ValidationConfig::new().with_lineage(true);
        assert!(validate_optional_data(&config, &g).is_ok());

        g.node_props.insert(
            "lineage_id".into(),
            PropData::Fixed(PropArrays::new(NdArray::from_vec_1d(vec![5u16, 5, 7, 6]))),
        );
        assert!(matches!(
            validate_optional_data(&config, &g),
            Err(ValidationError::InvalidLineages { .. })
        ));
    }
}
