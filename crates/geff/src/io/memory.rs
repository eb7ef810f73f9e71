//! In-memory representation of a loaded graph.

use std::collections::BTreeMap;

use crate::codec::PropArrays;
use crate::error::{Component, ValidationError};
use crate::metadata::GeffMetadata;
use crate::model::{DType, NdArray, Ragged};

/// Decoded data of one property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropData {
    /// Dense values, including decoded strings.
    Fixed(PropArrays),
    /// One optional array per element.
    VarLength(Vec<Ragged>),
}

impl PropData {
    pub fn len(&self) -> usize {
        match self {
            PropData::Fixed(arrays) => arrays.len(),
            PropData::VarLength(elements) => elements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_fixed(&self) -> Option<&PropArrays> {
        match self {
            PropData::Fixed(arrays) => Some(arrays),
            PropData::VarLength(_) => None,
        }
    }

    pub fn as_varlength(&self) -> Option<&[Ragged]> {
        match self {
            PropData::Fixed(_) => None,
            PropData::VarLength(elements) => Some(elements),
        }
    }

    /// Element dtype; `None` for a variable-length property with no
    /// present element.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            PropData::Fixed(arrays) => Some(arrays.values.dtype()),
            PropData::VarLength(elements) => elements.iter().find_map(Ragged::as_array).map(NdArray::dtype),
        }
    }

    /// Keeps the elements selected by `mask`.
    pub fn select(&self, mask: &[bool]) -> Self {
        match self {
            PropData::Fixed(arrays) => PropData::Fixed(arrays.select(mask)),
            PropData::VarLength(elements) => PropData::VarLength(
                elements
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(element, _)| element.clone())
                    .collect(),
            ),
        }
    }
}

impl From<PropArrays> for PropData {
    fn from(arrays: PropArrays) -> Self {
        PropData::Fixed(arrays)
    }
}

impl From<Vec<Ragged>> for PropData {
    fn from(elements: Vec<Ragged>) -> Self {
        PropData::VarLength(elements)
    }
}

/// A whole graph held as arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryGeff {
    pub metadata: GeffMetadata,
    /// 1-D integer node ids.
    pub node_ids: NdArray,
    /// `(E, 2)` edge endpoints, same dtype as `node_ids`.
    pub edge_ids: NdArray,
    pub node_props: BTreeMap<String, PropData>,
    pub edge_props: BTreeMap<String, PropData>,
}

impl InMemoryGeff {
    pub fn num_nodes(&self) -> usize {
        self.node_ids.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_ids.len()
    }

    pub fn props(&self, component: Component) -> &BTreeMap<String, PropData> {
        match component {
            Component::Node => &self.node_props,
            Component::Edge => &self.edge_props,
        }
    }

    /// Node ids widened to `i64`.
    pub fn node_ids_i64(&self) -> Result<Vec<i64>, ValidationError> {
        self.node_ids.to_i64_vec().ok_or(ValidationError::IdsNotRepresentable {
            component: Component::Node,
        })
    }

    /// Edge endpoints widened to `i64`.
    pub fn edge_pairs(&self) -> Result<Vec<[i64; 2]>, ValidationError> {
        if self.edge_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.edge_ids.to_edge_pairs().ok_or(ValidationError::IdsNotRepresentable {
            component: Component::Edge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> InMemoryGeff {
        InMemoryGeff {
            metadata: GeffMetadata::new(true),
            node_ids: NdArray::from_vec_1d(vec![1u32, 2, 3]),
            edge_ids: NdArray::from_rows(&[[1u32, 2], [2, 3]]),
            node_props: BTreeMap::new(),
            edge_props: BTreeMap::new(),
        }
    }

    #[test]
    fn test_id_widening() {
        let g = graph();
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.node_ids_i64().unwrap(), vec![1, 2, 3]);
        assert_eq!(g.edge_pairs().unwrap(), vec![[1, 2], [2, 3]]);
    }

    #[test]
    fn test_unrepresentable_ids() {
        let mut g = graph();
        g.node_ids = NdArray::from_vec_1d(vec![u64::MAX]);
        assert_eq!(
            g.node_ids_i64(),
            Err(ValidationError::IdsNotRepresentable {
                component: Component::Node
            })
        );
    }

    #[test]
    fn test_empty_edges_any_shape() {
        let mut g = graph();
        g.edge_ids = NdArray::from_vec_1d(Vec::<u32>::new());
        assert_eq!(g.edge_pairs().unwrap(), Vec::<[i64; 2]>::new());
    }

    #[test]
    fn test_select_varlength() {
        let data = PropData::VarLength(vec![
            Ragged::Present(NdArray::from_vec_1d(vec![1.0f32])),
            Ragged::Absent,
            Ragged::Present(NdArray::from_vec_1d(vec![2.0f32, 3.0])),
        ]);
        let selected = data.select(&[true, false, true]);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.dtype(), Some(DType::Float32));
        assert!(selected.as_fixed().is_none());
        assert!(selected.as_varlength().unwrap().iter().all(|e| !e.is_absent()));
    }
}
