//! GEFF: Graph Exchange File Format.
//!
//! This crate stores attributed graphs (node ids, edge id pairs and per
//! node/edge properties) as a hierarchy of chunked arrays plus a JSON
//! metadata document, and validates such stores.
//!
//! # Overview
//!
//! A GEFF group holds:
//! - `nodes/ids` and `edges/ids` integer arrays
//! - one group per property under `nodes/props` and `edges/props`, each with
//!   a `values` array, an optional boolean `missing` mask and, for strings
//!   and variable-length properties, a flat `data` payload
//! - the metadata document in the `geff` attribute of the root group
//!
//! # Quick Start
//!
//! ```rust
//! use geff::io::GeffReader;
//! use geff::metadata::Axis;
//! use geff::{GeffMetadata, Group, PropMap, PropValue, WriteOptions, write_dicts};
//!
//! let nodes: Vec<(i64, PropMap)> = (0..3)
//!     .map(|id| {
//!         let mut props = PropMap::new();
//!         props.insert("t".to_string(), PropValue::Int(id));
//!         (id, props)
//!     })
//!     .collect();
//! let edges = vec![([0i64, 1], PropMap::new()), ([1, 2], PropMap::new())];
//! let metadata = GeffMetadata::new(true).with_axes(vec![Axis::time("t")]);
//!
//! // Write into an in-memory group
//! let mut group = Group::new();
//! write_dicts::<&str>(&mut group, &nodes, &edges, &[], &[], &metadata, &WriteOptions::default()).unwrap();
//!
//! // Read it back
//! let mut reader = GeffReader::from_group(group, true).unwrap();
//! reader.read_node_props::<&str>(None).unwrap();
//! let graph = reader.build(None, None).unwrap();
//! assert_eq!(graph.num_nodes(), 3);
//! assert_eq!(graph.num_edges(), 2);
//! ```
//!
//! # Modules
//!
//! - [`model`]: Dtypes, n-dimensional arrays and property values
//! - [`codec`]: Fixed, string and variable-length property codecs
//! - [`store`]: In-memory groups and the zarr-v2 directory store
//! - [`metadata`]: The metadata document, axes and property metadata
//! - [`validate`]: Structural and graph-content validation
//! - [`io`]: Whole-graph readers and writers
//! - [`error`]: Error types

pub mod codec;
pub mod error;
pub mod io;
pub mod layout;
pub mod metadata;
pub mod model;
pub mod store;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{PropArrays, VarLenArrays};
pub use error::{CodecError, Component, GeffError, SchemaError, StoreError, ValidationError};
pub use io::{
    GeffReader, InMemoryGeff, PropData, ReadOptions, WriteOptions, read_from_path, read_to_memory, write_arrays,
    write_dicts, write_to_path,
};
pub use metadata::{Axis, GEFF_VERSION, GeffMetadata, PropMetadata};
pub use model::{DType, NdArray, PropMap, PropValue, Ragged};
pub use store::{Group, StoreOptions, open_storelike};
pub use validate::{ValidationConfig, validate_structure, validate_zarr_data};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
