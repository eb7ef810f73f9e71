//! Error types for GEFF property codecs, stores, metadata and validation.

use thiserror::Error;

use crate::model::DType;

/// Error raised while building or reading the metadata document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("property identifier must be a non-empty string")]
    EmptyIdentifier,

    #[error("property {identifier:?} must have a non-empty dtype")]
    EmptyDtype { identifier: String },

    #[error("Cannot have a variable length property with type str (property {identifier:?})")]
    VarLengthString { identifier: String },

    #[error("variable length property {identifier:?} has inconsistent dtypes: {first} and {other}")]
    InconsistentDtypes {
        identifier: String,
        first: DType,
        other: DType,
    },

    #[error("axis {name:?}: min and max must both be set or both be unset (min {min:?}, max {max:?})")]
    IncompleteAxisBounds {
        name: String,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("axis {name:?}: Min {min} is greater than max {max}")]
    AxisMinGreaterThanMax { name: String, min: f64, max: f64 },

    #[error("duplicate axis name {name:?}")]
    DuplicateAxis { name: String },

    #[error("axis list {field} has length {len}, expected {expected}")]
    AxisListLength {
        field: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("unsupported geff_version {version:?}; supported versions are {supported}")]
    UnsupportedVersion { version: String, supported: String },

    #[error("{component} property metadata key {key:?} does not match identifier {identifier:?}")]
    PropKeyMismatch {
        component: &'static str,
        key: String,
        identifier: String,
    },

    #[error("track_node_props key {key:?} must be one of 'lineage' or 'tracklet'")]
    InvalidTrackKey { key: String },

    #[error("{role} property {prop:?} is not declared in node_props_metadata")]
    UndeclaredNodeProp { role: &'static str, prop: String },

    #[error("No geff key found in {group}")]
    MissingGeffKey { group: String },

    #[error("malformed geff metadata: {0}")]
    Malformed(String),
}

/// Error raised by the property codecs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error(
        "All elements must have the same number of dimensions: element {index} has {actual}, expected {expected}"
    )]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Index {index} out of bounds for {len} rows")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("Cannot encode non-string array (dtype {dtype})")]
    NotString { dtype: DType },

    #[error("Cannot decode non-bytes array (dtype {dtype})")]
    NotBytes { dtype: DType },

    #[error("Property group does not contain '{key}'")]
    MissingKey { key: &'static str },

    #[error("Length of 'missing' ({missing}) does not match length of 'values' ({values})")]
    MissingLengthMismatch { missing: usize, values: usize },

    #[error("index array must be 2-D int64 with at least 2 columns, got dtype {dtype} and shape {shape:?}")]
    InvalidIndexArray { dtype: DType, shape: Vec<usize> },

    #[error("index row {row} is malformed: {reason}")]
    MalformedIndex { row: usize, reason: &'static str },

    #[error("invalid UTF-8 in string row {row}")]
    InvalidUtf8 { row: usize },

    #[error("shape {shape:?} requires {expected} elements, got {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("cannot cast {from} to {to}")]
    UnsupportedCast { from: DType, to: DType },

    #[error("property {name:?}: element {index} is incompatible: {reason}")]
    IncompatibleValue {
        name: String,
        index: usize,
        reason: String,
    },
}

/// Error raised by the store layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Path does not exist: {path}")]
    NotFound { path: String },

    #[error("store must be a zarr StoreLike: {reason}")]
    InvalidStore { reason: String },

    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("malformed metadata file {path}: {message}")]
    MalformedMetadata { path: String, message: String },

    #[error("unsupported dtype {dtype:?} in {path}")]
    UnsupportedDtype { path: String, dtype: String },

    #[error("unsupported compressor {id:?} in {path}")]
    UnsupportedCompressor { path: String, id: String },

    #[error("chunk {path} holds {actual} bytes, expected {expected}")]
    ChunkSize {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("unexpected end of chunk data while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("invalid code point {value:#x} in string chunk")]
    InvalidCodePoint { value: u32 },

    #[error("{path} is an array, not a group")]
    NotAGroup { path: String },

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),
}

/// Error raised when a store or loaded graph violates the GEFF layout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("'{parent}' group must contain a group named '{name}'")]
    MissingGroup { parent: String, name: String },

    #[error("'{parent}' group must contain an '{name}' array")]
    MissingArray { parent: String, name: String },

    #[error("'{parent}/{name}' must be a group, found an array")]
    ExpectedGroup { parent: String, name: String },

    #[error("node ids must have an integer dtype, found {dtype}")]
    NodeIdsNotInteger { dtype: DType },

    #[error("node ids must be 1-D, received shape {shape:?}")]
    NodeIdsShape { shape: Vec<usize> },

    #[error("edges ids must have a last dimension of size 2, received shape {shape:?}")]
    EdgeIdsShape { shape: Vec<usize> },

    #[error("edge ids dtype {edge_dtype} does not match node ids dtype {node_dtype}")]
    EdgeIdsDtype { node_dtype: DType, edge_dtype: DType },

    #[error("{component} property group '{prop}' must have a 'values' array")]
    MissingValues { component: Component, prop: String },

    #[error(
        "{component} property '{prop}' values has length {len}, which does not match id length {expected}"
    )]
    ValuesLength {
        component: Component,
        prop: String,
        len: usize,
        expected: usize,
    },

    #[error(
        "{component} property '{prop}' missing mask has length {len}, which does not match id length {expected}"
    )]
    MissingLength {
        component: Component,
        prop: String,
        len: usize,
        expected: usize,
    },

    #[error("{component} property '{prop}' missing mask must be boolean, found {dtype}")]
    MissingNotBoolean {
        component: Component,
        prop: String,
        dtype: DType,
    },

    #[error("{component} property {prop} described in metadata is not present in props arrays")]
    UndeclaredPropArrays { component: Component, prop: String },

    #[error("{component} property {prop} with dtype {actual} does not match metadata dtype {declared}")]
    DtypeMismatch {
        component: Component,
        prop: String,
        actual: String,
        declared: String,
    },

    #[error("Axis {axis} data is missing")]
    AxisMissing { axis: String },

    #[error("Axis property {axis} has {ndim} dimensions, must be 1D")]
    AxisNotOneDimensional { axis: String, ndim: usize },

    #[error("Axis {axis} has missing values which are not allowed")]
    AxisHasMissing { axis: String },

    #[error("{component} ids must be integers representable as int64")]
    IdsNotRepresentable { component: Component },

    #[error("Some edges are missing nodes: {edges}")]
    EdgesMissingNodes { edges: String },

    #[error("Self edges found in data: nodes {nodes}")]
    SelfEdges { nodes: String },

    #[error("Repeated edges found in data: {edges}")]
    RepeatedEdges { edges: String },

    #[error("{role} property {prop:?} is not present in the loaded node properties")]
    OptionalPropMissing { role: &'static str, prop: String },

    #[error("{role} values have unsupported dtype {dtype}")]
    NotNumeric { role: &'static str, dtype: DType },

    #[error("Sphere radius values must be non-negative; node {node} has radius {radius}")]
    NegativeRadius { node: i64, radius: f64 },

    #[error("Ellipsoid covariance matrices must be square with shape (n, d, d), received {shape:?}")]
    CovarianceShape { shape: Vec<usize> },

    #[error("Ellipsoid covariance matrix for node {node} is not symmetric")]
    CovarianceNotSymmetric { node: i64 },

    #[error("Ellipsoid covariance matrix for node {node} is not positive-definite")]
    CovarianceNotPositiveDefinite { node: i64 },

    #[error("Invalid tracklets: {details}")]
    InvalidTracklets { details: String },

    #[error("Invalid lineages: {details}")]
    InvalidLineages { details: String },
}

/// Whether a failure concerns node or edge data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Node,
    Edge,
}

impl Component {
    /// The subgroup holding this component under the graph root.
    pub fn group_name(self) -> &'static str {
        match self {
            Component::Node => crate::layout::NODES,
            Component::Edge => crate::layout::EDGES,
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Node => write!(f, "Node"),
            Component::Edge => write!(f, "Edge"),
        }
    }
}

/// Umbrella error for graph-level read and write entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeffError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("node ids dtype {node_dtype} and edge ids dtype {edge_dtype} must match")]
    IdDtypeMismatch { node_dtype: DType, edge_dtype: DType },

    #[error("{component} property {prop:?} has {len} rows, expected {expected}")]
    PropLength {
        component: Component,
        prop: String,
        len: usize,
        expected: usize,
    },

    #[error("Spatiotemporal property '{prop}' not found in node {node}")]
    AxisPropMissing { prop: String, node: i64 },

    #[error("mask has length {len}, expected {expected}")]
    MaskLength { len: usize, expected: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_expected_and_actual() {
        let err = ValidationError::ValuesLength {
            component: Component::Node,
            prop: "t".to_string(),
            len: 3,
            expected: 4,
        };
        assert_eq!(
            err.to_string(),
            "Node property 't' values has length 3, which does not match id length 4"
        );

        let err = ValidationError::DtypeMismatch {
            component: Component::Edge,
            prop: "score".to_string(),
            actual: "int16".to_string(),
            declared: "int64".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("int16") && msg.contains("int64"));
    }

    #[test]
    fn test_missing_group_message() {
        let err = ValidationError::MissingGroup {
            parent: "graph".to_string(),
            name: "nodes".to_string(),
        };
        assert_eq!(err.to_string(), "'graph' group must contain a group named 'nodes'");
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: GeffError = CodecError::MissingKey { key: "values" }.into();
        assert!(matches!(err, GeffError::Codec(CodecError::MissingKey { key: "values" })));
    }
}
