//! Structural and content validation of GEFF graphs.

pub mod data;
pub mod graph;
pub mod shapes;
pub mod structure;
pub mod tracks;

pub use data::{ValidationConfig, validate_optional_data, validate_zarr_data};
pub use graph::{validate_no_repeated_edges, validate_no_self_edges, validate_nodes_for_edges};
pub use shapes::{validate_ellipsoid, validate_sphere};
pub use structure::{validate_structure, validate_structure_group};
pub use tracks::{validate_lineages, validate_tracklets};
