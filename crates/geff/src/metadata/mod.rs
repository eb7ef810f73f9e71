//! GEFF metadata: the `geff` attribute document and its building blocks.

pub mod axis;
pub mod prop;
pub mod schema;
pub mod utils;
pub mod valid_values;
pub mod versions;

pub use axis::Axis;
pub use prop::PropMetadata;
pub use schema::{DisplayHints, GeffMetadata, RelatedObject};
pub use utils::{
    AxisLists, axes_from_lists, calculate_roi, create_or_update_metadata, create_or_update_props_metadata,
    get_graph_existing_metadata, update_axes_roi,
};
pub use versions::{GEFF_VERSION, is_supported_version, supported_versions};
