//! Names of the groups and arrays that make up a GEFF graph store.
//!
//! ```text
//! <root>            attrs["geff"] = metadata document
//! ├── nodes/
//! │   ├── ids                   1-D integer
//! │   └── props/<name>/
//! │       ├── values            leading dim == node count
//! │       ├── missing           optional, bool
//! │       └── data              varlength and string props only
//! └── edges/
//!     ├── ids                   (E, 2), same dtype as node ids
//!     └── props/<name>/...
//! ```

/// Attribute key holding the metadata document on the root group.
pub const GEFF_KEY: &str = "geff";

pub const NODES: &str = "nodes";
pub const EDGES: &str = "edges";
pub const IDS: &str = "ids";
pub const PROPS: &str = "props";
pub const VALUES: &str = "values";
pub const MISSING: &str = "missing";
pub const DATA: &str = "data";

/// Path of a component's id array relative to the root group.
pub fn ids_path(component: &str) -> String {
    format!("{component}/{IDS}")
}

/// Path of a component's props group relative to the root group.
pub fn props_path(component: &str) -> String {
    format!("{component}/{PROPS}")
}

/// Path of a single property group relative to the root group.
pub fn prop_path(component: &str, name: &str) -> String {
    format!("{component}/{PROPS}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(ids_path(NODES), "nodes/ids");
        assert_eq!(props_path(EDGES), "edges/props");
        assert_eq!(prop_path(NODES, "t"), "nodes/props/t");
    }
}
