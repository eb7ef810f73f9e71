//! Supported `geff_version` values.

/// Version written into new metadata documents.
pub const GEFF_VERSION: &str = "1.0.0";

/// `major.minor` prefixes this crate can read.
const SUPPORTED_VERSIONS: [&str; 7] = ["0.0", "0.1", "0.2", "0.3", "0.4", "0.5", "1.0"];

pub fn supported_versions() -> &'static [&'static str] {
    &SUPPORTED_VERSIONS
}

/// True if `version` starts with a supported `major.minor` prefix.
///
/// The prefix may be followed by a patch number or a pre-release/dev tag,
/// so `0.2.1`, `0.2.0-rc1` and `0.2.dev4+g1a2b` all match `0.2`.
pub fn is_supported_version(version: &str) -> bool {
    SUPPORTED_VERSIONS.iter().any(|supported| {
        version
            .strip_prefix(supported)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '-', '+']))
    })
}
