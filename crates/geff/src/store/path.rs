//! Store location helpers.

use std::path::PathBuf;

const REMOTE_SCHEMES: [&str; 4] = ["http", "https", "ftp", "sftp"];

/// True if `store` is a URL with a remote scheme.
pub fn is_remote_url(store: &str) -> bool {
    store
        .split_once("://")
        .is_some_and(|(scheme, _)| REMOTE_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()))
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(store: &str) -> PathBuf {
    if let Some(rest) = store.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest.trim_start_matches('/'));
            }
        }
    }
    PathBuf::from(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_urls() {
        assert!(is_remote_url("https://example.com/graph.zarr"));
        assert!(is_remote_url("HTTP://example.com/graph.zarr"));
        assert!(is_remote_url("sftp://host/graph.zarr"));
        assert!(!is_remote_url("file:///tmp/graph.zarr"));
        assert!(!is_remote_url("/tmp/graph.zarr"));
        assert!(!is_remote_url("s3:/bucket"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/tmp/x"), PathBuf::from("/tmp/x"));
        assert_eq!(expand_tilde("~user/x"), PathBuf::from("~user/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/graph.zarr"), home.join("graph.zarr"));
            assert_eq!(expand_tilde("~"), home);
        }
    }
}
