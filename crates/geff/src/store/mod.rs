//! Hierarchical array store boundary.
//!
//! A [`Group`] is an in-memory tree of groups and typed arrays with a JSON
//! attribute map per group. The [`fs`] module persists a tree as a
//! directory in a zarr-v2 compatible layout.

pub mod fs;
pub mod path;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::model::NdArray;

pub use fs::{StoreOptions, open_storelike, read_group, write_group};
pub use path::{expand_tilde, is_remote_url};

/// A node in the store tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Group(Group),
    Array(NdArray),
}

/// A group of named members plus an attribute map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    attrs: Map<String, Value>,
    members: BTreeMap<String, Member>,
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}

fn split_last(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.trim_matches('/');
    match trimmed.rsplit_once('/') {
        Some(split) => Some(split),
        None if !trimmed.is_empty() => Some(("", trimmed)),
        None => None,
    }
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.attrs
    }

    /// Direct members, in name order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(name, member)| (name.as_str(), member))
    }

    /// Names of direct child groups.
    pub fn group_keys(&self) -> Vec<&str> {
        self.members()
            .filter(|(_, m)| matches!(m, Member::Group(_)))
            .map(|(name, _)| name)
            .collect()
    }

    /// Names of direct child arrays.
    pub fn array_keys(&self) -> Vec<&str> {
        self.members()
            .filter(|(_, m)| matches!(m, Member::Array(_)))
            .map(|(name, _)| name)
            .collect()
    }

    /// The member at a `/`-separated path relative to this group.
    pub fn member(&self, path: &str) -> Option<&Member> {
        let (parent, name) = split_last(path)?;
        self.group(parent)?.members.get(name)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.member(path).is_some()
    }

    /// The group at `path`; the empty path is this group.
    pub fn group(&self, path: &str) -> Option<&Group> {
        let mut current = self;
        for part in components(path) {
            match current.members.get(part)? {
                Member::Group(group) => current = group,
                Member::Array(_) => return None,
            }
        }
        Some(current)
    }

    pub fn group_mut(&mut self, path: &str) -> Option<&mut Group> {
        let mut current = self;
        for part in components(path) {
            match current.members.get_mut(part)? {
                Member::Group(group) => current = group,
                Member::Array(_) => return None,
            }
        }
        Some(current)
    }

    pub fn array(&self, path: &str) -> Option<&NdArray> {
        match self.member(path)? {
            Member::Array(array) => Some(array),
            Member::Group(_) => None,
        }
    }

    /// Returns the group at `path`, creating it and any parents.
    pub fn require_group(&mut self, path: &str) -> Result<&mut Group, StoreError> {
        let mut current = self;
        let mut walked = String::new();
        for part in components(path) {
            if !walked.is_empty() {
                walked.push('/');
            }
            walked.push_str(part);
            let member = current
                .members
                .entry(part.to_string())
                .or_insert_with(|| Member::Group(Group::new()));
            current = match member {
                Member::Group(group) => group,
                Member::Array(_) => return Err(StoreError::NotAGroup { path: walked }),
            };
        }
        Ok(current)
    }

    /// Stores `array` at `path`, replacing any existing member.
    pub fn create_array(&mut self, path: &str, array: NdArray) -> Result<(), StoreError> {
        let (parent, name) = split_last(path).ok_or_else(|| StoreError::InvalidStore {
            reason: "array path must not be empty".to_string(),
        })?;
        self.require_group(parent)?
            .members
            .insert(name.to_string(), Member::Array(array));
        Ok(())
    }

    /// Inserts a child group, replacing any existing member.
    pub fn insert_group(&mut self, path: &str, group: Group) -> Result<(), StoreError> {
        let (parent, name) = split_last(path).ok_or_else(|| StoreError::InvalidStore {
            reason: "group path must not be empty".to_string(),
        })?;
        self.require_group(parent)?
            .members
            .insert(name.to_string(), Member::Group(group));
        Ok(())
    }

    pub fn remove(&mut self, path: &str) -> Option<Member> {
        let (parent, name) = split_last(path)?;
        self.group_mut(parent)?.members.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_paths() {
        let mut root = Group::new();
        root.create_array("nodes/ids", NdArray::from_vec_1d(vec![1i64, 2]))
            .unwrap();
        root.require_group("nodes/props").unwrap();

        assert!(root.group("nodes").is_some());
        assert!(root.group("/nodes/props/").is_some());
        assert_eq!(root.array("nodes/ids").map(NdArray::len), Some(2));
        assert!(root.group("nodes/ids").is_none());
        assert!(root.array("nodes/props").is_none());
        assert_eq!(root.group("nodes").unwrap().group_keys(), vec!["props"]);
        assert_eq!(root.group("nodes").unwrap().array_keys(), vec!["ids"]);
        assert!(root.group("").is_some());
    }

    #[test]
    fn test_require_group_through_array_fails() {
        let mut root = Group::new();
        root.create_array("a", NdArray::from_vec_1d(vec![0u8])).unwrap();
        assert!(matches!(
            root.require_group("a/b"),
            Err(StoreError::NotAGroup { path }) if path == "a"
        ));
    }

    #[test]
    fn test_remove() {
        let mut root = Group::new();
        root.create_array("x/y", NdArray::from_vec_1d(vec![0u8])).unwrap();
        assert!(matches!(root.remove("x/y"), Some(Member::Array(_))));
        assert!(!root.contains("x/y"));
        assert!(root.contains("x"));
        assert!(root.remove("").is_none());
    }
}
