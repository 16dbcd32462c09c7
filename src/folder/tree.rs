//! Folder tree construction from the backend's flat folder list.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use tracing::warn;

/// Separator between folder path segments.
pub const PATH_SEPARATOR: char = '/';

/// A folder as reported by the backend listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderEntry {
    /// Slash-delimited folder path (the backend calls this `name`).
    #[serde(rename = "name")]
    pub path: String,
    /// Backend-assigned folder identifier.
    pub id: String,
}

impl FolderEntry {
    /// Create a new folder entry.
    pub fn new(path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id: id.into(),
        }
    }
}

/// A node in the folder tree.
///
/// The root node of a built tree is implicit (it has no name); a node with
/// no children is a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathNode {
    children: BTreeMap<String, PathNode>,
}

impl PathNode {
    /// Create an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Child nodes in ascending name order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &PathNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Look up a direct child by segment name.
    pub fn child(&self, name: &str) -> Option<&PathNode> {
        self.children.get(name)
    }

    /// Check whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Walk (creating as needed) the nodes for `segments` below this node.
    fn insert<'a>(&mut self, segments: impl IntoIterator<Item = &'a str>) {
        let mut node = self;
        for segment in segments {
            node = node.children.entry(segment.to_string()).or_default();
        }
    }
}

/// Mapping from full folder path to backend identifier.
///
/// Only paths present as an explicit [`FolderEntry`] are recorded;
/// intermediate segments synthesized by the tree never get an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathIdIndex(HashMap<String, String>);

impl PathIdIndex {
    /// Identifier registered for a full path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether no paths are registered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split a folder path into segments, rejecting empty segments.
///
/// Returns `None` for `""`, `"/A"`, `"A//B"` or `"A/"`.
pub fn split_path(path: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

/// Build the folder tree and id index from a flat folder list.
///
/// The result does not depend on the order of `entries`. Entries with an
/// empty path segment are skipped; for a duplicated path the first id wins.
pub fn build(entries: &[FolderEntry]) -> (PathNode, PathIdIndex) {
    let mut root = PathNode::new();
    let mut index = HashMap::new();

    for entry in entries {
        let Some(segments) = split_path(&entry.path) else {
            warn!(path = %entry.path, id = %entry.id, "Skipping folder with empty path segment");
            continue;
        };

        root.insert(segments);

        if let Some(existing) = index.get(&entry.path) {
            warn!(
                path = %entry.path,
                kept = %existing,
                ignored = %entry.id,
                "Duplicate folder path in listing"
            );
            continue;
        }
        index.insert(entry.path.clone(), entry.id.clone());
    }

    (root, PathIdIndex(index))
}
