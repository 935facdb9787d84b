use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::record::{ChangeRecord, DeltaMapping};

pub const ROOT_ID: &str = "dropbox";
pub const ROOT_NAME: &str = "Dropbox";

/// One path segment of the output hierarchy.
///
/// `children` is present for directories and for every ancestor of another
/// path; a node without it is a file leaf. Absent fields are omitted from
/// JSON rather than written as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TreeNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl TreeNode {
    pub fn root() -> Self {
        Self {
            id: ROOT_ID.to_string(),
            name: Some(ROOT_NAME.to_string()),
            children: Some(Vec::new()),
            size: None,
            icon: None,
        }
    }

    fn placeholder(segment: &str) -> Self {
        Self {
            id: segment.to_string(),
            name: None,
            children: Some(Vec::new()),
            size: None,
            icon: None,
        }
    }

    fn from_record(segment: &str, record: &ChangeRecord) -> Self {
        if record.is_dir {
            Self {
                name: Some(record.path.clone()),
                ..Self::placeholder(segment)
            }
        } else {
            Self {
                id: segment.to_string(),
                name: Some(record.path.clone()),
                children: None,
                size: Some(record.bytes),
                icon: Some(record.icon.clone()),
            }
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn child(&self, id: &str) -> Option<&TreeNode> {
        self.children.as_ref()?.iter().find(|node| node.id == id)
    }

    /// Sum of `size` over every file leaf at or below this node.
    pub fn total_size(&self) -> u64 {
        match &self.children {
            Some(children) => children.iter().map(TreeNode::total_size).sum(),
            None => self.size.unwrap_or(0),
        }
    }

    /// Orders siblings by `id` at every level, giving a canonical layout
    /// independent of the order paths were inserted in.
    pub fn sort_children_recursive(&mut self) {
        if let Some(children) = self.children.as_mut() {
            children.sort_by(|a, b| a.id.cmp(&b.id));
            for child in children {
                child.sort_children_recursive();
            }
        }
    }
}

/// Two records disagree on whether a path is a file or a directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeInvariantViolation {
    #[error("{path}: segment `{segment}` is a file but has descendants")]
    FileAsAncestor { path: String, segment: String },
    #[error(
        "{path}: record is a {} but the tree already holds a {} there",
        record_kind(.existing_is_dir),
        existing_kind(.existing_is_dir)
    )]
    KindConflict { path: String, existing_is_dir: bool },
}

fn existing_kind(existing_is_dir: &bool) -> &'static str {
    if *existing_is_dir { "directory" } else { "file" }
}

fn record_kind(existing_is_dir: &bool) -> &'static str {
    existing_kind(&!*existing_is_dir)
}

/// Incrementally turns `(path, record)` pairs into a rooted tree.
///
/// Paths may arrive in any order: ancestors missing when a deeper path is
/// inserted are created as placeholders and receive their metadata once
/// their own record shows up.
#[derive(Debug)]
pub struct TreeBuilder {
    root: TreeNode,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            root: TreeNode::root(),
        }
    }

    /// Inserts one mapping entry keyed by its feed path. Deletions (`None`)
    /// are skipped and never create ancestors.
    pub fn insert(
        &mut self,
        key: &str,
        record: Option<&ChangeRecord>,
    ) -> Result<(), TreeInvariantViolation> {
        let Some(record) = record else {
            return Ok(());
        };
        let segments = split_segments(key);
        let Some(last) = segments.len().checked_sub(1) else {
            debug!(key, "skipping record that targets the root");
            return Ok(());
        };

        let mut level = self.root.children.get_or_insert_with(Vec::new);
        for (depth, segment) in segments.iter().copied().enumerate() {
            let is_final = depth == last;
            let node = match level.iter().position(|node| node.id == segment) {
                Some(index) => {
                    let existing = &mut level[index];
                    if is_final {
                        attach(existing, key, record)?;
                    }
                    existing
                }
                None => {
                    level.push(if is_final {
                        TreeNode::from_record(segment, record)
                    } else {
                        TreeNode::placeholder(segment)
                    });
                    let index = level.len() - 1;
                    &mut level[index]
                }
            };
            level = match node.children.as_mut() {
                Some(children) => children,
                None if is_final => break,
                None => {
                    return Err(TreeInvariantViolation::FileAsAncestor {
                        path: key.to_string(),
                        segment: segment.to_string(),
                    });
                }
            };
        }
        Ok(())
    }

    pub fn finish(self) -> TreeNode {
        self.root
    }
}

/// Builds the whole tree from an aggregated mapping. On an invariant
/// violation nothing is returned.
pub fn build_tree(mapping: &DeltaMapping) -> Result<TreeNode, TreeInvariantViolation> {
    let mut builder = TreeBuilder::new();
    for (key, record) in mapping {
        builder.insert(key, record.as_ref())?;
    }
    Ok(builder.finish())
}

fn split_segments(key: &str) -> Vec<&str> {
    key.strip_prefix('/')
        .unwrap_or(key)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

// Refreshes the metadata of a node reached by an earlier, deeper path or by
// another key that normalizes to the same segments.
fn attach(
    node: &mut TreeNode,
    key: &str,
    record: &ChangeRecord,
) -> Result<(), TreeInvariantViolation> {
    let existing_is_dir = !node.is_leaf();
    if existing_is_dir != record.is_dir {
        return Err(TreeInvariantViolation::KindConflict {
            path: key.to_string(),
            existing_is_dir,
        });
    }
    node.name = Some(record.path.clone());
    if !record.is_dir {
        node.size = Some(record.bytes);
        node.icon = Some(record.icon.clone());
    }
    Ok(())
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
